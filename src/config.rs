use crate::builder::BuildOptions;
use crate::error::BracketError;
use crate::types::BracketFormat;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BracketConfig {
  pub format: BracketFormat,
  pub options: BuildOptions,
}

impl Default for BracketConfig {
  fn default() -> Self {
    BracketConfig {
      format: BracketFormat::SingleElimination,
      options: BuildOptions::default(),
    }
  }
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn parse_flag(raw: &str) -> Option<bool> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}

/// Applies `BRACKET_*` settings on top of `config`. `lookup` resolves a key
/// to its value; `apply_env_overrides` uses the process environment.
pub fn apply_overrides_from<F>(mut config: BracketConfig, lookup: F) -> BracketConfig
where
  F: Fn(&str) -> Option<String>,
{
  if let Some(raw) = lookup("BRACKET_FORMAT") {
    match BracketFormat::parse(&raw) {
      Some(format) => config.format = format,
      None => tracing::warn!("BRACKET_FORMAT={raw} is not a bracket format, keeping {:?}", config.format),
    }
  }
  if let Some(raw) = lookup("BRACKET_GRAND_FINAL_RESET") {
    match parse_flag(&raw) {
      Some(flag) => config.options.grand_final_reset = flag,
      None => tracing::warn!("BRACKET_GRAND_FINAL_RESET={raw} is not a flag, ignoring"),
    }
  }
  if let Some(raw) = lookup("BRACKET_AVOID_REMATCHES") {
    match parse_flag(&raw) {
      Some(flag) => config.options.avoid_rematches = flag,
      None => tracing::warn!("BRACKET_AVOID_REMATCHES={raw} is not a flag, ignoring"),
    }
  }
  config
}

pub fn apply_env_overrides(config: BracketConfig) -> BracketConfig {
  apply_overrides_from(config, env_default)
}

pub fn load_config_from(path: &Path) -> Result<BracketConfig, BracketError> {
  if !path.is_file() {
    return Err(BracketError::InvalidArgument(format!(
      "bracket config not found at {}",
      path.display()
    )));
  }
  let data = fs::read_to_string(path)
    .map_err(|e| BracketError::InvalidArgument(format!("read bracket config {}: {e}", path.display())))?;
  serde_json::from_str::<BracketConfig>(&data)
    .map_err(|e| BracketError::InvalidArgument(format!("parse bracket config {}: {e}", path.display())))
}

/// Loads the config file when one is given, otherwise defaults, then applies
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<BracketConfig, BracketError> {
  let config = match path {
    Some(path) => load_config_from(path)?,
    None => BracketConfig::default(),
  };
  Ok(apply_env_overrides(config))
}
