pub mod types;
pub mod error;
pub mod config;
pub mod seeding;
pub mod entrants;
pub mod builder;
pub mod bracket;
mod progression;

pub use bracket::{Bracket, BracketSnapshot};
pub use builder::{blank_bracket, build_bracket, double_elimination, single_elimination, BuildOptions};
pub use config::BracketConfig;
pub use error::BracketError;
pub use seeding::{bracket_size, seed_order, BracketSize};
pub use types::*;

use tracing_subscriber::EnvFilter;

/// Installs a stderr `tracing` subscriber filtered by `RUST_LOG` (default
/// `info`). Does nothing when the host already installed one.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .with_writer(std::io::stderr)
    .try_init();
}

/// Builds a bracket with the format and options from `config`.
pub fn build_from_config(entries: &[ParticipantEntry], config: &BracketConfig) -> Result<Bracket, BracketError> {
  build_bracket(entries, config.format, &config.options)
}
