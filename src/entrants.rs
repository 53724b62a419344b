use crate::error::BracketError;
use crate::types::{Participant, ParticipantEntry};
use std::collections::HashSet;

/// Validates registered participants and assigns the placement seeds used to
/// build the bracket.
///
/// Declared seeds keep their relative order and come first; unseeded
/// participants follow in registration order. The result is ranked `1..=n`,
/// so gaps in declared seeds never push anyone out of the bracket.
pub fn normalize_entrants(entries: &[ParticipantEntry]) -> Result<Vec<Participant>, BracketError> {
  if entries.is_empty() {
    return Err(BracketError::InvalidArgument("no participants provided".to_string()));
  }

  let mut used_ids = HashSet::new();
  let mut used_seeds = HashSet::new();
  for entry in entries {
    if entry.id.0.trim().is_empty() {
      return Err(BracketError::InvalidArgument("participant id must not be empty".to_string()));
    }
    if !used_ids.insert(&entry.id) {
      return Err(BracketError::InvalidArgument(format!(
        "participant {} is registered twice",
        entry.id
      )));
    }
    if let Some(seed) = entry.seed {
      if seed == 0 {
        return Err(BracketError::InvalidArgument(format!(
          "participant {} has seed 0; seeds start at 1",
          entry.id
        )));
      }
      if !used_seeds.insert(seed) {
        return Err(BracketError::InvalidArgument(format!(
          "seed {seed} is assigned to more than one participant"
        )));
      }
    }
  }

  let mut ordered = entries.iter().enumerate().collect::<Vec<_>>();
  // Seeded first by seed, then unseeded by registration order.
  ordered.sort_by_key(|(registered, entry)| match entry.seed {
    Some(seed) => (0u8, seed as usize),
    None => (1u8, *registered),
  });

  Ok(
    ordered
      .into_iter()
      .enumerate()
      .map(|(rank, (_, entry))| Participant {
        id: entry.id.clone(),
        display_name: if entry.display_name.trim().is_empty() {
          entry.id.0.clone()
        } else {
          entry.display_name.trim().to_string()
        },
        seed: rank as u32 + 1,
        placeholder: false,
      })
      .collect(),
  )
}
