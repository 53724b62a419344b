use crate::error::BracketError;
use crate::types::{Participant, Slot};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketSize {
  pub size: usize,
  pub byes: usize,
  /// Winners-bracket rounds, `log2(size)`.
  pub rounds: u32,
}

pub fn bracket_size(participant_count: usize) -> Result<BracketSize, BracketError> {
  if participant_count < 2 {
    return Err(BracketError::InvalidArgument(format!(
      "a bracket needs at least two participants, got {participant_count}"
    )));
  }
  let size = participant_count.next_power_of_two();
  Ok(BracketSize {
    size,
    byes: size - participant_count,
    rounds: size.trailing_zeros(),
  })
}

/// Standard bracket order: which seed sits in each opening slot, left to right.
/// Seeds 1 and 2 can only meet in the final, seeds 1-4 no earlier than the
/// semifinals, and so on.
pub fn seed_order(size: usize) -> Result<Vec<u32>, BracketError> {
  if size == 0 || !size.is_power_of_two() {
    return Err(BracketError::InvalidArgument(format!(
      "seed order needs a power-of-two size, got {size}"
    )));
  }
  let mut seeds = vec![1u32];
  while seeds.len() < size {
    let mirror = (seeds.len() * 2 + 1) as u32;
    seeds = seeds
      .iter()
      .flat_map(|&seed| [seed, mirror - seed])
      .collect();
  }
  Ok(seeds)
}

/// Places normalized participants into the opening slots. Seed numbers past
/// the participant count become byes.
pub fn opening_slots(participants: &[Participant], size: usize) -> Result<Vec<Slot>, BracketError> {
  if participants.len() > size {
    return Err(BracketError::InvalidArgument(format!(
      "{} participants do not fit a bracket of {size}",
      participants.len()
    )));
  }
  let order = seed_order(size)?;
  let mut by_seed: Vec<Option<&Participant>> = vec![None; size + 1];
  for participant in participants {
    let seed = participant.seed as usize;
    if seed == 0 || seed > participants.len() || by_seed[seed].is_some() {
      return Err(BracketError::InvalidArgument(format!(
        "participant {} has unusable placement seed {seed}",
        participant.id
      )));
    }
    by_seed[seed] = Some(participant);
  }
  Ok(
    order
      .into_iter()
      .map(|seed| by_seed[seed as usize].map(Slot::participant).unwrap_or(Slot::Bye))
      .collect(),
  )
}
