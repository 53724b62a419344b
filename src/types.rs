use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Constants ──────────────────────────────────────────────────────────

/// Every match has exactly two slots.
pub const SLOTS_PER_MATCH: usize = 2;
pub const GRAND_FINAL_ROUND: u32 = 1;
pub const RESET_ROUND: u32 = 2;

// ── Identifiers ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
  pub fn new(id: impl Into<String>) -> Self {
    ParticipantId(id.into())
  }
}

impl fmt::Display for ParticipantId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ── Participants ───────────────────────────────────────────────────────

/// A registered participant as handed over by registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantEntry {
  pub id: ParticipantId,
  #[serde(default)]
  pub display_name: String,
  #[serde(default)]
  pub seed: Option<u32>,
}

impl ParticipantEntry {
  pub fn new(id: impl Into<String>, seed: Option<u32>) -> Self {
    let id = id.into();
    ParticipantEntry {
      display_name: id.clone(),
      id: ParticipantId(id),
      seed,
    }
  }
}

/// A participant after normalization, with the seed used for placement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
  pub id: ParticipantId,
  pub display_name: String,
  pub seed: u32,
  /// Stand-in entry of a blank bracket, cleared once it is renamed.
  #[serde(default)]
  pub placeholder: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Slot {
  Participant { id: ParticipantId, seed: Option<u32> },
  Bye,
  Tbd,
}

impl Slot {
  pub fn participant(participant: &Participant) -> Self {
    Slot::Participant {
      id: participant.id.clone(),
      seed: Some(participant.seed),
    }
  }

  pub fn is_resolved(&self) -> bool {
    !matches!(self, Slot::Tbd)
  }

  pub fn is_bye(&self) -> bool {
    matches!(self, Slot::Bye)
  }

  pub fn participant_id(&self) -> Option<&ParticipantId> {
    match self {
      Slot::Participant { id, .. } => Some(id),
      _ => None,
    }
  }
}

// ── Matches ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketFormat {
  SingleElimination,
  DoubleElimination,
}

impl BracketFormat {
  pub fn parse(raw: &str) -> Option<Self> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
      "single_elimination" | "single" => Some(BracketFormat::SingleElimination),
      "double_elimination" | "double" => Some(BracketFormat::DoubleElimination),
      _ => None,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSection {
  Winners,
  Losers,
  GrandFinal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
  /// At least one slot is still waiting on an earlier match.
  Waiting,
  /// Both slots resolved, ready to be played.
  Pending,
  /// Ready and given a start time.
  Scheduled,
  Bye,
  Live,
  Completed,
  /// Grand-final reset game that has not been triggered.
  Dormant,
  /// Grand-final reset game that turned out not to be needed.
  Void,
}

impl MatchStatus {
  pub fn is_settled(self) -> bool {
    matches!(self, MatchStatus::Bye | MatchStatus::Completed | MatchStatus::Void)
  }
}

/// Where a match's winner or loser goes next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advance {
  pub match_id: MatchId,
  pub slot: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
  pub id: MatchId,
  pub round: u32,
  pub match_number: u32,
  pub position: u32,
  pub section: BracketSection,
  pub slots: [Slot; SLOTS_PER_MATCH],
  pub scores: [u32; SLOTS_PER_MATCH],
  pub status: MatchStatus,
  pub winner_slot: Option<usize>,
  pub advance_winner_to: Option<Advance>,
  pub advance_loser_to: Option<Advance>,
  #[serde(default)]
  pub scheduled_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub started_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
  pub fn winner(&self) -> Option<&Slot> {
    self.winner_slot.and_then(|slot| self.slots.get(slot))
  }

  pub fn loser(&self) -> Option<&Slot> {
    self.winner_slot.and_then(|slot| self.slots.get(other_slot(slot)))
  }

  /// Playable now: both slots hold participants and no result is in.
  pub fn is_ready(&self) -> bool {
    matches!(self.status, MatchStatus::Pending | MatchStatus::Scheduled)
  }
}

pub fn other_slot(slot: usize) -> usize {
  if slot == 0 { 1 } else { 0 }
}
