use crate::types::{MatchId, ParticipantId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BracketError {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// A result argument that cannot apply to this match.
  #[error("invalid result for match {match_id}: {reason}")]
  InvalidResult { match_id: MatchId, reason: String },

  #[error("invariant violated at match {match_id}: {reason}")]
  InvariantViolation { match_id: MatchId, reason: String },

  #[error("match {match_id} is in the wrong state: {reason}")]
  InvalidState { match_id: MatchId, reason: String },

  #[error("conflicting result for match {match_id}: {reason}")]
  Conflict { match_id: MatchId, reason: String },

  #[error("match {0} not found")]
  NotFound(MatchId),

  #[error("lock for match {0} was poisoned")]
  Poisoned(MatchId),

  #[error("participant {0} is not in this bracket")]
  UnknownParticipant(ParticipantId),
}

impl BracketError {
  /// The match the error is about, when there is one.
  pub fn match_id(&self) -> Option<MatchId> {
    match self {
      BracketError::InvalidArgument(_) | BracketError::UnknownParticipant(_) => None,
      BracketError::InvalidResult { match_id, .. }
      | BracketError::InvariantViolation { match_id, .. }
      | BracketError::InvalidState { match_id, .. }
      | BracketError::Conflict { match_id, .. } => Some(*match_id),
      BracketError::NotFound(match_id) | BracketError::Poisoned(match_id) => Some(*match_id),
    }
  }

  pub(crate) fn invalid_result(match_id: MatchId, reason: impl Into<String>) -> Self {
    BracketError::InvalidResult { match_id, reason: reason.into() }
  }

  pub(crate) fn invariant(match_id: MatchId, reason: impl Into<String>) -> Self {
    BracketError::InvariantViolation { match_id, reason: reason.into() }
  }

  pub(crate) fn invalid_state(match_id: MatchId, reason: impl Into<String>) -> Self {
    BracketError::InvalidState { match_id, reason: reason.into() }
  }

  pub(crate) fn conflict(match_id: MatchId, reason: impl Into<String>) -> Self {
    BracketError::Conflict { match_id, reason: reason.into() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn match_id_is_exposed_for_match_errors() {
    let err = BracketError::conflict(MatchId(7), "winner differs");
    assert_eq!(err.match_id(), Some(MatchId(7)));
    assert_eq!(err.to_string(), "conflicting result for match 7: winner differs");

    let err = BracketError::invalid_result(MatchId(3), "scores are tied");
    assert_eq!(err.match_id(), Some(MatchId(3)));
    assert_eq!(err.to_string(), "invalid result for match 3: scores are tied");

    let err = BracketError::InvalidArgument("need two participants".to_string());
    assert_eq!(err.match_id(), None);
    assert_eq!(BracketError::UnknownParticipant(ParticipantId::new("x")).match_id(), None);
  }
}
