use crate::error::BracketError;
use crate::seeding::{bracket_size, BracketSize};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use tracing::debug;

/// Serializable form of a bracket, for the storage layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketSnapshot {
  pub format: BracketFormat,
  pub size: usize,
  pub participants: Vec<Participant>,
  pub matches: Vec<Match>,
}

/// A fully wired match graph.
///
/// Matches are kept in construction order and every advance link points at a
/// later match, so the store order is a topological order of the graph.
/// Each match has its own lock; see `progression` for how results take them.
pub struct Bracket {
  pub(crate) format: BracketFormat,
  pub(crate) size: BracketSize,
  /// Display names can change after construction; ids and seeds cannot.
  pub(crate) participants: RwLock<Vec<Participant>>,
  pub(crate) ids: Vec<MatchId>,
  pub(crate) matches: Vec<Mutex<Match>>,
  pub(crate) index: HashMap<MatchId, usize>,
  /// Single-elimination final, or grand final game 1.
  pub(crate) deciding: usize,
  pub(crate) reset: Option<usize>,
}

impl std::fmt::Debug for Bracket {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Bracket")
      .field("format", &self.format)
      .field("size", &self.size)
      .field("matches", &self.ids.len())
      .finish()
  }
}

impl Bracket {
  pub(crate) fn from_parts(
    format: BracketFormat,
    size: BracketSize,
    participants: Vec<Participant>,
    matches: Vec<Match>,
  ) -> Result<Self, BracketError> {
    if matches.is_empty() {
      return Err(BracketError::InvalidArgument("bracket has no matches".to_string()));
    }

    let known = participants.iter().map(|p| &p.id).collect::<HashSet<_>>();
    if known.len() != participants.len() {
      return Err(BracketError::InvalidArgument("participant id is listed twice".to_string()));
    }

    let mut index = HashMap::with_capacity(matches.len());
    for (idx, m) in matches.iter().enumerate() {
      if index.insert(m.id, idx).is_some() {
        return Err(BracketError::invariant(m.id, "match id is used twice"));
      }
    }

    for (idx, m) in matches.iter().enumerate() {
      if m.round == 0 {
        return Err(BracketError::invariant(m.id, "rounds are 1-based"));
      }
      if let Some(id) = m.slots.iter().filter_map(Slot::participant_id).find(|id| !known.contains(id)) {
        return Err(BracketError::invariant(m.id, format!("slot holds unknown participant {id}")));
      }
      if m.winner_slot.is_some_and(|slot| slot >= SLOTS_PER_MATCH) {
        return Err(BracketError::invariant(m.id, "winner slot out of range"));
      }
      for advance in [m.advance_winner_to, m.advance_loser_to].into_iter().flatten() {
        let Some(&target) = index.get(&advance.match_id) else {
          return Err(BracketError::invariant(
            m.id,
            format!("advances to unknown match {}", advance.match_id),
          ));
        };
        if target <= idx {
          return Err(BracketError::invariant(
            m.id,
            format!("advances backwards to match {}", advance.match_id),
          ));
        }
        if advance.slot >= SLOTS_PER_MATCH {
          return Err(BracketError::invariant(m.id, "advance slot out of range"));
        }
      }
    }

    let (deciding, reset) = match format {
      BracketFormat::SingleElimination => {
        let terminal = matches
          .iter()
          .enumerate()
          .filter(|(_, m)| m.section == BracketSection::Winners && m.advance_winner_to.is_none())
          .map(|(idx, _)| idx)
          .collect::<Vec<_>>();
        let &[deciding] = terminal.as_slice() else {
          return Err(BracketError::invariant(
            matches[0].id,
            format!("expected one final, found {}", terminal.len()),
          ));
        };
        (deciding, None)
      }
      BracketFormat::DoubleElimination => {
        let find_round = |round: u32| {
          matches
            .iter()
            .enumerate()
            .filter(|(_, m)| m.section == BracketSection::GrandFinal && m.round == round)
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>()
        };
        let games = find_round(GRAND_FINAL_ROUND);
        let &[deciding] = games.as_slice() else {
          return Err(BracketError::invariant(
            matches[0].id,
            format!("expected one grand final, found {}", games.len()),
          ));
        };
        let resets = find_round(RESET_ROUND);
        let reset = match resets.as_slice() {
          [] => None,
          &[reset] if reset > deciding => Some(reset),
          _ => {
            return Err(BracketError::invariant(
              matches[deciding].id,
              "grand final reset game is misplaced",
            ))
          }
        };
        (deciding, reset)
      }
    };

    Ok(Bracket {
      format,
      size,
      participants: RwLock::new(participants),
      ids: matches.iter().map(|m| m.id).collect(),
      matches: matches.into_iter().map(Mutex::new).collect(),
      index,
      deciding,
      reset,
    })
  }

  /// Rebuilds a live bracket from a stored snapshot.
  pub fn restore(snapshot: BracketSnapshot) -> Result<Self, BracketError> {
    let size = bracket_size(snapshot.participants.len())?;
    if size.size != snapshot.size {
      return Err(BracketError::InvalidArgument(format!(
        "snapshot size {} does not fit {} participants",
        snapshot.size,
        snapshot.participants.len()
      )));
    }
    Bracket::from_parts(snapshot.format, size, snapshot.participants, snapshot.matches)
  }

  pub fn snapshot(&self) -> Result<BracketSnapshot, BracketError> {
    Ok(BracketSnapshot {
      format: self.format,
      size: self.size.size,
      participants: self.participants(),
      matches: self.matches()?,
    })
  }

  pub fn format(&self) -> BracketFormat {
    self.format
  }

  pub fn size(&self) -> BracketSize {
    self.size
  }

  pub fn participants(&self) -> Vec<Participant> {
    self.participants.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn participant(&self, id: &ParticipantId) -> Option<Participant> {
    self
      .participants
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .iter()
      .find(|p| &p.id == id)
      .cloned()
  }

  /// Changes a participant's display name, e.g. when a placeholder of a blank
  /// bracket gets filled in. Slots refer to participants by id, so no match
  /// changes. Returns `false` when the name is already current.
  pub fn rename_participant(&self, id: &ParticipantId, name: &str) -> Result<bool, BracketError> {
    let name = name.trim();
    if name.is_empty() {
      return Err(BracketError::InvalidArgument(format!("new name for {id} is empty")));
    }
    let mut participants = self.participants.write().unwrap_or_else(PoisonError::into_inner);
    let participant = participants
      .iter_mut()
      .find(|p| &p.id == id)
      .ok_or_else(|| BracketError::UnknownParticipant(id.clone()))?;
    if participant.display_name == name && !participant.placeholder {
      return Ok(false);
    }
    debug!("participant {id} renamed from {:?} to {name:?}", participant.display_name);
    participant.display_name = name.to_string();
    participant.placeholder = false;
    Ok(true)
  }

  pub fn match_ids(&self) -> &[MatchId] {
    &self.ids
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }

  pub fn get(&self, id: MatchId) -> Result<Match, BracketError> {
    let idx = self.position(id)?;
    Ok(self.lock(idx)?.clone())
  }

  /// Consistent copy of every match, in construction order.
  pub fn matches(&self) -> Result<Vec<Match>, BracketError> {
    let guards = (0..self.matches.len())
      .map(|idx| self.lock(idx))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(guards.iter().map(|guard| (**guard).clone()).collect())
  }

  pub fn ready_matches(&self) -> Result<Vec<Match>, BracketError> {
    let mut ready = Vec::new();
    for idx in 0..self.matches.len() {
      let guard = self.lock(idx)?;
      if guard.is_ready() {
        ready.push(guard.clone());
      }
    }
    Ok(ready)
  }

  pub fn is_complete(&self) -> Result<bool, BracketError> {
    Ok(self.final_outcome()?.is_some())
  }

  pub fn champion(&self) -> Result<Option<ParticipantId>, BracketError> {
    Ok(self.final_outcome()?.and_then(|m| m.winner().and_then(|slot| slot.participant_id().cloned())))
  }

  /// The match that decided the tournament, once there is one.
  fn final_outcome(&self) -> Result<Option<Match>, BracketError> {
    // Deciding game before reset game, same order progression locks them in.
    let deciding = self.lock(self.deciding)?;
    if deciding.status != MatchStatus::Completed {
      return Ok(None);
    }
    let Some(reset) = self.reset else {
      return Ok(Some(deciding.clone()));
    };
    let reset = self.lock(reset)?;
    Ok(match reset.status {
      MatchStatus::Void => Some(deciding.clone()),
      MatchStatus::Completed => Some(reset.clone()),
      _ => None,
    })
  }

  pub(crate) fn position(&self, id: MatchId) -> Result<usize, BracketError> {
    self.index.get(&id).copied().ok_or(BracketError::NotFound(id))
  }

  pub(crate) fn lock(&self, idx: usize) -> Result<MutexGuard<'_, Match>, BracketError> {
    let id = self.ids[idx];
    self.matches[idx].lock().map_err(|_| BracketError::Poisoned(id))
  }
}
