//! Result recording and propagation.
//!
//! A result touches its own match plus whatever it feeds, possibly cascading
//! through byes. Every advance link points at a later store index, so a
//! propagation pass visits matches in strictly ascending index order and can
//! take their locks in that order while holding the earlier ones. All locks
//! are held until the final commit, which makes a result all-or-nothing and
//! keeps readers from seeing a half-filled match.

use crate::bracket::Bracket;
use crate::error::BracketError;
use crate::types::*;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::MutexGuard;
use tracing::{debug, info};

#[derive(Clone, Debug)]
enum Delivery {
  Fill { slot: usize, value: Slot },
  ActivateReset { slots: [Slot; SLOTS_PER_MATCH] },
  VoidReset,
}

struct Wave<'a> {
  bracket: &'a Bracket,
  guards: BTreeMap<usize, MutexGuard<'a, Match>>,
  work: BTreeMap<usize, Match>,
  inbox: BTreeMap<usize, Vec<Delivery>>,
  now: DateTime<Utc>,
}

impl<'a> Wave<'a> {
  fn new(bracket: &'a Bracket) -> Self {
    Wave {
      bracket,
      guards: BTreeMap::new(),
      work: BTreeMap::new(),
      inbox: BTreeMap::new(),
      now: Utc::now(),
    }
  }

  fn load(&mut self, idx: usize) -> Result<&mut Match, BracketError> {
    if !self.work.contains_key(&idx) {
      if let Some((&last, _)) = self.guards.last_key_value() {
        if idx < last {
          return Err(BracketError::invariant(
            self.bracket.ids[idx],
            "propagation reached an earlier match",
          ));
        }
      }
      let guard = self.bracket.lock(idx)?;
      self.work.insert(idx, (*guard).clone());
      self.guards.insert(idx, guard);
    }
    self
      .work
      .get_mut(&idx)
      .ok_or(BracketError::NotFound(self.bracket.ids[idx]))
  }

  fn send(&mut self, from: usize, advance: Advance, value: Slot) -> Result<(), BracketError> {
    let target = self.bracket.position(advance.match_id)?;
    if target <= from {
      return Err(BracketError::invariant(
        self.bracket.ids[from],
        format!("advances backwards to match {}", advance.match_id),
      ));
    }
    self
      .inbox
      .entry(target)
      .or_default()
      .push(Delivery::Fill { slot: advance.slot, value });
    Ok(())
  }

  /// Sends a decided match's winner and loser on to their next matches.
  fn forward(&mut self, idx: usize) -> Result<(), BracketError> {
    let decided = self.load(idx)?.clone();
    let (winner, loser) = match decided.winner_slot {
      Some(slot) => (decided.slots[slot].clone(), decided.slots[other_slot(slot)].clone()),
      None => (Slot::Bye, Slot::Bye),
    };
    if let Some(advance) = decided.advance_winner_to {
      self.send(idx, advance, winner)?;
    }
    if let Some(advance) = decided.advance_loser_to {
      self.send(idx, advance, loser)?;
    }
    Ok(())
  }

  fn deliver(&mut self, idx: usize, delivery: Delivery) -> Result<(), BracketError> {
    let now = self.now;
    let target = self.load(idx)?;
    match delivery {
      Delivery::Fill { slot, value } => {
        if target.status != MatchStatus::Waiting {
          return Err(BracketError::invariant(
            target.id,
            format!("slot {slot} filled while match is {:?}", target.status),
          ));
        }
        if target.slots[slot] == Slot::Tbd {
          target.slots[slot] = value;
        } else if target.slots[slot] != value {
          return Err(BracketError::invariant(
            target.id,
            format!("slot {slot} already holds {:?}", target.slots[slot]),
          ));
        }
      }
      Delivery::ActivateReset { slots } => {
        if target.status != MatchStatus::Dormant {
          return Err(BracketError::invariant(target.id, "reset game activated twice"));
        }
        target.slots = slots;
        target.status = MatchStatus::Waiting;
        info!("grand final reset activated as match {}", target.id);
      }
      Delivery::VoidReset => {
        if target.status != MatchStatus::Dormant {
          return Err(BracketError::invariant(target.id, "reset game voided twice"));
        }
        target.status = MatchStatus::Void;
        target.completed_at = Some(now);
      }
    }
    Ok(())
  }

  /// Moves a waiting match on once both of its slots are known.
  fn settle(&mut self, idx: usize) -> Result<(), BracketError> {
    let now = self.now;
    let target = self.load(idx)?;
    if target.status != MatchStatus::Waiting || !target.slots.iter().all(Slot::is_resolved) {
      return Ok(());
    }
    match (target.slots[0].is_bye(), target.slots[1].is_bye()) {
      (false, false) => {
        target.status = MatchStatus::Pending;
        return Ok(());
      }
      (true, true) => {
        if target.section == BracketSection::Winners {
          return Err(BracketError::invariant(target.id, "winners-bracket match has two byes"));
        }
        target.winner_slot = None;
      }
      (first_is_bye, _) => {
        target.winner_slot = Some(if first_is_bye { 1 } else { 0 });
      }
    }
    target.status = MatchStatus::Bye;
    target.completed_at = Some(now);
    debug!("match {} resolved by bye", target.id);
    self.forward(idx)
  }

  fn run(&mut self) -> Result<(), BracketError> {
    while let Some((idx, deliveries)) = self.inbox.pop_first() {
      for delivery in deliveries {
        self.deliver(idx, delivery)?;
      }
      self.settle(idx)?;
    }
    Ok(())
  }

  /// Writes every modified match back under its lock and reports which
  /// matches changed, in store order.
  fn commit(mut self) -> Vec<MatchId> {
    let mut changed = Vec::new();
    for (idx, updated) in std::mem::take(&mut self.work) {
      if let Some(guard) = self.guards.get_mut(&idx) {
        if **guard != updated {
          **guard = updated;
          changed.push(guard.id);
        }
      }
    }
    changed
  }
}

impl Bracket {
  /// Records the result of a match and propagates it through the bracket.
  ///
  /// Returns the ids of every match whose state changed. Repeating an
  /// already-applied result returns an empty list; a different result for a
  /// completed match is a `Conflict`. On error nothing is modified.
  pub fn record_result(
    &self,
    match_id: MatchId,
    winning_slot: usize,
    score1: u32,
    score2: u32,
  ) -> Result<Vec<MatchId>, BracketError> {
    let idx = self.position(match_id)?;
    if winning_slot >= SLOTS_PER_MATCH {
      return Err(BracketError::invalid_result(
        match_id,
        format!("winning slot must be 0 or 1, got {winning_slot}"),
      ));
    }
    let scores = [score1, score2];
    let mut wave = Wave::new(self);
    let now = wave.now;

    {
      let current = wave.load(idx)?;
      match current.status {
        MatchStatus::Completed => {
          if current.winner_slot == Some(winning_slot) && current.scores == scores {
            debug!("match {match_id} already has this result");
            return Ok(Vec::new());
          }
          return Err(BracketError::conflict(
            match_id,
            format!(
              "already completed with slot {:?} winning {}-{}",
              current.winner_slot, current.scores[0], current.scores[1]
            ),
          ));
        }
        MatchStatus::Pending | MatchStatus::Scheduled | MatchStatus::Live => {}
        MatchStatus::Waiting => {
          return Err(BracketError::invalid_state(match_id, "both slots must be resolved first"))
        }
        MatchStatus::Bye => return Err(BracketError::invalid_state(match_id, "match was decided by a bye")),
        MatchStatus::Dormant => {
          return Err(BracketError::invalid_state(match_id, "grand final reset has not been triggered"))
        }
        MatchStatus::Void => return Err(BracketError::invalid_state(match_id, "grand final reset is not needed")),
      }
      if current.slots.iter().any(|slot| slot.participant_id().is_none()) {
        return Err(BracketError::invalid_state(match_id, "both slots must hold participants"));
      }

      current.scores = scores;
      current.winner_slot = Some(winning_slot);
      current.status = MatchStatus::Completed;
      current.completed_at = Some(now);
    }
    wave.forward(idx)?;

    let mut finished = Some(idx) == self.reset;
    if idx == self.deciding {
      match self.reset {
        // Slot 1 holds the losers-bracket champion; a win there forces game two.
        Some(reset) if winning_slot == 1 => {
          let game = wave.load(idx)?.clone();
          wave.inbox.entry(reset).or_default().push(Delivery::ActivateReset {
            slots: [game.slots[1].clone(), game.slots[0].clone()],
          });
        }
        Some(reset) => {
          wave.inbox.entry(reset).or_default().push(Delivery::VoidReset);
          finished = true;
        }
        None => finished = true,
      }
    }

    wave.run()?;
    let changed = wave.commit();
    info!("match {match_id} completed; {} matches changed", changed.len());
    if finished {
      info!("tournament complete");
    }
    Ok(changed)
  }

  /// Records a result whose winner is the slot with the higher score.
  /// Elimination matches cannot end level, so a tie is rejected.
  pub fn record_scores(&self, match_id: MatchId, score1: u32, score2: u32) -> Result<Vec<MatchId>, BracketError> {
    self.position(match_id)?;
    let winning_slot = match score1.cmp(&score2) {
      Ordering::Greater => 0,
      Ordering::Less => 1,
      Ordering::Equal => {
        return Err(BracketError::invalid_result(
          match_id,
          format!("tied score {score1}-{score2} cannot decide an elimination match"),
        ))
      }
    };
    self.record_result(match_id, winning_slot, score1, score2)
  }

  /// Gives a ready match a start time. A scheduled match can be moved to a
  /// new time; the same time again returns `false`.
  pub fn schedule_match(&self, match_id: MatchId, at: DateTime<Utc>) -> Result<bool, BracketError> {
    let idx = self.position(match_id)?;
    let mut current = self.lock(idx)?;
    match current.status {
      MatchStatus::Scheduled if current.scheduled_at == Some(at) => Ok(false),
      MatchStatus::Pending | MatchStatus::Scheduled => {
        current.status = MatchStatus::Scheduled;
        current.scheduled_at = Some(at);
        debug!("match {match_id} scheduled for {at}");
        Ok(true)
      }
      status => Err(BracketError::invalid_state(
        match_id,
        format!("cannot schedule a match that is {status:?}"),
      )),
    }
  }

  /// Marks a ready match as being played. Starting a live match again is a
  /// no-op and returns `false`.
  pub fn start_match(&self, match_id: MatchId) -> Result<bool, BracketError> {
    let idx = self.position(match_id)?;
    let mut current = self.lock(idx)?;
    match current.status {
      MatchStatus::Pending | MatchStatus::Scheduled => {
        current.status = MatchStatus::Live;
        current.started_at = Some(Utc::now());
        debug!("match {match_id} is live");
        Ok(true)
      }
      MatchStatus::Live => Ok(false),
      status => Err(BracketError::invalid_state(
        match_id,
        format!("cannot start a match that is {status:?}"),
      )),
    }
  }

  /// Running score update; does not decide the match.
  pub fn update_score(&self, match_id: MatchId, score1: u32, score2: u32) -> Result<bool, BracketError> {
    let idx = self.position(match_id)?;
    let mut current = self.lock(idx)?;
    if !matches!(current.status, MatchStatus::Pending | MatchStatus::Scheduled | MatchStatus::Live) {
      return Err(BracketError::invalid_state(
        match_id,
        format!("cannot update scores of a match that is {:?}", current.status),
      ));
    }
    let scores = [score1, score2];
    if current.scores == scores {
      return Ok(false);
    }
    current.scores = scores;
    Ok(true)
  }

  /// Settles an opening match right after construction: ready when both
  /// slots hold participants, auto-advanced when one is a bye.
  pub(crate) fn settle_opening(&self, match_id: MatchId) -> Result<Vec<MatchId>, BracketError> {
    let idx = self.position(match_id)?;
    let mut wave = Wave::new(self);
    wave.settle(idx)?;
    wave.run()?;
    Ok(wave.commit())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builder::{build_bracket, BuildOptions};
  use crate::seeding::bracket_size;

  fn entries(count: usize) -> Vec<ParticipantEntry> {
    (1..=count)
      .map(|seed| ParticipantEntry::new(format!("p{seed}"), Some(seed as u32)))
      .collect()
  }

  fn single(count: usize) -> Bracket {
    build_bracket(&entries(count), BracketFormat::SingleElimination, &BuildOptions::default()).unwrap()
  }

  fn double(count: usize) -> Bracket {
    build_bracket(&entries(count), BracketFormat::DoubleElimination, &BuildOptions::default()).unwrap()
  }

  fn find(bracket: &Bracket, section: BracketSection, round: u32, position: u32) -> Match {
    bracket
      .matches()
      .unwrap()
      .into_iter()
      .find(|m| m.section == section && m.round == round && m.position == position)
      .unwrap()
  }

  fn name(slot: &Slot) -> Option<&str> {
    slot.participant_id().map(|id| id.0.as_str())
  }

  #[test]
  fn test_winner_fills_next_match_only_when_both_inputs_arrive() {
    let bracket = single(4);
    let semis = bracket.ready_matches().unwrap();
    assert_eq!(semis.len(), 2);

    let changed = bracket.record_result(semis[0].id, 0, 3, 1).unwrap();
    let final_match = find(&bracket, BracketSection::Winners, 2, 1);
    assert_eq!(changed, vec![semis[0].id, final_match.id]);
    assert_eq!(final_match.status, MatchStatus::Waiting);
    assert!(!final_match.is_ready());
    assert_eq!(name(&final_match.slots[0]), Some("p1"));
    assert_eq!(final_match.slots[1], Slot::Tbd);

    bracket.record_result(semis[1].id, 1, 0, 2).unwrap();
    let final_match = find(&bracket, BracketSection::Winners, 2, 1);
    assert_eq!(final_match.status, MatchStatus::Pending);
    assert_eq!(name(&final_match.slots[1]), Some("p3"));
  }

  #[test]
  fn test_repeated_result_is_a_no_op() {
    let bracket = single(4);
    let semi = bracket.ready_matches().unwrap()[0].id;
    bracket.record_result(semi, 0, 2, 0).unwrap();
    let before = bracket.snapshot().unwrap();

    let changed = bracket.record_result(semi, 0, 2, 0).unwrap();
    assert!(changed.is_empty());
    assert_eq!(bracket.snapshot().unwrap(), before);
  }

  #[test]
  fn test_contradicting_result_is_a_conflict() {
    let bracket = single(4);
    let semi = bracket.ready_matches().unwrap()[0].id;
    bracket.record_result(semi, 0, 2, 0).unwrap();
    let before = bracket.snapshot().unwrap();

    let err = bracket.record_result(semi, 1, 0, 2).unwrap_err();
    assert!(matches!(err, BracketError::Conflict { .. }));
    assert_eq!(err.match_id(), Some(semi));

    let err = bracket.record_result(semi, 0, 2, 1).unwrap_err();
    assert!(matches!(err, BracketError::Conflict { .. }));
    assert_eq!(bracket.snapshot().unwrap(), before);
  }

  #[test]
  fn test_unresolved_match_rejects_results() {
    let bracket = single(4);
    let final_match = find(&bracket, BracketSection::Winners, 2, 1);
    let before = bracket.snapshot().unwrap();
    let err = bracket.record_result(final_match.id, 0, 1, 0).unwrap_err();
    assert!(matches!(err, BracketError::InvalidState { .. }));
    assert_eq!(err.match_id(), Some(final_match.id));
    assert_eq!(bracket.snapshot().unwrap(), before);
  }

  #[test]
  fn test_bad_arguments() {
    let bracket = single(4);
    let semi = bracket.ready_matches().unwrap()[0].id;
    let err = bracket.record_result(semi, 2, 1, 0).unwrap_err();
    assert!(matches!(err, BracketError::InvalidResult { .. }));
    assert_eq!(err.match_id(), Some(semi));
    assert_eq!(
      bracket.record_result(MatchId(999), 0, 1, 0).unwrap_err(),
      BracketError::NotFound(MatchId(999))
    );
  }

  #[test]
  fn test_bye_match_cannot_be_scored() {
    let bracket = single(3);
    let bye = find(&bracket, BracketSection::Winners, 1, 1);
    assert_eq!(bye.status, MatchStatus::Bye);
    assert!(matches!(
      bracket.record_result(bye.id, 0, 1, 0),
      Err(BracketError::InvalidState { .. })
    ));
  }

  #[test]
  fn test_start_and_score_live_match() {
    let bracket = single(2);
    let id = bracket.ready_matches().unwrap()[0].id;
    assert!(bracket.start_match(id).unwrap());
    assert!(!bracket.start_match(id).unwrap());
    assert!(bracket.update_score(id, 1, 0).unwrap());
    assert!(!bracket.update_score(id, 1, 0).unwrap());

    let live = bracket.get(id).unwrap();
    assert_eq!(live.status, MatchStatus::Live);
    assert!(live.started_at.is_some());
    assert_eq!(live.scores, [1, 0]);

    bracket.record_result(id, 0, 2, 0).unwrap();
    assert!(matches!(bracket.start_match(id), Err(BracketError::InvalidState { .. })));
    assert!(matches!(bracket.update_score(id, 3, 0), Err(BracketError::InvalidState { .. })));
    assert!(bracket.is_complete().unwrap());
    assert_eq!(bracket.champion().unwrap(), Some(ParticipantId::new("p1")));
  }

  #[test]
  fn test_scheduled_match_can_start_and_be_decided() {
    let bracket = single(4);
    let semis = bracket.ready_matches().unwrap();
    let at = Utc::now() + chrono::Duration::hours(2);

    assert!(bracket.schedule_match(semis[0].id, at).unwrap());
    assert!(!bracket.schedule_match(semis[0].id, at).unwrap());
    let scheduled = bracket.get(semis[0].id).unwrap();
    assert_eq!(scheduled.status, MatchStatus::Scheduled);
    assert_eq!(scheduled.scheduled_at, Some(at));
    assert!(scheduled.is_ready());
    assert_eq!(bracket.ready_matches().unwrap().len(), 2);

    let later = at + chrono::Duration::minutes(30);
    assert!(bracket.schedule_match(semis[0].id, later).unwrap());
    assert!(bracket.update_score(semis[0].id, 1, 1).unwrap());
    assert!(bracket.start_match(semis[0].id).unwrap());
    assert_eq!(bracket.get(semis[0].id).unwrap().status, MatchStatus::Live);

    bracket.schedule_match(semis[1].id, at).unwrap();
    bracket.record_result(semis[1].id, 0, 2, 0).unwrap();
    assert_eq!(bracket.get(semis[1].id).unwrap().status, MatchStatus::Completed);
  }

  #[test]
  fn test_only_ready_matches_can_be_scheduled() {
    let bracket = single(4);
    let final_match = find(&bracket, BracketSection::Winners, 2, 1);
    let err = bracket.schedule_match(final_match.id, Utc::now()).unwrap_err();
    assert!(matches!(err, BracketError::InvalidState { .. }));

    let semi = bracket.ready_matches().unwrap()[0].id;
    bracket.start_match(semi).unwrap();
    assert!(matches!(
      bracket.schedule_match(semi, Utc::now()),
      Err(BracketError::InvalidState { .. })
    ));
    assert_eq!(
      bracket.schedule_match(MatchId(999), Utc::now()).unwrap_err(),
      BracketError::NotFound(MatchId(999))
    );
  }

  #[test]
  fn test_winner_taken_from_scores() {
    let bracket = single(4);
    let semis = bracket.ready_matches().unwrap();
    bracket.record_scores(semis[0].id, 21, 15).unwrap();
    bracket.record_scores(semis[1].id, 18, 21).unwrap();

    assert_eq!(bracket.get(semis[0].id).unwrap().winner_slot, Some(0));
    assert_eq!(bracket.get(semis[1].id).unwrap().winner_slot, Some(1));
    let final_match = find(&bracket, BracketSection::Winners, 2, 1);
    assert_eq!(name(&final_match.slots[0]), Some("p1"));
    assert_eq!(name(&final_match.slots[1]), Some("p3"));
    assert!(bracket.record_scores(semis[0].id, 21, 15).unwrap().is_empty());
  }

  #[test]
  fn test_tied_scores_cannot_decide_a_match() {
    let bracket = single(4);
    let semi = bracket.ready_matches().unwrap()[0].id;
    bracket.update_score(semi, 2, 2).unwrap();
    let before = bracket.snapshot().unwrap();

    let err = bracket.record_scores(semi, 2, 2).unwrap_err();
    assert!(matches!(err, BracketError::InvalidResult { .. }));
    assert_eq!(err.match_id(), Some(semi));
    assert_eq!(bracket.snapshot().unwrap(), before);
    assert_eq!(
      bracket.record_scores(MatchId(999), 1, 1).unwrap_err(),
      BracketError::NotFound(MatchId(999))
    );
  }

  #[test]
  fn test_waiting_match_cannot_start() {
    let bracket = single(4);
    let final_match = find(&bracket, BracketSection::Winners, 2, 1);
    assert!(matches!(
      bracket.start_match(final_match.id),
      Err(BracketError::InvalidState { .. })
    ));
  }

  #[test]
  fn test_losers_bracket_byes_cascade() {
    // 5 entrants: opening byes for seeds 1, 2 and 3. Their "losers" are byes,
    // so the losers bracket starts with a bye-vs-bye and a bye-vs-TBD match.
    let bracket = double(5);
    let l1_top = find(&bracket, BracketSection::Losers, 1, 1);
    let l1_bottom = find(&bracket, BracketSection::Losers, 1, 2);
    assert_eq!(l1_top.slots[0], Slot::Bye);
    assert_eq!(l1_top.status, MatchStatus::Waiting);
    assert_eq!(l1_bottom.status, MatchStatus::Bye);
    assert_eq!(l1_bottom.winner_slot, None);

    // 4 vs 5 is the only playable opening match; 2 vs 3 is already set up
    // in winners round 2.
    let opening = find(&bracket, BracketSection::Winners, 1, 2);
    let second_semi = find(&bracket, BracketSection::Winners, 2, 2);
    let ready = bracket.ready_matches().unwrap().iter().map(|m| m.id).collect::<Vec<_>>();
    assert_eq!(ready, vec![opening.id, second_semi.id]);

    let changed = bracket.record_result(opening.id, 0, 2, 1).unwrap();
    let l1_top = find(&bracket, BracketSection::Losers, 1, 1);
    assert!(changed.contains(&l1_top.id));
    assert_eq!(l1_top.status, MatchStatus::Bye);
    assert_eq!(l1_top.winner().and_then(name), Some("p5"));
  }

  #[test]
  fn test_grand_final_reset_is_activated() {
    let bracket = double(2);
    let opening = find(&bracket, BracketSection::Winners, 1, 1);
    bracket.record_result(opening.id, 0, 2, 0).unwrap();

    let game_one = find(&bracket, BracketSection::GrandFinal, 1, 1);
    let reset = find(&bracket, BracketSection::GrandFinal, 2, 1);
    assert_eq!(game_one.status, MatchStatus::Pending);
    assert_eq!(reset.status, MatchStatus::Dormant);
    assert!(matches!(
      bracket.record_result(reset.id, 0, 1, 0),
      Err(BracketError::InvalidState { .. })
    ));

    let changed = bracket.record_result(game_one.id, 1, 1, 3).unwrap();
    assert_eq!(changed, vec![game_one.id, reset.id]);
    assert!(!bracket.is_complete().unwrap());

    let reset = bracket.get(reset.id).unwrap();
    assert_eq!(reset.status, MatchStatus::Pending);
    assert_eq!(name(&reset.slots[0]), Some("p2"));
    assert_eq!(name(&reset.slots[1]), Some("p1"));

    bracket.record_result(reset.id, 1, 0, 3).unwrap();
    assert!(bracket.is_complete().unwrap());
    assert_eq!(bracket.champion().unwrap(), Some(ParticipantId::new("p1")));
  }

  #[test]
  fn test_grand_final_without_reset_ends_tournament() {
    let bracket = double(2);
    let opening = find(&bracket, BracketSection::Winners, 1, 1);
    bracket.record_result(opening.id, 0, 2, 0).unwrap();
    let game_one = find(&bracket, BracketSection::GrandFinal, 1, 1);
    bracket.record_result(game_one.id, 0, 3, 0).unwrap();

    let reset = find(&bracket, BracketSection::GrandFinal, 2, 1);
    assert_eq!(reset.status, MatchStatus::Void);
    assert!(bracket.is_complete().unwrap());
    assert_eq!(bracket.champion().unwrap(), Some(ParticipantId::new("p1")));
    assert!(bracket.ready_matches().unwrap().is_empty());
  }

  #[test]
  fn test_reset_can_be_disabled() {
    let options = BuildOptions { grand_final_reset: false, ..BuildOptions::default() };
    let bracket = build_bracket(&entries(2), BracketFormat::DoubleElimination, &options).unwrap();
    assert_eq!(bracket.len(), 2);
    let opening = find(&bracket, BracketSection::Winners, 1, 1);
    bracket.record_result(opening.id, 0, 2, 0).unwrap();
    let game_one = find(&bracket, BracketSection::GrandFinal, 1, 1);
    bracket.record_result(game_one.id, 1, 0, 3).unwrap();
    assert!(bracket.is_complete().unwrap());
    assert_eq!(bracket.champion().unwrap(), Some(ParticipantId::new("p2")));
  }

  #[test]
  fn test_double_bye_in_opening_round_fails_loudly() {
    let participants = vec![Participant {
      id: ParticipantId::new("solo"),
      display_name: "solo".to_string(),
      seed: 1,
      placeholder: false,
    }];
    let mut size = bracket_size(2).unwrap();
    size.size = 4;
    let opening = |id: u64, slots: [Slot; 2], to: Advance| Match {
      id: MatchId(id),
      round: 1,
      match_number: id as u32,
      position: id as u32,
      section: BracketSection::Winners,
      slots,
      scores: [0, 0],
      status: MatchStatus::Waiting,
      winner_slot: None,
      advance_winner_to: Some(to),
      advance_loser_to: None,
      scheduled_at: None,
      started_at: None,
      completed_at: None,
    };
    let final_match = Match {
      round: 2,
      advance_winner_to: None,
      slots: [Slot::Tbd, Slot::Tbd],
      ..opening(3, [Slot::Tbd, Slot::Tbd], Advance { match_id: MatchId(3), slot: 0 })
    };
    let matches = vec![
      opening(
        1,
        [Slot::participant(&participants[0]), Slot::Bye],
        Advance { match_id: MatchId(3), slot: 0 },
      ),
      opening(2, [Slot::Bye, Slot::Bye], Advance { match_id: MatchId(3), slot: 1 }),
      final_match,
    ];
    let bracket = Bracket::from_parts(BracketFormat::SingleElimination, size, participants, matches).unwrap();
    bracket.settle_opening(MatchId(1)).unwrap();
    let err = bracket.settle_opening(MatchId(2)).unwrap_err();
    assert!(matches!(err, BracketError::InvariantViolation { .. }));
    assert_eq!(err.match_id(), Some(MatchId(2)));
    assert_eq!(bracket.get(MatchId(2)).unwrap().status, MatchStatus::Waiting);
  }
}
