use crate::bracket::Bracket;
use crate::entrants::normalize_entrants;
use crate::error::BracketError;
use crate::seeding::{bracket_size, opening_slots};
use crate::types::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
  /// Pre-create the second grand-final game played when the losers-bracket
  /// champion wins the first.
  pub grand_final_reset: bool,
  /// Drop winners-bracket losers into every second drop-down round in
  /// reversed order, so early opponents do not meet again straight away.
  pub avoid_rematches: bool,
}

impl Default for BuildOptions {
  fn default() -> Self {
    BuildOptions {
      grand_final_reset: true,
      avoid_rematches: true,
    }
  }
}

/// Builds the complete match graph for `entries` and resolves opening byes.
pub fn build_bracket(
  entries: &[ParticipantEntry],
  format: BracketFormat,
  options: &BuildOptions,
) -> Result<Bracket, BracketError> {
  assemble(normalize_entrants(entries)?, format, options)
}

/// Builds a bracket of `size` placeholder participants ("Slot 1", "Slot 2",
/// ...) to be named later with `Bracket::rename_participant`. The size is
/// rounded up to a power of two, so a blank bracket never has byes.
pub fn blank_bracket(size: usize, format: BracketFormat) -> Result<Bracket, BracketError> {
  let slots = bracket_size(size)?.size;
  let entries = (1..=slots)
    .map(|seed| ParticipantEntry {
      id: ParticipantId(format!("slot-{seed}")),
      display_name: format!("Slot {seed}"),
      seed: Some(seed as u32),
    })
    .collect::<Vec<_>>();
  let mut participants = normalize_entrants(&entries)?;
  for participant in &mut participants {
    participant.placeholder = true;
  }
  assemble(participants, format, &BuildOptions::default())
}

fn assemble(
  participants: Vec<Participant>,
  format: BracketFormat,
  options: &BuildOptions,
) -> Result<Bracket, BracketError> {
  let size = bracket_size(participants.len())?;
  let slots = opening_slots(&participants, size.size)?;

  let mut plan = Plan::default();
  let winners = plan.winners_bracket(&slots, size.rounds)?;
  if format == BracketFormat::DoubleElimination {
    plan.losers_bracket_and_final(&winners, options)?;
  }

  let opening = winners[0].iter().map(|&idx| plan.matches[idx].id).collect::<Vec<_>>();
  let bracket = Bracket::from_parts(format, size, participants, plan.matches)?;
  for match_id in opening {
    bracket.settle_opening(match_id)?;
  }

  info!(
    "built {:?} bracket: {} participants, {} slots, {} byes, {} matches",
    format,
    bracket.participants().len(),
    size.size,
    size.byes,
    bracket.len()
  );
  Ok(bracket)
}

pub fn single_elimination(entries: &[ParticipantEntry]) -> Result<Bracket, BracketError> {
  build_bracket(entries, BracketFormat::SingleElimination, &BuildOptions::default())
}

pub fn double_elimination(entries: &[ParticipantEntry]) -> Result<Bracket, BracketError> {
  build_bracket(entries, BracketFormat::DoubleElimination, &BuildOptions::default())
}

#[derive(Default)]
struct Plan {
  matches: Vec<Match>,
}

impl Plan {
  fn push(&mut self, section: BracketSection, round: u32, position: usize, slots: [Slot; 2]) -> usize {
    let idx = self.matches.len();
    let number = idx as u32 + 1;
    self.matches.push(Match {
      id: MatchId(number as u64),
      round,
      match_number: number,
      position: position as u32 + 1,
      section,
      slots,
      scores: [0, 0],
      status: MatchStatus::Waiting,
      winner_slot: None,
      advance_winner_to: None,
      advance_loser_to: None,
      scheduled_at: None,
      started_at: None,
      completed_at: None,
    });
    idx
  }

  fn empty(&mut self, section: BracketSection, round: u32, position: usize) -> usize {
    self.push(section, round, position, [Slot::Tbd, Slot::Tbd])
  }

  fn advance_to(&self, to: usize, slot: usize) -> Option<Advance> {
    Some(Advance { match_id: self.matches[to].id, slot })
  }

  fn link_winner(&mut self, from: usize, to: usize, slot: usize) {
    self.matches[from].advance_winner_to = self.advance_to(to, slot);
  }

  fn link_loser(&mut self, from: usize, to: usize, slot: usize) {
    self.matches[from].advance_loser_to = self.advance_to(to, slot);
  }

  /// Winners bracket; returns store indices grouped by round.
  fn winners_bracket(&mut self, slots: &[Slot], rounds: u32) -> Result<Vec<Vec<usize>>, BracketError> {
    let mut winners: Vec<Vec<usize>> = Vec::with_capacity(rounds as usize);

    let mut opening = Vec::with_capacity(slots.len() / 2);
    for (position, pair) in slots.chunks(2).enumerate() {
      let [first, second] = pair else {
        return Err(BracketError::InvalidArgument("opening slots must come in pairs".to_string()));
      };
      opening.push(self.push(
        BracketSection::Winners,
        1,
        position,
        [first.clone(), second.clone()],
      ));
    }
    winners.push(opening);

    for round in 2..=rounds {
      let prev = winners[winners.len() - 1].clone();
      let mut ids = Vec::with_capacity(prev.len() / 2);
      for (position, feeders) in prev.chunks(2).enumerate() {
        let idx = self.empty(BracketSection::Winners, round, position);
        self.link_winner(feeders[0], idx, 0);
        self.link_winner(feeders[1], idx, 1);
        ids.push(idx);
      }
      winners.push(ids);
    }
    Ok(winners)
  }

  /// Losers bracket, grand final and (optionally) the reset game.
  fn losers_bracket_and_final(
    &mut self,
    winners: &[Vec<usize>],
    options: &BuildOptions,
  ) -> Result<(), BracketError> {
    let winners_final = winners
      .last()
      .and_then(|round| round.first())
      .copied()
      .ok_or_else(|| BracketError::InvalidArgument("winners bracket is empty".to_string()))?;

    let mut losers_final = None;
    if winners.len() > 1 {
      let mut round = 1u32;
      let mut prev = Vec::new();
      for (position, feeders) in winners[0].chunks(2).enumerate() {
        let idx = self.empty(BracketSection::Losers, round, position);
        self.link_loser(feeders[0], idx, 0);
        self.link_loser(feeders[1], idx, 1);
        prev.push(idx);
      }

      for (offset, dropping) in winners[1..].iter().enumerate() {
        let winners_round = offset + 2;
        if dropping.len() != prev.len() {
          return Err(BracketError::invariant(
            self.matches[dropping[0]].id,
            format!(
              "winners round {winners_round} drops {} players into {} losers matches",
              dropping.len(),
              prev.len()
            ),
          ));
        }
        let reverse = options.avoid_rematches && winners_round % 2 == 0;

        round += 1;
        let mut drop_down = Vec::with_capacity(prev.len());
        for (position, &survivor) in prev.iter().enumerate() {
          let dropped = if reverse {
            dropping[dropping.len() - 1 - position]
          } else {
            dropping[position]
          };
          let idx = self.empty(BracketSection::Losers, round, position);
          self.link_winner(survivor, idx, 0);
          self.link_loser(dropped, idx, 1);
          drop_down.push(idx);
        }
        prev = drop_down;

        if prev.len() > 1 {
          round += 1;
          let mut consolidation = Vec::with_capacity(prev.len() / 2);
          for (position, feeders) in prev.chunks(2).enumerate() {
            let idx = self.empty(BracketSection::Losers, round, position);
            self.link_winner(feeders[0], idx, 0);
            self.link_winner(feeders[1], idx, 1);
            consolidation.push(idx);
          }
          prev = consolidation;
        }
      }
      losers_final = prev.first().copied();
    }

    let grand_final = self.empty(BracketSection::GrandFinal, GRAND_FINAL_ROUND, 0);
    self.link_winner(winners_final, grand_final, 0);
    match losers_final {
      Some(losers_final) => self.link_winner(losers_final, grand_final, 1),
      // Two-player bracket: the opening loser goes straight to the grand final.
      None => self.link_loser(winners_final, grand_final, 1),
    }

    if options.grand_final_reset {
      let reset = self.empty(BracketSection::GrandFinal, RESET_ROUND, 0);
      self.matches[reset].status = MatchStatus::Dormant;
    }
    Ok(())
  }
}
