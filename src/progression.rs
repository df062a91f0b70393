//! Progression engine: folds one resolved round into the player's progress.
//!
//! Level and rank are never stored. Both are derived from experience on
//! demand (`level_for`, `RankTable::rank_for`), so they cannot drift from it.

use std::collections::HashSet;

use serde::Serialize;

use crate::catalog::RankTable;
use crate::config::ScoringRules;
use crate::domain::Rank;
use crate::resolver::RoundOutcome;

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct Accuracy {
  pub correct: u64,
  pub total: u64,
}

impl Accuracy {
  /// Share of correct rounds as a whole percentage, 0 before the first round.
  pub fn percentage(&self) -> u64 {
    if self.total == 0 {
      return 0;
    }
    (self.correct * 100 + self.total / 2) / self.total
  }
}

/// `floor(sqrt(xp / 100)) + 1`.
pub fn level_for(experience: u64) -> u32 {
  ((experience / 100) as f64).sqrt().floor() as u32 + 1
}

/// Experience at which `level` begins.
pub fn level_floor(level: u32) -> u64 {
  let l = u64::from(level.saturating_sub(1));
  l.saturating_mul(l).saturating_mul(100)
}

/// Accumulated progress for one session. Only `apply` changes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProgress {
  experience: u64,
  streak: u32,
  streak_freezes: u32,
  accuracy: Accuracy,
  solved_cases: HashSet<String>,
}

/// What a single round did to the progress, for presentation.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct RoundReceipt {
  pub points: u64,
  pub freeze_used: bool,
}

impl UserProgress {
  pub fn new(initial_streak_freezes: u32) -> Self {
    Self {
      experience: 0,
      streak: 0,
      streak_freezes: initial_streak_freezes,
      accuracy: Accuracy::default(),
      solved_cases: HashSet::new(),
    }
  }

  pub fn experience(&self) -> u64 { self.experience }
  pub fn level(&self) -> u32 { level_for(self.experience) }
  pub fn streak(&self) -> u32 { self.streak }
  pub fn streak_freezes(&self) -> u32 { self.streak_freezes }
  pub fn accuracy(&self) -> Accuracy { self.accuracy }
  pub fn solved_cases(&self) -> &HashSet<String> { &self.solved_cases }

  pub fn rank<'a>(&self, ranks: &'a RankTable) -> &'a Rank {
    ranks.rank_for(self.experience)
  }

  /// Replace this snapshot with the one `advance` derives from `outcome`.
  pub fn apply(&mut self, outcome: &RoundOutcome, rules: &ScoringRules) -> RoundReceipt {
    let (next, receipt) = advance(self, outcome, rules);
    *self = next;
    receipt
  }
}

/// Pure progression step: same previous snapshot and outcome, same result.
pub fn advance(prev: &UserProgress, outcome: &RoundOutcome, rules: &ScoringRules) -> (UserProgress, RoundReceipt) {
  let mut solved_cases = prev.solved_cases.clone();
  if outcome.correct {
    solved_cases.insert(outcome.case_id.clone());
  }

  // Streak first: the already-incremented streak feeds the points below.
  let mut streak = prev.streak;
  let mut streak_freezes = prev.streak_freezes;
  let mut freeze_used = false;
  if outcome.correct {
    streak += 1;
  } else if prev.streak > 0 && prev.streak_freezes > 0 {
    streak_freezes -= 1;
    freeze_used = true;
  } else {
    streak = 0;
  }

  let points = if outcome.correct {
    // Saturating: configured rules may be arbitrarily large.
    rules
      .base_points
      .saturating_add(u64::from(streak).saturating_mul(rules.streak_points))
      .saturating_add(outcome.bonus_points())
  } else {
    0
  };

  let accuracy = Accuracy {
    correct: prev.accuracy.correct + u64::from(outcome.correct),
    total: prev.accuracy.total + 1,
  };

  let next = UserProgress {
    experience: prev.experience.saturating_add(points),
    streak,
    streak_freezes,
    accuracy,
    solved_cases,
  };
  (next, RoundReceipt { points, freeze_used })
}

/// Where the player sits inside their current level.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct LevelProgress {
  pub level: u32,
  pub current_level_xp: u64,
  pub next_level_xp: u64,
  pub progress: u64,
  pub needed: u64,
}

pub fn level_progress(experience: u64) -> LevelProgress {
  let level = level_for(experience);
  let current_level_xp = level_floor(level);
  let next_level_xp = level_floor(level + 1);
  LevelProgress {
    level,
    current_level_xp,
    next_level_xp,
    progress: experience.saturating_sub(current_level_xp),
    needed: next_level_xp.saturating_sub(current_level_xp),
  }
}

/// Current rank, the next one (if any) and percent of the way there.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RankProgress {
  pub rank: Rank,
  pub next_rank: Option<Rank>,
  pub percent: f64,
}

pub fn rank_progress(experience: u64, ranks: &RankTable) -> RankProgress {
  let rank = ranks.rank_for(experience);
  let next_rank = ranks.next_after(rank);
  let percent = match next_rank {
    Some(next) => {
      let span = (next.min_xp - rank.min_xp) as f64;
      (experience.saturating_sub(rank.min_xp) as f64 / span * 100.0).max(0.0)
    }
    None => 100.0,
  };
  RankProgress { rank: rank.clone(), next_rank: next_rank.cloned(), percent }
}

#[cfg(test)]
impl UserProgress {
  pub(crate) fn restored(experience: u64, streak: u32, streak_freezes: u32) -> Self {
    Self { experience, streak, streak_freezes, ..Self::new(0) }
  }
}
