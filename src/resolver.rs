//! Round resolution: correctness of a guess plus the speed bonus rule.

use serde::Serialize;

use crate::config::ScoringRules;
use crate::domain::CaseFile;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
  Speed,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Bonus {
  pub kind: BonusKind,
  pub amount: u64,
}

/// Result of one resolved round, consumed by the progression engine.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RoundOutcome {
  pub case_id: String,
  pub selected_option: String,
  pub correct: bool,
  pub elapsed_seconds: f64,
  pub bonus: Option<Bonus>,
}

impl RoundOutcome {
  pub fn bonus_points(&self) -> u64 {
    self.bonus.map(|b| b.amount).unwrap_or(0)
  }
}

/// Speed bonus is granted only for a correct answer strictly under the threshold.
pub fn speed_bonus(correct: bool, elapsed_seconds: f64, rules: &ScoringRules) -> Option<Bonus> {
  if correct && elapsed_seconds < rules.speed_bonus_threshold_seconds {
    Some(Bonus { kind: BonusKind::Speed, amount: rules.speed_bonus_points })
  } else {
    None
  }
}

/// Exact string match against the case's correct answer. Membership of
/// `selected_option` in the case's options is checked by the caller.
pub fn resolve_round(case: &CaseFile, selected_option: &str, elapsed_seconds: f64, rules: &ScoringRules) -> RoundOutcome {
  let correct = selected_option == case.correct_answer;
  RoundOutcome {
    case_id: case.id.clone(),
    selected_option: selected_option.to_string(),
    correct,
    elapsed_seconds,
    bonus: speed_bonus(correct, elapsed_seconds, rules),
  }
}
