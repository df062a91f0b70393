//! Immutable catalog: the case files and the rank ladder, validated once at
//! startup and shared read-only for the lifetime of the process.

use std::collections::HashSet;

use crate::domain::{CaseFile, Difficulty, Genre, Rank};
use crate::error::{QuizError, Result};

/// Check a single case file in isolation.
pub fn validate_case(case: &CaseFile) -> Result<()> {
  if case.id.trim().is_empty() {
    return Err(QuizError::InvalidCatalog(format!("case '{}' has an empty id", case.title)));
  }
  if case.options.is_empty() {
    return Err(QuizError::InvalidCatalog(format!("case {} has no options", case.id)));
  }
  if !case.offers(&case.correct_answer) {
    return Err(QuizError::InvalidCatalog(format!(
      "case {}: correct answer '{}' is not one of its options",
      case.id, case.correct_answer
    )));
  }
  Ok(())
}

/// Rank ladder ordered by strictly increasing threshold, with a zero-threshold
/// base rank so every experience value maps to exactly one rank.
#[derive(Clone, Debug)]
pub struct RankTable {
  ranks: Vec<Rank>,
}

impl RankTable {
  pub fn new(ranks: Vec<Rank>) -> Result<Self> {
    let first = ranks
      .first()
      .ok_or_else(|| QuizError::InvalidCatalog("rank table is empty".into()))?;
    if first.min_xp != 0 {
      return Err(QuizError::InvalidCatalog(format!(
        "base rank '{}' must start at 0 xp, found {}",
        first.name, first.min_xp
      )));
    }
    for pair in ranks.windows(2) {
      if pair[1].min_xp <= pair[0].min_xp {
        return Err(QuizError::InvalidCatalog(format!(
          "rank '{}' ({}) does not exceed '{}' ({})",
          pair[1].name, pair[1].min_xp, pair[0].name, pair[0].min_xp
        )));
      }
    }
    let mut names = HashSet::new();
    for r in &ranks {
      if !names.insert(r.name.as_str()) {
        return Err(QuizError::InvalidCatalog(format!("duplicate rank name '{}'", r.name)));
      }
    }
    Ok(Self { ranks })
  }

  /// Highest rank whose threshold is at or below `xp`.
  pub fn rank_for(&self, xp: u64) -> &Rank {
    self.ranks
      .iter()
      .rev()
      .find(|r| r.min_xp <= xp)
      .unwrap_or(&self.ranks[0])
  }

  /// The rank directly above `rank`, if any.
  pub fn next_after(&self, rank: &Rank) -> Option<&Rank> {
    let idx = self.ranks.iter().position(|r| r.name == rank.name)?;
    self.ranks.get(idx + 1)
  }

  pub fn base(&self) -> &Rank { &self.ranks[0] }

  pub fn as_slice(&self) -> &[Rank] { &self.ranks }
}

#[derive(Clone, Debug)]
pub struct Catalog {
  cases: Vec<CaseFile>,
  ranks: RankTable,
}

impl Catalog {
  /// Build a catalog; every case must be valid and ids must be unique.
  pub fn new(cases: Vec<CaseFile>, ranks: RankTable) -> Result<Self> {
    let mut ids = HashSet::new();
    for c in &cases {
      validate_case(c)?;
      if !ids.insert(c.id.as_str()) {
        return Err(QuizError::InvalidCatalog(format!("duplicate case id '{}'", c.id)));
      }
    }
    Ok(Self { cases, ranks })
  }

  pub fn cases(&self) -> &[CaseFile] { &self.cases }

  pub fn ranks(&self) -> &RankTable { &self.ranks }

  pub fn get(&self, id: &str) -> Option<&CaseFile> {
    self.cases.iter().find(|c| c.id == id)
  }

  pub fn count(&self, genre: Genre, difficulty: Difficulty) -> usize {
    self.cases
      .iter()
      .filter(|c| c.genre == genre && c.difficulty == difficulty)
      .count()
  }
}
