//! Item selection: filter the catalog by genre and difficulty, then pick the
//! round's case by index, cycling through the filtered list indefinitely.

use crate::domain::{CaseFile, Difficulty, Genre};
use crate::error::{QuizError, Result};

/// Cases matching both filters exactly, in catalog order.
pub fn filter_cases(cases: &[CaseFile], genre: Genre, difficulty: Difficulty) -> Vec<&CaseFile> {
  cases
    .iter()
    .filter(|c| c.genre == genre && c.difficulty == difficulty)
    .collect()
}

/// `filtered[round_index mod len]`, or `NoCasesAvailable` when nothing matched.
pub fn select_case<'a>(
  cases: &'a [CaseFile],
  genre: Genre,
  difficulty: Difficulty,
  round_index: usize,
) -> Result<&'a CaseFile> {
  let filtered = filter_cases(cases, genre, difficulty);
  if filtered.is_empty() {
    return Err(QuizError::NoCasesAvailable { genre, difficulty });
  }
  Ok(filtered[round_index % filtered.len()])
}
