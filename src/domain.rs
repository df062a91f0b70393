//! Domain models: genres, difficulty tiers, case files and ranks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Musical genre a case file belongs to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Genre {
  #[serde(rename = "Hip-Hop")]
  HipHop,
  Electronic,
  Rock,
  Pop,
}

impl Genre {
  pub const ALL: [Genre; 4] = [Genre::HipHop, Genre::Electronic, Genre::Rock, Genre::Pop];

  pub fn label(self) -> &'static str {
    match self {
      Genre::HipHop => "Hip-Hop",
      Genre::Electronic => "Electronic",
      Genre::Rock => "Rock",
      Genre::Pop => "Pop",
    }
  }
}

impl fmt::Display for Genre {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// Difficulty category of a case file.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
  Beginner,
  Intermediate,
  Expert,
}

impl Difficulty {
  pub const ALL: [Difficulty; 3] = [Difficulty::Beginner, Difficulty::Intermediate, Difficulty::Expert];

  pub fn label(self) -> &'static str {
    match self {
      Difficulty::Beginner => "Beginner",
      Difficulty::Intermediate => "Intermediate",
      Difficulty::Expert => "Expert",
    }
  }

  /// One-line blurb shown next to the tier on the selection screen.
  pub fn description(self) -> &'static str {
    match self {
      Difficulty::Beginner => "Learn the fundamentals.",
      Difficulty::Intermediate => "Hone your core skills.",
      Difficulty::Expert => "True challenge.",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// One quiz item: a flawed/corrected audio pair plus the diagnosis options.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CaseFile {
  pub id: String,
  pub title: String,
  pub genre: Genre,
  pub difficulty: Difficulty,
  pub flawed_audio_url: String,
  pub corrected_audio_url: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  pub explanation: String,
}

impl CaseFile {
  pub fn offers(&self, option: &str) -> bool {
    self.options.iter().any(|o| o == option)
  }
}

/// Named tier unlocked at an experience threshold.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rank {
  pub name: String,
  pub min_xp: u64,
  /// Icon reference resolved by the presentation client (e.g. "ear", "trophy").
  pub icon: String,
}
