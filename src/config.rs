//! Loading service configuration (scoring rules, optional case bank and rank
//! ladder, session store limits) from TOML.
//!
//! See `EchoConfig` and `ScoringRules` for the expected schema.

use std::{path::Path, time::Duration};

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{CaseFile, Rank};
use crate::error::{QuizError, Result};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct EchoConfig {
  #[serde(default)]
  pub scoring: ScoringRules,
  #[serde(default)]
  pub cases: Vec<CaseFile>,
  /// Full replacement for the built-in rank ladder when present.
  #[serde(default)]
  pub ranks: Option<Vec<Rank>>,
  #[serde(default)]
  pub sessions: SessionLimits,
}

/// Bounds on the in-memory HTTP session store. Zero disables a limit.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionLimits {
  /// Sessions untouched for this many seconds are evicted.
  pub idle_ttl_seconds: u64,
  /// When full, opening a session evicts the least recently used one.
  pub max_sessions: usize,
}

impl Default for SessionLimits {
  fn default() -> Self {
    Self { idle_ttl_seconds: 3600, max_sessions: 10_000 }
  }
}

impl SessionLimits {
  pub fn idle_ttl(&self) -> Option<Duration> {
    (self.idle_ttl_seconds > 0).then(|| Duration::from_secs(self.idle_ttl_seconds))
  }

  /// How often the background sweep looks for idle sessions.
  pub fn sweep_interval(&self) -> Duration {
    Duration::from_secs(self.idle_ttl_seconds.clamp(1, 60))
  }
}

/// Scoring constants used by the round resolver and the progression engine.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringRules {
  pub base_points: u64,
  pub streak_points: u64,
  /// A correct answer strictly faster than this earns the speed bonus.
  pub speed_bonus_threshold_seconds: f64,
  pub speed_bonus_points: u64,
  pub initial_streak_freezes: u32,
}

impl Default for ScoringRules {
  fn default() -> Self {
    Self {
      base_points: 100,
      streak_points: 10,
      speed_bonus_threshold_seconds: 5.0,
      speed_bonus_points: 50,
      initial_streak_freezes: 1,
    }
  }
}

pub fn parse_config(s: &str) -> Result<EchoConfig> {
  toml::from_str::<EchoConfig>(s).map_err(|e| QuizError::Config(format!("invalid TOML: {}", e)))
}

pub fn load_config_from_path(path: &Path) -> Result<EchoConfig> {
  let s = std::fs::read_to_string(path)
    .map_err(|e| QuizError::Config(format!("cannot read {}: {}", path.display(), e)))?;
  parse_config(&s)
}

/// Attempt to load `EchoConfig` from ECHO_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<EchoConfig> {
  let path = std::env::var("ECHO_CONFIG_PATH").ok()?;
  match load_config_from_path(Path::new(&path)) {
    Ok(cfg) => {
      info!(target: "echo_backend", %path, cases = cfg.cases.len(), custom_ranks = cfg.ranks.is_some(), "Loaded config (TOML)");
      Some(cfg)
    }
    Err(e) => {
      error!(target: "echo_backend", %path, error = %e, "Failed to load TOML config; using defaults");
      None
    }
  }
}
