//! Application state: the immutable catalog, scoring rules, and the in-memory
//! session store used by the HTTP API.
//!
//! This module owns:
//!   - the catalog (config bank + built-in seeds, validated once)
//!   - the scoring rules (from TOML or defaults)
//!   - sessions by id (memory only; discarded on delete, idle expiry, eviction
//!     when the store is full, or shutdown)
//!
//! WebSocket connections own their session directly and never touch the store.

use std::{collections::HashMap, sync::Arc};
use tokio::{sync::RwLock, task::JoinHandle, time::Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::{validate_case, Catalog, RankTable};
use crate::config::{load_config_from_env, EchoConfig, ScoringRules, SessionLimits};
use crate::domain::CaseFile;
use crate::error::{QuizError, Result};
use crate::seeds::{seed_case_files, seed_ranks};
use crate::session::{Intent, Session};

/// A stored session and when a request last touched it.
#[derive(Clone, Debug)]
pub struct SessionEntry {
    pub session: Session,
    pub last_seen: Instant,
}

impl SessionEntry {
    fn new(session: Session) -> Self {
        Self { session, last_seen: Instant::now() }
    }

    fn is_idle(&self, limits: &SessionLimits, now: Instant) -> bool {
        limits
            .idle_ttl()
            .is_some_and(|ttl| now.saturating_duration_since(self.last_seen) >= ttl)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub rules: ScoringRules,
    pub limits: SessionLimits,
    pub sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl AppState {
    /// Build state from env: load config, merge the case bank with seeds, build the catalog.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Result<Self> {
        Self::from_config(load_config_from_env().unwrap_or_default())
    }

    pub fn from_config(cfg: EchoConfig) -> Result<Self> {
        let mut cases: Vec<CaseFile> = Vec::new();

        // Config-bank cases first; invalid or duplicate entries are skipped.
        for c in cfg.cases {
            if let Err(e) = validate_case(&c) {
                error!(target: "catalog", id = %c.id, error = %e, "Skipping bank case");
                continue;
            }
            if cases.iter().any(|existing| existing.id == c.id) {
                error!(target: "catalog", id = %c.id, "Skipping bank case: duplicate id");
                continue;
            }
            cases.push(c);
        }

        // Built-in seeds never overwrite a bank id.
        for c in seed_case_files() {
            if cases.iter().any(|existing| existing.id == c.id) {
                warn!(target: "catalog", id = %c.id, "Bank case shadows built-in seed");
                continue;
            }
            cases.push(c);
        }

        let ranks = match cfg.ranks.map(RankTable::new) {
            Some(Ok(table)) => table,
            Some(Err(e)) => {
                error!(target: "catalog", error = %e, "Rejecting configured rank table; using built-in ranks");
                RankTable::new(seed_ranks())?
            }
            None => RankTable::new(seed_ranks())?,
        };

        let catalog = Catalog::new(cases, ranks)?;
        log_inventory(&catalog);
        Ok(Self::with_catalog(catalog, cfg.scoring, cfg.sessions))
    }

    pub fn with_catalog(catalog: Catalog, rules: ScoringRules, limits: SessionLimits) -> Self {
        Self {
            catalog: Arc::new(catalog),
            rules,
            limits,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn new_session(&self) -> Session {
        Session::new(&self.rules)
    }

    /// Create and store a session; returns a snapshot of it. Idle sessions are
    /// dropped first, then the least recently used one if the store is full.
    #[instrument(level = "info", skip(self))]
    pub async fn open_session(&self) -> Session {
        let s = self.new_session();
        let mut sessions = self.sessions.write().await;
        evict_idle_locked(&mut sessions, &self.limits, Instant::now());

        let cap = self.limits.max_sessions;
        if cap > 0 && sessions.len() >= cap {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                sessions.remove(&id);
                warn!(target: "session", %id, max_sessions = cap, "Session store full; evicted least recently used session");
            }
        }

        sessions.insert(s.id().to_string(), SessionEntry::new(s.clone()));
        info!(target: "session", id = %s.id(), stored = sessions.len(), "Session opened");
        s
    }

    /// Snapshot of a stored session; reading it counts as activity.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_session(&self, id: &str) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let entry = live_entry(&mut sessions, id, &self.limits)?;
        entry.last_seen = Instant::now();
        Ok(entry.session.clone())
    }

    /// Dispatch one intent against a stored session under the write lock, so a
    /// round's progression update is applied as a single step.
    #[instrument(level = "info", skip(self, intent), fields(%id))]
    pub async fn dispatch(&self, id: &str, intent: Intent) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let entry = live_entry(&mut sessions, id, &self.limits)?;
        entry.last_seen = Instant::now();
        entry.session.dispatch(intent, &self.catalog, &self.rules)?;
        Ok(entry.session.clone())
    }

    #[instrument(level = "info", skip(self), fields(%id))]
    pub async fn close_session(&self, id: &str) -> Result<()> {
        match self.sessions.write().await.remove(id) {
            Some(_) => {
                info!(target: "session", %id, "Session closed");
                Ok(())
            }
            None => Err(QuizError::UnknownSession(id.to_string())),
        }
    }

    /// Drop every session idle past the configured TTL; returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        evict_idle_locked(&mut sessions, &self.limits, Instant::now())
    }

    /// Background task sweeping idle sessions; `None` when expiry is disabled.
    pub fn spawn_idle_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let ttl = self.limits.idle_ttl()?;
        let state = Arc::clone(self);
        info!(target: "session", ttl_secs = ttl.as_secs(), max_sessions = self.limits.max_sessions, "Idle session sweeper started");
        Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(state.limits.sweep_interval());
            loop {
                tick.tick().await;
                let evicted = state.evict_idle().await;
                if evicted > 0 {
                    debug!(target: "session", evicted, "Idle sweep");
                }
            }
        }))
    }
}

/// The entry for `id`, unless it is missing or has expired (an expired entry
/// is removed on the way out).
fn live_entry<'a>(
    sessions: &'a mut HashMap<String, SessionEntry>,
    id: &str,
    limits: &SessionLimits,
) -> Result<&'a mut SessionEntry> {
    let expired = sessions
        .get(id)
        .is_some_and(|entry| entry.is_idle(limits, Instant::now()));
    if expired {
        sessions.remove(id);
        info!(target: "session", %id, "Session expired after idling");
    }
    sessions
        .get_mut(id)
        .ok_or_else(|| QuizError::UnknownSession(id.to_string()))
}

fn evict_idle_locked(
    sessions: &mut HashMap<String, SessionEntry>,
    limits: &SessionLimits,
    now: Instant,
) -> usize {
    let before = sessions.len();
    sessions.retain(|id, entry| {
        let idle = entry.is_idle(limits, now);
        if idle {
            info!(target: "session", %id, "Session expired after idling");
        }
        !idle
    });
    before - sessions.len()
}

fn log_inventory(catalog: &Catalog) {
    let mut by_pair: HashMap<String, usize> = HashMap::new();
    for c in catalog.cases() {
        *by_pair.entry(format!("{}/{}", c.genre, c.difficulty)).or_default() += 1;
    }
    for (pair, count) in by_pair {
        info!(target: "catalog", %pair, cases = count, "Startup case inventory");
    }
    info!(target: "catalog", ranks = catalog.ranks().as_slice().len(), base = %catalog.ranks().base().name, "Rank ladder loaded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::domain::{Difficulty, Genre};
    use std::time::Duration;

    #[test]
    fn bank_cases_come_first_and_bad_ones_are_skipped() {
        let doc = r#"
[[cases]]
id = "bank-001"
title = "Clipped Bass"
genre = "Pop"
difficulty = "Expert"
flawed_audio_url = "f"
corrected_audio_url = "c"
options = ["Clipping", "Too Quiet"]
correct_answer = "Clipping"
explanation = "e"

[[cases]]
id = "bank-002"
title = "Broken"
genre = "Pop"
difficulty = "Expert"
flawed_audio_url = "f"
corrected_audio_url = "c"
options = ["A", "B"]
correct_answer = "C"
explanation = "e"
"#;
        let state = AppState::from_config(parse_config(doc).unwrap()).unwrap();
        assert_eq!(state.catalog.cases()[0].id, "bank-001");
        assert!(state.catalog.get("bank-002").is_none());
        assert_eq!(state.catalog.count(Genre::Pop, Difficulty::Expert), 1);
        assert_eq!(state.catalog.cases().len(), 12);
    }

    #[test]
    fn invalid_rank_table_falls_back_to_builtin() {
        let doc = r#"
[[ranks]]
name = "Late Starter"
min_xp = 100
icon = "ear"
"#;
        let state = AppState::from_config(parse_config(doc).unwrap()).unwrap();
        assert_eq!(state.catalog.ranks().base().name, "Sonic Scout");
    }

    fn limited(idle_ttl_seconds: u64, max_sessions: usize) -> AppState {
        let cfg = EchoConfig {
            sessions: SessionLimits { idle_ttl_seconds, max_sessions },
            ..EchoConfig::default()
        };
        AppState::from_config(cfg).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_expire() {
        let state = limited(60, 0);
        let idle = state.open_session().await.id().to_string();
        let busy = state.open_session().await.id().to_string();

        tokio::time::advance(Duration::from_secs(45)).await;
        state.get_session(&busy).await.unwrap();
        tokio::time::advance(Duration::from_secs(20)).await;

        assert!(matches!(state.get_session(&idle).await, Err(QuizError::UnknownSession(_))));
        assert!(state.get_session(&busy).await.is_ok());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(state.evict_idle().await, 1);
        assert!(state.sessions.read().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn full_store_evicts_least_recently_used() {
        let state = limited(0, 2);
        let first = state.open_session().await.id().to_string();
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = state.open_session().await.id().to_string();
        tokio::time::advance(Duration::from_secs(1)).await;
        state.dispatch(&first, Intent::Next).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;

        let third = state.open_session().await.id().to_string();
        let sessions = state.sessions.read().await;
        assert_eq!(sessions.len(), 2);
        assert!(sessions.contains_key(&first));
        assert!(!sessions.contains_key(&second));
        assert!(sessions.contains_key(&third));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_clears_abandoned_sessions() {
        let state = Arc::new(limited(30, 0));
        state.open_session().await;
        let sweeper = state.spawn_idle_sweeper().expect("ttl is set");

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert!(state.sessions.read().await.is_empty());
        sweeper.abort();

        assert!(Arc::new(limited(0, 0)).spawn_idle_sweeper().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_ttl_keeps_sessions_forever() {
        let state = limited(0, 0);
        let id = state.open_session().await.id().to_string();
        tokio::time::advance(Duration::from_secs(1_000_000)).await;
        assert_eq!(state.evict_idle().await, 0);
        assert!(state.get_session(&id).await.is_ok());
    }

    #[tokio::test]
    async fn session_store_lifecycle() {
        let state = AppState::from_config(EchoConfig::default()).unwrap();
        let s = state.open_session().await;
        let id = s.id().to_string();
        assert!(state.get_session(&id).await.is_ok());

        let after = state
            .dispatch(&id, Intent::SelectChallenge { genre: Genre::Rock, difficulty: Difficulty::Beginner })
            .await
            .unwrap();
        assert_eq!(after.current_case(&state.catalog).unwrap().id, "case-003");

        state.close_session(&id).await.unwrap();
        assert!(matches!(state.get_session(&id).await, Err(QuizError::UnknownSession(_))));
        assert!(state.close_session(&id).await.is_err());
    }
}
