//! Session controller: owns one player's progress and the screen they are on,
//! and turns user intents into round resolution, progression and navigation.
//!
//! Anomalies that only mean "the player is on the wrong screen" degrade to a
//! navigation fallback with a notice. Errors returned from `dispatch` leave
//! progress and screen untouched.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio::{AudioAction, AudioDeck, TrackKind};
use crate::catalog::Catalog;
use crate::config::ScoringRules;
use crate::domain::{CaseFile, Difficulty, Genre};
use crate::error::{QuizError, Result};
use crate::progression::{RoundReceipt, UserProgress};
use crate::resolver::{resolve_round, RoundOutcome};
use crate::selector::select_case;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Difficulty,
    Game,
    Result,
    Profile,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Selection {
    pub genre: Genre,
    pub difficulty: Difficulty,
}

/// A resolved round as shown on the result screen.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RoundReport {
    pub outcome: RoundOutcome,
    pub receipt: RoundReceipt,
}

/// Everything a player can ask the session to do.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    SelectChallenge {
        genre: Genre,
        difficulty: Difficulty,
    },
    SubmitGuess {
        option: String,
        /// Seconds since the round started, as measured by the client.
        /// Falls back to the server's own clock when absent.
        #[serde(default, rename = "elapsedSeconds")]
        elapsed_seconds: Option<f64>,
    },
    Next,
    Navigate {
        screen: Screen,
    },
    Audio {
        track: TrackKind,
        action: AudioAction,
        #[serde(default)]
        message: Option<String>,
    },
}

#[derive(Clone, Debug)]
pub struct Session {
    id: String,
    screen: Screen,
    selection: Option<Selection>,
    round_index: usize,
    round_started: Instant,
    last_round: Option<RoundReport>,
    progress: UserProgress,
    audio: AudioDeck,
    notice: Option<String>,
}

impl Session {
    pub fn new(rules: &ScoringRules) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            screen: Screen::Difficulty,
            selection: None,
            round_index: 0,
            round_started: Instant::now(),
            last_round: None,
            progress: UserProgress::new(rules.initial_streak_freezes),
            audio: AudioDeck::default(),
            notice: None,
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn screen(&self) -> Screen { self.screen }
    pub fn selection(&self) -> Option<Selection> { self.selection }
    pub fn round_index(&self) -> usize { self.round_index }
    pub fn last_round(&self) -> Option<&RoundReport> { self.last_round.as_ref() }
    pub fn progress(&self) -> &UserProgress { &self.progress }
    pub fn audio(&self) -> &AudioDeck { &self.audio }
    pub fn notice(&self) -> Option<&str> { self.notice.as_deref() }

    /// The case for the current round index under the current selection.
    pub fn current_case<'a>(&self, catalog: &'a Catalog) -> Result<&'a CaseFile> {
        let sel = self.selection.ok_or(QuizError::NoSelection)?;
        select_case(catalog.cases(), sel.genre, sel.difficulty, self.round_index)
    }

    /// The case the last recorded guess was made on.
    pub fn result_case<'a>(&self, catalog: &'a Catalog) -> Option<&'a CaseFile> {
        self.last_round
            .as_ref()
            .and_then(|r| catalog.get(&r.outcome.case_id))
    }

    pub fn dispatch(&mut self, intent: Intent, catalog: &Catalog, rules: &ScoringRules) -> Result<()> {
        self.notice = None;
        match intent {
            Intent::SelectChallenge { genre, difficulty } => {
                self.selection = Some(Selection { genre, difficulty });
                self.round_index = 0;
                self.last_round = None;
                self.enter_game(catalog);
                Ok(())
            }
            Intent::SubmitGuess { option, elapsed_seconds } => {
                self.submit_guess(&option, elapsed_seconds, catalog, rules)
            }
            Intent::Next => {
                if self.last_round.take().is_some() {
                    self.round_index += 1;
                }
                self.enter_game(catalog);
                Ok(())
            }
            Intent::Navigate { screen } => {
                self.navigate(screen, catalog);
                Ok(())
            }
            Intent::Audio { track, action, message } => {
                if !self.audio.handle(track, action, message.as_deref()) {
                    debug!(target: "session", id = %self.id, ?track, ?action, "Audio action for a track not on screen");
                }
                Ok(())
            }
        }
    }

    fn submit_guess(
        &mut self,
        option: &str,
        elapsed_seconds: Option<f64>,
        catalog: &Catalog,
        rules: &ScoringRules,
    ) -> Result<()> {
        if self.selection.is_none() {
            self.fall_back(Screen::Difficulty, QuizError::NoSelection);
            return Ok(());
        }
        if self.last_round.is_some() {
            return Err(QuizError::RoundAlreadyResolved);
        }
        if self.screen != Screen::Game {
            return Err(QuizError::NotInRound);
        }
        let case = match self.current_case(catalog) {
            Ok(c) => c,
            Err(e) => {
                self.fall_back(Screen::Difficulty, e);
                return Ok(());
            }
        };
        if !case.offers(option) {
            return Err(QuizError::UnknownOption { case_id: case.id.clone(), option: option.to_string() });
        }
        let elapsed = elapsed_seconds.unwrap_or_else(|| self.round_started.elapsed().as_secs_f64());
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(QuizError::InvalidElapsed(elapsed));
        }

        let outcome = resolve_round(case, option, elapsed, rules);
        let receipt = self.progress.apply(&outcome, rules);
        info!(
            target: "round",
            session = %self.id,
            case = %case.id,
            correct = outcome.correct,
            elapsed = %format!("{:.2}", elapsed),
            bonus = outcome.bonus_points(),
            points = receipt.points,
            freeze_used = receipt.freeze_used,
            xp = self.progress.experience(),
            streak = self.progress.streak(),
            "Round resolved"
        );

        self.audio = AudioDeck::for_result(case);
        self.last_round = Some(RoundReport { outcome, receipt });
        self.screen = Screen::Result;
        Ok(())
    }

    fn navigate(&mut self, screen: Screen, catalog: &Catalog) {
        match screen {
            Screen::Difficulty | Screen::Profile => {
                self.screen = screen;
                self.audio = AudioDeck::default();
            }
            Screen::Game | Screen::Result => {
                if self.selection.is_none() {
                    self.screen = Screen::Difficulty;
                    self.audio = AudioDeck::default();
                } else if self.last_round.is_some() {
                    // A guessed round stays resolved until `Next`.
                    self.show_result(catalog);
                } else {
                    if screen == Screen::Result {
                        warn!(target: "session", id = %self.id, reason = %QuizError::NoGuess, "Result requested before a guess; showing the round");
                    }
                    self.enter_game(catalog);
                }
            }
        }
    }

    fn enter_game(&mut self, catalog: &Catalog) {
        match self.current_case(catalog) {
            Ok(case) => {
                self.audio = AudioDeck::for_round(case);
                self.round_started = Instant::now();
                self.screen = Screen::Game;
            }
            Err(e) => self.fall_back(Screen::Difficulty, e),
        }
    }

    fn show_result(&mut self, catalog: &Catalog) {
        match self.result_case(catalog) {
            Some(case) => {
                self.audio = AudioDeck::for_result(case);
                self.screen = Screen::Result;
            }
            None => {
                self.last_round = None;
                self.enter_game(catalog);
            }
        }
    }

    fn fall_back(&mut self, screen: Screen, reason: QuizError) {
        warn!(target: "session", id = %self.id, from = ?self.screen, to = ?screen, reason = %reason, "Navigation fallback");
        self.screen = screen;
        self.audio = AudioDeck::default();
        self.notice = Some(reason.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RankTable;
    use crate::seeds::{seed_case_files, seed_ranks};

    fn catalog() -> Catalog {
        Catalog::new(seed_case_files(), RankTable::new(seed_ranks()).unwrap()).unwrap()
    }

    fn select(genre: Genre, difficulty: Difficulty) -> Intent {
        Intent::SelectChallenge { genre, difficulty }
    }

    fn guess(option: &str, elapsed: f64) -> Intent {
        Intent::SubmitGuess { option: option.into(), elapsed_seconds: Some(elapsed) }
    }

    #[test]
    fn starts_on_selection_with_default_progress() {
        let rules = ScoringRules::default();
        let s = Session::new(&rules);
        assert_eq!(s.screen(), Screen::Difficulty);
        assert_eq!(s.progress().streak_freezes(), 1);
        assert_eq!(s.progress().experience(), 0);
    }

    #[test]
    fn full_round_scores_and_shows_result() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(select(Genre::HipHop, Difficulty::Beginner), &cat, &rules).unwrap();
        assert_eq!(s.screen(), Screen::Game);
        assert_eq!(s.current_case(&cat).unwrap().id, "case-001");

        s.dispatch(guess("Muddy Low-End", 2.0), &cat, &rules).unwrap();
        assert_eq!(s.screen(), Screen::Result);
        let report = s.last_round().unwrap();
        assert!(report.outcome.correct);
        assert_eq!(report.receipt.points, 160);
        assert_eq!(s.progress().experience(), 160);
        assert_eq!(s.progress().level(), 2);
        assert!(s.audio().corrected.is_some());
    }

    #[test]
    fn empty_combination_redirects_with_notice() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(select(Genre::Pop, Difficulty::Expert), &cat, &rules).unwrap();
        assert_eq!(s.screen(), Screen::Difficulty);
        assert!(s.notice().unwrap().contains("No cases found"));

        // Recoverable by choosing again.
        s.dispatch(select(Genre::Pop, Difficulty::Beginner), &cat, &rules).unwrap();
        assert_eq!(s.screen(), Screen::Game);
        assert!(s.notice().is_none());
    }

    #[test]
    fn option_outside_case_is_rejected_without_state_change() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(select(Genre::HipHop, Difficulty::Beginner), &cat, &rules).unwrap();
        let err = s.dispatch(guess("Harsh Highs", 1.0), &cat, &rules).unwrap_err();
        assert!(matches!(err, QuizError::UnknownOption { .. }));
        assert_eq!(s.screen(), Screen::Game);
        assert_eq!(s.progress().accuracy().total, 0);
    }

    #[test]
    fn second_guess_on_same_round_is_refused() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(select(Genre::HipHop, Difficulty::Beginner), &cat, &rules).unwrap();
        s.dispatch(guess("Too Bright", 9.0), &cat, &rules).unwrap();
        let err = s.dispatch(guess("Muddy Low-End", 1.0), &cat, &rules).unwrap_err();
        assert!(matches!(err, QuizError::RoundAlreadyResolved));
        assert_eq!(s.progress().accuracy().total, 1);

        // Going back to the game from the profile still shows the resolved round.
        s.dispatch(Intent::Navigate { screen: Screen::Profile }, &cat, &rules).unwrap();
        s.dispatch(Intent::Navigate { screen: Screen::Game }, &cat, &rules).unwrap();
        assert_eq!(s.screen(), Screen::Result);
    }

    #[test]
    fn guess_without_selection_falls_back() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(guess("Muddy Low-End", 1.0), &cat, &rules).unwrap();
        assert_eq!(s.screen(), Screen::Difficulty);
        assert!(s.notice().is_some());
        assert_eq!(s.progress().accuracy().total, 0);
    }

    #[test]
    fn guess_off_the_game_screen_is_refused() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(select(Genre::HipHop, Difficulty::Beginner), &cat, &rules).unwrap();
        s.dispatch(Intent::Navigate { screen: Screen::Profile }, &cat, &rules).unwrap();
        let err = s.dispatch(guess("Muddy Low-End", 1.0), &cat, &rules).unwrap_err();
        assert!(matches!(err, QuizError::NotInRound));
    }

    #[test]
    fn negative_elapsed_is_rejected() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(select(Genre::HipHop, Difficulty::Beginner), &cat, &rules).unwrap();
        let err = s.dispatch(guess("Muddy Low-End", -1.0), &cat, &rules).unwrap_err();
        assert!(matches!(err, QuizError::InvalidElapsed(_)));
        assert_eq!(s.screen(), Screen::Game);
    }

    #[test]
    fn next_cycles_through_filtered_cases() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(select(Genre::Electronic, Difficulty::Beginner), &cat, &rules).unwrap();
        let mut seen = vec![];
        for _ in 0..3 {
            let case = s.current_case(&cat).unwrap().clone();
            seen.push(case.id.clone());
            s.dispatch(guess(&case.correct_answer, 10.0), &cat, &rules).unwrap();
            s.dispatch(Intent::Next, &cat, &rules).unwrap();
            assert_eq!(s.screen(), Screen::Game);
        }
        assert_eq!(seen, vec!["case-006", "case-007", "case-006"]);
        assert_eq!(s.progress().solved_cases().len(), 2);
        assert_eq!(s.progress().streak(), 3);
    }

    #[test]
    fn next_without_a_guess_does_not_skip() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(select(Genre::Electronic, Difficulty::Beginner), &cat, &rules).unwrap();
        s.dispatch(Intent::Next, &cat, &rules).unwrap();
        assert_eq!(s.round_index(), 0);
        assert_eq!(s.current_case(&cat).unwrap().id, "case-006");
    }

    #[test]
    fn result_before_guess_redirects_to_game() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(Intent::Navigate { screen: Screen::Result }, &cat, &rules).unwrap();
        assert_eq!(s.screen(), Screen::Difficulty);

        s.dispatch(select(Genre::Rock, Difficulty::Expert), &cat, &rules).unwrap();
        s.dispatch(Intent::Navigate { screen: Screen::Result }, &cat, &rules).unwrap();
        assert_eq!(s.screen(), Screen::Game);
    }

    #[test]
    fn streak_freeze_flows_through_session() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(select(Genre::HipHop, Difficulty::Beginner), &cat, &rules).unwrap();
        s.dispatch(guess("Muddy Low-End", 10.0), &cat, &rules).unwrap();
        s.dispatch(Intent::Next, &cat, &rules).unwrap();
        s.dispatch(guess("Too Bright", 10.0), &cat, &rules).unwrap();

        let report = s.last_round().unwrap();
        assert!(report.receipt.freeze_used);
        assert_eq!(s.progress().streak(), 1);
        assert_eq!(s.progress().streak_freezes(), 0);
    }

    #[test]
    fn playback_failure_does_not_touch_progress() {
        let (cat, rules) = (catalog(), ScoringRules::default());
        let mut s = Session::new(&rules);
        s.dispatch(select(Genre::HipHop, Difficulty::Beginner), &cat, &rules).unwrap();
        let before = s.progress().clone();
        s.dispatch(
            Intent::Audio { track: TrackKind::Flawed, action: AudioAction::Failed, message: Some("404".into()) },
            &cat,
            &rules,
        )
        .unwrap();
        assert_eq!(s.progress(), &before);
        assert_eq!(s.audio().flawed.as_ref().unwrap().last_error.as_deref(), Some("404"));
    }

    #[test]
    fn intents_deserialize_from_client_json() {
        let i: Intent = serde_json::from_str(r#"{"type":"select_challenge","genre":"Hip-Hop","difficulty":"Expert"}"#).unwrap();
        assert_eq!(i, select(Genre::HipHop, Difficulty::Expert));
        let i: Intent = serde_json::from_str(r#"{"type":"submit_guess","option":"Boxy Mids"}"#).unwrap();
        assert_eq!(i, Intent::SubmitGuess { option: "Boxy Mids".into(), elapsed_seconds: None });
        let i: Intent = serde_json::from_str(r#"{"type":"audio","track":"corrected","action":"toggle"}"#).unwrap();
        assert_eq!(i, Intent::Audio { track: TrackKind::Corrected, action: AudioAction::Toggle, message: None });
    }
}
