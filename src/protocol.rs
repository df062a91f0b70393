//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::audio::AudioDeck;
use crate::catalog::Catalog;
use crate::domain::{CaseFile, Difficulty, Genre, Rank};
use crate::progression::{level_progress, rank_progress, Accuracy, LevelProgress};
use crate::resolver::Bonus;
use crate::session::{Intent, Screen, Selection, Session};

/// Non-intent messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Ping,
    /// Ask for the current session view without changing anything.
    State,
}

#[derive(Debug)]
pub enum ClientWsMessage {
    Control(ControlMessage),
    Intent(Intent),
}

/// Control messages first, then intents; the intent parse error is the one
/// reported, since that is what almost every message is.
pub fn parse_client_message(txt: &str) -> Result<ClientWsMessage, serde_json::Error> {
    if let Ok(c) = serde_json::from_str::<ControlMessage>(txt) {
        return Ok(ClientWsMessage::Control(c));
    }
    serde_json::from_str::<Intent>(txt).map(ClientWsMessage::Intent)
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session { session: SessionView },
    Error { message: String },
}

/// Everything the presentation client needs to render the current screen.
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub screen: Screen,
    pub notice: Option<String>,
    pub selection: Option<Selection>,
    pub header: HeaderView,
    pub game: Option<GameView>,
    pub result: Option<ResultView>,
    pub profile: Option<ProfileView>,
    pub audio: AudioDeck,
}

#[derive(Debug, Serialize)]
pub struct HeaderView {
    pub streak: u32,
    pub streak_freezes: u32,
    pub xp: u64,
    pub level: u32,
    pub show_home_button: bool,
}

/// A case as presented during a round: no answer, no explanation.
#[derive(Debug, Serialize)]
pub struct CaseOut {
    pub id: String,
    pub title: String,
    pub genre: Genre,
    pub difficulty: Difficulty,
    pub options: Vec<String>,
    pub flawed_audio_url: String,
}

#[derive(Debug, Serialize)]
pub struct GameView {
    pub round_index: usize,
    pub case: CaseOut,
}

#[derive(Debug, Serialize)]
pub struct ResultView {
    pub case_id: String,
    pub title: String,
    pub guess: String,
    pub correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    pub xp_gained: u64,
    pub bonus: Option<Bonus>,
    pub streak_freeze_used: bool,
    pub xp: u64,
    pub level: LevelProgress,
    pub flawed_audio_url: String,
    pub corrected_audio_url: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub rank: Rank,
    pub next_rank: Option<Rank>,
    pub progress_to_next_rank: f64,
    pub xp: u64,
    pub level: u32,
    pub streak: u32,
    pub streak_freezes: u32,
    pub accuracy: Accuracy,
    pub accuracy_percentage: u64,
    pub solved_cases: usize,
}

/// Convert a full `CaseFile` (internal) to the in-round DTO.
pub fn to_out(c: &CaseFile) -> CaseOut {
    CaseOut {
        id: c.id.clone(),
        title: c.title.clone(),
        genre: c.genre,
        difficulty: c.difficulty,
        options: c.options.clone(),
        flawed_audio_url: c.flawed_audio_url.clone(),
    }
}

pub fn session_view(s: &Session, catalog: &Catalog) -> SessionView {
    let p = s.progress();
    let header = HeaderView {
        streak: p.streak(),
        streak_freezes: p.streak_freezes(),
        xp: p.experience(),
        level: p.level(),
        show_home_button: s.screen() != Screen::Difficulty,
    };

    let game = match s.screen() {
        Screen::Game => s
            .current_case(catalog)
            .ok()
            .map(|c| GameView { round_index: s.round_index(), case: to_out(c) }),
        _ => None,
    };

    let result = match (s.screen(), s.last_round(), s.result_case(catalog)) {
        (Screen::Result, Some(report), Some(case)) => Some(ResultView {
            case_id: case.id.clone(),
            title: case.title.clone(),
            guess: report.outcome.selected_option.clone(),
            correct: report.outcome.correct,
            correct_answer: case.correct_answer.clone(),
            explanation: case.explanation.clone(),
            xp_gained: report.receipt.points,
            bonus: report.outcome.bonus,
            streak_freeze_used: report.receipt.freeze_used,
            xp: p.experience(),
            level: level_progress(p.experience()),
            flawed_audio_url: case.flawed_audio_url.clone(),
            corrected_audio_url: case.corrected_audio_url.clone(),
        }),
        _ => None,
    };

    let profile = match s.screen() {
        Screen::Profile => {
            let rp = rank_progress(p.experience(), catalog.ranks());
            Some(ProfileView {
                rank: rp.rank,
                next_rank: rp.next_rank,
                progress_to_next_rank: rp.percent,
                xp: p.experience(),
                level: p.level(),
                streak: p.streak(),
                streak_freezes: p.streak_freezes(),
                accuracy: p.accuracy(),
                accuracy_percentage: p.accuracy().percentage(),
                solved_cases: p.solved_cases().len(),
            })
        }
        _ => None,
    };

    SessionView {
        session_id: s.id().to_string(),
        screen: s.screen(),
        notice: s.notice().map(str::to_string),
        selection: s.selection(),
        header,
        game,
        result,
        profile,
        audio: s.audio().clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct DifficultyOut {
    pub level: Difficulty,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CombinationOut {
    pub genre: Genre,
    pub difficulty: Difficulty,
    pub cases: usize,
}

/// What the selection screen needs: the choices and how many cases back each pair.
#[derive(Debug, Serialize)]
pub struct CatalogOut {
    pub genres: Vec<Genre>,
    pub difficulties: Vec<DifficultyOut>,
    pub combinations: Vec<CombinationOut>,
    pub ranks: Vec<Rank>,
}

pub fn catalog_out(catalog: &Catalog) -> CatalogOut {
    let combinations = Genre::ALL
        .iter()
        .flat_map(|&genre| {
            Difficulty::ALL.iter().map(move |&difficulty| CombinationOut {
                genre,
                difficulty,
                cases: catalog.count(genre, difficulty),
            })
        })
        .collect();
    CatalogOut {
        genres: Genre::ALL.to_vec(),
        difficulties: Difficulty::ALL
            .iter()
            .map(|&d| DifficultyOut { level: d, description: d.description() })
            .collect(),
        combinations,
        ranks: catalog.ranks().as_slice().to_vec(),
    }
}
