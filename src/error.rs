//! Error taxonomy for the quiz core and its service surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::domain::{Difficulty, Genre};

pub type Result<T> = std::result::Result<T, QuizError>;

#[derive(Error, Debug)]
pub enum QuizError {
    /// The selected genre/difficulty pair matches zero catalog items.
    #[error("No cases found for {genre} / {difficulty}. Please select another.")]
    NoCasesAvailable { genre: Genre, difficulty: Difficulty },

    /// A game round was requested before a genre/difficulty pair was chosen.
    #[error("No challenge selected yet")]
    NoSelection,

    /// A result was requested before a guess was recorded.
    #[error("No guess recorded for the current round")]
    NoGuess,

    #[error("Option '{option}' is not offered by case {case_id}")]
    UnknownOption { case_id: String, option: String },

    #[error("Round already resolved; advance to the next case first")]
    RoundAlreadyResolved,

    #[error("No round in progress; open the game screen first")]
    NotInRound,

    #[error("Elapsed time must be a finite, non-negative number of seconds, got {0}")]
    InvalidElapsed(f64),

    /// The request body could not be read as an intent.
    #[error("Malformed intent: {0}")]
    MalformedIntent(String),

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QuizError {
    pub fn status(&self) -> StatusCode {
        match self {
            QuizError::UnknownSession(_) => StatusCode::NOT_FOUND,
            QuizError::UnknownOption { .. }
            | QuizError::InvalidElapsed(_)
            | QuizError::MalformedIntent(_) => StatusCode::BAD_REQUEST,
            QuizError::RoundAlreadyResolved
            | QuizError::NotInRound
            | QuizError::NoCasesAvailable { .. }
            | QuizError::NoSelection
            | QuizError::NoGuess => StatusCode::CONFLICT,
            QuizError::InvalidCatalog(_) | QuizError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "type": "error", "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
