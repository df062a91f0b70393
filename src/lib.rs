//! Echo · ear-training quiz backend.
//!
//! A player listens to a flawed mix, picks a diagnosis, and earns experience,
//! streaks and ranks. The scoring core (`selector`, `resolver`,
//! `progression`) is pure; `session` routes screens and owns one player's
//! progress; `routes` exposes sessions over HTTP and WebSocket.

pub mod audio;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod logic;
pub mod progression;
pub mod protocol;
pub mod resolver;
pub mod routes;
pub mod seeds;
pub mod selector;
pub mod session;
pub mod state;
pub mod telemetry;

pub use routes::build_router;
pub use state::AppState;
