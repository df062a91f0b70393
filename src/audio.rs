//! Server-side mirror of the client's audio players.
//!
//! The presentation client does the actual playback; it reports what happened
//! (`ended`, `failed`) and asks for toggles, and we keep the "is playing"
//! signal it renders. Nothing here feeds into scoring.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::CaseFile;

/// The playback contract a player must satisfy.
pub trait Playback {
  fn is_playing(&self) -> bool;
  fn play(&mut self);
  fn pause(&mut self);

  fn toggle(&mut self) {
    if self.is_playing() {
      self.pause();
    } else {
      self.play();
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AudioTrack {
  pub url: String,
  pub looping: bool,
  pub playing: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_error: Option<String>,
}

impl AudioTrack {
  pub fn new(url: impl Into<String>, looping: bool) -> Self {
    Self { url: url.into(), looping, playing: false, last_error: None }
  }

  /// Playback reached the end; looping tracks keep going.
  pub fn ended(&mut self) {
    if !self.looping {
      self.playing = false;
    }
  }

  pub fn failed(&mut self, message: &str) {
    warn!(target: "audio", url = %self.url, error = %message, "Audio playback failed");
    self.playing = false;
    self.last_error = Some(message.to_string());
  }
}

impl Playback for AudioTrack {
  fn is_playing(&self) -> bool { self.playing }

  fn play(&mut self) {
    self.playing = true;
    self.last_error = None;
  }

  fn pause(&mut self) { self.playing = false; }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
  Flawed,
  Corrected,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudioAction {
  Toggle,
  Play,
  Pause,
  Ended,
  Failed,
}

/// The tracks on screen: the flawed clip during a round, both clips on the
/// result screen, nothing elsewhere.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct AudioDeck {
  pub flawed: Option<AudioTrack>,
  pub corrected: Option<AudioTrack>,
}

impl AudioDeck {
  pub fn for_round(case: &CaseFile) -> Self {
    Self { flawed: Some(AudioTrack::new(&case.flawed_audio_url, true)), corrected: None }
  }

  pub fn for_result(case: &CaseFile) -> Self {
    Self {
      flawed: Some(AudioTrack::new(&case.flawed_audio_url, true)),
      corrected: Some(AudioTrack::new(&case.corrected_audio_url, true)),
    }
  }

  pub fn track(&self, kind: TrackKind) -> Option<&AudioTrack> {
    match kind {
      TrackKind::Flawed => self.flawed.as_ref(),
      TrackKind::Corrected => self.corrected.as_ref(),
    }
  }

  fn track_mut(&mut self, kind: TrackKind) -> Option<&mut AudioTrack> {
    match kind {
      TrackKind::Flawed => self.flawed.as_mut(),
      TrackKind::Corrected => self.corrected.as_mut(),
    }
  }

  fn other_mut(&mut self, kind: TrackKind) -> Option<&mut AudioTrack> {
    match kind {
      TrackKind::Flawed => self.corrected.as_mut(),
      TrackKind::Corrected => self.flawed.as_mut(),
    }
  }

  /// Apply an action; returns false when `kind` is not loaded on this screen.
  /// Starting one clip pauses the other so the two never overlap.
  pub fn handle(&mut self, kind: TrackKind, action: AudioAction, detail: Option<&str>) -> bool {
    let starting = match action {
      AudioAction::Play => true,
      AudioAction::Toggle => self.track(kind).map(|t| !t.is_playing()).unwrap_or(false),
      _ => false,
    };
    if self.track(kind).is_none() {
      return false;
    }
    if starting {
      if let Some(other) = self.other_mut(kind) {
        other.pause();
      }
    }
    if let Some(track) = self.track_mut(kind) {
      match action {
        AudioAction::Toggle => track.toggle(),
        AudioAction::Play => track.play(),
        AudioAction::Pause => track.pause(),
        AudioAction::Ended => track.ended(),
        AudioAction::Failed => track.failed(detail.unwrap_or("unknown playback error")),
      }
    }
    true
  }
}
