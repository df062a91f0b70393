//! Built-in catalog content: the case files and rank ladder the service
//! ships with, so it is useful without any external config.

use crate::domain::{CaseFile, Difficulty, Genre, Rank};

const AUDIO_BASE_URL: &str = "https://storage.googleapis.com/gemini-web-codelab-audio/mixwiz";

fn seed_case(
  id: &str,
  title: &str,
  genre: Genre,
  difficulty: Difficulty,
  options: &[&str],
  correct_answer: &str,
  explanation: &str,
) -> CaseFile {
  CaseFile {
    id: id.into(),
    title: title.into(),
    genre,
    difficulty,
    flawed_audio_url: format!("{}/{}-flawed.mp3", AUDIO_BASE_URL, id),
    corrected_audio_url: format!("{}/{}-corrected.mp3", AUDIO_BASE_URL, id),
    options: options.iter().map(|o| o.to_string()).collect(),
    correct_answer: correct_answer.into(),
    explanation: explanation.into(),
  }
}

/// Built-in case files, in catalog order.
pub fn seed_case_files() -> Vec<CaseFile> {
  vec![
    seed_case(
      "case-001",
      "Muddy Kick Drum",
      Genre::HipHop,
      Difficulty::Beginner,
      &["Too Bright", "Muddy Low-End", "Too Much Reverb", "Panning is Off"],
      "Muddy Low-End",
      "The kick drum had too much energy around 200-400Hz, making it sound \"muddy\" and unclear. A small EQ cut in this range cleans it up significantly.",
    ),
    seed_case(
      "case-002",
      "Harsh Vocals",
      Genre::Pop,
      Difficulty::Beginner,
      &["Boxy Mids", "Too Quiet", "Harsh Highs", "Delay is Wrong"],
      "Harsh Highs",
      "The vocal had a sharp peak around 4-6kHz, causing a harsh \"ess\" sound (sibilance). A de-esser or a precise EQ cut tames this harshness.",
    ),
    seed_case(
      "case-003",
      "Boxy Snare Drum",
      Genre::Rock,
      Difficulty::Beginner,
      &["Too much low-end", "Boxy Mids", "Too much reverb", "Too quiet"],
      "Boxy Mids",
      "The snare had a resonant frequency in the 400-600Hz range, giving it a cardboard \"boxy\" sound. An EQ cut in this area lets the true \"crack\" of the snare come through.",
    ),
    seed_case(
      "case-006",
      "Drowned in Reverb",
      Genre::Electronic,
      Difficulty::Beginner,
      &["Too Dry", "Too Much Reverb", "Too Much Delay", "Vocals Too Loud"],
      "Too Much Reverb",
      "The synth lead was sent to a reverb with the wet/dry mix set too high, pushing it to the back of the mix and making it sound distant and washed out.",
    ),
    seed_case(
      "case-007",
      "Buried Lead Synth",
      Genre::Electronic,
      Difficulty::Beginner,
      &["Synth Too Loud", "Level Balance Issue", "Pads Too Quiet", "Drums Too Loud"],
      "Level Balance Issue",
      "This is a classic level balance problem. The lead synth was too quiet compared to the drums and bass, getting lost in the mix. Simply raising the synth fader makes it sit perfectly on top.",
    ),
    seed_case(
      "case-004",
      "Overcompressed Master",
      Genre::Electronic,
      Difficulty::Intermediate,
      &["Compression Pumping", "Not Loud Enough", "Stereo Field Too Wide", "Too much bass"],
      "Compression Pumping",
      "The master bus compressor had a fast attack and high ratio, causing an audible \"pumping\" effect that killed the track's dynamics. A slower attack and lower ratio fixed it.",
    ),
    seed_case(
      "case-008",
      "Untamed Transients",
      Genre::HipHop,
      Difficulty::Intermediate,
      &["Snare is too dull", "Harsh Cymbals", "Snare is Too 'Pokey'", "Kick is too boomy"],
      "Snare is Too 'Pokey'",
      "The snare drum's initial hit (the transient) was too sharp and aggressive, making it poke out of the mix unpleasantly. A transient shaper was used to soften the attack, helping it blend in more naturally.",
    ),
    seed_case(
      "case-009",
      "Clashing Frequencies",
      Genre::HipHop,
      Difficulty::Intermediate,
      &["Bass is too quiet", "Kick is too loud", "Frequency Masking", "Phase Issues"],
      "Frequency Masking",
      "The kick drum and the bass were competing for the same low-frequency range (around 80-120Hz), causing muddiness. A small EQ cut on the bass in the kick's primary frequency created space for both.",
    ),
    seed_case(
      "case-011",
      "Out-of-Time Delay",
      Genre::Rock,
      Difficulty::Intermediate,
      &["Reverb is too long", "Delay Not Synced", "Guitars are harsh", "Too much feedback"],
      "Delay Not Synced",
      "The delay on the guitar was set to a value that didn't match the song's tempo, creating a chaotic feel. Syncing the delay to a 1/4 note subdivision locked it into the groove.",
    ),
    seed_case(
      "case-005",
      "Phasey Guitars",
      Genre::Rock,
      Difficulty::Expert,
      &["Guitars are too loud", "Wrong delay time", "Phase Cancellation", "Not enough distortion"],
      "Phase Cancellation",
      "Two guitar tracks recorded with multiple mics were slightly out of phase, causing frequencies to cancel out and sound thin. A phase alignment tool resolved the issue.",
    ),
    seed_case(
      "case-010",
      "Narrow Stereo Image",
      Genre::Electronic,
      Difficulty::Expert,
      &["Mono Compatibility Issue", "Too much reverb", "Stereo Field Too Narrow", "Panning is wrong"],
      "Stereo Field Too Narrow",
      "The overall stereo image was very narrow, lacking width. A stereo imaging plugin was used on the master bus to gently widen the side channels, creating a more immersive sound.",
    ),
  ]
}

/// Built-in rank ladder, ordered by threshold and starting at zero.
pub fn seed_ranks() -> Vec<Rank> {
  [
    ("Sonic Scout", 0, "ear"),
    ("Audio Rookie", 500, "rookie"),
    ("Beat Detective", 1500, "magnifying_glass"),
    ("Audio Adept", 3000, "fader"),
    ("Mix Master", 5000, "star"),
    ("MixWiz", 10000, "trophy"),
  ]
  .into_iter()
  .map(|(name, min_xp, icon)| Rank { name: name.into(), min_xp, icon: icon.into() })
  .collect()
}
