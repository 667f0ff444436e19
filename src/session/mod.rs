//! Playback session
//!
//! Tracks which throttle is feeding the broadcaster and which phase the
//! broadcast is in.

pub mod state;

pub use state::{PlaybackPhase, PlaybackSession};
