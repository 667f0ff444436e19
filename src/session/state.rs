//! Playback state machine
//!
//! ```text
//! Idle ──► Probing ──► Playing ──► Stopped
//!  ▲                    │  ▲          │
//!  │                    ▼  │          │
//!  │                   Mixing         │
//!  └──────────── (start again) ◄──────┘
//! ```
//!
//! Transition methods ignore calls that are not valid from the current
//! phase and report whether they applied.

use std::path::PathBuf;
use std::time::Instant;

use crate::pipeline::Throttle;

/// Playback lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Nothing has played yet
    Idle,
    /// Bitrate probe in progress
    Probing,
    /// A throttle is feeding the broadcaster
    Playing,
    /// An effect is being spliced in
    Mixing,
    /// Playback was stopped or the source ran out
    Stopped,
}

impl PlaybackPhase {
    /// Whether `start` may run from this phase
    pub fn can_start(self) -> bool {
        matches!(self, PlaybackPhase::Idle | PlaybackPhase::Stopped)
    }

    /// Whether a pipeline is live in this phase
    pub fn is_live(self) -> bool {
        matches!(self, PlaybackPhase::Playing | PlaybackPhase::Mixing)
    }
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlaybackPhase::Idle => "idle",
            PlaybackPhase::Probing => "probing",
            PlaybackPhase::Playing => "playing",
            PlaybackPhase::Mixing => "mixing",
            PlaybackPhase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// The one live playback session
///
/// The throttle owns the upstream it reads from, so the session's throttle
/// is by construction the stage feeding the broadcaster.
#[derive(Debug)]
pub struct PlaybackSession {
    /// Current phase
    phase: PlaybackPhase,

    /// Source opened by the last `start`
    pub source: Option<PathBuf>,

    /// Pacing rate of the last `start` (bytes/sec), kept across splices
    pub bitrate: u64,

    /// Throttle currently feeding the broadcaster
    throttle: Option<Throttle>,

    /// When the current pipeline started
    pub started_at: Option<Instant>,

    /// Effects spliced into the current pipeline
    pub effects_applied: u32,
}

impl PlaybackSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            source: None,
            bitrate: 0,
            throttle: None,
            started_at: None,
            effects_applied: 0,
        }
    }

    /// Current phase
    ///
    /// A pipeline whose source ran out reports `Stopped`.
    pub fn phase(&self) -> PlaybackPhase {
        match self.phase {
            PlaybackPhase::Playing
                if self.throttle.as_ref().map_or(true, Throttle::is_finished) =>
            {
                PlaybackPhase::Stopped
            }
            phase => phase,
        }
    }

    /// Throttle currently feeding the broadcaster
    pub fn throttle(&self) -> Option<&Throttle> {
        self.throttle.as_ref()
    }

    /// Enter probing for `source`
    pub fn begin_probe(&mut self, source: PathBuf) -> bool {
        if !self.phase().can_start() {
            return false;
        }
        self.phase = PlaybackPhase::Probing;
        self.source = Some(source);
        true
    }

    /// Probe failed to produce a pipeline; return to stopped
    pub fn abort_probe(&mut self) {
        if self.phase == PlaybackPhase::Probing {
            self.phase = PlaybackPhase::Stopped;
        }
    }

    /// Install the first throttle of a new pipeline
    pub fn on_playing(&mut self, bitrate: u64, throttle: Throttle) -> bool {
        if self.phase != PlaybackPhase::Probing {
            return false;
        }
        self.bitrate = bitrate;
        self.throttle = Some(throttle);
        self.started_at = Some(Instant::now());
        self.effects_applied = 0;
        self.phase = PlaybackPhase::Playing;
        true
    }

    /// Enter mixing
    pub fn begin_mix(&mut self) -> bool {
        if self.phase() != PlaybackPhase::Playing {
            return false;
        }
        self.phase = PlaybackPhase::Mixing;
        true
    }

    /// Commit a splice, returning the retired throttle
    pub fn commit_mix(&mut self, throttle: Throttle) -> Option<Throttle> {
        if self.phase != PlaybackPhase::Mixing {
            return None;
        }
        self.phase = PlaybackPhase::Playing;
        self.effects_applied += 1;
        self.throttle.replace(throttle)
    }

    /// Leave mixing without a splice; the old throttle stays in place
    pub fn abort_mix(&mut self) {
        if self.phase == PlaybackPhase::Mixing {
            self.phase = PlaybackPhase::Playing;
        }
    }

    /// Leave mixing after the source was already handed over and lost
    ///
    /// The old throttle has nothing left to forward, so the pipeline is
    /// over. Returns the throttle to end.
    pub fn fail_mix(&mut self) -> Option<Throttle> {
        if self.phase != PlaybackPhase::Mixing {
            return None;
        }
        self.phase = PlaybackPhase::Stopped;
        self.throttle.take()
    }

    /// Stop the pipeline, returning the throttle to end
    ///
    /// A no-op returning `None` when nothing is playing.
    pub fn stop(&mut self) -> Option<Throttle> {
        if !self.phase.is_live() {
            return None;
        }
        self.phase = PlaybackPhase::Stopped;
        self.throttle.take()
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio::sync::mpsc;

    fn throttle() -> (Throttle, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(1);
        (Throttle::new(1_000, tx), rx)
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let mut session = PlaybackSession::new();
        assert_eq!(session.phase(), PlaybackPhase::Idle);

        assert!(session.begin_probe(PathBuf::from("song.mp3")));
        assert_eq!(session.phase(), PlaybackPhase::Probing);

        let (first, _rx) = throttle();
        assert!(session.on_playing(16_000, first));
        assert_eq!(session.phase(), PlaybackPhase::Playing);
        assert_eq!(session.bitrate, 16_000);

        assert!(session.begin_mix());
        assert_eq!(session.phase(), PlaybackPhase::Mixing);

        let (second, _rx2) = throttle();
        let retired = session.commit_mix(second);
        assert!(retired.is_some());
        assert_eq!(session.phase(), PlaybackPhase::Playing);
        assert_eq!(session.effects_applied, 1);
        assert_eq!(session.bitrate, 16_000);

        assert!(session.stop().is_some());
        assert_eq!(session.phase(), PlaybackPhase::Stopped);
    }

    #[tokio::test]
    async fn test_start_rejected_while_playing() {
        let mut session = PlaybackSession::new();
        session.begin_probe(PathBuf::from("song.mp3"));
        let (t, _rx) = throttle();
        session.on_playing(1_000, t);

        assert!(!session.begin_probe(PathBuf::from("other.mp3")));
        assert_eq!(session.source, Some(PathBuf::from("song.mp3")));
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let mut session = PlaybackSession::new();

        assert!(session.stop().is_none());
        assert!(session.stop().is_none());
        assert_eq!(session.phase(), PlaybackPhase::Idle);
    }

    #[test]
    fn test_mix_requires_playing() {
        let mut session = PlaybackSession::new();
        assert!(!session.begin_mix());

        session.abort_mix();
        assert_eq!(session.phase(), PlaybackPhase::Idle);
    }

    #[tokio::test]
    async fn test_abort_mix_keeps_throttle() {
        let mut session = PlaybackSession::new();
        session.begin_probe(PathBuf::from("song.mp3"));
        let (t, _rx) = throttle();
        session.on_playing(1_000, t);

        session.begin_mix();
        session.abort_mix();

        assert_eq!(session.phase(), PlaybackPhase::Playing);
        assert!(session.throttle().is_some());
        assert_eq!(session.effects_applied, 0);
    }

    #[tokio::test]
    async fn test_failed_mix_stops_pipeline() {
        let mut session = PlaybackSession::new();
        session.begin_probe(PathBuf::from("song.mp3"));
        let (t, _rx) = throttle();
        session.on_playing(1_000, t);

        assert!(session.fail_mix().is_none());
        assert_eq!(session.phase(), PlaybackPhase::Playing);

        session.begin_mix();
        assert!(session.fail_mix().is_some());
        assert_eq!(session.phase(), PlaybackPhase::Stopped);
        assert!(session.throttle().is_none());
        assert!(session.stop().is_none());
        assert!(session.begin_probe(PathBuf::from("song.mp3")));
    }

    #[tokio::test]
    async fn test_finished_source_reports_stopped() {
        let mut session = PlaybackSession::new();
        session.begin_probe(PathBuf::from("song.mp3"));
        let (t, _rx) = throttle();
        t.end();
        t.finished().await;
        session.on_playing(1_000, t);

        assert_eq!(session.phase(), PlaybackPhase::Stopped);
        assert!(session.begin_probe(PathBuf::from("song.mp3")));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(PlaybackPhase::Mixing.to_string(), "mixing");
        assert!(PlaybackPhase::Stopped.can_start());
        assert!(!PlaybackPhase::Probing.can_start());
    }
}
