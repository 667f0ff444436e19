//! Effect splicing
//!
//! Splicing hot-swaps the stage in front of the broadcaster:
//!
//! ```text
//! before:  source ──► Throttle A ──► feed
//! after:   source ──► mixer(stdin) ··· mixer(stdout) ──► Throttle B ──► feed
//! ```
//!
//! Throttle B exists and holds a feed handle before anything is detached.
//! Throttle A hands its upstream over only after it finished forwarding any
//! chunk already read, and the shared feed keeps A's chunks ahead of B's.
//! Listeners therefore see one continuous byte sequence.

use std::path::Path;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::audio::{AudioTool, MixSettings};
use crate::error::{Error, Result};
use crate::pipeline::Throttle;
use crate::session::PlaybackSession;

/// Splices effects into the live pipeline
#[derive(Debug, Clone)]
pub struct EffectMixer {
    tool: AudioTool,
    settings: MixSettings,
}

impl EffectMixer {
    pub fn new(tool: AudioTool, settings: MixSettings) -> Self {
        Self { tool, settings }
    }

    /// Mix `effect` into whatever `session` is currently playing
    ///
    /// The new throttle runs at the session's existing bitrate. On failure the
    /// session keeps its current throttle and phase.
    pub async fn splice(
        &self,
        session: &mut PlaybackSession,
        effect: &Path,
        feed: mpsc::Sender<Bytes>,
    ) -> Result<()> {
        if !session.begin_mix() {
            return Err(Error::NotPlaying);
        }

        let outcome = self.build(session, effect, feed).await;
        settle(session, effect, outcome)
    }

    async fn build(
        &self,
        session: &PlaybackSession,
        effect: &Path,
        feed: mpsc::Sender<Bytes>,
    ) -> std::result::Result<Throttle, SpliceFailure> {
        let next = Throttle::new(session.bitrate, feed);
        let mix = self
            .tool
            .spawn_mix(effect, &self.settings)
            .map_err(SpliceFailure::Intact)?;

        let current = session
            .throttle()
            .ok_or(SpliceFailure::Intact(Error::NotPlaying))?;
        let main = match current.detach().await {
            Some(main) => main,
            None => {
                mix.abort();
                return Err(SpliceFailure::Intact(Error::NotPlaying));
            }
        };

        let merged = mix.pipe(main);
        next.attach(merged).map_err(|_| {
            SpliceFailure::Lost(Error::Pipe("new throttle exited before the splice".into()))
        })?;

        Ok(next)
    }
}

/// Why a splice did not complete
#[derive(Debug)]
enum SpliceFailure {
    /// The current throttle still owns its upstream
    Intact(Error),
    /// The upstream already left the current throttle and is gone
    Lost(Error),
}

/// Apply the outcome of a splice attempt to the session
fn settle(
    session: &mut PlaybackSession,
    effect: &Path,
    outcome: std::result::Result<Throttle, SpliceFailure>,
) -> Result<()> {
    match outcome {
        Ok(next) => {
            if let Some(retired) = session.commit_mix(next) {
                // Already detached and idle; ending it only frees the task
                retired.end();
            }
            tracing::info!(
                effect = %effect.display(),
                bitrate = session.bitrate,
                effects = session.effects_applied,
                "Effect spliced"
            );
            Ok(())
        }
        Err(SpliceFailure::Intact(e)) => {
            session.abort_mix();
            tracing::warn!(effect = %effect.display(), error = %e, "Effect splice failed");
            Err(e)
        }
        Err(SpliceFailure::Lost(e)) => {
            if let Some(idle) = session.fail_mix() {
                idle.end();
            }
            tracing::error!(
                effect = %effect.display(),
                error = %e,
                "Effect splice lost the source, playback stopped"
            );
            Err(e)
        }
    }
}
