//! Broadcast engine
//!
//! [`RadioEngine`] owns the client registry, the broadcaster pump and the
//! playback session. `start`, `stop` and `trigger_effect` all serialize on
//! the session lock, so they never interleave partially.

pub mod config;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::audio::{AudioTool, MixSettings};
use crate::effects::{resolve_effect, EffectMixer};
use crate::error::{Error, Result};
use crate::files;
use crate::pipeline::{Broadcaster, Throttle};
use crate::registry::{ClientId, ClientRegistry, ClientStream};
use crate::session::{PlaybackPhase, PlaybackSession};
use crate::stats::EngineStats;

pub use config::EngineConfig;

/// Live broadcast engine
pub struct RadioEngine {
    config: EngineConfig,
    registry: Arc<ClientRegistry>,
    broadcaster: Broadcaster,
    session: Mutex<PlaybackSession>,
    tool: AudioTool,
    mixer: EffectMixer,
    effects_triggered: AtomicU64,
    shut_down: AtomicBool,
}

impl RadioEngine {
    /// Create an engine and spawn its broadcaster
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: EngineConfig) -> Self {
        let registry = Arc::new(ClientRegistry::with_capacity(config.client_buffer_capacity));
        let broadcaster = Broadcaster::spawn(Arc::clone(&registry), config.feed_capacity);
        let tool = AudioTool::from_config(&config);
        let mixer = EffectMixer::new(tool.clone(), MixSettings::from_config(&config));

        Self {
            config,
            registry,
            broadcaster,
            session: Mutex::new(PlaybackSession::new()),
            tool,
            mixer,
            effects_triggered: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Client registry shared with the broadcaster
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Register a listener
    pub async fn register_client(&self) -> (ClientId, ClientStream) {
        self.registry.register().await
    }

    /// Remove a listener
    pub async fn unregister_client(&self, id: ClientId) {
        self.registry.unregister(id).await;
    }

    /// Start playing the configured song
    ///
    /// Probes the bitrate (falling back on failure), opens the song and
    /// wires it through a new throttle into the broadcaster. Rejected with
    /// [`Error::AlreadyPlaying`] while a pipeline is live, and with
    /// [`Error::Pipe`] once the engine has been shut down.
    pub async fn start(&self) -> Result<()> {
        let song = self.config.current_song.clone();
        let mut session = self.session.lock().await;

        if self.is_shut_down() {
            tracing::warn!("Start rejected after shutdown");
            return Err(Error::Pipe("engine shut down".into()));
        }

        if !session.begin_probe(song.clone()) {
            tracing::warn!(phase = %session.phase(), "Start rejected");
            return Err(Error::AlreadyPlaying);
        }

        tracing::info!(song = %song.display(), "Starting playback");

        let bits = self.tool.probe(&song).await;
        let rate = self.config.pacing_rate(bits);

        let source = match files::open_read_stream(&song).await {
            Ok(source) => source,
            Err(e) => {
                session.abort_probe();
                tracing::error!(song = %song.display(), error = %e, "Failed to open song");
                return Err(e);
            }
        };

        let throttle = Throttle::with_upstream(rate, self.broadcaster.feed(), Box::new(source));
        session.on_playing(rate, throttle);

        tracing::info!(song = %song.display(), bitrate = bits, rate, "Playback started");
        Ok(())
    }

    /// Stop playback
    ///
    /// Ends the active throttle. Client streams stay open. A no-op when
    /// nothing is playing.
    pub async fn stop(&self) {
        let mut session = self.session.lock().await;

        match session.stop() {
            Some(throttle) => {
                throttle.end();
                tracing::info!(forwarded = throttle.bytes_forwarded(), "Playback stopped");
            }
            None => tracing::debug!(phase = %session.phase(), "Stop ignored"),
        }
    }

    /// Mix the effect matching `name` into the live stream
    ///
    /// Fails with [`Error::NotFound`] when no effect matches, and with
    /// [`Error::NotPlaying`] when there is nothing to mix into. A trigger
    /// while another effect is still audible mixes over the previous mix.
    pub async fn trigger_effect(&self, name: &str) -> Result<PathBuf> {
        let effect = resolve_effect(&self.config.fx_dir, name).await?;

        let mut session = self.session.lock().await;
        self.mixer
            .splice(&mut session, &effect, self.broadcaster.feed())
            .await?;

        self.effects_triggered.fetch_add(1, Ordering::Relaxed);
        Ok(effect)
    }

    /// Current playback phase
    pub async fn phase(&self) -> PlaybackPhase {
        self.session.lock().await.phase()
    }

    /// Snapshot of engine counters
    pub async fn stats(&self) -> EngineStats {
        let session = self.session.lock().await;

        EngineStats {
            phase: session.phase(),
            bitrate: session.bitrate,
            clients: self.registry.client_count().await,
            chunks_broadcast: self.broadcaster.chunks_broadcast(),
            bytes_broadcast: self.broadcaster.bytes_broadcast(),
            clients_evicted: self.registry.evicted_count(),
            effects_triggered: self.effects_triggered.load(Ordering::Relaxed),
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Stop playback, disconnect every client and halt the broadcaster
    ///
    /// The engine cannot play again afterwards.
    pub async fn shutdown(&self) {
        {
            // Flag under the session lock so no start slips in between
            let _session = self.session.lock().await;
            self.shut_down.store(true, Ordering::Release);
        }
        self.stop().await;
        self.broadcaster.shutdown();
        self.registry.clear().await;

        tracing::info!("Engine shut down");
    }
}
