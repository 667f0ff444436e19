//! Command dispatch
//!
//! The controller is the surface the transport layer talks to: it turns
//! free-form commands into engine operations and hands out listener streams
//! that unregister themselves when dropped.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use serde::{Deserialize, Serialize};

use crate::engine::RadioEngine;
use crate::error::Result;
use crate::registry::{ClientId, ClientRegistry, ClientStream};

/// A parsed controller command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    /// Anything else names an effect
    Effect(String),
}

impl Command {
    /// Parse a command; matching is case-insensitive and by substring
    pub fn parse(raw: &str) -> Self {
        let cmd = raw.trim().to_lowercase();

        if cmd.contains("start") {
            Command::Start
        } else if cmd.contains("stop") {
            Command::Stop
        } else {
            Command::Effect(cmd)
        }
    }
}

/// Body of a command request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// Body of a successful command response, `{"result":"ok"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub result: String,
}

impl CommandResponse {
    pub fn ok() -> Self {
        Self {
            result: "ok".to_string(),
        }
    }
}

/// Front door to the engine
#[derive(Clone)]
pub struct Controller {
    engine: Arc<RadioEngine>,
}

impl Controller {
    pub fn new(engine: Arc<RadioEngine>) -> Self {
        Self { engine }
    }

    /// Engine behind this controller
    pub fn engine(&self) -> &Arc<RadioEngine> {
        &self.engine
    }

    /// Run one command
    pub async fn handle_command(&self, raw: &str) -> Result<CommandResponse> {
        tracing::info!(command = raw, "Command received");

        match Command::parse(raw) {
            Command::Start => self.engine.start().await?,
            Command::Stop => self.engine.stop().await,
            Command::Effect(name) => {
                let effect = self.engine.trigger_effect(&name).await?;
                tracing::debug!(effect = %effect.display(), "Effect applied");
            }
        }

        Ok(CommandResponse::ok())
    }

    /// Register a listener whose stream unregisters itself on drop
    pub async fn create_client_stream(&self) -> ListenerStream {
        tracing::info!("Creating client stream");
        let (id, inner) = self.engine.register_client().await;

        ListenerStream {
            id,
            inner,
            registry: Arc::clone(self.engine.registry()),
        }
    }
}

/// A listener stream tied to its registration
pub struct ListenerStream {
    id: ClientId,
    inner: ClientStream,
    registry: Arc<ClientRegistry>,
}

impl ListenerStream {
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Wait for the next chunk
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.inner.recv().await
    }
}

impl Stream for ListenerStream {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for ListenerStream {
    fn drop(&mut self) {
        tracing::info!(client_id = %self.id, "Closing connection");
        self.inner.close();

        // Closed sinks are pruned on the next broadcast anyway; this only
        // removes the entry sooner when playback is stopped.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let registry = Arc::clone(&self.registry);
            let id = self.id;
            handle.spawn(async move {
                registry.unregister(id).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::EngineConfig;
    use crate::error::Error;
    use crate::session::PlaybackPhase;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("start"), Command::Start);
        assert_eq!(Command::parse("START the show"), Command::Start);
        assert_eq!(Command::parse("Stop"), Command::Stop);
        assert_eq!(
            Command::parse("Applause"),
            Command::Effect("applause".to_string())
        );
    }

    #[test]
    fn test_response_json() {
        let body = serde_json::to_string(&CommandResponse::ok()).unwrap();
        assert_eq!(body, r#"{"result":"ok"}"#);

        let req: CommandRequest = serde_json::from_str(r#"{"command":"boo"}"#).unwrap();
        assert_eq!(req.command, "boo");
    }

    fn controller(dir: &std::path::Path) -> Controller {
        let song = dir.join("song.mp3");
        std::fs::write(&song, vec![1u8; 40_000]).unwrap();
        std::fs::create_dir(dir.join("fx")).unwrap();

        let config = EngineConfig::with_root(dir)
            .audio_tool("/nonexistent/radio-rs-sox")
            .song(song)
            .fx_dir(dir.join("fx"));
        Controller::new(Arc::new(RadioEngine::new(config)))
    }

    #[tokio::test]
    async fn test_start_stop_commands() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path());

        let response = controller.handle_command("start").await.unwrap();
        assert_eq!(response, CommandResponse::ok());
        assert_eq!(controller.engine().phase().await, PlaybackPhase::Playing);

        controller.handle_command("stop").await.unwrap();
        controller.handle_command("stop").await.unwrap();
        assert_eq!(controller.engine().phase().await, PlaybackPhase::Stopped);
    }

    #[tokio::test]
    async fn test_unknown_command_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path());

        let err = controller.handle_command("missingfx").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_dropped_stream_unregisters() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path());
        let registry = Arc::clone(controller.engine().registry());

        let stream = controller.create_client_stream().await;
        let id = stream.id();
        assert!(registry.contains(id).await);

        drop(stream);

        let gone = tokio::time::timeout(Duration::from_secs(1), async {
            while registry.contains(id).await {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(gone.is_ok());
    }
}
