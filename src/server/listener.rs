//! HTTP server listener
//!
//! Binds the configured address and serves the router until shut down.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::config::ServerConfig;
use super::routes::{router, AppState};
use crate::controller::Controller;
use crate::engine::{EngineConfig, RadioEngine};
use crate::error::Result;

/// HTTP front end for a [`RadioEngine`]
pub struct RadioServer {
    config: ServerConfig,
    controller: Controller,
}

impl RadioServer {
    /// Create a server around a new engine
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: ServerConfig, engine_config: EngineConfig) -> Self {
        Self::with_engine(config, Arc::new(RadioEngine::new(engine_config)))
    }

    /// Create a server around an existing engine
    pub fn with_engine(config: ServerConfig, engine: Arc<RadioEngine>) -> Self {
        Self {
            config,
            controller: Controller::new(engine),
        }
    }

    /// Engine driven by this server
    pub fn engine(&self) -> &Arc<RadioEngine> {
        self.controller.engine()
    }

    /// Router serving this engine, for embedding or testing
    pub fn router(&self) -> axum::Router {
        router(AppState::new(self.controller.clone(), self.config.clone()))
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    ///
    /// Playback is stopped and listeners are disconnected once `shutdown`
    /// resolves.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Radio server listening");

        let engine = Arc::clone(self.engine());
        let shutdown = async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
            // Listener bodies never end on their own; close them so the
            // graceful shutdown can complete
            engine.shutdown().await;
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Radio server stopped");
        Ok(())
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
