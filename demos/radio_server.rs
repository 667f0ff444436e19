//! Radio server demo
//!
//! Run with: cargo run --example radio_server [ROOT_DIR]
//!
//! ROOT_DIR defaults to the current directory and must contain:
//!
//! ```text
//! audio/songs/conversation.mp3
//! audio/fx/*.mp3
//! public/home/index.html
//! public/controller/index.html
//! ```
//!
//! The port comes from `PORT` (default 3000). Requires `sox` with mp3 support
//! on the PATH; without it playback still works at the fallback bitrate but
//! effects fail.
//!
//! ## Listening
//!
//!   ffplay http://localhost:3000/stream
//!
//! ## Controlling
//!
//!   curl -X POST localhost:3000/controller -d '{"command":"start"}' -H 'content-type: application/json'
//!   curl -X POST localhost:3000/controller -d '{"command":"applause"}' -H 'content-type: application/json'
//!   curl -X POST localhost:3000/controller -d '{"command":"stop"}' -H 'content-type: application/json'

use radio_rs::{EngineConfig, RadioServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("radio_rs=info".parse()?),
        )
        .init();

    let root = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let port = match std::env::var("PORT") {
        Ok(port) => port.parse()?,
        Err(_) => radio_rs::server::config::DEFAULT_PORT,
    };

    let engine_config = EngineConfig::with_root(&root);
    let server_config = ServerConfig::default().port(port);

    tracing::info!(
        root = %root,
        song = %engine_config.current_song.display(),
        "Starting radio server"
    );

    let server = RadioServer::new(server_config, engine_config);
    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    let stats = server.engine().stats().await;
    println!(
        "Broadcast {} bytes in {} chunks, {} effects, {} clients evicted",
        stats.bytes_broadcast,
        stats.chunks_broadcast,
        stats.effects_triggered,
        stats.clients_evicted
    );

    Ok(())
}
