//! # radio-rs
//!
//! Live audio broadcast engine. One source plays continuously to any number
//! of listeners, paced to real time, and an operator can splice short sound
//! effects into the stream without interrupting anyone.
//!
//! ## Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   probe    ┌──────────────┐
//!   │  song file   │ ─────────► │  sox --i -B  │  bitrate (fallback 128k)
//!   └──────┬───────┘            └──────────────┘
//!          │ bytes
//!          ▼
//!   ┌──────────────┐            ┌──────────────┐
//!   │  Throttle A  │ ─ splice ► │ sox -m (fx)  │ ──► Throttle B
//!   └──────┬───────┘            └──────────────┘         │
//!          │                                             │
//!          └──────────────────► feed ◄───────────────────┘
//!                                 │
//!                                 ▼
//!                        ┌──────────────────┐
//!                        │ Broadcaster pump │
//!                        └────────┬─────────┘
//!                                 ▼
//!                        ┌──────────────────┐
//!                        │  ClientRegistry  │ ──► listener, listener, ...
//!                        └──────────────────┘
//! ```
//!
//! [`RadioEngine`] is the core; [`Controller`](controller::Controller) maps
//! free-form commands onto it and [`RadioServer`](server::RadioServer) puts
//! it behind HTTP.
//!
//! ```no_run
//! use radio_rs::{EngineConfig, RadioEngine};
//!
//! # async fn example() -> radio_rs::Result<()> {
//! let engine = RadioEngine::new(EngineConfig::with_root("/srv/radio"));
//! let (_id, mut listener) = engine.register_client().await;
//!
//! engine.start().await?;
//! while let Some(chunk) = listener.recv().await {
//!     println!("{} bytes", chunk.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod controller;
pub mod effects;
pub mod engine;
pub mod error;
pub mod files;
pub mod pipeline;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use engine::{EngineConfig, RadioEngine};
pub use error::{Error, Result};
pub use server::{RadioServer, ServerConfig};
