//! Client registry for broadcast fan-out
//!
//! The registry holds every connected listener and replicates each chunk of
//! the live pipeline to all of them.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<ClientRegistry>
//!                  ┌─────────────────────────────┐
//!                  │ clients: HashMap<ClientId,  │
//!                  │   ClientSink { tx }         │
//!                  │ >                           │
//!                  └──────────────┬──────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!   [ClientStream]          [ClientStream]          [ClientStream]
//!   stream.recv()           stream.recv()           stream.recv()
//! ```
//!
//! # Zero-Copy Design
//!
//! Chunks are `bytes::Bytes`, so every client shares the same allocation.
//! Writes use `try_send` and never wait on a client; one slow listener cannot
//! stall the others.

pub mod client;
pub mod store;

pub use client::{ClientId, ClientStream};
pub use store::{BroadcastReport, ClientRegistry};
