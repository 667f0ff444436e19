//! HTTP transport
//!
//! A thin layer over [`Controller`](crate::controller::Controller): pages,
//! static files, the command endpoint and the listener stream.

pub mod config;
pub mod listener;
pub mod routes;

pub use config::ServerConfig;
pub use listener::RadioServer;
pub use routes::{router, AppState};
