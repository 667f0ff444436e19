//! External audio tool integration
//!
//! - Bitrate discovery with a fixed fallback
//! - Effect mixing through a child process

pub mod bitrate;
pub mod tool;

pub use bitrate::{normalize_bitrate, parse_bitrate};
pub use tool::{AudioTool, MixProcess, MixSettings};
