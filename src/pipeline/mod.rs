//! Playback pipeline stages
//!
//! ```text
//!   source file ──► Throttle ──┐
//!                              ├──► feed ──► Broadcaster pump ──► ClientRegistry
//!   mixer stdout ─► Throttle ──┘
//! ```
//!
//! Exactly one throttle holds an upstream at a time. Splicing an effect moves
//! the upstream out of the active throttle and into the mixer, whose output
//! becomes the upstream of a new throttle writing into the same feed.

pub mod broadcaster;
pub mod throttle;

pub use broadcaster::Broadcaster;
pub use throttle::{Throttle, ThrottleExit, Upstream};
