//! ClipForge Common Utilities
//!
//! Shared infrastructure for all ClipForge crates:
//! - Error types and result aliases
//! - Timecode formatting and throttling utilities
//! - Transport signals between the editing surface and playback
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod signal;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use signal::*;
