//! ClipForge Edit Interaction Layer
//!
//! Translates pointer gestures into timeline mutations, continuously during
//! a drag. Every proposal is validated here before it reaches the model:
//! - Trims never shrink a clip below the minimum length
//! - Moves are snapped so clips on a track never overlap
//! - Playhead drags keep a fixed grab offset and drive transport signals

pub mod commands;
pub mod drag;
pub mod playhead;
pub mod trim;

pub use commands::*;
pub use drag::*;
pub use playhead::*;
pub use trim::*;
