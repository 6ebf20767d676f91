//! ClipForge Playback
//!
//! Drives a single preview surface from the timeline:
//! - **Surface:** the decoding/rendering seam ([`RenderSurface`]) and a
//!   headless [`SimulatedSurface`]
//! - **Synchronizer:** single-flight loads and seeks, clip-boundary
//!   transitions, gap traversal, and scrub handling
//! - **Gate:** the single-slot lock a play request waits on after scrubbing

pub mod error;
pub mod gate;
pub mod surface;
pub mod synchronizer;

pub use error::{PlaybackError, SurfaceError};
pub use gate::{ResyncGate, ResyncGuard};
pub use surface::{RenderSurface, SimulatedSurface};
pub use synchronizer::{ClipSignature, PlaybackMode, PlaybackSynchronizer};
