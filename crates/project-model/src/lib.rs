//! ClipForge Project Model
//!
//! Defines the authoritative editing state:
//! - **Clips:** trimmed placements of source files on a track
//! - **Timeline:** tracks, playhead, zoom, selection, and duration
//! - **Library:** imported source files, one entry per path
//! - **Project:** the versioned on-disk snapshot of timeline + library
//! - **Store:** the shared, explicitly owned container for all of the above
//!
//! All times are `f64` seconds. The model performs no media I/O.

pub mod clip;
pub mod library;
pub mod project;
pub mod store;
pub mod timeline;

pub use clip::*;
pub use library::*;
pub use project::*;
pub use store::*;
pub use timeline::*;
