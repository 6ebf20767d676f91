//! ClipForge Render Engine
//!
//! Turns the timeline into a single MP4 file.
//!
//! # Pipeline
//!
//! ```text
//! one clip:    source ── trim ── (scale) ── encode ──▶ output.mp4
//!
//! many clips:  clip_0 ── trim ── scale/pad ──┐
//!              clip_1 ── trim ── scale/pad ──┼── concat ── encode ──▶ output.mp4
//!              clip_n ── trim ── scale/pad ──┘
//!              (0-50%)                          (50-100%)
//! ```
//!
//! Clips from every track are concatenated in timeline order.

pub mod export;

pub use export::*;
