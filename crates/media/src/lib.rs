//! ClipForge Media
//!
//! Everything that touches source files before they reach the timeline:
//! - **Probe:** duration, stream metadata, and a representative thumbnail
//! - **Resolver:** at-most-once derivation per source path, with a timeout
//! - **Import:** batch import where every failure is a per-file skip
//! - **Capture:** finalizing raw recordings into importable files

pub mod capture;
pub mod error;
pub mod import;
pub mod probe;
pub mod resolver;

pub use capture::{finalize_recording, recording_file_name, CaptureKind, FinishedRecording};
pub use error::{CaptureError, MetadataExtractionError};
pub use import::{import_files, import_recordings, ImportReport, ImportSkip};
pub use probe::{FfprobeProbe, MediaProbe, ProbeInfo};
pub use resolver::{MediaResolver, ResolvedMedia};
