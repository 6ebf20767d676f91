//! Batch import into the media library.
//!
//! Every per-file failure becomes an [`ImportSkip`]; a batch never aborts.

use std::path::{Path, PathBuf};

use clipforge_project_model::{EditorStore, LibraryItem};

use crate::capture::FinishedRecording;
use crate::error::MetadataExtractionError;
use crate::resolver::{MediaResolver, ResolvedMedia};

/// A file that was not imported, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSkip {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of an import batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Newly added to the library.
    pub added: Vec<PathBuf>,
    /// Already in the library; reused without re-deriving.
    pub existing: Vec<PathBuf>,
    pub skipped: Vec<ImportSkip>,
}

impl ImportReport {
    /// Paths now available in the library (new or reused), in request order.
    pub fn available(&self) -> impl Iterator<Item = &PathBuf> {
        self.added.iter().chain(self.existing.iter())
    }

    fn skip(&mut self, path: &Path, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(path = %path.display(), %reason, "Import skipped");
        self.skipped.push(ImportSkip {
            path: path.to_path_buf(),
            reason,
        });
    }
}

/// Import files into the library held by `store`.
pub async fn import_files<I, P>(store: &EditorStore, resolver: &MediaResolver, paths: I) -> ImportReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut report = ImportReport::default();

    for path in paths {
        let path = path.as_ref();
        if !resolver.settings().is_supported(path) {
            report.skip(path, "unsupported file type");
            continue;
        }
        if reuse_existing(store, resolver, path) {
            report.existing.push(path.to_path_buf());
            continue;
        }

        match resolver.resolve(path).await {
            Ok(resolved) => add_to_library(store, path, resolved, &mut report),
            Err(e) => report.skip(path, e.to_string()),
        }
    }

    tracing::info!(
        added = report.added.len(),
        existing = report.existing.len(),
        skipped = report.skipped.len(),
        "Import finished"
    );
    report
}

/// Import finalized recordings.
///
/// Recordings often carry no container duration; the recorded wall-clock
/// length is used in that case.
pub async fn import_recordings(
    store: &EditorStore,
    resolver: &MediaResolver,
    recordings: &[FinishedRecording],
) -> ImportReport {
    let mut report = ImportReport::default();

    for recording in recordings {
        let path = recording.path.as_path();
        if reuse_existing(store, resolver, path) {
            report.existing.push(path.to_path_buf());
            continue;
        }

        match resolver.resolve(path).await {
            Ok(resolved) => add_to_library(store, path, resolved, &mut report),
            Err(MetadataExtractionError::InvalidDuration { .. }) if recording.recorded_secs > 0.0 => {
                tracing::debug!(
                    path = %path.display(),
                    recorded_secs = recording.recorded_secs,
                    "Recording has no container duration; using recorded length"
                );
                let item = LibraryItem::new(path, recording.recorded_secs);
                store.update(|s| s.library.add(item));
                report.added.push(path.to_path_buf());
            }
            Err(e) => report.skip(path, e.to_string()),
        }
    }

    report
}

fn reuse_existing(store: &EditorStore, resolver: &MediaResolver, path: &Path) -> bool {
    match store.read(|s| s.library.get(path).cloned()) {
        Some(item) => {
            resolver.seed(&item);
            true
        }
        None => false,
    }
}

fn add_to_library(
    store: &EditorStore,
    path: &Path,
    resolved: ResolvedMedia,
    report: &mut ImportReport,
) {
    let item = resolved.into_library_item(path);
    if store.update(|s| s.library.add(item)) {
        report.added.push(path.to_path_buf());
    } else {
        report.existing.push(path.to_path_buf());
    }
}
