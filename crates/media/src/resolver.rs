//! At-most-once media resolution per source path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use clipforge_common::MediaDefaults;
use clipforge_project_model::{LibraryItem, Thumbnail, VideoMetadata};
use tokio::sync::OnceCell;

use crate::error::MetadataExtractionError;
use crate::probe::MediaProbe;

/// Everything derived from a source file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMedia {
    pub duration: f64,
    pub metadata: VideoMetadata,
    pub thumbnail: Option<Thumbnail>,
}

impl ResolvedMedia {
    pub fn into_library_item(self, path: impl Into<PathBuf>) -> LibraryItem {
        let mut item = LibraryItem::new(path, self.duration);
        item.metadata = Some(self.metadata);
        item.thumbnail = self.thumbnail;
        item
    }
}

/// Offset at which the representative frame is taken.
pub fn thumbnail_offset(duration: f64, max_offset: f64) -> f64 {
    max_offset.min(duration / 2.0).max(0.0)
}

/// Resolves sources through a [`MediaProbe`], caching successes per path.
///
/// Concurrent requests for the same path share one derivation. Failures are
/// not cached, so a later request retries.
pub struct MediaResolver {
    probe: Arc<dyn MediaProbe>,
    settings: MediaDefaults,
    cache: Mutex<HashMap<PathBuf, Arc<OnceCell<ResolvedMedia>>>>,
}

impl MediaResolver {
    pub fn new(probe: Arc<dyn MediaProbe>, settings: MediaDefaults) -> Self {
        Self {
            probe,
            settings,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &MediaDefaults {
        &self.settings
    }

    pub async fn resolve(&self, path: &Path) -> Result<ResolvedMedia, MetadataExtractionError> {
        let cell = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_path_buf())
            .or_default()
            .clone();

        cell.get_or_try_init(|| self.derive(path)).await.cloned()
    }

    /// Result of an earlier successful resolution, if any.
    pub fn cached(&self, path: &Path) -> Option<ResolvedMedia> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .and_then(|cell| cell.get().cloned())
    }

    /// Pre-populate the cache from an existing library entry.
    pub fn seed(&self, item: &LibraryItem) {
        let resolved = ResolvedMedia {
            duration: item.duration,
            metadata: item.metadata.clone().unwrap_or_default(),
            thumbnail: item.thumbnail.clone(),
        };
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let cell = cache.entry(item.file_path.clone()).or_default();
        // Already resolved or resolving; keep that.
        let _ = cell.set(resolved);
    }

    async fn derive(&self, path: &Path) -> Result<ResolvedMedia, MetadataExtractionError> {
        let timeout = self.settings.metadata_timeout();
        let started = tokio::time::Instant::now();

        let info = tokio::time::timeout(timeout, self.probe.probe(path))
            .await
            .map_err(|_| MetadataExtractionError::Timeout {
                path: path.to_path_buf(),
                timeout,
            })??;

        if !info.duration.is_finite() || info.duration <= 0.0 {
            return Err(MetadataExtractionError::InvalidDuration {
                path: path.to_path_buf(),
                duration: info.duration,
            });
        }

        let at = thumbnail_offset(info.duration, self.settings.thumbnail_max_offset_secs);
        let remaining = timeout.saturating_sub(started.elapsed());
        let thumbnail = match tokio::time::timeout(remaining, self.probe.thumbnail(path, at)).await {
            Ok(Ok(thumbnail)) => Some(thumbnail),
            Ok(Err(e)) => {
                tracing::warn!(path = %path.display(), error = %e, "Thumbnail unavailable");
                None
            }
            Err(_) => {
                tracing::warn!(path = %path.display(), "Thumbnail timed out");
                None
            }
        };

        tracing::debug!(
            path = %path.display(),
            duration = info.duration,
            width = info.metadata.width,
            height = info.metadata.height,
            probe = self.probe.name(),
            elapsed_ms = started.elapsed().as_millis(),
            "Media resolved"
        );

        Ok(ResolvedMedia {
            duration: info.duration,
            metadata: info.metadata,
            thumbnail,
        })
    }
}

impl std::fmt::Debug for MediaResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaResolver")
            .field("probe", &self.probe.name())
            .field("settings", &self.settings)
            .finish()
    }
}
