//! Import media files into a project.

use std::path::PathBuf;
use std::sync::Arc;

use clipforge_common::AppConfig;
use clipforge_media::{import_files, FfprobeProbe, MediaResolver};
use clipforge_project_model::{EditorStore, TrackId, DEFAULT_TRACK_ID};

pub async fn run(
    path: PathBuf,
    files: Vec<PathBuf>,
    append: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let probe = FfprobeProbe::new();
    if !probe.is_available() {
        anyhow::bail!("ffprobe and ffmpeg must be installed to import media");
    }

    let store = EditorStore::new(super::load_state(&path, config)?);
    let resolver = MediaResolver::new(Arc::new(probe), config.media.clone());

    println!("Importing {} file(s) into {}", files.len(), path.display());
    let report = import_files(&store, &resolver, &files).await;

    for added in &report.added {
        println!("  [OK]   {}", added.display());
    }
    for existing in &report.existing {
        println!("  [SKIP] {} (already in library)", existing.display());
    }
    for skip in &report.skipped {
        println!("  [FAIL] {}: {}", skip.path.display(), skip.reason);
    }

    if append {
        let track = TrackId::new(DEFAULT_TRACK_ID);
        let placed = store.update(|state| {
            let mut placed = 0;
            for source in report.available() {
                let Some(item) = state.library.get(source).cloned() else {
                    continue;
                };
                match state.timeline.append_source(&track, &item) {
                    Ok(_) => placed += 1,
                    Err(e) => tracing::warn!(path = %source.display(), error = %e, "Could not place clip"),
                }
            }
            placed
        });
        println!("  Placed {placed} clip(s) on {track}");
    }

    super::save_state(&path, &store.snapshot())?;
    println!(
        "\n{} added, {} already present, {} skipped.",
        report.added.len(),
        report.existing.len(),
        report.skipped.len()
    );

    Ok(())
}
