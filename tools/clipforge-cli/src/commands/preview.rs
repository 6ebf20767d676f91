//! Headless timeline preview on a simulated surface.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clipforge_common::{format_timecode, AppConfig};
use clipforge_playback::{PlaybackMode, PlaybackSynchronizer, SimulatedSurface};
use clipforge_project_model::EditorStore;

pub async fn run(
    path: PathBuf,
    from: f64,
    limit: Option<f64>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let state = super::load_state(&path, config)?;

    // Only sources that exist on disk are decodable.
    let surface = Arc::new(SimulatedSurface::new());
    let sources = state
        .library
        .items()
        .iter()
        .map(|item| (item.file_path.clone(), item.duration))
        .chain(
            state
                .timeline
                .clips()
                .map(|clip| (clip.file_path.clone(), clip.duration)),
        );
    for (source, duration) in sources {
        if source.exists() {
            surface.register(source, duration);
        } else {
            tracing::warn!(path = %source.display(), "Source missing, it will fail to load");
        }
    }

    let store = EditorStore::new(state);
    let start = store.set_playhead(from);
    let sync = PlaybackSynchronizer::new(store.clone(), surface.clone(), config);
    let pump = sync.spawn_progress_pump();

    println!(
        "Previewing {} from {} (duration {})",
        path.display(),
        format_timecode(start),
        format_timecode(store.timeline(|tl| tl.duration()))
    );

    if let Err(e) = sync.play().await {
        pump.abort();
        anyhow::bail!(e.user_message());
    }

    let started = tokio::time::Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                sync.pause();
                println!("\nInterrupted.");
                break;
            }
        }

        let clip = store
            .read(|s| s.timeline.selected_clip().map(|c| c.name.clone()))
            .unwrap_or_else(|| "-".to_string());
        print!(
            "\r  {:>8} / {:<8} {:<13} {}      ",
            format_timecode(store.playhead()),
            format_timecode(store.timeline(|tl| tl.duration())),
            format!("{:?}", sync.mode()),
            clip
        );
        std::io::stdout().flush().ok();

        if let Some(err) = sync.take_error() {
            pump.abort();
            println!();
            anyhow::bail!(err.user_message());
        }
        if matches!(sync.mode(), PlaybackMode::Paused | PlaybackMode::Idle) {
            println!("\nReached the end of the timeline.");
            break;
        }
        if limit.is_some_and(|secs| started.elapsed().as_secs_f64() >= secs) {
            sync.pause();
            println!("\nStopped after {:.1}s.", started.elapsed().as_secs_f64());
            break;
        }
    }

    pump.abort();
    Ok(())
}
