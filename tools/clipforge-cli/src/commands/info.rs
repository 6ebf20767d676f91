//! Show project information.

use std::path::PathBuf;

use clipforge_common::{format_timecode, AppConfig};

pub fn run(path: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let state = super::load_state(&path, config)?;
    let timeline = &state.timeline;

    println!("Project: {}", state.name);
    println!("  Created: {}", state.created_at);
    println!();

    println!("Timeline:");
    println!("  Duration: {}", format_timecode(timeline.duration()));
    println!("  Playhead: {}", format_timecode(timeline.playhead_position()));
    println!("  Zoom: {} px/s", timeline.zoom());
    println!();

    for track in timeline.tracks() {
        let mut flags = Vec::new();
        if !track.is_visible {
            flags.push("hidden");
        }
        if track.is_muted {
            flags.push("muted");
        }
        println!(
            "Track {} ({}) {}",
            track.name,
            track.id,
            if flags.is_empty() {
                String::new()
            } else {
                format!("[{}]", flags.join(", "))
            }
        );
        for clip in track.clips_by_start() {
            println!(
                "  {:>8} - {:<8} {} (source {:.2}s..{:.2}s)",
                format_timecode(clip.start_time),
                format_timecode(clip.end()),
                clip.name,
                clip.trim_start,
                clip.trim_end,
            );
        }
    }
    println!();

    println!("Library ({} items):", state.library.len());
    for item in state.library.items() {
        let size = item
            .metadata
            .as_ref()
            .map(|m| format!(", {}x{} {}", m.width, m.height, m.codec))
            .unwrap_or_default();
        println!(
            "  {} ({}{})",
            item.name,
            format_timecode(item.duration),
            size
        );
    }

    Ok(())
}
