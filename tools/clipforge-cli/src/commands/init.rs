//! Initialize a new ClipForge project.

use std::path::PathBuf;

use clipforge_common::AppConfig;
use clipforge_project_model::{EditorState, PROJECT_EXTENSION};

pub fn run(name: String, output: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let path = output.join(format!("{name}.{PROJECT_EXTENSION}"));
    if path.exists() {
        anyhow::bail!("Project already exists: {}", path.display());
    }

    println!("Creating project '{}' at {}", name, path.display());
    let state = EditorState::with_defaults(&name, &config.editor);
    super::save_state(&path, &state)?;

    println!("Project created successfully:");
    println!("  File: {}", path.display());
    println!("  Tracks: {}", state.timeline.tracks().len());
    println!("  Zoom: {} px/s", state.timeline.zoom());
    println!();
    println!("Next: clipforge import {} <FILES> --append", path.display());

    Ok(())
}
