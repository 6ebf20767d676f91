pub mod export;
pub mod import;
pub mod info;
pub mod init;
pub mod preview;
pub mod validate;

use std::path::Path;

use clipforge_common::AppConfig;
use clipforge_project_model::{EditorState, ProjectFile};

/// Load a project file into editor state.
pub(crate) fn load_state(path: &Path, config: &AppConfig) -> anyhow::Result<EditorState> {
    let project =
        ProjectFile::load(path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    Ok(project.into_state(&config.editor))
}

pub(crate) fn save_state(path: &Path, state: &EditorState) -> anyhow::Result<()> {
    ProjectFile::snapshot(state)
        .save(path)
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))
}
