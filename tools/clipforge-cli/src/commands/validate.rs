//! Validate a ClipForge project file.

use std::path::PathBuf;

use clipforge_project_model::ProjectFile;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating project at: {}", path.display());

    let project =
        ProjectFile::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    println!("  Name: {}", project.name);
    println!("  Version: {}", project.version);
    println!("  Tracks: {}", project.timeline.tracks.len());
    println!("  Clips: {}", project.clip_count());
    println!("  Library items: {}", project.library.len());

    let errors = project.validate_sources();
    if errors.is_empty() {
        println!("  Sources: All present");
        println!("\nProject is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. Project may not be fully usable.",
            errors.len()
        );
    }

    Ok(())
}
