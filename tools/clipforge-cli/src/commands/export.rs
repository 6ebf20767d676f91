//! Export a project to video.

use std::io::Write;
use std::path::PathBuf;

use clipforge_common::AppConfig;
use clipforge_render_engine::{export_timeline, ExportProgress, ExportRequest, ExportResolution, ProgressCallback};

pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    resolution: ExportResolution,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Exporting project at: {}", path.display());

    let state = super::load_state(&path, config)?;
    let output_path = output.unwrap_or_else(|| path.with_extension("mp4"));

    let request = ExportRequest::from_timeline(
        &state.timeline,
        resolution,
        &output_path,
        config.export.clone(),
    )?;

    println!("  Output: {}", output_path.display());
    println!("  Resolution: {resolution}");
    println!("  Clips: {}", request.segments.len());
    println!("  Length: {:.1}s", request.total_duration());

    let progress_cb: ProgressCallback = Box::new(|p: ExportProgress| {
        let clip = p
            .current_clip
            .map(|i| format!(" clip {}/{}", i + 1, p.total_clips))
            .unwrap_or_default();
        print!("\r  Progress: {:5.1}% ({:?}{clip})      ", p.percent, p.stage);
        std::io::stdout().flush().ok();
    });

    match export_timeline(request, Some(progress_cb)).await {
        Ok(out) => {
            println!("\nExport complete: {}", out.display());
            Ok(())
        }
        Err(e) => {
            println!("\nExport failed: {e}");
            Err(e.into())
        }
    }
}
