//! ClipForge CLI: create, inspect, import into, preview, and export projects.
//!
//! Usage:
//!   clipforge init <NAME>                Create an empty project file
//!   clipforge info <PROJECT>             Show project information
//!   clipforge import <PROJECT> <FILES>   Import media into the library
//!   clipforge validate <PROJECT>         Check that referenced sources exist
//!   clipforge preview <PROJECT>          Play the timeline headlessly
//!   clipforge export <PROJECT>           Render the timeline to a video file

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clipforge_common::AppConfig;
use clipforge_render_engine::ExportResolution;

mod commands;

#[derive(Parser)]
#[command(
    name = "clipforge",
    about = "Timeline video editing from the command line",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    Init {
        /// Project name
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show project information
    Info {
        /// Path to the project file
        path: PathBuf,
    },

    /// Import media files into a project's library
    Import {
        /// Path to the project file
        path: PathBuf,

        /// Files to import
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also place each imported file at the end of the first track
        #[arg(long)]
        append: bool,
    },

    /// Check that every referenced source file exists
    Validate {
        /// Path to the project file
        path: PathBuf,
    },

    /// Play the timeline on a simulated surface, printing the playhead
    Preview {
        /// Path to the project file
        path: PathBuf,

        /// Start position in timeline seconds
        #[arg(long, default_value = "0")]
        from: f64,

        /// Stop after this many seconds of wall-clock playback
        #[arg(long)]
        limit: Option<f64>,
    },

    /// Export a project to video
    Export {
        /// Path to the project file
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output resolution: 720p, 1080p, or source
        #[arg(short, long, default_value = "source")]
        resolution: ExportResolution,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    clipforge_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Init { name, output } => commands::init::run(name, output, &config),
        Commands::Info { path } => commands::info::run(path, &config),
        Commands::Import {
            path,
            files,
            append,
        } => commands::import::run(path, files, append, &config).await,
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Preview { path, from, limit } => {
            commands::preview::run(path, from, limit, &config).await
        }
        Commands::Export {
            path,
            output,
            resolution,
        } => commands::export::run(path, output, resolution, &config).await,
    }
}
