mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skyform", version)]
#[command(about = "Declarative resource graphs, applied in dependency order", long_about = None)]
struct Cli {
    /// Project root; the resource store lives in .skyform/ underneath
    #[arg(short = 'd', long, global = true, default_value = ".")]
    dir: PathBuf,

    /// Content directory for the static-site stack
    #[arg(long, global = true, default_value = "www")]
    content_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a stack's resources
    Up {
        /// Stack name (web-service, static-site)
        stack: String,
        /// Apply independent resources concurrently, up to N in flight
        #[arg(short, long, default_value = "1")]
        parallel: usize,
        /// Stop dispatching new resources after the first failure
        #[arg(long)]
        stop_on_failure: bool,
    },
    /// Show planned actions without applying
    Preview {
        /// Stack name (web-service, static-site)
        stack: String,
    },
    /// Delete a stack's resources in reverse apply order
    Down {
        /// Stack name (web-service, static-site)
        stack: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt::init();

    match cli.command {
        Commands::Up {
            stack,
            parallel,
            stop_on_failure,
        } => {
            let stack = commands::load_stack(&stack, &cli.content_dir)?;
            commands::up::handle(stack, &cli.dir, parallel, stop_on_failure).await
        }
        Commands::Preview { stack } => {
            let stack = commands::load_stack(&stack, &cli.content_dir)?;
            commands::preview::handle(stack, &cli.dir).await
        }
        Commands::Down { stack } => {
            let stack = commands::load_stack(&stack, &cli.content_dir)?;
            commands::down::handle(stack, &cli.dir).await
        }
    }
}
