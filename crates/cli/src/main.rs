mod seed;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

/// PV inspection-report service.
#[derive(Parser)]
#[command(name = "pvdesk", version, about = "PV inspection-report service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP JSON API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 5000)]
        port: u16,

        /// Directory for uploaded media (images live under <media-dir>/images)
        #[arg(long, default_value = "uploads")]
        media_dir: PathBuf,

        /// JSON fixture file pre-loading users (with session tokens) and tasks
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            media_dir,
            seed,
        } => {
            if let Err(e) = serve::start_server(port, media_dir, seed).await {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
