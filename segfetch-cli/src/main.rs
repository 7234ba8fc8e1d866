//! Segfetch CLI - command-line interface
//!
//! Downloads a URL over several concurrent range requests and manages the
//! persisted settings used by those downloads.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use segfetch::logging::{default_log_dir, init_logging};

use commands::config::ConfigCommands;
use commands::get::GetArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "segfetch", version, about = "Segmented HTTP downloader")]
struct Cli {
    /// Also print logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for the log file
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download a URL in concurrent segments
    Get(GetArgs),

    /// View or change persisted settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let log_dir = cli.log_dir.clone().unwrap_or_else(default_log_dir);
    let _guard = match init_logging(&log_dir, cli.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("{} {}", style("warning:").yellow().bold(), e);
            None
        }
    };

    if let Err(e) = run(cli.command) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Get(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .thread_name("segfetch-worker")
                .build()
                .map_err(CliError::Runtime)?;
            runtime.block_on(commands::get::run(args))
        }
        Commands::Config(command) => commands::config::run(command),
    }
}
