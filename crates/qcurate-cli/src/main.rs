mod cli;
mod commands;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!("qcurate CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let command_result = match cli.command {
        Commands::Create(args) => {
            info!("Dispatching to 'create' command.");
            commands::create::run(args, cli.threads)
        }
        Commands::Settings(args) => {
            info!("Dispatching to 'settings' command.");
            commands::settings::run(args.command)
        }
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Export(args) => {
            info!("Dispatching to 'export' command.");
            commands::export::run(args)
        }
        Commands::Components(args) => commands::components::run(args),
    };

    match &command_result {
        Ok(()) => info!("Command completed successfully."),
        Err(e) => error!("Command failed: {}", e),
    }
    command_result
}
