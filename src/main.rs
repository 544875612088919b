mod breakdown;
mod cli;
mod error;
mod exporter;
mod fmt;
mod models;
mod ofx;
mod reconciler;
mod session;
mod settings;
mod spreadsheet;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use settings::{load_settings, EXTERNAL_API_KEY_VAR};

fn init_tracing(verbose: bool) {
    let default = if verbose { "ofx_reconcile=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings().with_external_api_key(std::env::var(EXTERNAL_API_KEY_VAR).ok());

    let result = match cli.command {
        Commands::Run {
            ofx,
            sheet,
            sheet_name,
            output,
            stdout,
            no_chart,
        } => cli::run::run(
            cli::run::RunArgs {
                ofx,
                sheet,
                sheet_name,
                output,
                stdout,
                no_chart,
            },
            &settings,
        ),
        Commands::Init { force } => cli::init::run(force),
        Commands::Status => cli::status::run(&settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
