pub mod init;
pub mod run;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ofx-reconcile",
    about = "Reconcile OFX bank statements against a categorized spreadsheet."
)]
pub struct Cli {
    /// Verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import, reconcile, chart and re-export. Either input may be omitted.
    Run {
        /// OFX statement to reconcile
        #[arg(long)]
        ofx: Option<String>,
        /// Spreadsheet (CSV/XLSX) with columns Data, Descrição, Valor
        #[arg(long)]
        sheet: Option<String>,
        /// Worksheet name (default: first sheet)
        #[arg(long = "sheet-name")]
        sheet_name: Option<String>,
        /// Output path for the updated OFX (default: atualizado.ofx)
        #[arg(long, conflicts_with = "stdout")]
        output: Option<String>,
        /// Print only the updated OFX to stdout, no tables
        #[arg(long)]
        stdout: bool,
        /// Skip the description breakdown chart
        #[arg(long = "no-chart")]
        no_chart: bool,
    },
    /// Write a settings file with default values.
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
    /// Show the active settings.
    Status,
}
