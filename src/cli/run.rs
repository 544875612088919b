use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::breakdown::{by_description, Breakdown};
use crate::error::{ReconError, Result};
use crate::exporter::{render_ofx, OFX_MIME_TYPE};
use crate::fmt::money;
use crate::models::Transaction;
use crate::session::Session;
use crate::settings::Settings;
use crate::spreadsheet::SheetOptions;

pub struct RunArgs {
    pub ofx: Option<String>,
    pub sheet: Option<String>,
    pub sheet_name: Option<String>,
    pub output: Option<String>,
    pub stdout: bool,
    pub no_chart: bool,
}

fn transactions_table(rows: &[Transaction]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Data", "Descrição", "Valor"]);
    for row in rows {
        let amount = if row.amount < Decimal::ZERO {
            money(row.amount).red().to_string()
        } else {
            money(row.amount).green().to_string()
        };
        table.add_row(vec![
            Cell::new(row.date_iso()),
            Cell::new(&row.description),
            Cell::new(amount),
        ]);
    }
    table
}

fn bar(pct: f64) -> String {
    "█".repeat((pct / 2.0).round() as usize)
}

fn chart_table(data: &Breakdown) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Descrição", "Valor", "%", "Count", ""]);
    for slice in &data.slices {
        table.add_row(vec![
            Cell::new(&slice.description),
            Cell::new(money(slice.total)),
            Cell::new(format!("{:.1}%", slice.pct)),
            Cell::new(slice.count),
            Cell::new(bar(slice.pct)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(data.total)),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
    ]);
    table
}

fn write_ofx(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), mime = OFX_MIME_TYPE, "wrote updated OFX");
    Ok(())
}

pub fn run(args: RunArgs, settings: &Settings) -> Result<()> {
    if args.ofx.is_none() && args.sheet.is_none() {
        println!("Nothing to do: pass --ofx and/or --sheet.");
        return Ok(());
    }

    let options = SheetOptions {
        sheet_name: args.sheet_name,
        placeholder: settings.placeholder_description.clone(),
    };
    let ofx_path = args.ofx.map(PathBuf::from);
    let sheet_path = args.sheet.map(PathBuf::from);
    let session = Session::load(ofx_path.as_deref(), sheet_path.as_deref(), &options);

    let failures = session.failures();
    for (label, err) in &failures {
        eprintln!("{} {err}", format!("{label}:").red().bold());
    }

    if !args.stdout {
        if let Some(rows) = session.ofx.table() {
            println!("{}\n{}", "OFX transactions".bold(), transactions_table(rows));
        }
        if let Some(rows) = session.sheet.table() {
            println!("{}\n{}", "Spreadsheet".bold(), transactions_table(rows));
        }
    }

    if !failures.is_empty() {
        let labels: Vec<&str> = failures.iter().map(|(l, _)| *l).collect();
        return Err(ReconError::Rejected(labels.join(", ")));
    }

    let Some(merged) = session.reconcile() else {
        if !args.stdout {
            println!("Provide both --ofx and --sheet to reconcile and export.");
        }
        return Ok(());
    };

    let document = render_ofx(&merged.rows, &settings.export);
    if args.stdout {
        print!("{document}");
        return Ok(());
    }

    println!(
        "{}  ({} of {} descriptions replaced)\n{}",
        "Updated OFX".bold(),
        merged.matched,
        merged.rows.len(),
        transactions_table(&merged.rows)
    );
    if !args.no_chart {
        let chart = by_description(&merged.rows);
        println!("{}\n{}", "Breakdown by description".bold(), chart_table(&chart));
    }

    let path = PathBuf::from(args.output.unwrap_or_else(|| settings.output_file.clone()));
    write_ofx(&document, &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
