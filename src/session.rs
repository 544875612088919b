use std::path::Path;

use crate::error::{ReconError, Result};
use crate::models::Transaction;
use crate::reconciler::{reconcile, Reconciliation};
use crate::spreadsheet::SheetOptions;
use crate::{ofx, spreadsheet};

/// Outcome of importing one input file.
#[derive(Debug)]
pub enum Stage {
    /// No file was supplied. Not an error; the stage simply has no output.
    Empty,
    Failed(ReconError),
    Loaded(Vec<Transaction>),
}

impl Stage {
    fn from_result(label: &str, result: Result<Vec<Transaction>>) -> Self {
        match result {
            Ok(rows) => {
                tracing::info!(input = label, rows = rows.len(), "input loaded");
                Stage::Loaded(rows)
            }
            Err(e) => {
                tracing::warn!(input = label, error = %e, "input rejected");
                Stage::Failed(e)
            }
        }
    }

    pub fn table(&self) -> Option<&[Transaction]> {
        match self {
            Stage::Loaded(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ReconError> {
        match self {
            Stage::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// One reconciliation run: two independent inputs and, when both loaded,
/// their merge. A failure in one input never discards the other.
pub struct Session {
    pub ofx: Stage,
    pub sheet: Stage,
}

impl Session {
    pub fn load(ofx_path: Option<&Path>, sheet_path: Option<&Path>, options: &SheetOptions) -> Self {
        let ofx = match ofx_path {
            None => Stage::Empty,
            Some(path) => Stage::from_result(
                "ofx",
                std::fs::read(path)
                    .map_err(ReconError::from)
                    .and_then(|bytes| ofx::parse(&bytes, &options.placeholder)),
            ),
        };
        let sheet = match sheet_path {
            None => Stage::Empty,
            Some(path) => Stage::from_result("sheet", spreadsheet::parse(path, options)),
        };
        Self { ofx, sheet }
    }

    /// The merged table, only when both inputs loaded.
    pub fn reconcile(&self) -> Option<Reconciliation> {
        Some(reconcile(self.ofx.table()?, self.sheet.table()?))
    }

    pub fn failures(&self) -> Vec<(&'static str, &ReconError)> {
        [("OFX", &self.ofx), ("Spreadsheet", &self.sheet)]
            .into_iter()
            .filter_map(|(label, stage)| stage.error().map(|e| (label, e)))
            .collect()
    }
}
