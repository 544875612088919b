use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::Transaction;

pub struct Reconciliation {
    /// Base rows in base order, with descriptions replaced where the lookup matched.
    pub rows: Vec<Transaction>,
    /// How many base rows took their description from the lookup.
    pub matched: usize,
}

/// First-occurrence description per amount. Keys are normalized so that
/// `-50` and `-50.00` land on the same entry.
fn first_descriptions(lookup: &[Transaction]) -> HashMap<Decimal, &str> {
    let mut by_amount = HashMap::with_capacity(lookup.len());
    for row in lookup {
        by_amount
            .entry(row.amount.normalize())
            .or_insert(row.description.as_str());
    }
    by_amount
}

/// Amount-keyed left join. The base (OFX) table is authoritative: row count,
/// order, dates and amounts are kept; only descriptions change, taken from
/// the first lookup row with an exactly equal amount.
pub fn reconcile(base: &[Transaction], lookup: &[Transaction]) -> Reconciliation {
    let by_amount = first_descriptions(lookup);
    let mut matched = 0usize;

    let rows = base
        .iter()
        .map(|row| match by_amount.get(&row.amount.normalize()) {
            Some(description) => {
                matched += 1;
                Transaction {
                    description: (*description).to_string(),
                    ..row.clone()
                }
            }
            None => row.clone(),
        })
        .collect();

    tracing::debug!(
        base = base.len(),
        lookup = lookup.len(),
        matched,
        "reconciled transactions"
    );
    Reconciliation { rows, matched }
}
