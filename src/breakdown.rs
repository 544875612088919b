use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::Transaction;

pub struct Slice {
    pub description: String,
    pub total: Decimal,
    pub count: usize,
    /// Share of the chart: |total| over the sum of every slice's |total|.
    pub pct: f64,
}

pub struct Breakdown {
    pub slices: Vec<Slice>,
    pub total: Decimal,
}

/// Chart data: amounts grouped by description, slices in first-seen order.
pub fn by_description(rows: &[Transaction]) -> Breakdown {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut raw: Vec<(&str, Decimal, usize)> = Vec::new();
    for row in rows {
        match index.get(row.description.as_str()) {
            Some(&i) => {
                raw[i].1 += row.amount;
                raw[i].2 += 1;
            }
            None => {
                index.insert(row.description.as_str(), raw.len());
                raw.push((row.description.as_str(), row.amount, 1));
            }
        }
    }

    let total: Decimal = raw.iter().map(|(_, t, _)| *t).sum();
    let magnitude: Decimal = raw.iter().map(|(_, t, _)| t.abs()).sum();
    let slices = raw
        .into_iter()
        .map(|(description, t, count)| Slice {
            description: description.to_string(),
            total: t,
            count,
            pct: if magnitude.is_zero() {
                0.0
            } else {
                (t.abs() / magnitude * Decimal::ONE_HUNDRED)
                    .to_f64()
                    .unwrap_or(0.0)
            },
        })
        .collect();

    Breakdown { slices, total }
}
