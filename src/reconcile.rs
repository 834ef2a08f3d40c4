use crate::error::Result;
use crate::normalize::clean_name;
use crate::schema::{ReconcileMapping, ReconcileRequest};
use crate::Table;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One reconciled item: aggregated purchase ("in") and sales ("out")
/// quantities and amounts for a normalized name, with signed differences.
/// A key missing from one side reads as zero on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    pub key: String,
    pub in_qty: f64,
    pub in_amount: f64,
    pub out_qty: f64,
    pub out_amount: f64,
    pub qty_diff: f64,
    pub amount_diff: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct SideTotals {
    qty: f64,
    amount: f64,
}

/// Sum quantity and amount per normalized name. Duplicate keys accumulate;
/// cells that fail numeric coercion contribute zero rather than aborting.
fn aggregate(table: &Table, mapping: &ReconcileMapping) -> Result<BTreeMap<String, SideTotals>> {
    let name_idx = table.require_column(&mapping.name_column)?;
    let qty_idx = table.require_column(&mapping.quantity_column)?;
    let amount_idx = table.require_column(&mapping.amount_column)?;

    let mut totals: BTreeMap<String, SideTotals> = BTreeMap::new();
    for row in &table.rows {
        let key = clean_name(&table.cell(row, name_idx));
        let entry = totals.entry(key).or_default();
        entry.qty += table.cell(row, qty_idx).as_number().unwrap_or(0.0);
        entry.amount += table.cell(row, amount_idx).as_number().unwrap_or(0.0);
    }
    Ok(totals)
}

/// Outer-join the aggregated purchase and sales tables on normalized name.
/// Every key present on either side appears exactly once, in key order.
pub fn reconcile(
    purchases: &Table,
    sales: &Table,
    request: &ReconcileRequest,
) -> Result<Vec<ReconciledRow>> {
    let in_totals = aggregate(purchases, &request.purchases)?;
    let out_totals = aggregate(sales, &request.sales)?;

    let mut merged: BTreeMap<String, (SideTotals, SideTotals)> = BTreeMap::new();
    for (key, totals) in in_totals {
        merged.entry(key).or_default().0 = totals;
    }
    for (key, totals) in out_totals {
        merged.entry(key).or_default().1 = totals;
    }

    debug!("Reconciled {} distinct keys", merged.len());

    Ok(merged
        .into_iter()
        .map(|(key, (ins, outs))| ReconciledRow {
            key,
            in_qty: ins.qty,
            in_amount: ins.amount,
            out_qty: outs.qty,
            out_amount: outs.amount,
            qty_diff: outs.qty - ins.qty,
            amount_diff: outs.amount - ins.amount,
        })
        .collect())
}
