//! # Invoice Day Splitter
//!
//! A library for turning single-day Excel quantity ledgers into randomized
//! per-day allocations, and for reconciling purchase/sales exports by
//! normalized item name.
//!
//! ## Core Concepts
//!
//! - **Split**: one source row carries a total quantity for a period; the
//!   allocator spreads it over a subset of "active" days so that the daily
//!   fragments sum back to the original total (exactly for integer units,
//!   to one decimal for weighed goods).
//! - **Column Propagation**: every output column is either replaced by the
//!   fragment, recomputed from a unit price, scaled by the fragment ratio,
//!   or copied verbatim, driven by a reviewable column-name policy table.
//! - **Reconciliation**: two exports are joined on a normalized item name
//!   (embedded `*CODE*` annotations stripped), quantities and amounts are
//!   summed per key, and the signed differences are reported.
//!
//! ## Example
//!
//! ```rust,ignore
//! use invoice_day_splitter::*;
//! use std::path::Path;
//!
//! let request = SplitRequest {
//!     sheet_name: "Sheet1".to_string(),
//!     quantity_column: "数量".to_string(),
//!     total_days: 12,
//!     output_columns: vec!["名称".into(), "单位".into(), "数量".into(), "含税金额".into()],
//!     integer_units: vec!["个".into(), "只".into()],
//! };
//!
//! let store = ResultStore::new("results")?;
//! let outcome = run_split(Path::new("ledger.xlsx"), &request, &ColumnHeuristics::default(), &store);
//! assert!(outcome.success);
//! ```

pub mod engine;
pub mod error;
pub mod logbuf;
pub mod normalize;
pub mod reconcile;
pub mod schema;
pub mod service;
pub mod split;
pub mod workbook;

pub use engine::DayAllocator;
pub use error::{Result, SplitterError};
pub use logbuf::{BufferLogger, LogBuffer};
pub use normalize::{clean_name, clean_text};
pub use reconcile::{reconcile, ReconciledRow};
pub use schema::{
    ColumnHeuristics, ReconcileMapping, ReconcileRequest, RunOutcome, SplitRequest,
};
pub use service::{run_reconcile, run_split, run_split_with_rng, ResultStore};
pub use split::{active_day_count, pick_day_indices, split_quantity};
pub use workbook::{
    analyze, read_table, sheet_details, sheet_names, write_daily_workbook,
    write_reconciliation, SheetDetails, SheetInfo, WorkbookSummary, RECONCILIATION_HEADERS,
};

use serde::{Deserialize, Serialize};

/// A single spreadsheet value as read from (or written to) a workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Numeric coercion: numbers pass through, booleans map to 0/1, and
    /// numeric-looking text is parsed. Anything else is not a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Display rendering, used for normalization keys and unit lookups.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Bool(b) => format!("{}", b),
        }
    }
}

/// An in-memory sheet: named columns plus rows of cells. Rows may be ragged
/// (shorter than the header); missing trailing cells read as [`Cell::Empty`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| SplitterError::MissingColumn(name.to_string()))
    }

    pub fn cell(&self, row: &[Cell], col_idx: usize) -> Cell {
        row.get(col_idx).cloned().unwrap_or(Cell::Empty)
    }
}

/// The outcome of splitting one row: which days receive a fragment, and how
/// much each receives. `day_indices` are strictly increasing and unique;
/// `fragments` always has the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    pub day_indices: Vec<usize>,
    pub fragments: Vec<f64>,
}

impl SplitPlan {
    pub fn total(&self) -> f64 {
        self.fragments.iter().sum()
    }
}

/// Output rows assigned to one day index. Created fresh per run and only
/// ever appended to.
#[derive(Debug, Clone)]
pub struct DailyBucket {
    pub day_index: usize,
    pub rows: Vec<Vec<Cell>>,
}

impl DailyBucket {
    pub fn new(day_index: usize) -> Self {
        Self {
            day_index,
            rows: Vec::new(),
        }
    }
}
