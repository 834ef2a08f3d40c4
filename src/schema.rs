use serde::{Deserialize, Serialize};

/// Maximum number of output columns a split request may retain.
pub const MAX_OUTPUT_COLUMNS: usize = 10;

/// Parameters for one splitting operation, as supplied by the serving layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRequest {
    /// Sheet to read from the uploaded workbook.
    pub sheet_name: String,
    /// Column holding the total quantity to distribute.
    pub quantity_column: String,
    /// Number of days in the target range (sheet count of the output).
    pub total_days: usize,
    /// Columns to retain in the output, in order. Capped at
    /// [`MAX_OUTPUT_COLUMNS`]; extras are silently ignored.
    pub output_columns: Vec<String>,
    /// Units whose quantities must stay whole numbers after splitting
    /// (counted pieces, as opposed to weighed goods).
    #[serde(default)]
    pub integer_units: Vec<String>,
}

impl SplitRequest {
    pub fn is_integer_unit(&self, unit: &str) -> bool {
        self.integer_units.iter().any(|u| u == unit)
    }
}

/// Column mapping for one side of a reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileMapping {
    pub name_column: String,
    pub quantity_column: String,
    pub amount_column: String,
}

/// Parameters for one reconciliation operation: the purchase ("in") side
/// and the sales ("out") side each name their own columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileRequest {
    pub purchases: ReconcileMapping,
    pub sales: ReconcileMapping,
}

/// Substring markers used to recognize column roles by name. These are
/// heuristics carried over from the original tool and are deliberately kept
/// as data so deployments can review and adjust them without a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnHeuristics {
    /// Marks the unit-of-measure column (e.g. 单位).
    pub unit_markers: Vec<String>,
    /// Marks the unit-price column (e.g. 单价).
    pub price_markers: Vec<String>,
    /// Marks the amount column recomputed as price × fragment (e.g. 含税金额).
    pub amount_markers: Vec<String>,
    /// Columns matching any of these are never scaled, only copied:
    /// identifiers, codes, dates, prices, and specifications.
    pub static_markers: Vec<String>,
}

impl Default for ColumnHeuristics {
    fn default() -> Self {
        Self {
            unit_markers: vec!["单位".to_string(), "unit".to_string()],
            price_markers: vec!["单价".to_string(), "price".to_string()],
            amount_markers: vec!["含税金额".to_string(), "金额".to_string()],
            static_markers: vec![
                "id".to_string(),
                "code".to_string(),
                "编号".to_string(),
                "编码".to_string(),
                "日期".to_string(),
                "date".to_string(),
                "单价".to_string(),
                "price".to_string(),
                "规格".to_string(),
                "spec".to_string(),
            ],
        }
    }
}

impl ColumnHeuristics {
    fn matches(column: &str, markers: &[String]) -> bool {
        let lowered = column.to_lowercase();
        markers.iter().any(|m| lowered.contains(&m.to_lowercase()))
    }

    pub fn is_unit_column(&self, column: &str) -> bool {
        Self::matches(column, &self.unit_markers)
    }

    pub fn is_price_column(&self, column: &str) -> bool {
        Self::matches(column, &self.price_markers)
    }

    pub fn is_amount_column(&self, column: &str) -> bool {
        Self::matches(column, &self.amount_markers)
    }

    pub fn is_static_column(&self, column: &str) -> bool {
        Self::matches(column, &self.static_markers)
    }

    /// First column whose name matches the given marker set.
    pub fn find_column<'a>(
        &self,
        columns: &'a [String],
        markers: &[String],
    ) -> Option<(usize, &'a String)> {
        columns
            .iter()
            .enumerate()
            .find(|(_, c)| Self::matches(c, markers))
    }
}

/// Structured result of a top-level operation. Failures are reported here
/// rather than propagated; nothing in the core is fatal to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    /// Name of the result file in the result store, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Human-readable failure description, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunOutcome {
    pub fn ok(filename: String) -> Self {
        Self {
            success: true,
            filename: Some(filename),
            message: None,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            filename: None,
            message: Some(message),
        }
    }
}
