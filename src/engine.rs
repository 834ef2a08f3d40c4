use crate::error::{Result, SplitterError};
use crate::schema::{ColumnHeuristics, SplitRequest, MAX_OUTPUT_COLUMNS};
use crate::split::{active_day_count, pick_day_indices, round2, split_quantity};
use crate::{Cell, DailyBucket, SplitPlan, Table};
use log::debug;
use rand::Rng;

/// Expands source rows into per-day output rows.
///
/// Each source row with a positive quantity is assigned a set of active
/// days, its quantity is split across them, and one output row per active
/// day is built from the requested output columns, each column transformed
/// according to its resolved role.
pub struct DayAllocator {
    request: SplitRequest,
    heuristics: ColumnHeuristics,
}

/// How one output column's value is derived for a day row.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnAction {
    /// Replaced with the day's fragment.
    Quantity,
    /// Recomputed as fragment × unit price; falls back to proportional
    /// scaling of the original amount, then to a verbatim copy.
    Amount,
    /// Proportionally scaled by fragment / original quantity when the cell
    /// is numeric; copied otherwise.
    Scale,
    /// Copied verbatim (identifiers, codes, dates, prices, specs).
    Copy,
}

struct ColumnPlan {
    source_idx: usize,
    action: ColumnAction,
}

impl DayAllocator {
    pub fn new(mut request: SplitRequest, heuristics: ColumnHeuristics) -> Result<Self> {
        if request.total_days == 0 {
            return Err(SplitterError::InvalidDayCount(request.total_days));
        }
        request.output_columns.truncate(MAX_OUTPUT_COLUMNS);
        Ok(Self {
            request,
            heuristics,
        })
    }

    /// The requested output columns that actually exist in the table, in
    /// request order. This is the header of every output sheet.
    pub fn output_columns(&self, table: &Table) -> Vec<String> {
        self.request
            .output_columns
            .iter()
            .filter(|c| table.column_index(c).is_some())
            .cloned()
            .collect()
    }

    pub fn allocate<R: Rng + ?Sized>(
        &self,
        table: &Table,
        rng: &mut R,
    ) -> Result<Vec<DailyBucket>> {
        let qty_idx = table.require_column(&self.request.quantity_column)?;
        let unit_idx = self
            .heuristics
            .find_column(&table.columns, &self.heuristics.unit_markers)
            .map(|(i, _)| i);
        let price_idx = self
            .heuristics
            .find_column(&table.columns, &self.heuristics.price_markers)
            .map(|(i, _)| i);

        let plans = self.plan_columns(table, price_idx.is_some());

        let mut buckets: Vec<DailyBucket> = (0..self.request.total_days)
            .map(DailyBucket::new)
            .collect();

        let mut dropped = 0usize;
        for row in &table.rows {
            let qty = match table.cell(row, qty_idx).as_number() {
                Some(q) if q > 0.0 => q,
                _ => {
                    dropped += 1;
                    continue;
                }
            };

            let unit = unit_idx
                .map(|i| table.cell(row, i).display())
                .unwrap_or_default();
            let integer_mode = self.request.is_integer_unit(unit.trim());

            let plan = self.plan_row(qty, integer_mode, rng);
            if plan.fragments.is_empty() {
                dropped += 1;
                continue;
            }

            for (&day_idx, &fragment) in plan.day_indices.iter().zip(&plan.fragments) {
                let out_row = self.build_row(table, row, &plans, qty, fragment, price_idx);
                buckets[day_idx].rows.push(out_row);
            }
        }

        if dropped > 0 {
            debug!("Dropped {} rows without a positive quantity", dropped);
        }

        Ok(buckets)
    }

    fn plan_row<R: Rng + ?Sized>(&self, qty: f64, integer_mode: bool, rng: &mut R) -> SplitPlan {
        let total_days = self.request.total_days;
        let active = active_day_count(qty, total_days, rng);
        let fragments = split_quantity(qty, active, integer_mode, rng);
        // Integer mode may return fewer fragments than requested; pick
        // exactly as many days as there are fragments.
        let day_indices = pick_day_indices(total_days, fragments.len(), rng);
        SplitPlan {
            day_indices,
            fragments,
        }
    }

    fn plan_columns(&self, table: &Table, has_price: bool) -> Vec<ColumnPlan> {
        self.request
            .output_columns
            .iter()
            .filter_map(|name| {
                let source_idx = table.column_index(name)?;
                let action = if *name == self.request.quantity_column {
                    ColumnAction::Quantity
                } else if has_price && self.heuristics.is_amount_column(name) {
                    ColumnAction::Amount
                } else if self.heuristics.is_static_column(name)
                    || self.heuristics.is_price_column(name)
                {
                    ColumnAction::Copy
                } else {
                    ColumnAction::Scale
                };
                Some(ColumnPlan { source_idx, action })
            })
            .collect()
    }

    fn build_row(
        &self,
        table: &Table,
        row: &[Cell],
        plans: &[ColumnPlan],
        original_qty: f64,
        fragment: f64,
        price_idx: Option<usize>,
    ) -> Vec<Cell> {
        let ratio = fragment / original_qty;
        plans
            .iter()
            .map(|plan| {
                let cell = table.cell(row, plan.source_idx);
                match plan.action {
                    ColumnAction::Quantity => Cell::Number(fragment),
                    ColumnAction::Amount => {
                        let price = price_idx.and_then(|i| table.cell(row, i).as_number());
                        match price {
                            Some(p) => Cell::Number(round2(fragment * p)),
                            None => match cell.as_number() {
                                Some(amount) => Cell::Number(round2(amount * ratio)),
                                None => cell,
                            },
                        }
                    }
                    ColumnAction::Scale => match cell.as_number() {
                        Some(value) => Cell::Number(round2(value * ratio)),
                        None => cell,
                    },
                    ColumnAction::Copy => cell,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{thread_rng, SeedableRng};

    fn sample_table() -> Table {
        let mut table = Table::new(vec![
            "商品编码".to_string(),
            "名称".to_string(),
            "规格型号".to_string(),
            "单位".to_string(),
            "数量".to_string(),
            "单价".to_string(),
            "含税金额".to_string(),
            "重量".to_string(),
        ]);
        table.rows.push(vec![
            Cell::Text("A001".to_string()),
            Cell::Text("奶粉".to_string()),
            Cell::Text("900g".to_string()),
            Cell::Text("罐".to_string()),
            Cell::Number(30.0),
            Cell::Number(25.0),
            Cell::Number(750.0),
            Cell::Number(27.0),
        ]);
        table.rows.push(vec![
            Cell::Text("A002".to_string()),
            Cell::Text("白砂糖".to_string()),
            Cell::Text("散装".to_string()),
            Cell::Text("千克".to_string()),
            Cell::Number(7.5),
            Cell::Number(6.0),
            Cell::Number(45.0),
            Cell::Number(7.5),
        ]);
        table
    }

    fn sample_request() -> SplitRequest {
        SplitRequest {
            sheet_name: "Sheet1".to_string(),
            quantity_column: "数量".to_string(),
            total_days: 12,
            output_columns: vec![
                "商品编码".to_string(),
                "名称".to_string(),
                "单位".to_string(),
                "数量".to_string(),
                "单价".to_string(),
                "含税金额".to_string(),
                "重量".to_string(),
            ],
            integer_units: vec!["罐".to_string(), "个".to_string()],
        }
    }

    fn flat_rows(buckets: &[DailyBucket]) -> Vec<&Vec<Cell>> {
        buckets.iter().flat_map(|b| b.rows.iter()).collect()
    }

    #[test]
    fn test_missing_quantity_column_aborts() {
        let mut request = sample_request();
        request.quantity_column = "不存在".to_string();
        let allocator = DayAllocator::new(request, ColumnHeuristics::default()).unwrap();
        let result = allocator.allocate(&sample_table(), &mut thread_rng());
        assert!(matches!(result, Err(SplitterError::MissingColumn(_))));
    }

    #[test]
    fn test_zero_days_rejected() {
        let mut request = sample_request();
        request.total_days = 0;
        let result = DayAllocator::new(request, ColumnHeuristics::default());
        assert!(matches!(result, Err(SplitterError::InvalidDayCount(0))));
    }

    #[test]
    fn test_quantity_totals_preserved_per_row() {
        let allocator =
            DayAllocator::new(sample_request(), ColumnHeuristics::default()).unwrap();
        let table = sample_table();
        let qty_pos = 3; // position of 数量 within the output columns
        for _ in 0..20 {
            let buckets = allocator.allocate(&table, &mut thread_rng()).unwrap();
            assert_eq!(buckets.len(), 12);

            let mut jar_total = 0.0;
            let mut sugar_total = 0.0;
            for row in flat_rows(&buckets) {
                let qty = row[qty_pos].as_number().unwrap();
                match &row[1] {
                    Cell::Text(name) if name == "奶粉" => {
                        assert_eq!(qty.fract(), 0.0, "integer unit split fractionally");
                        jar_total += qty;
                    }
                    _ => sugar_total += qty,
                }
            }
            assert_eq!(jar_total, 30.0);
            assert!((sugar_total - 7.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_amount_recomputed_from_price() {
        let allocator =
            DayAllocator::new(sample_request(), ColumnHeuristics::default()).unwrap();
        let buckets = allocator
            .allocate(&sample_table(), &mut StdRng::seed_from_u64(1))
            .unwrap();
        for row in flat_rows(&buckets) {
            let qty = row[3].as_number().unwrap();
            let price = row[4].as_number().unwrap();
            let amount = row[5].as_number().unwrap();
            assert!(
                (amount - round2(qty * price)).abs() < 1e-9,
                "amount {} is not qty {} x price {}",
                amount,
                qty,
                price
            );
        }
    }

    #[test]
    fn test_amount_scaled_when_price_not_numeric() {
        let mut table = sample_table();
        table.rows.truncate(1);
        table.rows[0][5] = Cell::Text("面议".to_string());

        let allocator =
            DayAllocator::new(sample_request(), ColumnHeuristics::default()).unwrap();
        let buckets = allocator
            .allocate(&table, &mut StdRng::seed_from_u64(2))
            .unwrap();
        for row in flat_rows(&buckets) {
            let qty = row[3].as_number().unwrap();
            let amount = row[5].as_number().unwrap();
            let expected = round2(750.0 * qty / 30.0);
            assert!((amount - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_other_numeric_column_tracks_split_ratio() {
        let allocator =
            DayAllocator::new(sample_request(), ColumnHeuristics::default()).unwrap();
        let buckets = allocator
            .allocate(&sample_table(), &mut StdRng::seed_from_u64(3))
            .unwrap();
        // 重量 starts at 27.0 for 30 units: 0.9 per unit.
        for row in flat_rows(&buckets) {
            if let Cell::Text(name) = &row[1] {
                if name == "奶粉" {
                    let qty = row[3].as_number().unwrap();
                    let weight = row[6].as_number().unwrap();
                    assert!((weight - round2(27.0 * qty / 30.0)).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_static_and_price_columns_copied_verbatim() {
        let allocator =
            DayAllocator::new(sample_request(), ColumnHeuristics::default()).unwrap();
        let buckets = allocator
            .allocate(&sample_table(), &mut StdRng::seed_from_u64(4))
            .unwrap();
        for row in flat_rows(&buckets) {
            assert!(matches!(&row[0], Cell::Text(code) if code.starts_with('A')));
            let expected_price = match &row[1] {
                Cell::Text(name) if name == "奶粉" => 25.0,
                _ => 6.0,
            };
            assert_eq!(row[4].as_number(), Some(expected_price));
        }
    }

    #[test]
    fn test_rows_without_positive_quantity_dropped() {
        let mut table = sample_table();
        table.rows[0][4] = Cell::Empty;
        table.rows[1][4] = Cell::Number(-2.0);
        table.rows.push(vec![
            Cell::Text("A003".to_string()),
            Cell::Text("盐".to_string()),
            Cell::Empty,
            Cell::Text("包".to_string()),
            Cell::Text("n/a".to_string()),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
        ]);

        let allocator =
            DayAllocator::new(sample_request(), ColumnHeuristics::default()).unwrap();
        let buckets = allocator.allocate(&table, &mut thread_rng()).unwrap();
        assert!(flat_rows(&buckets).is_empty());
    }

    #[test]
    fn test_output_columns_capped_at_ten() {
        let mut request = sample_request();
        request.output_columns = (0..15).map(|i| format!("col{}", i)).collect();
        let allocator = DayAllocator::new(request, ColumnHeuristics::default()).unwrap();
        let table = Table::new((0..15).map(|i| format!("col{}", i)).collect());
        assert_eq!(allocator.output_columns(&table).len(), 10);
    }

    #[test]
    fn test_small_quantity_lands_on_single_day() {
        let mut table = sample_table();
        table.rows.truncate(1);
        table.rows[0][4] = Cell::Number(2.0);

        let allocator =
            DayAllocator::new(sample_request(), ColumnHeuristics::default()).unwrap();
        for _ in 0..20 {
            let buckets = allocator.allocate(&table, &mut thread_rng()).unwrap();
            let days_used = buckets.iter().filter(|b| !b.rows.is_empty()).count();
            assert_eq!(days_used, 1);
        }
    }
}
