use crate::error::{Result, SplitterError};
use crate::reconcile::ReconciledRow;
use crate::schema::ColumnHeuristics;
use crate::split::round2;
use crate::{Cell, DailyBucket, Table};
use calamine::{open_workbook_auto, Data, Reader, SheetVisible};
use chrono::Timelike;
use log::debug;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use std::path::Path;

/// Column headers of the reconciliation report, in output order:
/// key, in-qty, in-amount, out-qty, out-amount, qty diff, amount diff.
pub const RECONCILIATION_HEADERS: [&str; 7] = [
    "关联名称",
    "进项_数量",
    "进项_金额",
    "销项_数量",
    "销项_金额",
    "数量差异(销-进)",
    "金额差异(销-进)",
];

#[derive(Debug, Clone, Serialize)]
pub struct SheetInfo {
    pub name: String,
    pub visible: bool,
}

/// First look at an uploaded workbook: which sheets to offer, and the
/// columns of the first one.
#[derive(Debug, Clone, Serialize)]
pub struct WorkbookSummary {
    pub sheets: Vec<String>,
    pub columns: Vec<String>,
}

/// Detail view of one sheet: its columns plus the distinct values of the
/// unit-of-measure column, for the integer-unit picker.
#[derive(Debug, Clone, Serialize)]
pub struct SheetDetails {
    pub columns: Vec<String>,
    pub units: Vec<String>,
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => Cell::Text(format!("{:?}", e)),
        // Dates land in static columns and are copied verbatim, so a text
        // rendering is sufficient.
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.time().num_seconds_from_midnight() == 0 => {
                Cell::Text(ndt.format("%Y-%m-%d").to_string())
            }
            Some(ndt) => Cell::Text(ndt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// All sheets in the workbook with their visibility flag.
pub fn sheet_names(path: &Path) -> Result<Vec<SheetInfo>> {
    let workbook = open_workbook_auto(path)?;
    let sheets: Vec<SheetInfo> = workbook
        .sheets_metadata()
        .iter()
        .map(|s| SheetInfo {
            name: s.name.clone(),
            visible: matches!(s.visible, SheetVisible::Visible),
        })
        .collect();
    if sheets.is_empty() {
        return Err(SplitterError::EmptyWorkbook);
    }
    Ok(sheets)
}

/// Read one sheet into a [`Table`]. The first row is the header; blank
/// header cells are named `Unnamed: {idx}`.
pub fn read_table(path: &Path, sheet_name: &str) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    if !workbook.sheet_names().iter().any(|s| s == sheet_name) {
        return Err(SplitterError::SheetNotFound(sheet_name.to_string()));
    }
    let range = workbook.worksheet_range(sheet_name)?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(idx, data)| {
                let name = convert_cell(data).display();
                if name.is_empty() {
                    format!("Unnamed: {}", idx)
                } else {
                    name
                }
            })
            .collect(),
        None => Vec::new(),
    };

    let mut table = Table::new(columns);
    for row in rows {
        table.rows.push(row.iter().map(convert_cell).collect());
    }

    debug!(
        "Read sheet '{}': {} columns, {} rows",
        sheet_name,
        table.columns.len(),
        table.rows.len()
    );
    Ok(table)
}

/// Sheets worth offering to the user (visible ones, or all when the format
/// carries no visibility information) plus the columns of the first one.
pub fn analyze(path: &Path) -> Result<WorkbookSummary> {
    let all = sheet_names(path)?;
    let visible: Vec<String> = all
        .iter()
        .filter(|s| s.visible)
        .map(|s| s.name.clone())
        .collect();
    let sheets = if visible.is_empty() {
        all.into_iter().map(|s| s.name).collect()
    } else {
        visible
    };

    let columns = read_table(path, &sheets[0])?.columns;
    Ok(WorkbookSummary { sheets, columns })
}

/// Columns of one sheet plus the distinct non-empty values of its
/// unit-of-measure column, in first-seen order.
pub fn sheet_details(
    path: &Path,
    sheet_name: &str,
    heuristics: &ColumnHeuristics,
) -> Result<SheetDetails> {
    let table = read_table(path, sheet_name)?;

    let mut units: Vec<String> = Vec::new();
    if let Some((unit_idx, _)) = heuristics.find_column(&table.columns, &heuristics.unit_markers) {
        for row in &table.rows {
            let unit = table.cell(row, unit_idx).display();
            if !unit.is_empty() && !units.contains(&unit) {
                units.push(unit);
            }
        }
    }

    Ok(SheetDetails {
        columns: table.columns,
        units,
    })
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        Cell::Number(n) => {
            sheet.write_number(row, col, *n)?;
        }
        Cell::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}

fn write_header(sheet: &mut Worksheet, columns: &[String]) -> Result<()> {
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string(0, col as u16, name)?;
    }
    Ok(())
}

/// Write one sheet per day, named 第1天, 第2天, … in day order.
pub fn write_daily_workbook(
    path: &Path,
    columns: &[String],
    buckets: &[DailyBucket],
) -> Result<()> {
    let mut workbook = Workbook::new();
    for bucket in buckets {
        let sheet = workbook
            .add_worksheet()
            .set_name(format!("第{}天", bucket.day_index + 1))?;
        write_header(sheet, columns)?;
        for (r, row) in bucket.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                write_cell(sheet, (r + 1) as u32, c as u16, cell)?;
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

/// Write the single-sheet reconciliation report.
pub fn write_reconciliation(path: &Path, rows: &[ReconciledRow]) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in RECONCILIATION_HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (r, row) in rows.iter().enumerate() {
        let r = (r + 1) as u32;
        sheet.write_string(r, 0, &row.key)?;
        sheet.write_number(r, 1, round2(row.in_qty))?;
        sheet.write_number(r, 2, round2(row.in_amount))?;
        sheet.write_number(r, 3, round2(row.out_qty))?;
        sheet.write_number(r, 4, round2(row.out_amount))?;
        sheet.write_number(r, 5, round2(row.qty_diff))?;
        sheet.write_number(r, 6, round2(row.amount_diff))?;
    }
    workbook.save(path)?;
    Ok(())
}
