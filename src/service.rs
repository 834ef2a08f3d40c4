use crate::engine::DayAllocator;
use crate::error::Result;
use crate::reconcile::reconcile;
use crate::schema::{ColumnHeuristics, ReconcileRequest, RunOutcome, SplitRequest};
use crate::workbook;
use log::{error, info};
use rand::thread_rng;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory holding result workbooks. Files are uniquely named per
/// operation, so concurrent requests never collide.
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    fn split_filename(sheet_name: &str) -> String {
        let tag = Uuid::new_v4().simple().to_string();
        format!("拆分_{}_{}.xlsx", sheet_name, &tag[..8])
    }

    fn reconcile_filename() -> String {
        format!("result_{}.xlsx", Uuid::new_v4().simple())
    }
}

fn split_to_file<R: Rng + ?Sized>(
    source: &Path,
    request: &SplitRequest,
    heuristics: &ColumnHeuristics,
    store: &ResultStore,
    rng: &mut R,
) -> Result<String> {
    let table = workbook::read_table(source, &request.sheet_name)?;
    let allocator = DayAllocator::new(request.clone(), heuristics.clone())?;
    let buckets = allocator.allocate(&table, rng)?;
    let columns = allocator.output_columns(&table);

    let filename = ResultStore::split_filename(&request.sheet_name);
    workbook::write_daily_workbook(&store.path_of(&filename), &columns, &buckets)?;

    let row_count: usize = buckets.iter().map(|b| b.rows.len()).sum();
    info!(
        "Split sheet '{}' into {} day sheets ({} rows)",
        request.sheet_name,
        buckets.len(),
        row_count
    );
    Ok(filename)
}

/// Run one splitting operation end to end with the given random source.
/// Failures are returned as a structured outcome, never propagated.
pub fn run_split_with_rng<R: Rng + ?Sized>(
    source: &Path,
    request: &SplitRequest,
    heuristics: &ColumnHeuristics,
    store: &ResultStore,
    rng: &mut R,
) -> RunOutcome {
    match split_to_file(source, request, heuristics, store, rng) {
        Ok(filename) => RunOutcome::ok(filename),
        Err(e) => {
            error!("Split failed: {}", e);
            RunOutcome::failure(e.to_string())
        }
    }
}

/// [`run_split_with_rng`] with the thread-local random source.
pub fn run_split(
    source: &Path,
    request: &SplitRequest,
    heuristics: &ColumnHeuristics,
    store: &ResultStore,
) -> RunOutcome {
    run_split_with_rng(source, request, heuristics, store, &mut thread_rng())
}

fn reconcile_to_file(
    purchases: &Path,
    sales: &Path,
    request: &ReconcileRequest,
    store: &ResultStore,
) -> Result<String> {
    let purchase_table = {
        let summary = workbook::analyze(purchases)?;
        workbook::read_table(purchases, &summary.sheets[0])?
    };
    let sales_table = {
        let summary = workbook::analyze(sales)?;
        workbook::read_table(sales, &summary.sheets[0])?
    };

    let rows = reconcile(&purchase_table, &sales_table, request)?;

    let filename = ResultStore::reconcile_filename();
    workbook::write_reconciliation(&store.path_of(&filename), &rows)?;

    info!("Reconciled {} distinct item names", rows.len());
    Ok(filename)
}

/// Run one reconciliation end to end: the first offered sheet of each
/// upload is aggregated and diffed. Failures become a structured outcome.
pub fn run_reconcile(
    purchases: &Path,
    sales: &Path,
    request: &ReconcileRequest,
    store: &ResultStore,
) -> RunOutcome {
    match reconcile_to_file(purchases, sales, request, store) {
        Ok(filename) => RunOutcome::ok(filename),
        Err(e) => {
            error!("Reconciliation failed: {}", e);
            RunOutcome::failure(e.to_string())
        }
    }
}
