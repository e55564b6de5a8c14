use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::info;

use crate::error::Result;
use crate::fetcher::{PageFetcher, PageSource};
use crate::progress::Progress;
use crate::query::QueryParams;
use crate::region::{GeographicUnit, Scope};
use crate::table::{Batch, ResultTable};
use crate::time_window::TimeWindow;

pub const DEFAULT_WORKERS: usize = 8;

/// Fetch, parse and stamp one (window, unit) pair.
pub fn scrape_unit<S: PageSource>(
    fetcher: &PageFetcher<S>,
    window: &TimeWindow,
    unit: &GeographicUnit,
    scope: Scope,
) -> Result<Batch> {
    let params = QueryParams::new(window, unit, scope);
    let species = fetcher.fetch(&params)?;
    Ok(Batch::stamp(species, unit, &params.r1, window))
}

/// Scrape every window × unit pair on a pool of `workers` threads.
///
/// Time windows form the outer loop and units the inner loop; rows in the
/// returned table follow that order regardless of which unit finishes first.
/// The first error aborts the run.
pub fn scrape_all<S: PageSource>(
    fetcher: &PageFetcher<S>,
    windows: &[TimeWindow],
    units: &[GeographicUnit],
    scope: Scope,
    workers: usize,
    progress: &dyn Progress,
) -> Result<ResultTable> {
    let start_time = Instant::now();

    let work: Vec<(&TimeWindow, &GeographicUnit)> = windows
        .iter()
        .flat_map(|window| units.iter().map(move |unit| (window, unit)))
        .collect();
    let total = work.len();

    info!(
        action = "start",
        component = "scrape",
        windows = windows.len(),
        units = units.len(),
        work_units = total,
        worker_count = workers,
        scope = ?scope,
        "Starting scrape"
    );
    progress.begin(total);

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("magpie-worker-{i}"))
        .build()?;

    let completed = AtomicUsize::new(0);
    let batches = pool.install(|| {
        work.par_iter()
            .map(|&(window, unit)| {
                let batch = scrape_unit(fetcher, window, unit, scope)?;

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                let code = unit.most_specific_code();
                info!(
                    action = "complete",
                    component = "work_unit",
                    code,
                    start_month = window.start_month,
                    end_month = window.end_month,
                    rows = batch.rows.len(),
                    completed = done,
                    total,
                    "Work unit finished"
                );
                progress.item_done(code);
                Ok(batch)
            })
            .collect::<Result<Vec<Batch>>>()
    });
    progress.finish();

    let table = ResultTable::concat(batches?);
    info!(
        action = "complete",
        component = "scrape",
        rows = table.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Scrape completed"
    );
    Ok(table)
}
