// =============================================================================
// Universe Scan — per-instrument fan-out over already-fetched series
// =============================================================================
//
// Each instrument's computation is pure and independent: no shared state, no
// ordering constraint, no synchronisation point beyond collecting each task's
// own output.  The work is CPU-bound, so every instrument runs on the
// blocking pool and the collector awaits the handles in submission order.
//
// The success/skip/failure tallies live in the collector alone and come back
// inside the summary — no counters are shared with the workers.
// =============================================================================

use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::record::{build_records, InstrumentRecords};
use crate::types::InstrumentSeries;

/// Everything one pass over the universe produced.
#[derive(Debug)]
pub struct ScanSummary {
    /// Records for every instrument that produced output, sorted by symbol.
    pub records: Vec<InstrumentRecords>,
    /// Instruments that produced records.
    pub succeeded: usize,
    /// Instruments declined for insufficient history — an expected outcome,
    /// not a failure.
    pub skipped: usize,
    /// Instruments rejected for violating the input contract, plus any task
    /// that panicked.
    pub failed: usize,
}

/// Run the indicator pipeline over every instrument in `universe`.
///
/// Instruments are processed concurrently; the records come back sorted by
/// symbol regardless of completion order.
pub async fn scan_universe(universe: Vec<InstrumentSeries>, config: &ScanConfig) -> ScanSummary {
    let total = universe.len();
    info!(total, "scanning universe");

    let mut handles = Vec::with_capacity(total);
    for instrument in universe {
        let cfg = config.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let outcome = build_records(&instrument, &cfg);
            (instrument.symbol, outcome)
        }));
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for handle in handles {
        match handle.await {
            Ok((symbol, Ok(Some(built)))) => {
                debug!(symbol = %symbol, "records built");
                records.push(built);
            }
            Ok((symbol, Ok(None))) => {
                debug!(symbol = %symbol, "skipped: insufficient history");
                skipped += 1;
            }
            Ok((symbol, Err(e))) => {
                warn!(symbol = %symbol, error = %e, "instrument rejected");
                failed += 1;
            }
            Err(e) => {
                warn!(error = %e, "scan worker panicked");
                failed += 1;
            }
        }
    }

    records.sort_by(|a, b| a.snapshot.symbol.cmp(&b.snapshot.symbol));

    let succeeded = records.len();
    info!(succeeded, skipped, failed, "scan complete");

    ScanSummary {
        records,
        succeeded,
        skipped,
        failed,
    }
}
