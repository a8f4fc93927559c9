//! vnscan — daily OHLCV indicator pipeline.
//!
//! Takes one instrument's daily bar history and derives a fixed indicator
//! battery: simple moving averages of price and volume at 5/20/60 days, the
//! Wilder-smoothed ADMF money-flow oscillator, convergence spreads between
//! the averages, and oscillation statistics over four trailing horizons.
//! Each series reduces to a latest-state [`Snapshot`] and a fully annotated
//! [`DailySeries`] for charting.
//!
//! Fetching raw bars, persisting records, and retry/rate-limit concerns live
//! outside this crate: the pipeline is a pure function of a series plus a
//! [`ScanConfig`], and [`scan_universe`] merely fans that function out over
//! many instruments at once.

pub mod config;
pub mod indicators;
pub mod record;
pub mod scan;
pub mod types;

pub use config::ScanConfig;
pub use record::{
    build_records, DailyRow, DailySeries, IndicatorSeries, InstrumentRecords, Snapshot,
    DAILY_COLUMNS, MIN_BARS,
};
pub use scan::{scan_universe, ScanSummary};
pub use types::{Bar, InstrumentSeries};
