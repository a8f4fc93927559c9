// =============================================================================
// Shared types used across the vnscan indicator pipeline
// =============================================================================

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data for a single instrument.
///
/// Bars are owned by the external fetch layer and are read-only here: the
/// pipeline appends derived columns alongside them but never rewrites a bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Typical price of the bar: (high + low + close) / 3.
    pub fn hlc3(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// The unit of work handed in by the fetch layer: one instrument's identity
/// plus its full daily history, oldest bar first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSeries {
    /// Ticker symbol, e.g. "VNM".
    pub symbol: String,
    /// Exchange tag, e.g. "HOSE".
    pub exchange: String,
    /// Daily bars ordered by date ascending, dates unique.
    pub bars: Vec<Bar>,
}

impl InstrumentSeries {
    pub fn new(
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        bars: Vec<Bar>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: exchange.into(),
            bars,
        }
    }

    /// Check the input contract the fetch layer is supposed to guarantee.
    ///
    /// The indicator math cannot recover from a half-broken bar — interpolating
    /// a missing price would corrupt every downstream column — so a violation
    /// rejects the whole instrument:
    /// - every price must be finite,
    /// - `high >= low` on every bar,
    /// - dates strictly ascending (which also rules out duplicates).
    pub fn validate(&self) -> Result<()> {
        for (i, bar) in self.bars.iter().enumerate() {
            let prices = [bar.open, bar.high, bar.low, bar.close];
            if prices.iter().any(|p| !p.is_finite()) {
                bail!(
                    "{}: bar {} ({}) has a non-finite price",
                    self.symbol,
                    i,
                    bar.date
                );
            }
            if bar.high < bar.low {
                bail!(
                    "{}: bar {} ({}) has high {} below low {}",
                    self.symbol,
                    i,
                    bar.date,
                    bar.high,
                    bar.low
                );
            }
        }

        for pair in self.bars.windows(2) {
            if pair[1].date <= pair[0].date {
                bail!(
                    "{}: bars out of order ({} follows {})",
                    self.symbol,
                    pair[1].date,
                    pair[0].date
                );
            }
        }

        Ok(())
    }
}
