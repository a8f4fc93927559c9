// =============================================================================
// Record Builder — per-instrument Snapshot and DailySeries assembly
// =============================================================================
//
// Runs the full derivation for one instrument and reduces it to the two
// output records:
//
//   Snapshot    — the last bar plus every latest-value metric, for the
//                 scanner table.
//   DailySeries — the full annotated history in columnar-named, row-ordered
//                 form, for charting.
//
// An instrument with fewer than 60 bars (the longest moving-average window)
// produces NO output at all; partial records are never emitted.
// =============================================================================

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::config::ScanConfig;
use crate::indicators::admf::money_flow;
use crate::indicators::convergence::{aggregate_spread, ConvergenceMetrics};
use crate::indicators::oscillation::{oscillation_stats, OscillationStats};
use crate::indicators::round_dp;
use crate::indicators::sma::rolling_mean;
use crate::indicators::true_range::true_range;
use crate::types::{Bar, InstrumentSeries};

/// Moving-average windows. Fixed: the output field names (`ma5`, `va20`, ...)
/// encode them.
const MA_SHORT: usize = 5;
const MA_MID: usize = 20;
const MA_LONG: usize = 60;

/// Minimum usable series length: the longest window must fill at least once.
pub const MIN_BARS: usize = MA_LONG;

/// Oscillation lookback horizons in trading days (~1, 2, 3, 4 months),
/// matching the `admf_1m` ... `admf_4m` snapshot fields.
const ADMF_HORIZONS: [usize; 4] = [22, 44, 66, 88];

/// Legacy column order of the daily table. Consumers index rows by position.
pub const DAILY_COLUMNS: [&str; 13] = [
    "date", "o", "h", "l", "c", "v", "ma5", "ma20", "ma60", "va5", "va20", "va60", "admf",
];

// =============================================================================
// IndicatorSeries — the derived columns
// =============================================================================

/// Every derived column for one instrument. Each column has exactly one entry
/// per bar; `None` marks positions a window has not yet filled.
///
/// `ad_ratio` and `admf` are total: the zero fallback defines the ratio on
/// every bar and the smoothing law is seeded by its first sample, so neither
/// carries a warm-up gap.
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub ma5: Vec<Option<f64>>,
    pub ma20: Vec<Option<f64>>,
    pub ma60: Vec<Option<f64>>,
    pub va5: Vec<Option<f64>>,
    pub va20: Vec<Option<f64>>,
    pub va60: Vec<Option<f64>>,
    pub true_range: Vec<Option<f64>>,
    pub ad_ratio: Vec<f64>,
    pub admf: Vec<f64>,
}

impl IndicatorSeries {
    /// Derive all columns from the raw bars. Strictly sequential: the
    /// oscillator consumes the True Range column, nothing else crosses
    /// columns.
    pub fn derive(bars: &[Bar], config: &ScanConfig) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

        let tr = true_range(bars);
        let flow = money_flow(bars, &tr, config.admf_length);

        Self {
            ma5: rolling_mean(&closes, MA_SHORT),
            ma20: rolling_mean(&closes, MA_MID),
            ma60: rolling_mean(&closes, MA_LONG),
            va5: rolling_mean(&volumes, MA_SHORT),
            va20: rolling_mean(&volumes, MA_MID),
            va60: rolling_mean(&volumes, MA_LONG),
            true_range: tr,
            ad_ratio: flow.ad_ratio,
            admf: flow.admf,
        }
    }
}

// =============================================================================
// Output records
// =============================================================================

/// Latest-state summary of one instrument, one row of the scanner table.
///
/// Field names match the legacy wire format; absent oscillation stats
/// serialise as explicit nulls.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub symbol: String,
    pub exchange: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Last close. Kept under the legacy name `price` on the wire.
    pub price: f64,
    pub volume: u64,
    pub ma5: f64,
    pub ma20: f64,
    pub ma60: f64,
    pub va5: f64,
    pub va20: f64,
    pub va60: f64,
    #[serde(flatten)]
    pub convergence: ConvergenceMetrics,
    #[serde(rename = "vaConverge")]
    pub va_converge: f64,
    pub admf: f64,
    pub admf_1m: Option<OscillationStats>,
    pub admf_2m: Option<OscillationStats>,
    pub admf_3m: Option<OscillationStats>,
    pub admf_4m: Option<OscillationStats>,
}

/// One row of the daily table.
///
/// Serialises as a bare 13-element array in [`DAILY_COLUMNS`] order, with an
/// explicit null for every not-yet-computable cell; a null distinguishes
/// "window not filled" from "computed as zero".
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub ma5: Option<f64>,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub va5: Option<f64>,
    pub va20: Option<f64>,
    pub va60: Option<f64>,
    pub admf: f64,
}

impl Serialize for DailyRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_tuple(13)?;
        row.serialize_element(&self.date)?;
        row.serialize_element(&self.open)?;
        row.serialize_element(&self.high)?;
        row.serialize_element(&self.low)?;
        row.serialize_element(&self.close)?;
        row.serialize_element(&self.volume)?;
        row.serialize_element(&self.ma5)?;
        row.serialize_element(&self.ma20)?;
        row.serialize_element(&self.ma60)?;
        row.serialize_element(&self.va5)?;
        row.serialize_element(&self.va20)?;
        row.serialize_element(&self.va60)?;
        row.serialize_element(&self.admf)?;
        row.end()
    }
}

/// Full annotated history of one instrument, shaped for charting.
#[derive(Debug, Clone, Serialize)]
pub struct DailySeries {
    pub symbol: String,
    pub exchange: String,
    /// Date of the most recent bar in the table.
    pub updated: NaiveDate,
    pub columns: [&'static str; 13],
    pub data: Vec<DailyRow>,
}

/// The pair of records one instrument produces.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentRecords {
    pub snapshot: Snapshot,
    pub daily: DailySeries,
}

// =============================================================================
// Builder
// =============================================================================

/// Latest value of a derived column, with the warm-up coercion rule.
///
/// An average still inside its window is treated as 0 here, and only here;
/// the daily table keeps the same position null. Scanner consumers sort and
/// filter on the zeros, so the asymmetry is load-bearing.
fn latest_or_zero(column: &[Option<f64>]) -> f64 {
    column.last().copied().flatten().unwrap_or(0.0)
}

/// Build the Snapshot and DailySeries for one instrument.
///
/// - `Err`: the input violates the fetch-layer contract (non-finite price,
///   inverted range, unordered dates) or the configuration is unusable; the
///   whole instrument is rejected, nothing partial is emitted.
/// - `Ok(None)`: fewer than [`MIN_BARS`] bars; an expected outcome for new
///   listings and thinly traded names, not an error.
/// - `Ok(Some(_))`: both records.
pub fn build_records(
    instrument: &InstrumentSeries,
    config: &ScanConfig,
) -> Result<Option<InstrumentRecords>> {
    if config.admf_length == 0 {
        bail!("admf_length must be at least 1");
    }

    instrument.validate()?;

    if instrument.bars.len() < MIN_BARS {
        debug!(
            symbol = %instrument.symbol,
            bars = instrument.bars.len(),
            min = MIN_BARS,
            "series too short, declining to produce records"
        );
        return Ok(None);
    }

    let columns = IndicatorSeries::derive(&instrument.bars, config);
    let Some(last) = instrument.bars.last() else {
        return Ok(None);
    };

    // Convergence runs on the raw (unrounded) latest averages; only the
    // published figures are wire-rounded.
    let ma5 = latest_or_zero(&columns.ma5);
    let ma20 = latest_or_zero(&columns.ma20);
    let ma60 = latest_or_zero(&columns.ma60);
    let va5 = latest_or_zero(&columns.va5);
    let va20 = latest_or_zero(&columns.va20);
    let va60 = latest_or_zero(&columns.va60);

    let last_admf = columns.admf.last().copied().unwrap_or(0.0);

    let snapshot = Snapshot {
        symbol: instrument.symbol.clone(),
        exchange: instrument.exchange.clone(),
        open: round_dp(last.open, 2),
        high: round_dp(last.high, 2),
        low: round_dp(last.low, 2),
        price: round_dp(last.close, 2),
        volume: last.volume,
        ma5: round_dp(ma5, 2),
        ma20: round_dp(ma20, 2),
        ma60: round_dp(ma60, 2),
        va5: round_dp(va5, 2),
        va20: round_dp(va20, 2),
        va60: round_dp(va60, 2),
        convergence: ConvergenceMetrics::from_averages(ma5, ma20, ma60),
        va_converge: round_dp(aggregate_spread(va5, va20, va60), 2),
        admf: round_dp(last_admf, 0),
        admf_1m: oscillation_stats(&columns.admf, ADMF_HORIZONS[0], config.near_zero_threshold),
        admf_2m: oscillation_stats(&columns.admf, ADMF_HORIZONS[1], config.near_zero_threshold),
        admf_3m: oscillation_stats(&columns.admf, ADMF_HORIZONS[2], config.near_zero_threshold),
        admf_4m: oscillation_stats(&columns.admf, ADMF_HORIZONS[3], config.near_zero_threshold),
    };

    let data: Vec<DailyRow> = instrument
        .bars
        .iter()
        .enumerate()
        .map(|(i, bar)| DailyRow {
            date: bar.date,
            open: round_dp(bar.open, 2),
            high: round_dp(bar.high, 2),
            low: round_dp(bar.low, 2),
            close: round_dp(bar.close, 2),
            volume: bar.volume,
            ma5: columns.ma5[i].map(|v| round_dp(v, 2)),
            ma20: columns.ma20[i].map(|v| round_dp(v, 2)),
            ma60: columns.ma60[i].map(|v| round_dp(v, 2)),
            va5: columns.va5[i].map(|v| round_dp(v, 2)),
            va20: columns.va20[i].map(|v| round_dp(v, 2)),
            va60: columns.va60[i].map(|v| round_dp(v, 2)),
            admf: round_dp(columns.admf[i], 0),
        })
        .collect();

    let daily = DailySeries {
        symbol: instrument.symbol.clone(),
        exchange: instrument.exchange.clone(),
        updated: last.date,
        columns: DAILY_COLUMNS,
        data,
    };

    Ok(Some(InstrumentRecords { snapshot, daily }))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn date(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(i as u64))
            .unwrap()
    }

    /// Bars with a 2-unit range around each close.
    fn bars_from_closes(closes: &[f64], volume: u64) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: date(i),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume,
            })
            .collect()
    }

    fn instrument(closes: &[f64], volume: u64) -> InstrumentSeries {
        InstrumentSeries::new("TST", "HOSE", bars_from_closes(closes, volume))
    }

    fn cfg() -> ScanConfig {
        ScanConfig::default()
    }

    // ---- preconditions ----------------------------------------------------

    #[test]
    fn fewer_than_sixty_bars_produces_nothing() {
        for n in [0usize, 1, 30, 59] {
            let inst = instrument(&vec![10.0; n], 1_000);
            let result = build_records(&inst, &cfg()).unwrap();
            assert!(result.is_none(), "expected no records for {n} bars");
        }
    }

    #[test]
    fn exactly_sixty_bars_produces_records() {
        let inst = instrument(&vec![10.0; 60], 1_000);
        assert!(build_records(&inst, &cfg()).unwrap().is_some());
    }

    #[test]
    fn malformed_input_is_rejected() {
        let mut inst = instrument(&vec![10.0; 60], 1_000);
        inst.bars[30].close = f64::NAN;
        assert!(build_records(&inst, &cfg()).is_err());
    }

    #[test]
    fn zero_admf_length_is_rejected() {
        let inst = instrument(&vec![10.0; 60], 1_000);
        let config = ScanConfig {
            admf_length: 0,
            ..ScanConfig::default()
        };
        assert!(build_records(&inst, &config).is_err());
    }

    // ---- constant series --------------------------------------------------

    #[test]
    fn constant_series_snapshot() {
        let inst = instrument(&vec![10.0; 60], 1_000);
        let records = build_records(&inst, &cfg()).unwrap().unwrap();
        let snap = &records.snapshot;

        assert_eq!(snap.symbol, "TST");
        assert_eq!(snap.exchange, "HOSE");
        assert_eq!(snap.price, 10.0);
        assert_eq!(snap.high, 11.0);
        assert_eq!(snap.low, 9.0);
        assert_eq!(snap.volume, 1_000);
        assert_eq!(snap.ma5, 10.0);
        assert_eq!(snap.ma20, 10.0);
        assert_eq!(snap.ma60, 10.0);
        assert_eq!(snap.convergence.ma_converge, 0.0);
        assert_eq!(snap.va_converge, 0.0);
        // Flat closes give zero close-to-close change, hence a zero
        // oscillator and no oscillation stats at any horizon.
        assert_eq!(snap.admf, 0.0);
        assert!(snap.admf_1m.is_none());
        assert!(snap.admf_2m.is_none());
        assert!(snap.admf_3m.is_none());
        assert!(snap.admf_4m.is_none());
    }

    // ---- spike behaviour --------------------------------------------------

    #[test]
    fn spike_moves_short_average_more_than_long() {
        // One spike bar inside an otherwise flat series: the 5-day mean
        // reflects it fully while the 60-day mean barely moves.
        let mut closes = vec![10.0; 60];
        closes[5] = 12.0;
        let inst = instrument(&closes, 1_000);
        let records = build_records(&inst, &cfg()).unwrap().unwrap();
        let rows = &records.daily.data;

        // Bar 6 is the first where the 5-day window contains the spike... and
        // bars 6..=9 all do: mean = (4*10 + 12)/5 = 10.4.
        let ma5_after = rows[6].ma5.unwrap();
        assert!((ma5_after - 10.4).abs() < 1e-9, "got {ma5_after}");

        // The 60-day mean sees the same spike diluted twelve-fold.
        let ma60_last = rows[59].ma60.unwrap();
        assert!((ma60_last - 10.03).abs() < 1e-9, "got {ma60_last}");
    }

    #[test]
    fn spike_near_the_end_widens_convergence() {
        let flat = instrument(&vec![10.0; 60], 1_000);
        let flat_converge = build_records(&flat, &cfg())
            .unwrap()
            .unwrap()
            .snapshot
            .convergence
            .ma_converge;
        assert_eq!(flat_converge, 0.0);

        let mut closes = vec![10.0; 60];
        closes[57] = 12.0;
        let spiked = instrument(&closes, 1_000);
        let spiked_converge = build_records(&spiked, &cfg())
            .unwrap()
            .unwrap()
            .snapshot
            .convergence
            .ma_converge;

        assert!(
            spiked_converge > flat_converge,
            "spike should widen the spread: {spiked_converge} vs {flat_converge}"
        );
    }

    // ---- zero volume ------------------------------------------------------

    #[test]
    fn zero_volume_series_zeroes_the_volume_side() {
        let mut closes = vec![10.0; 60];
        // Moving prices so the price side is alive while volume is dead.
        for (i, c) in closes.iter_mut().enumerate() {
            *c += (i as f64 * 0.3).sin();
        }
        let inst = instrument(&closes, 0);
        let records = build_records(&inst, &cfg()).unwrap().unwrap();
        let snap = &records.snapshot;

        assert_eq!(snap.va5, 0.0);
        assert_eq!(snap.va20, 0.0);
        assert_eq!(snap.va60, 0.0);
        assert_eq!(snap.va_converge, 0.0);
        // Weighted flow is volume-scaled, so the oscillator never leaves 0.
        assert_eq!(snap.admf, 0.0);
        assert!(snap.admf_1m.is_none());
        for row in &records.daily.data {
            assert_eq!(row.admf, 0.0);
        }
    }

    // ---- daily table ------------------------------------------------------

    #[test]
    fn daily_table_shape_and_nulls() {
        let inst = instrument(&vec![10.0; 70], 1_000);
        let records = build_records(&inst, &cfg()).unwrap().unwrap();
        let daily = &records.daily;

        assert_eq!(daily.columns, DAILY_COLUMNS);
        assert_eq!(daily.data.len(), 70);
        assert_eq!(daily.updated, date(69));

        // Warm-up prefix: each window's first defined position is window - 1.
        assert!(daily.data[3].ma5.is_none());
        assert!(daily.data[4].ma5.is_some());
        assert!(daily.data[18].ma20.is_none());
        assert!(daily.data[19].ma20.is_some());
        assert!(daily.data[58].ma60.is_none());
        assert!(daily.data[59].ma60.is_some());
        assert!(daily.data[58].va60.is_none());
        assert!(daily.data[59].va60.is_some());
    }

    #[test]
    fn daily_row_serialises_as_positional_array() {
        let mut closes = vec![10.0; 60];
        closes[59] = 11.0;
        let inst = instrument(&closes, 1_000);
        let records = build_records(&inst, &cfg()).unwrap().unwrap();

        // A warm-up row: ma60 must be null, not 0.
        let early = serde_json::to_value(&records.daily.data[10]).unwrap();
        let early = early.as_array().unwrap();
        assert_eq!(early.len(), 13);
        assert_eq!(early[0], serde_json::json!("2024-01-11"));
        assert!((early[4].as_f64().unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(early[5], serde_json::json!(1_000));
        assert!(early[8].is_null(), "ma60 must render as null in the warm-up");
        assert!(early[11].is_null(), "va60 must render as null in the warm-up");

        // A fully-warmed row has every cell populated.
        let last = serde_json::to_value(&records.daily.data[59]).unwrap();
        let last = last.as_array().unwrap();
        assert!(last.iter().all(|cell| !cell.is_null()));
    }

    // ---- snapshot wire format ---------------------------------------------

    #[test]
    fn snapshot_serialises_with_legacy_field_names() {
        let inst = instrument(&vec![10.0; 60], 1_000);
        let records = build_records(&inst, &cfg()).unwrap().unwrap();
        let json = serde_json::to_value(&records.snapshot).unwrap();

        for key in [
            "symbol", "exchange", "open", "high", "low", "price", "volume", "ma5", "ma20",
            "ma60", "va5", "va20", "va60", "ma5_20", "ma20_60", "ma5_60", "maConverge",
            "vaConverge", "admf", "admf_1m", "admf_2m", "admf_3m", "admf_4m",
        ] {
            assert!(json.get(key).is_some(), "missing snapshot field {key}");
        }
        // Absent horizon stats are explicit nulls, not omitted fields.
        assert!(json["admf_1m"].is_null());
    }

    #[test]
    fn snapshot_prices_are_wire_rounded() {
        let mut closes = vec![10.0; 60];
        closes[59] = 10.23456;
        let inst = instrument(&closes, 1_000);
        let records = build_records(&inst, &cfg()).unwrap().unwrap();
        assert_eq!(records.snapshot.price, 10.23);
    }

    #[test]
    fn active_series_produces_oscillation_stats() {
        // A slow price wave (20-bar cycle) drives money flow in and out, so
        // the smoothed oscillator keeps crossing zero over every horizon.
        let closes: Vec<f64> = (0..90)
            .map(|i| 10.0 + 2.0 * (i as f64 * std::f64::consts::TAU / 20.0).sin())
            .collect();
        let inst = instrument(&closes, 10_000);
        let records = build_records(&inst, &cfg()).unwrap().unwrap();
        let snap = &records.snapshot;

        for stats in [&snap.admf_1m, &snap.admf_2m, &snap.admf_3m, &snap.admf_4m] {
            let stats = stats.as_ref().expect("stats should be present");
            assert_eq!(stats.max_distance, 100.0);
            assert!(stats.avg_distance > 0.0 && stats.avg_distance <= 100.0);
        }
        // Over ~4.5 cycles the oscillator must have flipped sign repeatedly.
        assert!(snap.admf_4m.unwrap().zero_cross_count > 0);
    }

    // ---- warm-up coercion helper -------------------------------------------

    #[test]
    fn latest_or_zero_coerces_absent_to_zero() {
        assert_eq!(latest_or_zero(&[None, None]), 0.0);
        assert_eq!(latest_or_zero(&[None, Some(4.2)]), 4.2);
        assert_eq!(latest_or_zero(&[]), 0.0);
    }
}
