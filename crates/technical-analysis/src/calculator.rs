use analysis_core::{AnalysisError, LookbackWindows, PriceSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicators::*;

/// Trailing window for the 52-week high/low, in bars.
pub const EXTREMES_WINDOW: usize = 252;
/// Trailing window for the average volume.
pub const VOLUME_WINDOW: usize = 20;
pub const SMA_SHORT: usize = 20;
pub const SMA_MEDIUM: usize = 50;
pub const SMA_LONG: usize = 200;

/// Penalty per 100% below the 52-week high, subtracted from the 1-month return.
pub const MOMENTUM_1M_PENALTY: f64 = 500.0;
/// Penalty per 100% below the 52-week high, subtracted from the 12-month return.
pub const MOMENTUM_12M_PENALTY: f64 = 2000.0;
pub const PMI_SCALE: f64 = 5.0;

/// Derived indicators for one bar. `None` until the bar has enough history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub return_1m: Option<f64>,
    pub return_3m: Option<f64>,
    pub return_12m: Option<f64>,
    pub high_52w: Option<f64>,
    pub low_52w: Option<f64>,
    pub pct_from_high: Option<f64>,
    pub momentum_1m: Option<f64>,
    pub momentum_12m: Option<f64>,
    pub cmi: Option<f64>,
    /// Price-movement index. Informational only; zero whenever it cannot be computed.
    pub pmi: f64,
    pub avg_volume_20: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
}

/// The fully-populated indicator set of the most recent bar, as read by the strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestIndicators {
    pub date: NaiveDate,
    pub close: f64,
    pub return_1m: f64,
    pub return_3m: f64,
    pub return_12m: f64,
    pub high_52w: f64,
    pub low_52w: f64,
    pub pct_from_high: f64,
    pub momentum_1m: f64,
    pub momentum_12m: f64,
    pub cmi: f64,
    pub pmi: f64,
    pub volume_ratio: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub sma_200: f64,
}

impl TryFrom<&IndicatorSnapshot> for LatestIndicators {
    type Error = AnalysisError;

    fn try_from(row: &IndicatorSnapshot) -> Result<Self, Self::Error> {
        fn required(value: Option<f64>, name: &str, date: NaiveDate) -> Result<f64, AnalysisError> {
            value.ok_or_else(|| {
                AnalysisError::CalculationError(format!("{} undefined on {}", name, date))
            })
        }

        Ok(Self {
            date: row.date,
            close: row.close,
            return_1m: required(row.return_1m, "1M return", row.date)?,
            return_3m: required(row.return_3m, "3M return", row.date)?,
            return_12m: required(row.return_12m, "12M return", row.date)?,
            high_52w: required(row.high_52w, "52-week high", row.date)?,
            low_52w: required(row.low_52w, "52-week low", row.date)?,
            pct_from_high: required(row.pct_from_high, "percent from high", row.date)?,
            momentum_1m: required(row.momentum_1m, "1M momentum", row.date)?,
            momentum_12m: required(row.momentum_12m, "12M momentum", row.date)?,
            cmi: required(row.cmi, "CMI", row.date)?,
            pmi: row.pmi,
            volume_ratio: required(row.volume_ratio, "volume ratio", row.date)?,
            sma_20: required(row.sma_20, "SMA 20", row.date)?,
            sma_50: required(row.sma_50, "SMA 50", row.date)?,
            sma_200: required(row.sma_200, "SMA 200", row.date)?,
        })
    }
}

/// Computes momentum, trend and volume indicators from a daily price series.
#[derive(Debug, Clone, Default)]
pub struct IndicatorCalculator {
    windows: LookbackWindows,
}

impl IndicatorCalculator {
    pub fn new(windows: LookbackWindows) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> LookbackWindows {
        self.windows
    }

    /// Bars needed so the final bar has every indicator defined: the longest
    /// trailing window plus the current bar.
    pub fn min_history(&self) -> usize {
        self.windows
            .twelve_month
            .max(self.windows.three_month)
            .max(EXTREMES_WINDOW)
            .max(SMA_LONG)
            + 1
    }

    /// One snapshot per bar.
    pub fn compute(&self, series: &PriceSeries) -> Result<Vec<IndicatorSnapshot>, AnalysisError> {
        let required = self.min_history();
        if series.len() < required {
            return Err(AnalysisError::InsufficientHistory {
                required,
                actual: series.len(),
            });
        }

        let closes = series.closes();
        let volumes = series.volumes();

        let return_1m = trailing_return(&closes, self.windows.one_month);
        let return_3m = trailing_return(&closes, self.windows.three_month);
        let return_12m = trailing_return(&closes, self.windows.twelve_month);
        let high_52w = rolling_max(&series.highs(), EXTREMES_WINDOW);
        let low_52w = rolling_min(&series.lows(), EXTREMES_WINDOW);
        let avg_volume_20 = rolling_mean(&volumes, VOLUME_WINDOW);
        let sma_20 = rolling_mean(&closes, SMA_SHORT);
        let sma_50 = rolling_mean(&closes, SMA_MEDIUM);
        let sma_200 = rolling_mean(&closes, SMA_LONG);

        let snapshots = series
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let close = bar.close;
                let pct_from_high = high_52w[i].map(|high| (close - high) / high * 100.0);
                let distance = pct_from_high.map(f64::abs);

                let momentum_1m = return_1m[i]
                    .zip(distance)
                    .map(|(r, d)| r - MOMENTUM_1M_PENALTY * d / 100.0);
                let momentum_12m = return_12m[i]
                    .zip(distance)
                    .map(|(r, d)| r - MOMENTUM_12M_PENALTY * d / 100.0);
                let cmi = momentum_1m.zip(momentum_12m).map(|(m1, m12)| m1 + m12);

                IndicatorSnapshot {
                    date: bar.date,
                    close,
                    return_1m: return_1m[i],
                    return_3m: return_3m[i],
                    return_12m: return_12m[i],
                    high_52w: high_52w[i],
                    low_52w: low_52w[i],
                    pct_from_high,
                    momentum_1m,
                    momentum_12m,
                    cmi,
                    pmi: price_movement_index(close, low_52w[i], distance, return_1m[i], return_3m[i]),
                    avg_volume_20: avg_volume_20[i],
                    volume_ratio: avg_volume_20[i].map(|avg| bar.volume / avg),
                    sma_20: sma_20[i],
                    sma_50: sma_50[i],
                    sma_200: sma_200[i],
                }
            })
            .collect();

        Ok(snapshots)
    }

    /// Indicators of the most recent bar.
    pub fn latest(&self, series: &PriceSeries) -> Result<LatestIndicators, AnalysisError> {
        let snapshots = self.compute(series)?;
        let last = snapshots.last().ok_or(AnalysisError::InsufficientHistory {
            required: self.min_history(),
            actual: 0,
        })?;
        LatestIndicators::try_from(last)
    }
}

/// PMI saturates to zero on any undefined input or non-finite result (e.g. a flat 3M return).
fn price_movement_index(
    close: f64,
    low_52w: Option<f64>,
    distance_from_high: Option<f64>,
    return_1m: Option<f64>,
    return_3m: Option<f64>,
) -> f64 {
    let (Some(low), Some(distance), Some(r1), Some(r3)) = (low_52w, distance_from_high, return_1m, return_3m)
    else {
        return 0.0;
    };

    let price_multiple = close / low;
    let base = distance * price_multiple / 100.0;
    let pmi = base * (r1 / r3) * PMI_SCALE - PMI_SCALE * distance / 100.0;

    if pmi.is_finite() {
        pmi
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::PriceBar;
    use chrono::Duration;

    fn series_from(closes: &[f64], volumes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let bars = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| PriceBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn wavy_closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + i as f64 * 0.2 + 8.0 * (i as f64 / 9.0).sin())
            .collect()
    }

    #[test]
    fn test_rejects_short_series() {
        let closes = wavy_closes(252);
        let series = series_from(&closes, &vec![1_000.0; 252]);

        let err = IndicatorCalculator::default().compute(&series).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientHistory { required: 253, actual: 252 });
    }

    #[test]
    fn test_min_history_default_windows() {
        assert_eq!(IndicatorCalculator::default().min_history(), 253);
    }

    #[test]
    fn test_accepts_exact_minimum() {
        let closes = wavy_closes(253);
        let series = series_from(&closes, &vec![1_000.0; 253]);

        let latest = IndicatorCalculator::default().latest(&series).unwrap();
        assert_eq!(latest.close, closes[252]);
        assert!((latest.return_12m - (closes[252] / closes[0] - 1.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_early_rows_are_undefined() {
        let closes = wavy_closes(300);
        let series = series_from(&closes, &vec![1_000.0; 300]);
        let rows = IndicatorCalculator::default().compute(&series).unwrap();

        assert_eq!(rows.len(), 300);
        assert!(rows[20].return_1m.is_none());
        assert!(rows[21].return_1m.is_some());
        assert!(rows[18].sma_20.is_none());
        assert!(rows[19].sma_20.is_some());
        assert!(rows[250].high_52w.is_none());
        assert!(rows[251].high_52w.is_some());
        assert!(rows[251].cmi.is_none());
        assert!(rows[252].cmi.is_some());
        assert_eq!(rows[10].pmi, 0.0);
    }

    #[test]
    fn test_cmi_matches_reduced_formula() {
        let closes = wavy_closes(320);
        let series = series_from(&closes, &vec![1_000.0; 320]);
        let latest = IndicatorCalculator::default().latest(&series).unwrap();

        let distance = latest.pct_from_high.abs();
        let expected = latest.return_1m - 5.0 * distance + latest.return_12m - 20.0 * distance;
        assert!(distance > 0.0);
        assert!((latest.cmi - expected).abs() < 1e-9);
        assert!((latest.cmi - (latest.momentum_1m + latest.momentum_12m)).abs() < 1e-12);
    }

    #[test]
    fn test_extremes_use_trailing_252_bars() {
        let mut closes = vec![500.0];
        closes.extend(std::iter::repeat(100.0).take(299));
        let series = series_from(&closes, &vec![1_000.0; 300]);
        let latest = IndicatorCalculator::default().latest(&series).unwrap();

        assert!((latest.high_52w - 101.0).abs() < 1e-9);
        assert!((latest.low_52w - 99.0).abs() < 1e-9);
        let expected_pct = (100.0 - 101.0) / 101.0 * 100.0;
        assert!((latest.pct_from_high - expected_pct).abs() < 1e-9);
        assert!(latest.pct_from_high <= 0.0);
    }

    #[test]
    fn test_pmi_zero_when_three_month_return_flat() {
        let mut closes = wavy_closes(300);
        closes[299] = closes[299 - 63];
        let series = series_from(&closes, &vec![1_000.0; 300]);
        let latest = IndicatorCalculator::default().latest(&series).unwrap();

        assert_eq!(latest.return_3m, 0.0);
        assert_eq!(latest.pmi, 0.0);
    }

    #[test]
    fn test_pmi_formula() {
        let closes = wavy_closes(300);
        let series = series_from(&closes, &vec![1_000.0; 300]);
        let latest = IndicatorCalculator::default().latest(&series).unwrap();

        let distance = latest.pct_from_high.abs();
        let base = distance * (latest.close / latest.low_52w) / 100.0;
        let expected = base * (latest.return_1m / latest.return_3m) * 5.0 - 5.0 * distance / 100.0;
        assert!((latest.pmi - expected).abs() < 1e-9);
    }

    #[test]
    fn test_volume_ratio_and_moving_averages() {
        let closes: Vec<f64> = (0..260).map(|i| 50.0 + i as f64).collect();
        let mut volumes = vec![100.0; 260];
        volumes[259] = 300.0;
        let series = series_from(&closes, &volumes);
        let latest = IndicatorCalculator::default().latest(&series).unwrap();

        assert!((latest.volume_ratio - 300.0 / 110.0).abs() < 1e-9);

        let mean_of_last = |k: usize| closes[260 - k..].iter().sum::<f64>() / k as f64;
        assert!((latest.sma_20 - mean_of_last(20)).abs() < 1e-9);
        assert!((latest.sma_50 - mean_of_last(50)).abs() < 1e-9);
        assert!((latest.sma_200 - mean_of_last(200)).abs() < 1e-9);
        assert!(latest.close > latest.sma_50 && latest.sma_50 > latest.sma_200);
    }
}
