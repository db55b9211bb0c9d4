use std::path::{Path, PathBuf};

use analysis_core::{PriceTrend, RankedList, StrategyMetrics, StrategySignal};
use anyhow::{Context, Result};
use serde::Serialize;

/// Flat CSV row. Metric columns a strategy does not produce are left empty.
#[derive(Debug, Serialize)]
struct PickRow<'a> {
    rank: usize,
    symbol: &'a str,
    strategy: &'static str,
    current_price: f64,
    composite_score: f64,
    rating: &'static str,
    entry_price: f64,
    stop_loss: f64,
    target_price: f64,
    cmi: Option<f64>,
    return_1m: Option<f64>,
    return_12m: Option<f64>,
    pct_from_high: Option<f64>,
    volume_ratio: Option<f64>,
    pe_ratio: Option<f64>,
    pb_ratio: Option<f64>,
    roe_pct: Option<f64>,
    debt_to_equity: Option<f64>,
    price_trend: Option<&'static str>,
    technical_score: Option<f64>,
    fundamental_score: Option<f64>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl<'a> PickRow<'a> {
    fn new(rank: usize, signal: &'a StrategySignal) -> Self {
        let mut row = Self {
            rank,
            symbol: &signal.symbol,
            strategy: signal.strategy.label(),
            current_price: round2(signal.current_price),
            composite_score: round1(signal.composite_score),
            rating: signal.rating.as_str(),
            entry_price: round2(signal.entry_price),
            stop_loss: round2(signal.stop_loss),
            target_price: round2(signal.target_price),
            cmi: None,
            return_1m: None,
            return_12m: None,
            pct_from_high: None,
            volume_ratio: None,
            pe_ratio: None,
            pb_ratio: None,
            roe_pct: None,
            debt_to_equity: None,
            price_trend: None,
            technical_score: None,
            fundamental_score: None,
        };

        match &signal.metrics {
            StrategyMetrics::Technical { cmi, return_1m, return_12m, pct_from_high, volume_ratio } => {
                row.cmi = Some(round2(*cmi));
                row.return_1m = Some(round2(*return_1m));
                row.return_12m = Some(round2(*return_12m));
                row.pct_from_high = Some(round2(*pct_from_high));
                row.volume_ratio = Some(round2(*volume_ratio));
            }
            StrategyMetrics::Value { pe_ratio, pb_ratio, roe_pct, debt_to_equity, price_trend } => {
                row.pe_ratio = Some(round2(*pe_ratio));
                row.pb_ratio = Some(round2(*pb_ratio));
                row.roe_pct = Some(round2(*roe_pct));
                row.debt_to_equity = Some(round2(*debt_to_equity));
                row.price_trend = Some(match price_trend {
                    PriceTrend::Up => "UP",
                    PriceTrend::Down => "DOWN",
                });
            }
            StrategyMetrics::Hybrid { technical_score, fundamental_score, cmi, pe_ratio, return_1m } => {
                row.technical_score = Some(round1(*technical_score));
                row.fundamental_score = Some(round1(*fundamental_score));
                row.cmi = Some(round2(*cmi));
                row.pe_ratio = Some(round2(*pe_ratio));
                row.return_1m = Some(round2(*return_1m));
            }
        }
        row
    }
}

/// File name for a strategy's picks, e.g. `technical_momentum_picks.csv`.
pub fn picks_file_name(list: &RankedList) -> String {
    format!("{}_picks.csv", list.strategy.slug())
}

/// Write one ranked list to `<dir>/<strategy>_picks.csv`. An empty list still
/// produces a header-only file.
pub fn write_picks(dir: &Path, list: &RankedList) -> Result<PathBuf> {
    let path = dir.join(picks_file_name(list));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    if list.is_empty() {
        writer.write_record(PICK_COLUMNS)?;
    }
    for (i, signal) in list.signals.iter().enumerate() {
        writer
            .serialize(PickRow::new(i + 1, signal))
            .with_context(|| format!("Failed to write {} to {}", signal.symbol, path.display()))?;
    }
    writer.flush()?;

    tracing::info!("💾 Saved {} picks to {}", list.signals.len(), path.display());
    Ok(path)
}

const PICK_COLUMNS: [&str; 21] = [
    "rank",
    "symbol",
    "strategy",
    "current_price",
    "composite_score",
    "rating",
    "entry_price",
    "stop_loss",
    "target_price",
    "cmi",
    "return_1m",
    "return_12m",
    "pct_from_high",
    "volume_ratio",
    "pe_ratio",
    "pb_ratio",
    "roe_pct",
    "debt_to_equity",
    "price_trend",
    "technical_score",
    "fundamental_score",
];

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{Rating, StrategyKind};

    fn technical(symbol: &str) -> StrategySignal {
        StrategySignal {
            symbol: symbol.to_string(),
            strategy: StrategyKind::TechnicalMomentum,
            current_price: 2456.789,
            metrics: StrategyMetrics::Technical {
                cmi: 31.456,
                return_1m: 6.004,
                return_12m: 25.0,
                pct_from_high: -1.234,
                volume_ratio: 1.3,
            },
            composite_score: 87.46,
            rating: Rating::StrongBuy,
            entry_price: 2456.789,
            stop_loss: 2260.246,
            target_price: 2825.307,
        }
    }

    fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_writes_rounded_rows() {
        let dir = tempfile::tempdir().unwrap();
        let list = RankedList {
            strategy: StrategyKind::TechnicalMomentum,
            signals: vec![technical("RELIANCE.NS"), technical("TCS.NS")],
            total_evaluated: 2,
        };

        let path = write_picks(dir.path(), &list).unwrap();
        assert!(path.ends_with("technical_momentum_picks.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), PICK_COLUMNS.to_vec());

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(&rows[0][1], "RELIANCE.NS");
        assert_eq!(&rows[0][3], "2456.79");
        assert_eq!(&rows[0][4], "87.5");
        assert_eq!(&rows[0][5], "STRONG_BUY");
        assert_eq!(&rows[0][9], "31.46");
        assert_eq!(&rows[0][14], "");
        assert_eq!(&rows[1][0], "2");
    }

    #[test]
    fn test_empty_list_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let list = RankedList {
            strategy: StrategyKind::Hybrid,
            signals: Vec::new(),
            total_evaluated: 0,
        };

        let path = write_picks(dir.path(), &list).unwrap();
        assert!(path.ends_with("hybrid_strategy_picks.csv"));
        assert!(read_rows(&path).is_empty());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("rank,symbol,strategy"));
    }

    #[test]
    fn test_value_row_carries_trend() {
        let signal = StrategySignal {
            symbol: "ITC.NS".to_string(),
            strategy: StrategyKind::FundamentalValue,
            current_price: 430.0,
            metrics: StrategyMetrics::Value {
                pe_ratio: 25.5,
                pb_ratio: 7.0,
                roe_pct: 28.456,
                debt_to_equity: 0.0,
                price_trend: PriceTrend::Up,
            },
            composite_score: 72.0,
            rating: Rating::Buy,
            entry_price: 430.0,
            stop_loss: 344.0,
            target_price: 537.5,
        };

        let row = PickRow::new(1, &signal);
        assert_eq!(row.strategy, "Fundamental-Value");
        assert_eq!(row.roe_pct, Some(28.46));
        assert_eq!(row.price_trend, Some("UP"));
        assert_eq!(row.cmi, None);
    }
}
