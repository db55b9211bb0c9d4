use std::collections::HashMap;
use std::path::{Path, PathBuf};

use analysis_core::{
    AnalysisError, FundamentalsRecord, FundamentalsSource, PriceBar, PriceDataSource, PriceSeries,
};
use async_trait::async_trait;

pub const FUNDAMENTALS_FILE: &str = "fundamentals.json";

/// Offline data: `<dir>/<SYMBOL>.csv` with `date,open,high,low,close,volume`
/// rows, and an optional `<dir>/fundamentals.json` keyed by symbol.
pub struct CsvDirectorySource {
    dir: PathBuf,
    fundamentals: HashMap<String, FundamentalsRecord>,
}

impl CsvDirectorySource {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AnalysisError> {
        let dir = dir.into();
        if !tokio::fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(AnalysisError::DataSource(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let path = dir.join(FUNDAMENTALS_FILE);
        let fundamentals = match tokio::fs::read_to_string(&path).await {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                AnalysisError::InvalidData(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No {} in {}", FUNDAMENTALS_FILE, dir.display());
                HashMap::new()
            }
            Err(e) => {
                return Err(AnalysisError::DataSource(format!("{}: {}", path.display(), e)));
            }
        };

        tracing::info!(
            "📂 Reading market data from {} ({} fundamentals records)",
            dir.display(),
            fundamentals.len()
        );

        Ok(Self { dir, fundamentals })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn series_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }
}

#[async_trait]
impl PriceDataSource for CsvDirectorySource {
    async fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, AnalysisError> {
        let path = self.series_path(symbol);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AnalysisError::DataSource(format!("{}: {}", path.display(), e)))?;

        parse_bars(&text)
            .map_err(|e| AnalysisError::InvalidData(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl FundamentalsSource for CsvDirectorySource {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalsRecord, AnalysisError> {
        self.fundamentals.get(symbol).cloned().ok_or_else(|| {
            AnalysisError::FundamentalsUnavailable(format!("{} not in {}", symbol, FUNDAMENTALS_FILE))
        })
    }
}

/// Parse `date,open,high,low,close,volume` rows, sorted by date.
pub fn parse_bars(text: &str) -> Result<PriceSeries, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut bars = reader
        .deserialize::<PriceBar>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AnalysisError::InvalidData(e.to_string()))?;
    bars.sort_by_key(|b| b.date);

    PriceSeries::new(bars)
}
