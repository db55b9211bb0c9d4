use std::collections::BTreeMap;
use std::time::Duration;

use analysis_core::{
    AnalysisError, FundamentalsRecord, FundamentalsSource, PriceBar, PriceDataSource, PriceSeries,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, Url};
use serde_json::Value;

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "summaryDetail,defaultKeyStatistics,financialData";

pub const DEFAULT_HISTORY_RANGE: &str = "2y";

/// Daily bars and fundamentals from Yahoo Finance.
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    range: String,
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            range: DEFAULT_HISTORY_RANGE.to_string(),
        }
    }

    /// History length requested from the chart endpoint (`1y`, `2y`, `5y`, ...).
    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = range.into();
        self
    }

    async fn get_json(&self, url: Url) -> Result<Value, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceDataSource for YahooFinanceClient {
    async fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, AnalysisError> {
        let mut url = symbol_url(CHART_URL, symbol)?;
        url.query_pairs_mut()
            .append_pair("range", &self.range)
            .append_pair("interval", "1d");

        let json = self
            .get_json(url)
            .await
            .map_err(|e| AnalysisError::DataSource(format!("{}: {}", symbol, e)))?;

        parse_chart(&json)
    }
}

#[async_trait]
impl FundamentalsSource for YahooFinanceClient {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalsRecord, AnalysisError> {
        let mut url = symbol_url(QUOTE_SUMMARY_URL, symbol)?;
        url.query_pairs_mut().append_pair("modules", SUMMARY_MODULES);

        let json = self
            .get_json(url)
            .await
            .map_err(|e| AnalysisError::FundamentalsUnavailable(format!("{}: {}", symbol, e)))?;

        parse_quote_summary(&json)
    }
}

fn symbol_url(base: &str, symbol: &str) -> Result<Url, AnalysisError> {
    let mut url = Url::parse(base).map_err(|e| AnalysisError::DataSource(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| AnalysisError::DataSource(format!("cannot build URL for {}", symbol)))?
        .push(symbol);
    Ok(url)
}

/// Turn a v8 chart response into a series. Bars with any missing field are
/// dropped; when two bars fall on the same exchange-local date the later wins.
pub fn parse_chart(json: &Value) -> Result<PriceSeries, AnalysisError> {
    let chart = json
        .get("chart")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::DataSource("No chart data found".to_string()))?;

    let gmt_offset = chart
        .get("meta")
        .and_then(|m| m.get("gmtoffset"))
        .and_then(|v| v.as_i64())
        .unwrap_or(0);

    let timestamps = chart
        .get("timestamp")
        .and_then(|v| v.as_array())
        .ok_or_else(|| AnalysisError::DataSource("No timestamps found".to_string()))?;

    let quote = chart
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::DataSource("No quote data found".to_string()))?;

    let column = |name: &str| -> Vec<Option<f64>> {
        quote
            .get(name)
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().map(Value::as_f64).collect())
            .unwrap_or_default()
    };
    let (opens, highs, lows, closes, volumes) = (
        column("open"),
        column("high"),
        column("low"),
        column("close"),
        column("volume"),
    );
    let at = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten();

    let mut by_date: BTreeMap<NaiveDate, PriceBar> = BTreeMap::new();
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(date) = ts
            .as_i64()
            .and_then(|t| DateTime::from_timestamp(t + gmt_offset, 0))
            .map(|dt| dt.date_naive())
        else {
            continue;
        };

        if let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            at(&opens, i),
            at(&highs, i),
            at(&lows, i),
            at(&closes, i),
            at(&volumes, i),
        ) {
            by_date.insert(date, PriceBar { date, open, high, low, close, volume });
        }
    }

    PriceSeries::new(by_date.into_values().collect())
}

/// Extract the six ratios from a v10 quoteSummary response.
pub fn parse_quote_summary(json: &Value) -> Result<FundamentalsRecord, AnalysisError> {
    let result = json
        .get("quoteSummary")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::FundamentalsUnavailable("No quote summary found".to_string()))?;

    // values arrive either bare or as {"raw": x, "fmt": "..."}
    let field = |module: &str, name: &str| -> Option<f64> {
        let value = result.get(module)?.get(name)?;
        value.get("raw").unwrap_or(value).as_f64()
    };

    Ok(FundamentalsRecord {
        pe_ratio: field("summaryDetail", "trailingPE"),
        pb_ratio: field("defaultKeyStatistics", "priceToBook"),
        roe: field("financialData", "returnOnEquity"),
        debt_to_equity: field("financialData", "debtToEquity"),
        current_ratio: field("financialData", "currentRatio"),
        profit_margin: field("financialData", "profitMargins")
            .or_else(|| field("defaultKeyStatistics", "profitMargins")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_chart() {
        // 2024-01-02 and 2024-01-03 03:45 UTC (09:15 IST), plus a partial bar
        let json = json!({
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": 19800 },
                    "timestamp": [1704167100, 1704253500, 1704339900],
                    "indicators": { "quote": [{
                        "open":   [100.0, 102.0, null],
                        "high":   [103.0, 104.0, 105.0],
                        "low":    [99.0, 101.0, 100.0],
                        "close":  [102.0, 103.5, 104.0],
                        "volume": [150000, 120000, 90000]
                    }]}
                }],
                "error": null
            }
        });

        let series = parse_chart(&json).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(series.closes(), vec![102.0, 103.5]);
        assert_eq!(series.volumes(), vec![150000.0, 120000.0]);
    }

    #[test]
    fn test_parse_chart_keeps_last_bar_per_date() {
        let json = json!({
            "chart": { "result": [{
                "timestamp": [1704189600, 1704200400],
                "indicators": { "quote": [{
                    "open": [1.0, 2.0], "high": [1.0, 2.0], "low": [1.0, 2.0],
                    "close": [1.0, 2.0], "volume": [10, 20]
                }]}
            }]}
        });

        let series = parse_chart(&json).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.closes(), vec![2.0]);
    }

    #[test]
    fn test_parse_chart_rejects_empty_result() {
        let json = json!({ "chart": { "result": null, "error": { "code": "Not Found" } } });
        assert!(matches!(parse_chart(&json), Err(AnalysisError::DataSource(_))));
    }

    #[test]
    fn test_parse_quote_summary() {
        let json = json!({
            "quoteSummary": { "result": [{
                "summaryDetail": { "trailingPE": { "raw": 24.5, "fmt": "24.50" } },
                "defaultKeyStatistics": { "priceToBook": { "raw": 3.1, "fmt": "3.10" } },
                "financialData": {
                    "returnOnEquity": { "raw": 0.19, "fmt": "19.00%" },
                    "debtToEquity": { "raw": 35.2, "fmt": "35.20" },
                    "currentRatio": {},
                    "profitMargins": 0.11
                }
            }]}
        });

        let record = parse_quote_summary(&json).unwrap();
        assert_eq!(record.pe_ratio, Some(24.5));
        assert_eq!(record.pb_ratio, Some(3.1));
        assert_eq!(record.roe, Some(0.19));
        assert_eq!(record.debt_to_equity, Some(35.2));
        assert_eq!(record.current_ratio, None);
        assert_eq!(record.profit_margin, Some(0.11));
    }

    #[test]
    fn test_parse_quote_summary_missing_result() {
        let json = json!({ "quoteSummary": { "result": [], "error": null } });
        assert!(matches!(
            parse_quote_summary(&json),
            Err(AnalysisError::FundamentalsUnavailable(_))
        ));
    }

    #[test]
    fn test_symbol_url_appends_symbol() {
        let url = symbol_url(CHART_URL, "M&M.NS").unwrap();
        assert!(url.path().ends_with("/chart/M&M.NS"));
    }
}
