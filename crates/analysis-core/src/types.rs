use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Bars for one symbol, strictly increasing by date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<PriceBar>", into = "Vec<PriceBar>")]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, AnalysisError> {
        if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(AnalysisError::InvalidData(format!(
                "bars must be strictly increasing by date ({} followed by {})",
                pair[0].date, pair[1].date
            )));
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

impl TryFrom<Vec<PriceBar>> for PriceSeries {
    type Error = AnalysisError;

    fn try_from(bars: Vec<PriceBar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}

impl From<PriceSeries> for Vec<PriceBar> {
    fn from(series: PriceSeries) -> Self {
        series.bars
    }
}

/// Valuation and quality ratios for one symbol.
///
/// `None`, zero and non-finite values are all treated as "not reported".
/// `roe` and `profit_margin` are fractions (0.15 = 15%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalsRecord {
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub profit_margin: Option<f64>,
}

impl FundamentalsRecord {
    /// Filter out the values a data provider uses to mean "missing".
    pub fn reported(value: Option<f64>) -> Option<f64> {
        value.filter(|v| v.is_finite() && *v != 0.0)
    }
}

/// Everything the scoring engine needs for one symbol.
#[derive(Debug, Clone)]
pub struct SymbolInput {
    pub symbol: String,
    pub series: PriceSeries,
    pub fundamentals: Result<FundamentalsRecord, AnalysisError>,
}

impl SymbolInput {
    pub fn new(
        symbol: impl Into<String>,
        series: PriceSeries,
        fundamentals: Result<FundamentalsRecord, AnalysisError>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            series,
            fundamentals,
        }
    }
}

/// Recommendation label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rating {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    NoData,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::StrongBuy => "STRONG_BUY",
            Rating::Buy => "BUY",
            Rating::Hold => "HOLD",
            Rating::Sell => "SELL",
            Rating::NoData => "NO_DATA",
        }
    }

    /// BUY or STRONG_BUY
    pub fn is_buy(&self) -> bool {
        matches!(self, Rating::StrongBuy | Rating::Buy)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    TechnicalMomentum,
    FundamentalValue,
    Hybrid,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::TechnicalMomentum,
        StrategyKind::FundamentalValue,
        StrategyKind::Hybrid,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::TechnicalMomentum => "Technical-Momentum",
            StrategyKind::FundamentalValue => "Fundamental-Value",
            StrategyKind::Hybrid => "Hybrid Technical-Fundamental",
        }
    }

    /// Short snake_case identifier used for file names.
    pub fn slug(&self) -> &'static str {
        match self {
            StrategyKind::TechnicalMomentum => "technical_momentum",
            StrategyKind::FundamentalValue => "fundamental_value",
            StrategyKind::Hybrid => "hybrid_strategy",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceTrend {
    Up,
    Down,
}

/// Strategy-specific context carried alongside the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyMetrics {
    Technical {
        cmi: f64,
        return_1m: f64,
        return_12m: f64,
        pct_from_high: f64,
        volume_ratio: f64,
    },
    Value {
        pe_ratio: f64,
        pb_ratio: f64,
        /// Return on equity in percent
        roe_pct: f64,
        debt_to_equity: f64,
        price_trend: PriceTrend,
    },
    Hybrid {
        technical_score: f64,
        fundamental_score: f64,
        cmi: f64,
        pe_ratio: f64,
        return_1m: f64,
    },
}

/// One strategy's verdict on one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySignal {
    pub symbol: String,
    pub strategy: StrategyKind,
    pub current_price: f64,
    pub metrics: StrategyMetrics,
    pub composite_score: f64,
    pub rating: Rating,
    pub entry_price: f64,
    pub stop_loss: f64,
    /// Profit target; the fair-value estimate for the value strategy.
    pub target_price: f64,
}

/// Top-N signals of one strategy, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedList {
    pub strategy: StrategyKind,
    pub signals: Vec<StrategySignal>,
    /// Signals available before truncation
    pub total_evaluated: usize,
}

impl RankedList {
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn leader(&self) -> Option<&StrategySignal> {
        self.signals.first()
    }

    pub fn buy_count(&self) -> usize {
        self.signals.iter().filter(|s| s.rating.is_buy()).count()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.signals.iter().map(|s| s.symbol.as_str())
    }
}
