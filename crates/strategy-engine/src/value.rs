use analysis_core::{
    AnalysisError, FundamentalsRecord, PriceTrend, StrategyKind, StrategyMetrics, StrategySignal,
};
use fundamental_analysis::FundamentalScore;
use technical_analysis::LatestIndicators;

use crate::{validate_price, PriceBands, StrategyEngine};

/// Stop at 20% below, fair value at 25% above the current price.
pub const BANDS: PriceBands = PriceBands::new(0.80, 1.25);

/// Ranks on the fundamental aggregate alone; the 50-day trend is context only.
pub struct FundamentalValueStrategy;

impl FundamentalValueStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FundamentalValueStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyEngine for FundamentalValueStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FundamentalValue
    }

    fn evaluate(
        &self,
        symbol: &str,
        indicators: &LatestIndicators,
        fundamentals: &FundamentalScore,
    ) -> Result<StrategySignal, AnalysisError> {
        let price = validate_price(symbol, indicators.close)?;
        let (stop_loss, fair_value) = BANDS.levels(price);

        let price_trend = if indicators.close > indicators.sma_50 {
            PriceTrend::Up
        } else {
            PriceTrend::Down
        };

        let ratio = |value: Option<f64>| FundamentalsRecord::reported(value).unwrap_or(0.0);
        let record = &fundamentals.record;

        Ok(StrategySignal {
            symbol: symbol.to_string(),
            strategy: self.kind(),
            current_price: price,
            metrics: StrategyMetrics::Value {
                pe_ratio: ratio(record.pe_ratio),
                pb_ratio: ratio(record.pb_ratio),
                roe_pct: ratio(record.roe) * 100.0,
                debt_to_equity: ratio(record.debt_to_equity),
                price_trend,
            },
            composite_score: fundamentals.aggregate,
            rating: fundamentals.rating,
            entry_price: price,
            stop_loss,
            target_price: fair_value,
        })
    }
}
