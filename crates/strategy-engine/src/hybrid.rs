use analysis_core::{
    AnalysisError, FundamentalsRecord, Rating, StrategyKind, StrategyMetrics, StrategySignal,
};
use fundamental_analysis::FundamentalScore;
use technical_analysis::LatestIndicators;

use crate::{validate_price, PriceBands, StrategyEngine};

pub const GATE_POINTS: f64 = 25.0;
pub const GATE_CMI: f64 = 10.0;
pub const GATE_VOLUME_RATIO: f64 = 1.1;

pub const TECHNICAL_WEIGHT: f64 = 0.6;
pub const FUNDAMENTAL_WEIGHT: f64 = 0.4;

pub const BANDS: PriceBands = PriceBands::new(0.88, 1.20);

/// Minimum (hybrid, technical, fundamental) scores for a tier.
#[derive(Debug, Clone, Copy)]
struct Tier {
    hybrid: f64,
    technical: f64,
    fundamental: f64,
    rating: Rating,
}

const TIERS: [Tier; 3] = [
    Tier { hybrid: 75.0, technical: 70.0, fundamental: 50.0, rating: Rating::StrongBuy },
    Tier { hybrid: 60.0, technical: 50.0, fundamental: 40.0, rating: Rating::Buy },
    Tier { hybrid: 45.0, technical: f64::NEG_INFINITY, fundamental: f64::NEG_INFINITY, rating: Rating::Hold },
];

/// Blends a four-gate technical check with the fundamental aggregate.
pub struct HybridStrategy;

impl HybridStrategy {
    pub fn new() -> Self {
        Self
    }

    /// 25 points per passing gate: CMI, long-term trend, volume, 1-month return.
    pub fn technical_score(&self, ind: &LatestIndicators) -> f64 {
        let gates = [
            ind.cmi > GATE_CMI,
            ind.close > ind.sma_200,
            ind.volume_ratio > GATE_VOLUME_RATIO,
            ind.return_1m > 0.0,
        ];
        gates.iter().filter(|passed| **passed).count() as f64 * GATE_POINTS
    }
}

impl Default for HybridStrategy {
    fn default() -> Self {
        Self::new()
    }
}

pub fn hybrid_score(technical: f64, fundamental: f64) -> f64 {
    TECHNICAL_WEIGHT * technical + FUNDAMENTAL_WEIGHT * fundamental
}

/// First tier whose thresholds are all met wins.
pub fn hybrid_rating(hybrid: f64, technical: f64, fundamental: f64) -> Rating {
    TIERS
        .iter()
        .find(|t| hybrid >= t.hybrid && technical >= t.technical && fundamental >= t.fundamental)
        .map_or(Rating::Sell, |t| t.rating)
}

impl StrategyEngine for HybridStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hybrid
    }

    fn evaluate(
        &self,
        symbol: &str,
        indicators: &LatestIndicators,
        fundamentals: &FundamentalScore,
    ) -> Result<StrategySignal, AnalysisError> {
        let price = validate_price(symbol, indicators.close)?;
        let technical = self.technical_score(indicators);
        let fundamental = fundamentals.aggregate;
        let score = hybrid_score(technical, fundamental);
        let (stop_loss, target_price) = BANDS.levels(price);

        Ok(StrategySignal {
            symbol: symbol.to_string(),
            strategy: self.kind(),
            current_price: price,
            metrics: StrategyMetrics::Hybrid {
                technical_score: technical,
                fundamental_score: fundamental,
                cmi: indicators.cmi,
                pe_ratio: FundamentalsRecord::reported(fundamentals.record.pe_ratio).unwrap_or(0.0),
                return_1m: indicators.return_1m,
            },
            composite_score: score,
            rating: hybrid_rating(score, technical, fundamental),
            entry_price: price,
            stop_loss,
            target_price,
        })
    }
}
