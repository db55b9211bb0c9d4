use analysis_core::{AnalysisError, Rating, StrategyKind, StrategyMetrics, StrategySignal};
use fundamental_analysis::FundamentalScore;
use technical_analysis::LatestIndicators;

use crate::{validate_price, PriceBands, StrategyEngine};

pub const CMI_STRONG: f64 = 20.0;
pub const CMI_POSITIVE: f64 = 0.0;
pub const CMI_WEAK: f64 = -20.0;
pub const CMI_STRONG_POINTS: f64 = 40.0;
pub const CMI_POSITIVE_POINTS: f64 = 20.0;
pub const CMI_WEAK_POINTS: f64 = 10.0;

pub const TREND_POINTS: f64 = 15.0;

pub const VOLUME_SURGE: f64 = 1.2;
pub const VOLUME_ABOVE_AVERAGE: f64 = 1.0;
pub const VOLUME_SURGE_POINTS: f64 = 20.0;
pub const VOLUME_ABOVE_AVERAGE_POINTS: f64 = 10.0;

pub const RETURN_STRONG: f64 = 5.0;
pub const RETURN_STRONG_POINTS: f64 = 10.0;
pub const RETURN_POSITIVE_POINTS: f64 = 5.0;

pub const STRONG_BUY_SCORE: f64 = 80.0;
pub const BUY_SCORE: f64 = 60.0;
pub const HOLD_SCORE: f64 = 40.0;

pub const BANDS: PriceBands = PriceBands::new(0.92, 1.15);

/// Additive momentum rubric over CMI, trend, volume and the 1-month return.
pub struct TechnicalMomentumStrategy;

impl TechnicalMomentumStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Rubric total in [0, 100].
    pub fn score(&self, ind: &LatestIndicators) -> f64 {
        let mut score = 0.0;

        score += if ind.cmi > CMI_STRONG {
            CMI_STRONG_POINTS
        } else if ind.cmi > CMI_POSITIVE {
            CMI_POSITIVE_POINTS
        } else if ind.cmi > CMI_WEAK {
            CMI_WEAK_POINTS
        } else {
            0.0
        };

        if ind.close > ind.sma_200 {
            score += TREND_POINTS;
        }
        if ind.close > ind.sma_50 {
            score += TREND_POINTS;
        }

        score += if ind.volume_ratio > VOLUME_SURGE {
            VOLUME_SURGE_POINTS
        } else if ind.volume_ratio > VOLUME_ABOVE_AVERAGE {
            VOLUME_ABOVE_AVERAGE_POINTS
        } else {
            0.0
        };

        score += if ind.return_1m > RETURN_STRONG {
            RETURN_STRONG_POINTS
        } else if ind.return_1m > 0.0 {
            RETURN_POSITIVE_POINTS
        } else {
            0.0
        };

        score
    }
}

impl Default for TechnicalMomentumStrategy {
    fn default() -> Self {
        Self::new()
    }
}

pub fn momentum_rating(score: f64) -> Rating {
    if score >= STRONG_BUY_SCORE {
        Rating::StrongBuy
    } else if score >= BUY_SCORE {
        Rating::Buy
    } else if score >= HOLD_SCORE {
        Rating::Hold
    } else {
        Rating::Sell
    }
}

impl StrategyEngine for TechnicalMomentumStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TechnicalMomentum
    }

    fn evaluate(
        &self,
        symbol: &str,
        indicators: &LatestIndicators,
        _fundamentals: &FundamentalScore,
    ) -> Result<StrategySignal, AnalysisError> {
        let price = validate_price(symbol, indicators.close)?;
        let score = self.score(indicators);
        let (stop_loss, target_price) = BANDS.levels(price);

        Ok(StrategySignal {
            symbol: symbol.to_string(),
            strategy: self.kind(),
            current_price: price,
            metrics: StrategyMetrics::Technical {
                cmi: indicators.cmi,
                return_1m: indicators.return_1m,
                return_12m: indicators.return_12m,
                pct_from_high: indicators.pct_from_high,
                volume_ratio: indicators.volume_ratio,
            },
            composite_score: score,
            rating: momentum_rating(score),
            entry_price: price,
            stop_loss,
            target_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use fundamental_analysis::FundamentalScore;

    #[test]
    fn test_full_marks_scenario() {
        let signal = TechnicalMomentumStrategy::new()
            .evaluate("RELIANCE.NS", &strong_indicators(), &FundamentalScore::unavailable())
            .unwrap();

        assert_eq!(signal.composite_score, 100.0);
        assert_eq!(signal.rating, Rating::StrongBuy);
        assert_eq!(signal.entry_price, 100.0);
        assert!((signal.stop_loss - 92.0).abs() < 1e-9);
        assert!((signal.target_price - 115.0).abs() < 1e-9);
        match signal.metrics {
            StrategyMetrics::Technical { cmi, pct_from_high, .. } => {
                assert_eq!(cmi, 31.0);
                assert_eq!(pct_from_high, 0.0);
            }
            other => panic!("unexpected metrics: {:?}", other),
        }
    }

    #[test]
    fn test_weak_symbol_scores_zero() {
        let strategy = TechnicalMomentumStrategy::new();
        assert_eq!(strategy.score(&weak_indicators()), 0.0);
        assert_eq!(momentum_rating(0.0), Rating::Sell);
    }

    #[test]
    fn test_cmi_tiers_do_not_stack() {
        let strategy = TechnicalMomentumStrategy::new();
        let mut ind = weak_indicators();

        let at = |ind: &mut LatestIndicators, cmi: f64| {
            ind.cmi = cmi;
            strategy.score(ind)
        };
        assert_eq!(at(&mut ind, -20.0), 0.0);
        assert_eq!(at(&mut ind, -19.9), 10.0);
        assert_eq!(at(&mut ind, 0.0), 10.0);
        assert_eq!(at(&mut ind, 0.1), 20.0);
        assert_eq!(at(&mut ind, 20.0), 20.0);
        assert_eq!(at(&mut ind, 20.1), 40.0);
    }

    #[test]
    fn test_trend_points_are_independent() {
        let strategy = TechnicalMomentumStrategy::new();
        let mut ind = weak_indicators();
        ind.close = 80.0; // above SMA50 (75), below SMA200 (85)
        assert_eq!(strategy.score(&ind), 15.0);

        ind.sma_50 = 90.0;
        ind.sma_200 = 70.0;
        assert_eq!(strategy.score(&ind), 15.0);

        ind.sma_50 = 70.0;
        assert_eq!(strategy.score(&ind), 30.0);
    }

    #[test]
    fn test_score_monotone_in_volume_ratio() {
        let strategy = TechnicalMomentumStrategy::new();
        let mut ind = weak_indicators();
        let mut previous = f64::NEG_INFINITY;

        for step in 0..=40 {
            ind.volume_ratio = 0.9 + step as f64 * 0.01;
            let score = strategy.score(&ind);
            assert!(score >= previous, "score dropped at volume ratio {}", ind.volume_ratio);
            previous = score;
        }
        assert_eq!(previous, 20.0);
    }

    #[test]
    fn test_score_monotone_in_return_and_cmi() {
        let strategy = TechnicalMomentumStrategy::new();
        let mut ind = weak_indicators();

        let mut previous = f64::NEG_INFINITY;
        for r in [-10.0, -0.1, 0.0, 0.1, 4.9, 5.0, 5.1, 30.0] {
            ind.return_1m = r;
            let score = strategy.score(&ind);
            assert!(score >= previous);
            previous = score;
        }

        let mut previous = f64::NEG_INFINITY;
        for cmi in [-100.0, -20.0, -5.0, 0.0, 5.0, 20.0, 25.0, 500.0] {
            ind.cmi = cmi;
            let score = strategy.score(&ind);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_rating_bands_inclusive() {
        assert_eq!(momentum_rating(80.0), Rating::StrongBuy);
        assert_eq!(momentum_rating(79.9), Rating::Buy);
        assert_eq!(momentum_rating(60.0), Rating::Buy);
        assert_eq!(momentum_rating(40.0), Rating::Hold);
        assert_eq!(momentum_rating(39.9), Rating::Sell);
    }
}
