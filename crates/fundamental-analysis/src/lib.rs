use analysis_core::{AnalysisError, FundamentalsRecord, Rating};
use serde::{Deserialize, Serialize};

/// Points lost per unit of P/E.
pub const PE_PENALTY: f64 = 2.0;
/// Points lost per unit of P/B.
pub const PB_PENALTY: f64 = 20.0;
/// Points per unit of ROE (as a fraction).
pub const ROE_WEIGHT: f64 = 500.0;
/// Points lost per unit of debt-to-equity.
pub const DEBT_PENALTY: f64 = 20.0;
/// Debt score when debt-to-equity is not reported.
pub const DEBT_NEUTRAL_SCORE: f64 = 50.0;
/// Points per unit of current ratio.
pub const LIQUIDITY_WEIGHT: f64 = 50.0;
/// Points per unit of profit margin (as a fraction).
pub const MARGIN_WEIGHT: f64 = 1000.0;

pub const VALUE_BUY_THRESHOLD: f64 = 70.0;
pub const VALUE_HOLD_THRESHOLD: f64 = 40.0;

const MAX_SUB_SCORE: f64 = 100.0;

/// Six bounded sub-scores and their mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalScore {
    pub pe_score: f64,
    pub pb_score: f64,
    pub roe_score: f64,
    pub debt_score: f64,
    pub liquidity_score: f64,
    pub margin_score: f64,
    pub aggregate: f64,
    pub rating: Rating,
    /// Raw ratios, kept for reporting
    pub record: FundamentalsRecord,
}

impl FundamentalScore {
    /// Stand-in for a symbol whose fundamentals could not be obtained.
    pub fn unavailable() -> Self {
        Self {
            pe_score: 0.0,
            pb_score: 0.0,
            roe_score: 0.0,
            debt_score: 0.0,
            liquidity_score: 0.0,
            margin_score: 0.0,
            aggregate: 0.0,
            rating: Rating::NoData,
            record: FundamentalsRecord::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.rating != Rating::NoData
    }

    pub fn sub_scores(&self) -> [f64; 6] {
        [
            self.pe_score,
            self.pb_score,
            self.roe_score,
            self.debt_score,
            self.liquidity_score,
            self.margin_score,
        ]
    }
}

/// Maps valuation and quality ratios onto a 0-100 score.
pub struct FundamentalScorer;

impl FundamentalScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, record: &FundamentalsRecord) -> FundamentalScore {
        let pe_score = FundamentalsRecord::reported(record.pe_ratio)
            .filter(|pe| *pe > 0.0)
            .map_or(0.0, |pe| bounded(MAX_SUB_SCORE - PE_PENALTY * pe));

        let pb_score = FundamentalsRecord::reported(record.pb_ratio)
            .filter(|pb| *pb > 0.0)
            .map_or(0.0, |pb| bounded(MAX_SUB_SCORE - PB_PENALTY * pb));

        let roe_score =
            FundamentalsRecord::reported(record.roe).map_or(0.0, |roe| bounded(ROE_WEIGHT * roe));

        let debt_score = FundamentalsRecord::reported(record.debt_to_equity)
            .map_or(DEBT_NEUTRAL_SCORE, |de| bounded(MAX_SUB_SCORE - DEBT_PENALTY * de));

        let liquidity_score = FundamentalsRecord::reported(record.current_ratio)
            .map_or(0.0, |cr| bounded(LIQUIDITY_WEIGHT * cr));

        let margin_score = FundamentalsRecord::reported(record.profit_margin)
            .map_or(0.0, |pm| bounded(MARGIN_WEIGHT * pm));

        let aggregate =
            (pe_score + pb_score + roe_score + debt_score + liquidity_score + margin_score) / 6.0;

        FundamentalScore {
            pe_score,
            pb_score,
            roe_score,
            debt_score,
            liquidity_score,
            margin_score,
            aggregate,
            rating: value_rating(aggregate),
            record: record.clone(),
        }
    }

    /// Scores a fetched record, degrading a failed fetch to `NO_DATA`.
    pub fn score_or_unavailable(
        &self,
        symbol: &str,
        fundamentals: &Result<FundamentalsRecord, AnalysisError>,
    ) -> FundamentalScore {
        match fundamentals {
            Ok(record) => self.score(record),
            Err(e) => {
                tracing::warn!("⚠️  No fundamentals for {}: {}", symbol, e);
                FundamentalScore::unavailable()
            }
        }
    }
}

impl Default for FundamentalScorer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn value_rating(aggregate: f64) -> Rating {
    if aggregate > VALUE_BUY_THRESHOLD {
        Rating::Buy
    } else if aggregate > VALUE_HOLD_THRESHOLD {
        Rating::Hold
    } else {
        Rating::Sell
    }
}

fn bounded(score: f64) -> f64 {
    score.clamp(0.0, MAX_SUB_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pe: f64, pb: f64, roe: f64, de: f64, cr: f64, pm: f64) -> FundamentalsRecord {
        FundamentalsRecord {
            pe_ratio: Some(pe),
            pb_ratio: Some(pb),
            roe: Some(roe),
            debt_to_equity: Some(de),
            current_ratio: Some(cr),
            profit_margin: Some(pm),
        }
    }

    #[test]
    fn test_all_missing_uses_neutral_debt_only() {
        let score = FundamentalScorer::new().score(&FundamentalsRecord::default());

        assert_eq!(score.debt_score, 50.0);
        assert_eq!(score.pe_score, 0.0);
        assert_eq!(score.pb_score, 0.0);
        assert_eq!(score.roe_score, 0.0);
        assert_eq!(score.liquidity_score, 0.0);
        assert_eq!(score.margin_score, 0.0);
        assert!((score.aggregate - 50.0 / 6.0).abs() < 1e-9);
        assert_eq!(score.rating, Rating::Sell);
    }

    #[test]
    fn test_zero_values_count_as_missing() {
        let score = FundamentalScorer::new().score(&record(0.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        assert_eq!(score.debt_score, 50.0);
        assert!((score.aggregate - 50.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_typical_record() {
        // P/E 15, P/B 2, ROE 18%, D/E 0.5, current ratio 1.5, margin 12%
        let score = FundamentalScorer::new().score(&record(15.0, 2.0, 0.18, 0.5, 1.5, 0.12));

        assert!((score.pe_score - 70.0).abs() < 1e-9);
        assert!((score.pb_score - 60.0).abs() < 1e-9);
        assert!((score.roe_score - 90.0).abs() < 1e-9);
        assert!((score.debt_score - 90.0).abs() < 1e-9);
        assert!((score.liquidity_score - 75.0).abs() < 1e-9);
        assert!((score.margin_score - 100.0).abs() < 1e-9);
        assert!((score.aggregate - 485.0 / 6.0).abs() < 1e-9);
        assert_eq!(score.rating, Rating::Buy);
        assert!(score.is_available());
    }

    #[test]
    fn test_sub_scores_are_clamped() {
        let score = FundamentalScorer::new().score(&record(80.0, 9.0, 0.9, 12.0, 5.0, 0.5));
        assert!(score.sub_scores().iter().all(|s| (0.0..=100.0).contains(s)));
        assert_eq!(score.pe_score, 0.0);
        assert_eq!(score.roe_score, 100.0);
        assert_eq!(score.debt_score, 0.0);

        let negative = FundamentalScorer::new().score(&record(-12.0, -1.0, -0.2, -0.5, 1.0, -0.1));
        assert_eq!(negative.pe_score, 0.0);
        assert_eq!(negative.pb_score, 0.0);
        assert_eq!(negative.roe_score, 0.0);
        assert_eq!(negative.margin_score, 0.0);
        assert_eq!(negative.debt_score, 100.0);
    }

    #[test]
    fn test_value_rating_thresholds_are_strict() {
        assert_eq!(value_rating(70.0), Rating::Hold);
        assert_eq!(value_rating(70.01), Rating::Buy);
        assert_eq!(value_rating(40.0), Rating::Sell);
        assert_eq!(value_rating(40.01), Rating::Hold);
    }

    #[test]
    fn test_failed_fetch_degrades_to_no_data() {
        let fetched = Err(AnalysisError::FundamentalsUnavailable("timeout".to_string()));
        let score = FundamentalScorer::new().score_or_unavailable("INFY.NS", &fetched);

        assert_eq!(score.aggregate, 0.0);
        assert_eq!(score.rating, Rating::NoData);
        assert!(!score.is_available());
    }
}
