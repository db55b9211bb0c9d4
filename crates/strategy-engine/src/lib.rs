//! Per-symbol strategy evaluation.
//!
//! Each engine turns the latest indicator set and the fundamental score of one
//! symbol into a [`StrategySignal`]. Engines hold no state and never see other
//! symbols, so callers can evaluate them in parallel.

pub mod hybrid;
pub mod momentum;
pub mod value;

pub use hybrid::HybridStrategy;
pub use momentum::TechnicalMomentumStrategy;
pub use value::FundamentalValueStrategy;

use analysis_core::{AnalysisError, StrategyKind, StrategySignal};
use fundamental_analysis::FundamentalScore;
use technical_analysis::LatestIndicators;

pub trait StrategyEngine: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn evaluate(
        &self,
        symbol: &str,
        indicators: &LatestIndicators,
        fundamentals: &FundamentalScore,
    ) -> Result<StrategySignal, AnalysisError>;
}

/// The three strategies in report order.
pub fn all_strategies() -> Vec<Box<dyn StrategyEngine>> {
    vec![
        Box::new(TechnicalMomentumStrategy::new()),
        Box::new(FundamentalValueStrategy::new()),
        Box::new(HybridStrategy::new()),
    ]
}

/// Stop-loss and target multipliers applied to the current price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBands {
    pub stop_loss: f64,
    pub target: f64,
}

impl PriceBands {
    pub const fn new(stop_loss: f64, target: f64) -> Self {
        Self { stop_loss, target }
    }

    /// (stop loss, target) around `price`
    pub fn levels(&self, price: f64) -> (f64, f64) {
        (price * self.stop_loss, price * self.target)
    }
}

pub(crate) fn validate_price(symbol: &str, price: f64) -> Result<f64, AnalysisError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(AnalysisError::InvalidData(format!(
            "{} has unusable price {}",
            symbol, price
        )))
    }
}
