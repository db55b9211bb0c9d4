use async_trait::async_trait;

use crate::{AnalysisError, FundamentalsRecord, PriceSeries};

/// A symbol list together with the name of the universe that actually produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUniverse {
    pub name: String,
    pub symbols: Vec<String>,
}

/// Supplies the list of symbols to screen
#[async_trait]
pub trait SymbolSource: Send + Sync {
    async fn list(&self) -> Result<Vec<String>, AnalysisError>;

    fn name(&self) -> &str;

    /// Symbols plus the effective universe name. Sources with a fallback
    /// override this so the name follows the list that was served.
    async fn resolve(&self) -> Result<ResolvedUniverse, AnalysisError> {
        Ok(ResolvedUniverse {
            name: self.name().to_string(),
            symbols: self.list().await?,
        })
    }
}

/// Supplies daily price history for a symbol
#[async_trait]
pub trait PriceDataSource: Send + Sync {
    async fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, AnalysisError>;
}

/// Supplies the latest fundamentals snapshot for a symbol
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalsRecord, AnalysisError>;
}
