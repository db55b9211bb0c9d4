use std::sync::Arc;
use std::time::Duration;

use analysis_core::{AnalysisError, FundamentalsSource, PriceDataSource, SymbolInput};
use tokio::task::JoinSet;

/// How a universe is paced against the data provider.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub batch_size: usize,
    /// Pause between consecutive batches
    pub delay: Duration,
}

impl BatchOptions {
    pub const DEFAULT_BATCH_SIZE: usize = 25;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
            delay: Self::DEFAULT_DELAY,
        }
    }
}

/// Loaded inputs plus the symbols whose prices could not be fetched.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// In the order the symbols were requested
    pub inputs: Vec<SymbolInput>,
    pub failed: Vec<(String, AnalysisError)>,
}

/// Fetch prices and fundamentals for every symbol, one batch at a time.
///
/// Symbols within a batch are fetched concurrently. Price failures drop the
/// symbol without requesting its fundamentals; fundamentals failures are
/// carried through for the scorer to degrade.
pub async fn fetch_universe(
    prices: Arc<dyn PriceDataSource>,
    fundamentals: Arc<dyn FundamentalsSource>,
    symbols: &[String],
    options: &BatchOptions,
) -> FetchOutcome {
    let batch_size = options.batch_size.max(1);
    let total_batches = symbols.len().div_ceil(batch_size);
    let mut outcome = FetchOutcome::default();

    tracing::info!(
        "⬇️  Downloading data for {} symbols in batches of {}",
        symbols.len(),
        batch_size
    );

    for (batch_index, batch) in symbols.chunks(batch_size).enumerate() {
        tracing::info!(
            "Processing batch {}/{} ({} symbols)",
            batch_index + 1,
            total_batches,
            batch.len()
        );

        let mut tasks = JoinSet::new();
        for (offset, symbol) in batch.iter().enumerate() {
            let prices = Arc::clone(&prices);
            let fundamentals = Arc::clone(&fundamentals);
            let symbol = symbol.clone();
            tasks.spawn(async move {
                let loaded = match prices.fetch_series(&symbol).await {
                    Ok(series) => Ok((series, fundamentals.fetch_fundamentals(&symbol).await)),
                    Err(e) => Err(e),
                };
                (offset, symbol, loaded)
            });
        }

        let mut results = Vec::with_capacity(batch.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!("Fetch task error: {}", e),
            }
        }
        results.sort_by_key(|(offset, ..)| *offset);

        for (_, symbol, loaded) in results {
            match loaded {
                Ok((series, record)) => outcome.inputs.push(SymbolInput::new(symbol, series, record)),
                Err(e) => {
                    tracing::warn!("Failed to fetch {}: {}", symbol, e);
                    outcome.failed.push((symbol, e));
                }
            }
        }

        if batch_index + 1 < total_batches && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    tracing::info!(
        "✓ Loaded {} of {} symbols ({} failed)",
        outcome.inputs.len(),
        symbols.len(),
        outcome.failed.len()
    );

    outcome
}
