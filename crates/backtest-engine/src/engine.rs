use std::collections::HashMap;

use analysis_core::{PriceSeries, RankedList};
use statrs::statistics::Statistics;

use crate::models::*;

/// Picks evaluated per strategy.
pub const DEFAULT_TOP_PICKS: usize = 10;

/// Measures how a strategy's current leaders performed over trailing windows.
pub struct BacktestEvaluator {
    top_picks: usize,
    windows: Vec<TrailingWindow>,
}

impl BacktestEvaluator {
    pub fn new(top_picks: usize) -> Self {
        Self {
            top_picks,
            windows: TrailingWindow::ALL.to_vec(),
        }
    }

    pub fn evaluate(
        &self,
        list: &RankedList,
        history: &HashMap<String, PriceSeries>,
    ) -> BacktestSummary {
        let symbols_tested: Vec<String> = list
            .symbols()
            .take(self.top_picks)
            .map(str::to_string)
            .collect();

        tracing::info!(
            "📈 Backtesting {} over {} symbols",
            list.strategy,
            symbols_tested.len()
        );

        let mut returns = Vec::new();
        for symbol in &symbols_tested {
            let Some(series) = history.get(symbol) else {
                tracing::debug!("No price history for {}, skipping backtest", symbol);
                continue;
            };
            let closes = series.closes();

            for window in &self.windows {
                if let Some(return_pct) = trailing_return(&closes, window.bars()) {
                    returns.push(PeriodReturn {
                        symbol: symbol.clone(),
                        window: *window,
                        return_pct,
                    });
                }
            }
        }

        let windows = self
            .windows
            .iter()
            .filter_map(|window| summarize(*window, &returns))
            .collect();

        BacktestSummary {
            strategy: list.strategy,
            symbols_tested,
            windows,
            returns,
        }
    }
}

impl Default for BacktestEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_PICKS)
    }
}

/// `(close[last] / close[last - window] - 1) * 100`, or `None` without enough
/// history or with a non-finite result.
fn trailing_return(closes: &[f64], window: usize) -> Option<f64> {
    if closes.len() <= window {
        return None;
    }
    let last = closes[closes.len() - 1];
    let base = closes[closes.len() - 1 - window];
    let pct = (last / base - 1.0) * 100.0;
    pct.is_finite().then_some(pct)
}

fn summarize(window: TrailingWindow, returns: &[PeriodReturn]) -> Option<WindowSummary> {
    let samples: Vec<f64> = returns
        .iter()
        .filter(|r| r.window == window)
        .map(|r| r.return_pct)
        .collect();

    if samples.is_empty() {
        return None;
    }

    let samples = samples.as_slice();
    Some(WindowSummary {
        window,
        mean_return: Statistics::mean(samples),
        sample_count: samples.len(),
        best_return: Statistics::max(samples),
        worst_return: Statistics::min(samples),
    })
}
