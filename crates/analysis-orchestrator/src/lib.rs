use analysis_core::{
    AnalysisError, EngineConfig, RankedList, StrategyKind, StrategySignal, SymbolInput, TopN,
};
use chrono::{DateTime, Utc};
use fundamental_analysis::FundamentalScorer;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strategy_engine::{all_strategies, StrategyEngine};
use technical_analysis::IndicatorCalculator;

pub mod ranker;
pub use ranker::rank;

/// A symbol that never reached the strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Output of one scoring pass over a universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningRun {
    pub technical: RankedList,
    pub value: RankedList,
    pub hybrid: RankedList,
    pub excluded: Vec<ExcludedSymbol>,
    pub total_symbols: usize,
    pub timestamp: DateTime<Utc>,
}

impl ScreeningRun {
    pub fn ranked(&self, kind: StrategyKind) -> &RankedList {
        match kind {
            StrategyKind::TechnicalMomentum => &self.technical,
            StrategyKind::FundamentalValue => &self.value,
            StrategyKind::Hybrid => &self.hybrid,
        }
    }

    /// The three lists in report order.
    pub fn lists(&self) -> [&RankedList; 3] {
        [&self.technical, &self.value, &self.hybrid]
    }

    /// No strategy produced a recommendation.
    pub fn is_empty(&self) -> bool {
        self.lists().iter().all(|l| l.is_empty())
    }
}

/// Per-symbol result: one slot per strategy, in `all_strategies()` order.
enum SymbolOutcome {
    Scored(Vec<Option<StrategySignal>>),
    Excluded(ExcludedSymbol),
}

/// Scores a universe of fully-loaded symbols under every strategy and ranks the results.
///
/// Performs no I/O. Symbols are evaluated in parallel; ranking happens once all
/// are done. Input order is the tie-break order.
pub struct AnalysisOrchestrator {
    calculator: IndicatorCalculator,
    scorer: FundamentalScorer,
    strategies: Vec<Box<dyn StrategyEngine>>,
    top_n: TopN,
}

impl AnalysisOrchestrator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            calculator: IndicatorCalculator::new(config.windows),
            scorer: FundamentalScorer::new(),
            strategies: all_strategies(),
            top_n: config.top_n,
        }
    }

    pub fn min_history(&self) -> usize {
        self.calculator.min_history()
    }

    pub fn run(&self, inputs: &[SymbolInput]) -> ScreeningRun {
        let total_symbols = inputs.len();
        tracing::info!("📊 Scoring {} symbols across {} strategies", total_symbols, self.strategies.len());

        let outcomes: Vec<SymbolOutcome> = inputs
            .par_iter()
            .map(|input| self.evaluate_symbol(input))
            .collect();

        let mut per_strategy: Vec<Vec<StrategySignal>> = vec![Vec::new(); self.strategies.len()];
        let mut excluded = Vec::new();

        for outcome in outcomes {
            match outcome {
                SymbolOutcome::Scored(signals) => {
                    for (slot, signal) in signals.into_iter().enumerate() {
                        if let Some(signal) = signal {
                            per_strategy[slot].push(signal);
                        }
                    }
                }
                SymbolOutcome::Excluded(skip) => excluded.push(skip),
            }
        }

        let mut technical = None;
        let mut value = None;
        let mut hybrid = None;

        for (strategy, signals) in self.strategies.iter().zip(per_strategy) {
            let kind = strategy.kind();
            let ranked = rank(kind, signals, self.top_n_for(kind));
            tracing::info!(
                "✅ {}: {} evaluated, top {} kept ({} buy-rated)",
                kind,
                ranked.total_evaluated,
                ranked.signals.len(),
                ranked.buy_count()
            );
            match kind {
                StrategyKind::TechnicalMomentum => technical = Some(ranked),
                StrategyKind::FundamentalValue => value = Some(ranked),
                StrategyKind::Hybrid => hybrid = Some(ranked),
            }
        }

        if !excluded.is_empty() {
            tracing::info!("⏭️  {} symbols excluded before scoring", excluded.len());
        }

        ScreeningRun {
            technical: technical.unwrap_or_else(|| empty(StrategyKind::TechnicalMomentum)),
            value: value.unwrap_or_else(|| empty(StrategyKind::FundamentalValue)),
            hybrid: hybrid.unwrap_or_else(|| empty(StrategyKind::Hybrid)),
            excluded,
            total_symbols,
            timestamp: Utc::now(),
        }
    }

    fn top_n_for(&self, kind: StrategyKind) -> usize {
        match kind {
            StrategyKind::TechnicalMomentum => self.top_n.technical,
            StrategyKind::FundamentalValue => self.top_n.value,
            StrategyKind::Hybrid => self.top_n.hybrid,
        }
    }

    fn evaluate_symbol(&self, input: &SymbolInput) -> SymbolOutcome {
        let indicators = match self.calculator.latest(&input.series) {
            Ok(latest) => latest,
            Err(e) => {
                log_exclusion(&input.symbol, &e);
                return SymbolOutcome::Excluded(ExcludedSymbol {
                    symbol: input.symbol.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let fundamentals = self
            .scorer
            .score_or_unavailable(&input.symbol, &input.fundamentals);

        let signals = self
            .strategies
            .iter()
            .map(|strategy| {
                match strategy.evaluate(&input.symbol, &indicators, &fundamentals) {
                    Ok(signal) => Some(signal),
                    Err(e) => {
                        tracing::warn!("Failed to evaluate {} for {}: {}", input.symbol, strategy.kind(), e);
                        None
                    }
                }
            })
            .collect();

        SymbolOutcome::Scored(signals)
    }
}

impl Default for AnalysisOrchestrator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn log_exclusion(symbol: &str, error: &AnalysisError) {
    if error.excludes_symbol() {
        tracing::debug!("Skipping {}: {}", symbol, error);
    } else {
        tracing::warn!("Failed to compute indicators for {}: {}", symbol, error);
    }
}

fn empty(strategy: StrategyKind) -> RankedList {
    RankedList {
        strategy,
        signals: Vec::new(),
        total_evaluated: 0,
    }
}
