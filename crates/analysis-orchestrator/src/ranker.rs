use analysis_core::{RankedList, StrategyKind, StrategySignal};

/// Sort signals best-first and keep the leading `top_n`.
///
/// Scores are compared at one decimal, the precision they are reported at, so
/// 62.01 and 62.04 tie. The sort is stable: tied scores keep the order in which
/// the symbols were supplied, so callers get deterministic output only if they
/// supply symbols in a fixed order. Signals keep their full-precision scores.
pub fn rank(strategy: StrategyKind, mut signals: Vec<StrategySignal>, top_n: usize) -> RankedList {
    let total_evaluated = signals.len();

    signals.sort_by(|a, b| {
        ranking_key(b.composite_score)
            .partial_cmp(&ranking_key(a.composite_score))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    signals.truncate(top_n);

    RankedList {
        strategy,
        signals,
        total_evaluated,
    }
}

fn ranking_key(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}
