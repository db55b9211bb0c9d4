use std::fmt;

use analysis_core::StrategyKind;
use serde::{Deserialize, Serialize};

/// Trailing holding period measured back from the last bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrailingWindow {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonth,
    #[serde(rename = "6M")]
    SixMonth,
    #[serde(rename = "1Y")]
    OneYear,
}

impl TrailingWindow {
    pub const ALL: [TrailingWindow; 4] = [
        TrailingWindow::OneMonth,
        TrailingWindow::ThreeMonth,
        TrailingWindow::SixMonth,
        TrailingWindow::OneYear,
    ];

    /// Length in trading days.
    pub fn bars(&self) -> usize {
        match self {
            TrailingWindow::OneMonth => 21,
            TrailingWindow::ThreeMonth => 63,
            TrailingWindow::SixMonth => 126,
            TrailingWindow::OneYear => 252,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrailingWindow::OneMonth => "1M",
            TrailingWindow::ThreeMonth => "3M",
            TrailingWindow::SixMonth => "6M",
            TrailingWindow::OneYear => "1Y",
        }
    }
}

impl fmt::Display for TrailingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Percent return of one symbol over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReturn {
    pub symbol: String,
    pub window: TrailingWindow,
    pub return_pct: f64,
}

/// Cross-symbol statistics for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub window: TrailingWindow,
    pub mean_return: f64,
    pub sample_count: usize,
    pub best_return: f64,
    pub worst_return: f64,
}

/// Retrospective performance of a strategy's top picks. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub strategy: StrategyKind,
    pub symbols_tested: Vec<String>,
    /// Windows with at least one sample, shortest first
    pub windows: Vec<WindowSummary>,
    pub returns: Vec<PeriodReturn>,
}

impl BacktestSummary {
    pub fn window(&self, window: TrailingWindow) -> Option<&WindowSummary> {
        self.windows.iter().find(|w| w.window == window)
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
