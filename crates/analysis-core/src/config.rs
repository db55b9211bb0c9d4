use serde::{Deserialize, Serialize};

/// Trailing lookback windows, in bars (trading days).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindows {
    pub one_month: usize,
    pub three_month: usize,
    pub twelve_month: usize,
}

impl LookbackWindows {
    pub const ONE_MONTH: usize = 21;
    pub const THREE_MONTH: usize = 63;
    pub const TWELVE_MONTH: usize = 252;
}

impl Default for LookbackWindows {
    fn default() -> Self {
        Self {
            one_month: Self::ONE_MONTH,
            three_month: Self::THREE_MONTH,
            twelve_month: Self::TWELVE_MONTH,
        }
    }
}

/// Number of signals kept per strategy after ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopN {
    pub technical: usize,
    pub value: usize,
    pub hybrid: usize,
}

impl TopN {
    pub const DEFAULT: usize = 25;

    pub fn uniform(n: usize) -> Self {
        Self {
            technical: n,
            value: n,
            hybrid: n,
        }
    }
}

impl Default for TopN {
    fn default() -> Self {
        Self::uniform(Self::DEFAULT)
    }
}

/// Immutable configuration for one scoring run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub windows: LookbackWindows,
    pub top_n: TopN,
}
