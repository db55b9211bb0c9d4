use std::path::PathBuf;
use std::time::Duration;

use analysis_core::TopN;
use market_data::{BatchOptions, DEFAULT_MAX_SYMBOLS};

pub const DEFAULT_HISTORY_RANGE: &str = "2y";

/// Run settings read from `SCREENER_*` environment variables.
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    pub top_n: TopN,
    pub batch: BatchOptions,
    pub output_dir: PathBuf,
    /// Yahoo chart range, e.g. "2y"
    pub history_range: String,
    pub max_symbols: usize,
}

impl ScreenerConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Unparseable or blank values fall back to the default.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let number = |key: &str, default: usize| {
            var(key).and_then(|v| v.parse::<usize>().ok()).unwrap_or(default)
        };

        let delay_ms = var("SCREENER_BATCH_DELAY_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(BatchOptions::DEFAULT_DELAY);

        Self {
            top_n: TopN {
                technical: number("SCREENER_TOP_N_TECHNICAL", TopN::DEFAULT),
                value: number("SCREENER_TOP_N_VALUE", TopN::DEFAULT),
                hybrid: number("SCREENER_TOP_N_HYBRID", TopN::DEFAULT),
            },
            batch: BatchOptions {
                batch_size: number("SCREENER_BATCH_SIZE", BatchOptions::DEFAULT_BATCH_SIZE),
                delay: delay_ms,
            },
            output_dir: var("SCREENER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            history_range: var("SCREENER_HISTORY_RANGE")
                .unwrap_or_else(|| DEFAULT_HISTORY_RANGE.to_string()),
            max_symbols: number("SCREENER_MAX_SYMBOLS", DEFAULT_MAX_SYMBOLS),
        }
    }
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ScreenerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ScreenerConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = ScreenerConfig::default();
        assert_eq!(config.top_n, TopN::uniform(25));
        assert_eq!(config.batch.batch_size, 25);
        assert_eq!(config.batch.delay, Duration::from_millis(1000));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.history_range, "2y");
        assert_eq!(config.max_symbols, 200);
    }

    #[test]
    fn test_reads_overrides() {
        let config = config_from(&[
            ("SCREENER_TOP_N_TECHNICAL", "10"),
            ("SCREENER_TOP_N_HYBRID", " 5 "),
            ("SCREENER_BATCH_SIZE", "50"),
            ("SCREENER_BATCH_DELAY_MS", "250"),
            ("SCREENER_OUTPUT_DIR", "/tmp/screens"),
            ("SCREENER_HISTORY_RANGE", "5y"),
            ("SCREENER_MAX_SYMBOLS", "500"),
        ]);

        assert_eq!(config.top_n.technical, 10);
        assert_eq!(config.top_n.value, 25);
        assert_eq!(config.top_n.hybrid, 5);
        assert_eq!(config.batch.batch_size, 50);
        assert_eq!(config.batch.delay, Duration::from_millis(250));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/screens"));
        assert_eq!(config.history_range, "5y");
        assert_eq!(config.max_symbols, 500);
    }

    #[test]
    fn test_invalid_numbers_use_defaults() {
        let config = config_from(&[
            ("SCREENER_TOP_N_VALUE", "lots"),
            ("SCREENER_BATCH_DELAY_MS", "-1"),
        ]);
        assert_eq!(config.top_n.value, 25);
        assert_eq!(config.batch.delay, Duration::from_secs(1));
    }
}
