pub mod engine;
pub mod models;

pub use engine::{BacktestEvaluator, DEFAULT_TOP_PICKS};
pub use models::*;
