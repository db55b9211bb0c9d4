//! Symbol universes and market-data sources feeding the scoring engine.

pub mod csv_source;
pub mod fetch;
pub mod universe;
pub mod yahoo;

pub use csv_source::CsvDirectorySource;
pub use fetch::{fetch_universe, BatchOptions, FetchOutcome};
pub use universe::{cap_universe, RemoteUniverse, StaticUniverse, DEFAULT_MAX_SYMBOLS};
pub use yahoo::YahooFinanceClient;
