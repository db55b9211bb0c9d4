use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use analysis_core::{EngineConfig, FundamentalsSource, PriceDataSource, SymbolSource, TopN};
use analysis_orchestrator::{AnalysisOrchestrator, ScreeningRun};
use anyhow::{bail, Context, Result};
use backtest_engine::BacktestEvaluator;
use clap::{Parser, ValueEnum};
use market_data::{
    cap_universe, fetch_universe, CsvDirectorySource, RemoteUniverse, StaticUniverse,
    YahooFinanceClient,
};
use notification_service::{DailyReport, NotificationConfig, NotificationService, ReportTemplate};
use tracing_subscriber::EnvFilter;

mod config;
mod export;

use config::ScreenerConfig;

const DEFAULT_LOG_FILTER: &str =
    "value_momentum_screener=info,market_data=info,analysis_orchestrator=info";
const REPORT_FILE: &str = "report.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Universe {
    Nifty50,
    Nifty500,
    Custom,
}

/// Daily value & momentum screener for NSE stocks
#[derive(Parser, Debug)]
#[command(name = "value-momentum-screener", version, long_about = None)]
struct Cli {
    /// Symbol universe to screen
    #[arg(long, value_enum, default_value_t = Universe::Nifty500)]
    universe: Universe,

    /// Symbols for the custom universe, e.g. RELIANCE.NS TCS.NS
    #[arg(long, num_args = 1..)]
    symbols: Vec<String>,

    /// Read <SYMBOL>.csv and fundamentals.json from this directory instead of Yahoo Finance
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Where CSV picks and report.html are written
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Picks kept per strategy
    #[arg(long)]
    top_n: Option<usize>,

    /// Cap on the number of symbols screened
    #[arg(long)]
    max_symbols: Option<usize>,

    /// Email the report using SMTP settings from the environment
    #[arg(long)]
    email: bool,

    /// Skip the trailing-return backtest
    #[arg(long)]
    no_backtest: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn apply(&self, mut config: ScreenerConfig) -> ScreenerConfig {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(n) = self.top_n {
            config.top_n = TopN::uniform(n);
        }
        if let Some(max) = self.max_symbols {
            config.max_symbols = max;
        }
        config
    }

    fn symbol_source(&self) -> Result<Box<dyn SymbolSource>> {
        match self.universe {
            Universe::Nifty50 => Ok(Box::new(StaticUniverse::nifty50())),
            Universe::Nifty500 => Ok(Box::new(RemoteUniverse::nifty500())),
            Universe::Custom if self.symbols.is_empty() => {
                bail!("--universe custom requires --symbols")
            }
            Universe::Custom => Ok(Box::new(StaticUniverse::custom(self.symbols.clone()))),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = cli.apply(ScreenerConfig::from_env());
    tracing::info!("🚀 Value & Momentum Screener starting");

    if cli.universe != Universe::Custom && !cli.symbols.is_empty() {
        tracing::warn!("--symbols is ignored unless --universe custom is set");
    }

    let source = cli.symbol_source()?;
    let universe = source
        .resolve()
        .await
        .with_context(|| format!("Failed to load {} universe", source.name()))?;
    let symbols = cap_universe(universe.symbols, config.max_symbols);
    tracing::info!("🌐 Universe {}: {} symbols", universe.name, symbols.len());

    let (prices, fundamentals) = data_sources(&cli, &config).await?;
    let outcome = fetch_universe(prices, fundamentals, &symbols, &config.batch).await;
    for (symbol, e) in &outcome.failed {
        tracing::warn!("⏭️  {} skipped: {}", symbol, e);
    }
    tracing::info!(
        "✓ Loaded {}/{} symbols ({} failed)",
        outcome.inputs.len(),
        symbols.len(),
        outcome.failed.len()
    );

    let orchestrator = AnalysisOrchestrator::new(EngineConfig {
        top_n: config.top_n,
        ..EngineConfig::default()
    });
    let run = orchestrator.run(&outcome.inputs);

    let backtests = if cli.no_backtest {
        Vec::new()
    } else {
        let history: HashMap<_, _> = outcome
            .inputs
            .iter()
            .map(|input| (input.symbol.clone(), input.series.clone()))
            .collect();
        let evaluator = BacktestEvaluator::default();
        run.lists()
            .iter()
            .map(|list| evaluator.evaluate(list, &history))
            .collect()
    };

    let report = DailyReport {
        generated_at: run.timestamp,
        universe: universe.name,
        symbols_screened: run.total_symbols,
        technical: run.technical.clone(),
        value: run.value.clone(),
        hybrid: run.hybrid.clone(),
        backtests,
    };

    write_outputs(&config, &report)?;

    if cli.email {
        let service = NotificationService::new(&NotificationConfig::from_env());
        service
            .send_report(&report)
            .await
            .context("Failed to deliver email report")?;
    }

    log_summary(&report.universe, &run);
    Ok(())
}

async fn data_sources(
    cli: &Cli,
    config: &ScreenerConfig,
) -> Result<(Arc<dyn PriceDataSource>, Arc<dyn FundamentalsSource>)> {
    match &cli.data_dir {
        Some(dir) => {
            let source = Arc::new(
                CsvDirectorySource::open(dir.clone())
                    .await
                    .with_context(|| format!("Failed to open data directory {}", dir.display()))?,
            );
            let prices: Arc<dyn PriceDataSource> = source.clone();
            let fundamentals: Arc<dyn FundamentalsSource> = source;
            Ok((prices, fundamentals))
        }
        None => {
            let client = Arc::new(YahooFinanceClient::new().with_range(config.history_range.clone()));
            tracing::info!("📡 Fetching {} of daily history from Yahoo Finance", config.history_range);
            let prices: Arc<dyn PriceDataSource> = client.clone();
            let fundamentals: Arc<dyn FundamentalsSource> = client;
            Ok((prices, fundamentals))
        }
    }
}

fn write_outputs(config: &ScreenerConfig, report: &DailyReport) -> Result<()> {
    let dir = &config.output_dir;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    for list in report.lists() {
        export::write_picks(dir, list)?;
    }

    let path = dir.join(REPORT_FILE);
    std::fs::write(&path, ReportTemplate::render(report))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("📝 Report written to {}", path.display());
    Ok(())
}

fn log_summary(universe: &str, run: &ScreeningRun) {
    tracing::info!("📋 Screening summary for {} ({} symbols)", universe, run.total_symbols);
    for list in run.lists() {
        match list.leader() {
            Some(leader) => tracing::info!(
                "   {}: {} BUY or better, leader {} ({:.1}, {})",
                list.strategy,
                list.buy_count(),
                leader.symbol,
                leader.composite_score,
                leader.rating
            ),
            None => tracing::info!("   {}: no recommendations", list.strategy),
        }
    }
    if run.is_empty() {
        tracing::warn!("⚠️  No strategy produced recommendations today");
    }
}
