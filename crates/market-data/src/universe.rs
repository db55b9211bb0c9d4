use std::collections::HashSet;
use std::time::Duration;

use analysis_core::{AnalysisError, ResolvedUniverse, SymbolSource};
use async_trait::async_trait;
use reqwest::Client;

pub const NSE_NIFTY_500_URL: &str = "https://archives.nseindia.com/content/indices/ind_nifty500list.csv";
pub const NSE_SUFFIX: &str = ".NS";
pub const DEFAULT_MAX_SYMBOLS: usize = 200;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

const NIFTY_50: [&str; 50] = [
    "RELIANCE", "TCS", "HDFCBANK", "ICICIBANK", "INFY", "HINDUNILVR", "ITC", "SBIN",
    "BHARTIARTL", "KOTAKBANK", "LT", "AXISBANK", "ASIANPAINT", "MARUTI", "SUNPHARMA",
    "TITAN", "ULTRACEMCO", "BAJFINANCE", "WIPRO", "NESTLEIND", "NTPC", "POWERGRID", "M&M",
    "TATAMOTORS", "HCLTECH", "COALINDIA", "INDUSINDBK", "CIPLA", "ONGC", "TECHM", "GRASIM",
    "HINDALCO", "ADANIPORTS", "DRREDDY", "JSWSTEEL", "TATASTEEL", "BAJAJFINSV", "BRITANNIA",
    "BPCL", "EICHERMOT", "HEROMOTOCO", "TATACONSUM", "BAJAJ-AUTO", "APOLLOHOSP", "ADANIENT",
    "DIVISLAB", "SBILIFE", "HDFCLIFE", "LTIM", "SHRIRAMFIN",
];

/// Liquid Nifty 500 names served when the constituents download fails.
const NIFTY_500_CURATED: [&str; 212] = [
    "RELIANCE", "TCS", "HDFCBANK", "INFY", "HINDUNILVR", "ICICIBANK", "KOTAKBANK", "ITC",
    "SBIN", "BHARTIARTL", "ASIANPAINT", "LT", "AXISBANK", "MARUTI", "SUNPHARMA", "ULTRACEMCO",
    "TITAN", "WIPRO", "NESTLEIND", "NTPC", "POWERGRID", "M&M", "TATAMOTORS", "HCLTECH",
    "COALINDIA", "INDUSINDBK", "CIPLA", "ONGC", "TECHM", "GRASIM", "BAJFINANCE", "HINDALCO",
    "ADANIPORTS", "DRREDDY", "UPL", "JSWSTEEL", "TATASTEEL", "BAJAJFINSV", "DIVISLAB",
    "BRITANNIA", "BPCL", "EICHERMOT", "HEROMOTOCO", "IOC", "TATACONSUM", "BAJAJ-AUTO",
    "APOLLOHOSP", "ADANIENT", "SHREECEM", "TATAPOWER", "SAIL", "VEDL", "HINDZINC",
    "NATIONALUM", "JINDALSTEL", "NMDC", "MOIL", "RATNAMANI", "WELCORP", "BANKBARODA", "CANBK",
    "PNB", "IDFCFIRSTB", "FEDERALBNK", "RBLBANK", "BANDHANBNK", "AUBANK", "INDHOTEL",
    "OBEROIRLTY", "MPHASIS", "COFORGE", "LTTS", "PERSISTENT", "LUPIN", "BIOCON", "TORNTPHARM",
    "GODREJCP", "DABUR", "MARICO", "COLPAL", "VBL", "TATAELXSI", "ESCORTS", "ASHOKLEY",
    "BALKRISIND", "BOSCHLTD", "MRF", "APOLLOTYRE", "CEATLTD", "RELAXO", "BATAINDIA", "PAGEIND",
    "PIDILITIND", "BERGEPAINT", "AKZOINDIA", "KANSAINER", "DEEPAKNTR", "AAVAS", "LICHSGFIN",
    "CHOLAFIN", "MUTHOOTFIN", "MANAPPURAM", "ADANIGREEN", "ADANIPOWER", "ATGL", "TORNTPOWER",
    "CESC", "THERMAX", "SIEMENS", "ABB", "HAVELLS", "CROMPTON", "VOLTAS", "BLUESTARCO",
    "WHIRLPOOL", "GODREJIND", "GODREJPROP", "DLF", "PRESTIGE", "BRIGADE", "PHOENIXLTD",
    "INOXWIND", "SUZLON", "CONCOR", "IRCTC", "IRFC", "RAILTEL", "RVNL", "NBCC", "BEL", "HAL",
    "BEML", "MAZDOCK", "COCHINSHIP", "SJVN", "NHPC", "PFC", "RECLTD", "IREDA", "OFSS",
    "CYIENT", "SONATSOFTW", "KPITTECH", "ZENSARTECH", "AUROPHARMA", "ZYDUSLIFE", "ALKEM",
    "LALPATHLAB", "LAURUSLABS", "GLENMARK", "IPCALAB", "ABBOTINDIA", "PFIZER", "GLAXO",
    "SANOFI", "FORTIS", "MAXHEALTH", "EMAMILTD", "JYOTHYLAB", "GILLETTE", "HONAUT", "PGHH",
    "RADICO", "UBL", "CCL", "VSTIND", "TRIDENT", "VTL", "TVSMOTOR", "BAJAJHLDNG", "EXIDEIND",
    "SUNDRMFAST", "BHARATFORG", "SRF", "AMBUJACEM", "ACC", "RAMCOCEM", "JKCEMENT",
    "DALBHARAT", "JKLAKSHMI", "KALYANKJIL", "TITAGARH", "IRB", "GNFC", "RCF", "CHAMBLFERT",
    "COROMANDEL", "GSFC", "PIIND", "GAIL", "OIL", "HINDPETRO", "MGL", "IGL", "GSPL",
    "AEGISLOG", "CASTROLIND", "PETRONET", "HFCL", "SUNTV", "TRENT", "JUBLFOOD", "POLYCAB",
    "DIXON", "CAMS", "CDSL", "NYKAA", "POLICYBZR", "DMART", "TATACOMM", "LTIM", "SHRIRAMFIN",
];

/// Fixed symbol list.
#[derive(Debug, Clone)]
pub struct StaticUniverse {
    name: String,
    symbols: Vec<String>,
}

impl StaticUniverse {
    pub fn nifty50() -> Self {
        Self {
            name: "Nifty 50".to_string(),
            symbols: NIFTY_50.iter().map(|s| format!("{}{}", s, NSE_SUFFIX)).collect(),
        }
    }

    /// Broad stand-in for the Nifty 500 when NSE is unreachable.
    pub fn nifty500_fallback() -> Self {
        Self {
            name: "Nifty 500 (curated fallback)".to_string(),
            symbols: dedup(
                NIFTY_500_CURATED
                    .iter()
                    .map(|s| format!("{}{}", s, NSE_SUFFIX))
                    .collect(),
            ),
        }
    }

    pub fn custom(symbols: Vec<String>) -> Self {
        Self {
            name: "Custom".to_string(),
            symbols: dedup(symbols),
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

#[async_trait]
impl SymbolSource for StaticUniverse {
    async fn list(&self) -> Result<Vec<String>, AnalysisError> {
        Ok(self.symbols.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Index constituents downloaded from a published CSV, with a static fallback.
pub struct RemoteUniverse {
    name: String,
    url: String,
    suffix: String,
    client: Client,
    fallback: StaticUniverse,
}

impl RemoteUniverse {
    pub fn new(name: impl Into<String>, url: impl Into<String>, fallback: StaticUniverse) -> Self {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(REMOTE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            name: name.into(),
            url: url.into(),
            suffix: NSE_SUFFIX.to_string(),
            client,
            fallback,
        }
    }

    pub fn nifty500() -> Self {
        Self::new("Nifty 500", NSE_NIFTY_500_URL, StaticUniverse::nifty500_fallback())
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    async fn download(&self) -> Result<Vec<String>, AnalysisError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AnalysisError::DataSource(format!("constituents download failed: {}", e)))?;

        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::DataSource(format!("constituents body unreadable: {}", e)))?;

        parse_constituents(&body, &self.suffix)
    }
}

#[async_trait]
impl SymbolSource for RemoteUniverse {
    async fn list(&self) -> Result<Vec<String>, AnalysisError> {
        Ok(self.resolve().await?.symbols)
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self) -> Result<ResolvedUniverse, AnalysisError> {
        match self.download().await {
            Ok(symbols) => {
                tracing::info!("✓ Fetched {} {} symbols", symbols.len(), self.name);
                Ok(ResolvedUniverse {
                    name: self.name.clone(),
                    symbols,
                })
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️  Could not fetch {} constituents ({}), using {}",
                    self.name,
                    e,
                    self.fallback.name()
                );
                self.fallback.resolve().await
            }
        }
    }
}

/// Read the `Symbol` column of an index-constituents CSV.
pub fn parse_constituents(body: &str, suffix: &str) -> Result<Vec<String>, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AnalysisError::InvalidData(format!("constituents header: {}", e)))?;
    let column = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("symbol"))
        .ok_or_else(|| AnalysisError::InvalidData("constituents CSV has no Symbol column".to_string()))?;

    let mut symbols = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AnalysisError::InvalidData(format!("constituents row: {}", e)))?;
        if let Some(symbol) = record.get(column).filter(|s| !s.is_empty()) {
            symbols.push(format!("{}{}", symbol, suffix));
        }
    }

    let symbols = dedup(symbols);
    if symbols.is_empty() {
        return Err(AnalysisError::InvalidData("constituents CSV has no symbols".to_string()));
    }
    Ok(symbols)
}

/// Keep the first `max` symbols.
pub fn cap_universe(mut symbols: Vec<String>, max: usize) -> Vec<String> {
    if symbols.len() > max {
        tracing::info!("Limiting universe to {} of {} symbols", max, symbols.len());
        symbols.truncate(max);
    }
    symbols
}

fn dedup(symbols: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
