//! Symbol universes and sector classification.

use crate::config::ScannerConfig;
use tracing::warn;

/// NIFTY 50 constituents.
pub const NIFTY50: &[&str] = &[
    "RELIANCE", "TCS", "HDFCBANK", "ICICIBANK", "INFY", "ITC", "LT", "SBIN", "BHARTIARTL",
    "HINDUNILVR", "HCLTECH", "AXISBANK", "BAJFINANCE", "KOTAKBANK", "MARUTI", "ASIANPAINT",
    "SUNPHARMA", "LUPIN", "ONGC", "POWERGRID", "TITAN", "WIPRO", "ULTRACEMCO", "NTPC", "M&M",
    "NESTLEIND", "BAJAJFINSV", "ADANIENT", "ADANIPORTS", "HINDALCO", "JSWSTEEL", "TATASTEEL",
    "TATAMOTORS", "TATACONSUM", "COALINDIA", "GRASIM", "BPCL", "HEROMOTOCO", "BRITANNIA",
    "DIVISLAB", "DRREDDY", "EICHERMOT", "HDFCLIFE", "BAJAJ-AUTO", "CIPLA", "SHRIRAMFIN", "TECHM",
    "UPL", "LTIM", "LTTS",
];

/// NIFTY NEXT 50 constituents.
pub const NIFTY_NEXT50: &[&str] = &[
    "GODREJCP", "MUTHOOTFIN", "PIDILITIND", "HAVELLS", "TORNTPHARM", "MOTHERSON", "AUROPHARMA",
    "COLPAL", "CONCOR", "SIEMENS", "ALKEM", "INDIGO", "NAUKRI", "MCDOWELL-N", "ACC", "DABUR",
    "SAIL", "GAIL", "CANBK", "DLF", "NMDC", "BANKBARODA", "IOC", "INDUSINDBK", "JINDALSTEL",
    "TORNTPOWER", "PETRONET", "MARICO", "APOLLOHOSP", "BOSCHLTD", "TRENT", "SRF", "MANAPPURAM",
    "POLICYBZR", "ZOMATO", "PAYTM", "PERSISTENT", "MPHASIS", "BIOCON", "CADILAHC", "PEL",
    "IDFCFIRSTB", "VEDL", "IRCTC", "DMART", "BANDHANBNK", "LICI", "HAL", "PNB",
];

/// Symbol universe selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Universe {
    Nifty50,
    NiftyNext50,
    Custom,
}

impl Universe {
    /// Parse the config selector; unknown values fall back to NIFTY 50
    /// with a warning.
    pub fn parse(selector: &str) -> Self {
        match selector {
            "NIFTY50" => Universe::Nifty50,
            "NIFTY_NEXT50" => Universe::NiftyNext50,
            "CUSTOM" => Universe::Custom,
            other => {
                warn!("Unknown universe {:?}, falling back to NIFTY50", other);
                Universe::Nifty50
            }
        }
    }

    /// Resolve the configured universe to a symbol list.
    pub fn resolve(config: &ScannerConfig) -> Vec<String> {
        match Universe::parse(&config.universe) {
            Universe::Nifty50 => NIFTY50.iter().map(|s| s.to_string()).collect(),
            Universe::NiftyNext50 => NIFTY_NEXT50.iter().map(|s| s.to_string()).collect(),
            Universe::Custom => config.custom_symbols.clone(),
        }
    }
}

/// Static sector classification; unknown symbols map to "Other".
pub fn sector_for(symbol: &str) -> &'static str {
    match symbol {
        "TCS" | "INFY" | "HCLTECH" | "WIPRO" | "TECHM" | "LTIM" | "LTTS" => "IT",
        "HDFCBANK" | "ICICIBANK" | "AXISBANK" | "SBIN" | "KOTAKBANK" => "Banking",
        "BAJFINANCE" | "BAJAJFINSV" | "SHRIRAMFIN" => "NBFC",
        "HDFCLIFE" => "Insurance",
        "RELIANCE" | "ONGC" | "BPCL" => "Energy",
        "BHARTIARTL" => "Telecom",
        "LT" | "ADANIPORTS" => "Infrastructure",
        "POWERGRID" | "NTPC" => "Utilities",
        "MARUTI" | "TATAMOTORS" | "BAJAJ-AUTO" | "HEROMOTOCO" | "EICHERMOT" | "M&M" => "Auto",
        "SUNPHARMA" | "DRREDDY" | "CIPLA" | "LUPIN" | "DIVISLAB" => "Pharma",
        "HINDUNILVR" | "ITC" | "NESTLEIND" | "BRITANNIA" | "TATACONSUM" => "FMCG",
        "ASIANPAINT" => "Paints",
        "ULTRACEMCO" => "Cement",
        "GRASIM" => "Materials",
        "UPL" => "Chemicals",
        "JSWSTEEL" | "TATASTEEL" | "HINDALCO" => "Metals",
        "COALINDIA" => "Mining",
        "TITAN" => "Jewellery",
        "ADANIENT" => "Conglomerate",
        _ => "Other",
    }
}
