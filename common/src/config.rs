//! Scanner configuration
//!
//! Every recognized option is declared here with a documented default and
//! validated once at startup, rather than re-merged wherever it is read.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Full configuration surface for scan, outcome collection and prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Symbol universe selector: "NIFTY50", "NIFTY_NEXT50" or "CUSTOM"
    #[serde(default = "default_universe")]
    pub universe: String,

    /// Explicit symbol list, used only when universe = "CUSTOM"
    #[serde(default)]
    pub custom_symbols: Vec<String>,

    /// Trailing calendar days of daily bars to request
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Liquidity floor: absolute volume required for a volume surge
    #[serde(default = "default_min_volume")]
    pub min_volume: f64,

    /// Volume ratio (today / 20-day average) that counts as a surge
    #[serde(default = "default_vol_surge_threshold")]
    pub vol_surge_threshold: f64,

    /// RSI level treated as oversold (short-side penalty)
    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: f64,

    /// RSI level treated as overbought (long-side penalty)
    #[serde(default = "default_rsi_overbought")]
    pub rsi_overbought: f64,

    /// Rolling percentile at or below which a CPR counts as narrow
    #[serde(default = "default_cpr_narrow_percentile")]
    pub cpr_narrow_percentile: f64,

    /// Directory for CSV batch output
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Bounded retry attempts for the bulk market-data fetch
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between fetch attempts, in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Risk budget per trade, in currency units
    #[serde(default = "default_risk_per_trade")]
    pub risk_per_trade: f64,

    /// Stop distance = ATR x this multiplier
    #[serde(default = "default_stop_atr_multiplier")]
    pub stop_atr_multiplier: f64,

    /// Target distance = stop distance x this ratio
    #[serde(default = "default_target_rr_ratio")]
    pub target_rr_ratio: f64,

    /// IBS at or below this (or at/above 1 minus this) is extreme
    #[serde(default = "default_ibs_extreme_threshold")]
    pub ibs_extreme_threshold: f64,

    /// Directory for persisted model artifacts
    #[serde(default = "default_models_dir")]
    pub models_dir: String,

    /// Labeled records required before training is allowed
    #[serde(default = "default_min_training_samples")]
    pub min_training_samples: usize,

    /// Profit probability required for a BUY/SELL recommendation
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Next-day high return (%) that counts as target-hit
    #[serde(default = "default_target_return_pct")]
    pub target_return_pct: f64,

    /// Next-day low return (%) that counts as stop-hit (negative)
    #[serde(default = "default_stop_return_pct")]
    pub stop_return_pct: f64,

    /// Live-quote cache TTL, in seconds
    #[serde(default = "default_quote_ttl_secs")]
    pub quote_ttl_secs: u64,

    /// Base URL of the market-data service
    #[serde(default = "default_data_base_url")]
    pub data_base_url: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            universe: default_universe(),
            custom_symbols: Vec::new(),
            lookback_days: default_lookback_days(),
            min_volume: default_min_volume(),
            vol_surge_threshold: default_vol_surge_threshold(),
            rsi_oversold: default_rsi_oversold(),
            rsi_overbought: default_rsi_overbought(),
            cpr_narrow_percentile: default_cpr_narrow_percentile(),
            output_dir: default_output_dir(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            risk_per_trade: default_risk_per_trade(),
            stop_atr_multiplier: default_stop_atr_multiplier(),
            target_rr_ratio: default_target_rr_ratio(),
            ibs_extreme_threshold: default_ibs_extreme_threshold(),
            models_dir: default_models_dir(),
            min_training_samples: default_min_training_samples(),
            confidence_threshold: default_confidence_threshold(),
            target_return_pct: default_target_return_pct(),
            stop_return_pct: default_stop_return_pct(),
            quote_ttl_secs: default_quote_ttl_secs(),
            data_base_url: default_data_base_url(),
        }
    }
}

fn default_universe() -> String {
    "NIFTY50".to_string()
}

fn default_lookback_days() -> u32 {
    180
}

fn default_min_volume() -> f64 {
    1_000_000.0
}

fn default_vol_surge_threshold() -> f64 {
    1.3
}

fn default_rsi_oversold() -> f64 {
    30.0
}

fn default_rsi_overbought() -> f64 {
    70.0
}

fn default_cpr_narrow_percentile() -> f64 {
    0.2
}

fn default_output_dir() -> String {
    "eod_scanner_output".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_risk_per_trade() -> f64 {
    5000.0
}

fn default_stop_atr_multiplier() -> f64 {
    0.8
}

fn default_target_rr_ratio() -> f64 {
    2.0
}

fn default_ibs_extreme_threshold() -> f64 {
    0.2
}

fn default_models_dir() -> String {
    "ml_models".to_string()
}

fn default_min_training_samples() -> usize {
    50
}

fn default_confidence_threshold() -> f64 {
    0.6
}

fn default_target_return_pct() -> f64 {
    2.0
}

fn default_stop_return_pct() -> f64 {
    -1.0
}

fn default_quote_ttl_secs() -> u64 {
    60
}

fn default_data_base_url() -> String {
    "http://127.0.0.1:8900".to_string()
}

impl ScannerConfig {
    /// Validate the full configuration once, at startup.
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days < 60 {
            bail!(
                "lookback_days = {} is too short for the longest indicator lookback",
                self.lookback_days
            );
        }
        if self.max_retries == 0 {
            bail!("max_retries must be at least 1");
        }
        if self.risk_per_trade <= 0.0 {
            bail!("risk_per_trade must be positive");
        }
        if self.stop_atr_multiplier <= 0.0 {
            bail!("stop_atr_multiplier must be positive");
        }
        if self.target_rr_ratio <= 0.0 {
            bail!("target_rr_ratio must be positive");
        }
        if !(0.0..1.0).contains(&self.cpr_narrow_percentile) || self.cpr_narrow_percentile == 0.0 {
            bail!("cpr_narrow_percentile must be in (0, 1)");
        }
        if !(0.0..0.5).contains(&self.ibs_extreme_threshold) || self.ibs_extreme_threshold == 0.0 {
            bail!("ibs_extreme_threshold must be in (0, 0.5)");
        }
        if !(0.0..1.0).contains(&self.confidence_threshold) || self.confidence_threshold == 0.0 {
            bail!("confidence_threshold must be in (0, 1)");
        }
        if self.stop_return_pct >= 0.0 {
            bail!("stop_return_pct must be negative");
        }
        if self.universe == "CUSTOM" && self.custom_symbols.is_empty() {
            bail!("universe = CUSTOM requires a non-empty custom_symbols list");
        }
        Ok(())
    }
}

/// Load configuration from a TOML file; a missing file yields the defaults
/// and writes them out so the user has a template to edit.
pub fn load_config(path: &str) -> Result<ScannerConfig> {
    let config = if std::path::Path::new(path).exists() {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)?
    } else {
        let config = ScannerConfig::default();
        save_config(&config, path)?;
        tracing::info!("Created default config file: {}", path);
        config
    };
    config.validate()?;
    Ok(config)
}

/// Save configuration to a TOML file.
pub fn save_config(config: &ScannerConfig, path: &str) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScannerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.universe, "NIFTY50");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.risk_per_trade, 5000.0);
        assert_eq!(config.min_training_samples, 50);
    }

    #[test]
    fn test_config_serialization() {
        let config = ScannerConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: ScannerConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.vol_surge_threshold, deserialized.vol_surge_threshold);
        assert_eq!(config.output_dir, deserialized.output_dir);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let config: ScannerConfig = toml::from_str("universe = \"NIFTY_NEXT50\"").unwrap();
        assert_eq!(config.universe, "NIFTY_NEXT50");
        assert_eq!(config.lookback_days, 180);
        assert_eq!(config.stop_atr_multiplier, 0.8);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ScannerConfig::default();
        config.risk_per_trade = 0.0;
        assert!(config.validate().is_err());

        let mut config = ScannerConfig::default();
        config.stop_return_pct = 1.0;
        assert!(config.validate().is_err());

        let mut config = ScannerConfig::default();
        config.universe = "CUSTOM".to_string();
        assert!(config.validate().is_err());
    }
}
