//! config.rs - Scanner configuration
//!
//! Loaded once at startup from YAML (or built-in defaults) and read-only
//! afterwards. Unknown exchange names are tolerated here; the registry
//! drops them with a warning when it builds clients.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, ScannerError};
use crate::models::TradingPair;

/// Env var consulted for the config file path when no CLI argument is given
pub const CONFIG_PATH_ENV: &str = "ARB_SCANNER_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScannerConfig {
    /// Exchange names to enable, in scan/display order
    pub exchanges: Vec<String>,
    /// Canonical "BASE/QUOTE" pairs, in scan/display order
    pub pairs: Vec<String>,
    /// Minimum profit after fees, in percent (0.05 = 0.05%)
    pub min_profit_pct: Decimal,
    /// Fee per trade as a fraction (0.002 = 0.2%), charged on both legs
    pub fee_rate: Decimal,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Optional webhook receiving a JSON `{"text": ...}` per opportunity
    pub alert_webhook_url: Option<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            exchanges: ["binance", "kraken", "coinbase", "okx", "bybit"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            pairs: [
                "BTC/USDT", "ETH/USDT", "SOL/USDT", "XRP/USDT", "ADA/USDT", "DOGE/USDT",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            // More exchanges means more noise, so the default gate is low but non-zero
            min_profit_pct: Decimal::new(5, 2),
            fee_rate: Decimal::new(2, 3),
            refresh_interval_secs: 30,
            request_timeout_secs: 10,
            alert_webhook_url: None,
        }
    }
}

impl ScannerConfig {
    /// Load configuration from a YAML file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScannerError::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let reader = BufReader::new(File::open(path)?);
        let config: ScannerConfig = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate YAML content
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ScannerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config source: explicit path, then `ARB_SCANNER_CONFIG`,
    /// then built-in defaults.
    pub fn load(cli_path: Option<&str>) -> Result<Self> {
        let path = cli_path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .filter(|p| !p.trim().is_empty());

        match path {
            Some(p) => {
                log::info!("Loading configuration from {}", p);
                Self::from_file(Path::new(&p))
            }
            None => {
                log::info!("No configuration file given, using built-in defaults");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pairs.is_empty() {
            return Err(ScannerError::Config("pair list cannot be empty".to_string()));
        }

        if let Some(bad) = self
            .pairs
            .iter()
            .find(|p| !TradingPair::new(p).is_well_formed())
        {
            return Err(ScannerError::Config(format!(
                "pair '{}' is not of the form BASE/QUOTE",
                bad
            )));
        }

        if self.exchanges.is_empty() {
            return Err(ScannerError::Config("exchange list cannot be empty".to_string()));
        }

        if self.fee_rate < Decimal::ZERO {
            return Err(ScannerError::Config(format!(
                "fee_rate cannot be negative (got {})",
                self.fee_rate
            )));
        }

        if self.refresh_interval_secs == 0 {
            return Err(ScannerError::Config(
                "refresh_interval_secs must be > 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ScannerError::Config(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Configured pairs as typed values, upper-cased with duplicates removed
    pub fn trading_pairs(&self) -> Vec<TradingPair> {
        let mut pairs: Vec<TradingPair> = Vec::with_capacity(self.pairs.len());
        for symbol in &self.pairs {
            let pair = TradingPair::new(&symbol.trim().to_ascii_uppercase());
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_CONFIG_YAML: &str = r#"
exchanges: [binance, kraken, coinbasepro]
pairs:
  - BTC/USDT
  - ETH/USDT
  - SOL/USDT
min_profit_pct: 1.0
fee_rate: 0.002
refresh_interval_secs: 15
"#;

    #[test]
    fn test_default_settings() {
        let config = ScannerConfig::default();
        assert_eq!(config.exchanges.len(), 5);
        assert_eq!(config.pairs.len(), 6);
        assert_eq!(config.min_profit_pct, dec!(0.05));
        assert_eq!(config.fee_rate, dec!(0.002));
        assert_eq!(config.refresh_interval_secs, 30);
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_str_valid() {
        let config = ScannerConfig::from_yaml_str(VALID_CONFIG_YAML).unwrap();
        assert_eq!(config.exchanges, vec!["binance", "kraken", "coinbasepro"]);
        assert_eq!(config.pairs.len(), 3);
        assert_eq!(config.min_profit_pct, dec!(1.0));
        assert_eq!(config.fee_rate, dec!(0.002));
        assert_eq!(config.refresh_interval_secs, 15);
        // Omitted fields fall back to defaults
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.alert_webhook_url.is_none());
    }

    #[test]
    fn test_from_yaml_str_invalid_yaml() {
        let result = ScannerConfig::from_yaml_str("pairs: [BTC/USDT");
        assert!(matches!(result, Err(ScannerError::Yaml(_))));
    }

    #[test]
    fn test_empty_pair_list_rejected() {
        let result = ScannerConfig::from_yaml_str("pairs: []");
        assert!(matches!(result, Err(ScannerError::Config(_))));
    }

    #[test]
    fn test_malformed_pair_rejected() {
        let result = ScannerConfig::from_yaml_str("pairs: [BTCUSDT]");
        match result {
            Err(ScannerError::Config(msg)) => assert!(msg.contains("BTCUSDT")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = ScannerConfig::from_yaml_str("refresh_interval_secs: 0");
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_fee_rejected() {
        let result = ScannerConfig::from_yaml_str("fee_rate: -0.001");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_exchange_is_not_a_validation_error() {
        let config = ScannerConfig::from_yaml_str("exchanges: [binance, mtgox]").unwrap();
        assert_eq!(config.exchanges.len(), 2);
    }

    #[test]
    fn test_trading_pairs_dedup_preserves_order() {
        let config =
            ScannerConfig::from_yaml_str("pairs: [ETH/USDT, BTC/USDT, ETH/USDT]").unwrap();
        let pairs = config.trading_pairs();
        assert_eq!(pairs, vec![TradingPair::new("ETH/USDT"), TradingPair::new("BTC/USDT")]);
    }

    #[test]
    fn test_trading_pairs_dedup_ignores_case() {
        let config =
            ScannerConfig::from_yaml_str("pairs: [btc/usdt, BTC/USDT, Eth/Usdt]").unwrap();
        let pairs = config.trading_pairs();
        assert_eq!(pairs, vec![TradingPair::new("BTC/USDT"), TradingPair::new("ETH/USDT")]);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(VALID_CONFIG_YAML.as_bytes()).unwrap();

        let config = ScannerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.pairs.len(), 3);
    }

    #[test]
    fn test_from_file_missing() {
        let result = ScannerConfig::from_file(Path::new("/nonexistent/scanner.yaml"));
        assert!(matches!(result, Err(ScannerError::Config(_))));
    }
}
