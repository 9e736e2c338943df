//! models.rs - Core data structures for the arbitrage scanner
//!
//! Defines ExchangeId, TradingPair, Quote, ArbitrageOpportunity and the
//! per-scan price matrix handed to the display layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A centralized exchange the scanner knows how to query
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    Binance,
    Kraken,
    Coinbase,
    Okx,
    Bybit,
}

impl ExchangeId {
    /// Every supported exchange, in default scan order
    pub const ALL: [ExchangeId; 5] = [
        ExchangeId::Binance,
        ExchangeId::Kraken,
        ExchangeId::Coinbase,
        ExchangeId::Okx,
        ExchangeId::Bybit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "binance",
            ExchangeId::Kraken => "kraken",
            ExchangeId::Coinbase => "coinbase",
            ExchangeId::Okx => "okx",
            ExchangeId::Bybit => "bybit",
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown exchange: {0}")]
pub struct UnknownExchange(pub String);

impl FromStr for ExchangeId {
    type Err = UnknownExchange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(ExchangeId::Binance),
            "kraken" => Ok(ExchangeId::Kraken),
            // Coinbase Pro was folded into Coinbase Exchange
            "coinbase" | "coinbasepro" => Ok(ExchangeId::Coinbase),
            "okx" => Ok(ExchangeId::Okx),
            "bybit" => Ok(ExchangeId::Bybit),
            _ => Err(UnknownExchange(s.to_string())),
        }
    }
}

/// Canonical trading pair symbol (e.g., "BTC/USDT")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TradingPair(String);

impl TradingPair {
    pub fn new(symbol: &str) -> Self {
        TradingPair(symbol.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits into (base, quote); None when the symbol has no "/" separator
    pub fn split(&self) -> Option<(&str, &str)> {
        self.0.split_once('/')
    }

    /// True for a well-formed "BASE/QUOTE" symbol
    pub fn is_well_formed(&self) -> bool {
        match self.split() {
            Some((base, quote)) => {
                !base.is_empty()
                    && !quote.is_empty()
                    && !quote.contains('/')
                    && base.chars().chain(quote.chars()).all(|c| c.is_ascii_alphanumeric())
            }
            None => false,
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TradingPair {
    fn from(symbol: &str) -> Self {
        TradingPair::new(symbol)
    }
}

/// Best bid/ask snapshot from one exchange for one pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub exchange: ExchangeId,
    pub pair: TradingPair,
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn new(exchange: ExchangeId, pair: TradingPair, bid: Decimal, ask: Decimal) -> Self {
        Quote {
            exchange,
            pair,
            bid,
            ask,
            timestamp: Utc::now(),
        }
    }

    /// Positive on both sides and not crossed
    pub fn is_usable(&self) -> bool {
        self.bid > Decimal::ZERO && self.ask > Decimal::ZERO && self.ask >= self.bid
    }

    pub fn mid_price(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// A cross-exchange spread that clears fees and the profit threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArbitrageOpportunity {
    pub pair: TradingPair,
    pub buy_exchange: ExchangeId,
    pub buy_price: Decimal,
    pub sell_exchange: ExchangeId,
    pub sell_price: Decimal,
    pub spread_pct: Decimal,
    pub profit_pct: Decimal,
    pub detected_at: DateTime<Utc>,
}

impl ArbitrageOpportunity {
    /// One-line plain text summary used by alert sinks
    pub fn summary(&self) -> String {
        format!(
            "{}: buy {} @ {:.2}, sell {} @ {:.2}, spread {:.2}%, profit {:.2}%",
            self.pair,
            self.buy_exchange.as_str().to_uppercase(),
            self.buy_price.round_dp(2),
            self.sell_exchange.as_str().to_uppercase(),
            self.sell_price.round_dp(2),
            self.spread_pct.round_dp(2),
            self.profit_pct.round_dp(2),
        )
    }
}

impl fmt::Display for ArbitrageOpportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Mid-prices of one pair across every registered exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRow {
    pub pair: TradingPair,
    /// Indexed like `PriceMatrix::exchanges`; None = no usable quote this scan
    pub prices: Vec<Option<Decimal>>,
}

/// pair x exchange -> mid-price or absent
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceMatrix {
    pub exchanges: Vec<ExchangeId>,
    pub rows: Vec<PriceRow>,
}

impl PriceMatrix {
    pub fn new(exchanges: Vec<ExchangeId>) -> Self {
        PriceMatrix {
            exchanges,
            rows: Vec::new(),
        }
    }

    pub fn get(&self, pair: &TradingPair, exchange: ExchangeId) -> Option<Decimal> {
        let col = self.exchanges.iter().position(|e| *e == exchange)?;
        self.rows
            .iter()
            .find(|row| &row.pair == pair)
            .and_then(|row| row.prices.get(col).copied().flatten())
    }

    /// Number of populated cells
    pub fn available_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.prices.iter().filter(|p| p.is_some()).count())
            .sum()
    }
}

/// Everything one scan pass produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanResult {
    pub opportunities: Vec<ArbitrageOpportunity>,
    pub price_matrix: PriceMatrix,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn opportunities(&self) -> &[ArbitrageOpportunity] {
        &self.opportunities
    }

    pub fn price_matrix(&self) -> &PriceMatrix {
        &self.price_matrix
    }

    pub fn duration_ms(&self) -> i64 {
        self.finished_at
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }
}
