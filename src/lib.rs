//! Crypto Arbitrage Scanner
//!
//! Polls centralized exchanges for bid/ask quotes and reports pairs whose
//! cross-exchange spread beats round-trip fees. Monitoring only; it never
//! places orders.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │             Refresh loop (main / display)            │
//! │      interval tick → scan() → LatestScan::publish    │
//! └────────────────────────┬────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                      Scanner                         │
//! │  per pair: QuoteAggregator → SpreadEvaluator         │
//! └────────────────────────┬────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                 ExchangeRegistry                     │
//! │  fetch_quote(exchange, pair) → Quote | Unavailable   │
//! │  symbols::normalize → ExchangeClient::fetch_ticker   │
//! └────────────────────────┬────────────────────────────┘
//!                          │
//!          ┌───────────────┴───────────────┐
//!          │                               │
//!          ▼                               ▼
//! ┌──────────────────────┐       ┌──────────────────────┐
//! │  RestExchangeClient  │       │  MockExchangeClient  │
//! │  (Production)        │       │  (Testing)           │
//! └──────────────────────┘       └──────────────────────┘
//! ```

pub mod aggregator;
pub mod alerts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod evaluator;
pub mod exchanges;
pub mod models;
pub mod scanner;
pub mod symbols;

// Re-export commonly used types
pub use models::{
    ArbitrageOpportunity,
    ExchangeId,
    PriceMatrix,
    PriceRow,
    Quote,
    ScanResult,
    TradingPair,
};

pub use aggregator::{PairPrices, QuoteAggregator};
pub use alerts::{AlertSink, LogAlertSink, WebhookAlertSink};
pub use config::ScannerConfig;
pub use dashboard::LatestScan;
pub use error::ScannerError;
pub use evaluator::SpreadEvaluator;
pub use exchanges::{
    ExchangeClient, ExchangeRegistry, MockExchangeClient, RestExchangeClient, Unavailable,
};
pub use scanner::Scanner;
pub use symbols::normalize;

/// Version of the scanner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the package
pub const NAME: &str = env!("CARGO_PKG_NAME");
