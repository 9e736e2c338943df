//! exchanges.rs - Exchange ticker clients and the client registry
//!
//! One REST client per enabled exchange, each with its own request timeout.
//! The registry owns the per-exchange rate limiters and is the boundary where
//! every client failure becomes an `Unavailable` value instead of an error.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::ScannerConfig;
use crate::error::{Result, ScannerError};
use crate::models::{ExchangeId, Quote, TradingPair};
use crate::symbols::normalize;

/// Best bid/ask as reported by an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker {
    pub bid: Decimal,
    pub ask: Decimal,
}

/// Trait defining the single operation the scanner needs from an exchange
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Current best bid and ask for an exchange-native market symbol
    async fn fetch_ticker(&self, symbol: &str) -> anyhow::Result<Ticker>;
}

// ============================================================================
// Exchange REST profiles
// ============================================================================

/// Static connection details for one exchange
#[derive(Debug, Clone, Copy)]
pub struct ExchangeProfile {
    pub base_url: &'static str,
    /// Minimum spacing between two requests from the same client
    pub min_request_spacing: Duration,
}

pub fn profile_for(exchange: ExchangeId) -> ExchangeProfile {
    match exchange {
        ExchangeId::Binance => ExchangeProfile {
            base_url: "https://api.binance.com",
            min_request_spacing: Duration::from_millis(50),
        },
        ExchangeId::Kraken => ExchangeProfile {
            base_url: "https://api.kraken.com",
            min_request_spacing: Duration::from_millis(500),
        },
        ExchangeId::Coinbase => ExchangeProfile {
            base_url: "https://api.exchange.coinbase.com",
            min_request_spacing: Duration::from_millis(100),
        },
        ExchangeId::Okx => ExchangeProfile {
            base_url: "https://www.okx.com",
            min_request_spacing: Duration::from_millis(100),
        },
        ExchangeId::Bybit => ExchangeProfile {
            base_url: "https://api.bybit.com",
            min_request_spacing: Duration::from_millis(20),
        },
    }
}

/// Ticker endpoint for `symbol` on `exchange`
pub fn ticker_url(exchange: ExchangeId, base_url: &str, symbol: &str) -> String {
    match exchange {
        ExchangeId::Binance => format!("{}/api/v3/ticker/bookTicker?symbol={}", base_url, symbol),
        ExchangeId::Kraken => format!("{}/0/public/Ticker?pair={}", base_url, symbol),
        ExchangeId::Coinbase => format!("{}/products/{}/ticker", base_url, symbol),
        ExchangeId::Okx => format!("{}/api/v5/market/ticker?instId={}", base_url, symbol),
        ExchangeId::Bybit => format!(
            "{}/v5/market/tickers?category=spot&symbol={}",
            base_url, symbol
        ),
    }
}

// ============================================================================
// Exchange API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct BinanceBookTicker {
    #[serde(rename = "bidPrice")]
    bid_price: Option<String>,

    #[serde(rename = "askPrice")]
    ask_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KrakenResponse {
    #[serde(default)]
    error: Vec<String>,
    result: Option<HashMap<String, KrakenTicker>>,
}

#[derive(Debug, Deserialize)]
struct KrakenTicker {
    /// [price, whole lot volume, lot volume]
    a: Vec<String>,
    b: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CoinbaseTicker {
    bid: Option<String>,
    ask: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OkxResponse {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<OkxTicker>,
}

#[derive(Debug, Deserialize)]
struct OkxTicker {
    #[serde(rename = "bidPx")]
    bid_px: Option<String>,

    #[serde(rename = "askPx")]
    ask_px: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BybitResponse {
    #[serde(rename = "retCode")]
    ret_code: i64,

    #[serde(rename = "retMsg", default)]
    ret_msg: String,

    result: Option<BybitResult>,
}

#[derive(Debug, Deserialize)]
struct BybitResult {
    #[serde(default)]
    list: Vec<BybitTicker>,
}

#[derive(Debug, Deserialize)]
struct BybitTicker {
    #[serde(rename = "bid1Price")]
    bid1_price: Option<String>,

    #[serde(rename = "ask1Price")]
    ask1_price: Option<String>,
}

fn parse_price(field: &str, value: Option<&str>) -> anyhow::Result<Decimal> {
    let raw = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("missing {}", field))?;

    Decimal::from_str(raw).map_err(|e| anyhow::anyhow!("invalid {} '{}': {}", field, raw, e))
}

/// Map an exchange-native ticker body to bid/ask
pub fn parse_ticker(exchange: ExchangeId, body: &str) -> anyhow::Result<Ticker> {
    let (bid, ask) = match exchange {
        ExchangeId::Binance => {
            let t: BinanceBookTicker = serde_json::from_str(body)?;
            (
                parse_price("bidPrice", t.bid_price.as_deref())?,
                parse_price("askPrice", t.ask_price.as_deref())?,
            )
        }
        ExchangeId::Kraken => {
            let resp: KrakenResponse = serde_json::from_str(body)?;
            if !resp.error.is_empty() {
                anyhow::bail!("kraken error: {}", resp.error.join(", "));
            }
            // Result is keyed by Kraken's internal pair name (e.g. XXBTZUSD)
            let ticker = resp
                .result
                .and_then(|r| r.into_values().next())
                .ok_or_else(|| anyhow::anyhow!("empty kraken result"))?;
            (
                parse_price("b[0]", ticker.b.first().map(String::as_str))?,
                parse_price("a[0]", ticker.a.first().map(String::as_str))?,
            )
        }
        ExchangeId::Coinbase => {
            let t: CoinbaseTicker = serde_json::from_str(body)?;
            (
                parse_price("bid", t.bid.as_deref())?,
                parse_price("ask", t.ask.as_deref())?,
            )
        }
        ExchangeId::Okx => {
            let resp: OkxResponse = serde_json::from_str(body)?;
            if resp.code != "0" {
                anyhow::bail!("okx error {}: {}", resp.code, resp.msg);
            }
            let t = resp
                .data
                .first()
                .ok_or_else(|| anyhow::anyhow!("empty okx data"))?;
            (
                parse_price("bidPx", t.bid_px.as_deref())?,
                parse_price("askPx", t.ask_px.as_deref())?,
            )
        }
        ExchangeId::Bybit => {
            let resp: BybitResponse = serde_json::from_str(body)?;
            if resp.ret_code != 0 {
                anyhow::bail!("bybit error {}: {}", resp.ret_code, resp.ret_msg);
            }
            let t = resp
                .result
                .and_then(|r| r.list.into_iter().next())
                .ok_or_else(|| anyhow::anyhow!("empty bybit ticker list"))?;
            (
                parse_price("bid1Price", t.bid1_price.as_deref())?,
                parse_price("ask1Price", t.ask1_price.as_deref())?,
            )
        }
    };

    Ok(Ticker { bid, ask })
}

// ============================================================================
// RateLimiter
// ============================================================================

/// Enforces a minimum spacing between requests; callers queue on the mutex
#[derive(Debug)]
pub struct RateLimiter {
    min_spacing: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_spacing: Duration) -> Self {
        RateLimiter {
            min_spacing,
            last_request: Mutex::new(None),
        }
    }

    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_spacing;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

// ============================================================================
// RestExchangeClient - Public ticker endpoints over HTTPS
// ============================================================================

#[derive(Debug)]
pub struct RestExchangeClient {
    exchange: ExchangeId,
    client: Client,
    base_url: String,
}

impl RestExchangeClient {
    /// Create a client for `exchange` with the given request timeout
    pub fn new(exchange: ExchangeId, timeout: Duration) -> std::result::Result<Self, reqwest::Error> {
        let profile = profile_for(exchange);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(RestExchangeClient {
            exchange,
            client,
            base_url: profile.base_url.to_string(),
        })
    }
}

#[async_trait]
impl ExchangeClient for RestExchangeClient {
    async fn fetch_ticker(&self, symbol: &str) -> anyhow::Result<Ticker> {
        let url = ticker_url(self.exchange, &self.base_url, symbol);
        debug!("Fetching from: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("{} returned status {} for '{}'", self.exchange, status, symbol);
        }

        let body = response.text().await?;
        parse_ticker(self.exchange, &body)
    }
}

// ============================================================================
// MockExchangeClient - For testing purposes
// ============================================================================

/// In-memory exchange keyed by wire symbol
#[derive(Debug, Default)]
pub struct MockExchangeClient {
    tickers: HashMap<String, Ticker>,
    fallback: Option<Ticker>,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockExchangeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quote `bid`/`ask` for one wire symbol
    pub fn with_ticker(mut self, symbol: &str, bid: Decimal, ask: Decimal) -> Self {
        self.tickers.insert(symbol.to_string(), Ticker { bid, ask });
        self
    }

    /// Quote `bid`/`ask` for any symbol without an explicit ticker
    pub fn with_fallback(mut self, bid: Decimal, ask: Decimal) -> Self {
        self.fallback = Some(Ticker { bid, ask });
        self
    }

    /// Every request fails
    pub fn failing() -> Self {
        MockExchangeClient {
            fail: true,
            ..Self::default()
        }
    }

    /// Sleep before answering, to simulate a hung exchange
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeClient for MockExchangeClient {
    async fn fetch_ticker(&self, symbol: &str) -> anyhow::Result<Ticker> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            anyhow::bail!("mock exchange failure");
        }

        self.tickers
            .get(symbol)
            .copied()
            .or(self.fallback)
            .ok_or_else(|| anyhow::anyhow!("unknown symbol {}", symbol))
    }
}

// ============================================================================
// ExchangeRegistry
// ============================================================================

/// No usable quote from `exchange` for `pair` this cycle
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{exchange} unavailable for {pair}: {reason}")]
pub struct Unavailable {
    pub exchange: ExchangeId,
    pub pair: TradingPair,
    pub reason: String,
}

/// Builds a client for one exchange; failures exclude that exchange only
pub type ClientFactory =
    dyn Fn(ExchangeId, Duration) -> anyhow::Result<Arc<dyn ExchangeClient>>;

struct RegisteredClient {
    exchange: ExchangeId,
    client: Arc<dyn ExchangeClient>,
    rate_limiter: RateLimiter,
}

/// The configured exchange clients, in configured order.
///
/// Built once at startup and shared read-only by the scanner.
pub struct ExchangeRegistry {
    clients: Vec<RegisteredClient>,
    request_timeout: Duration,
}

impl ExchangeRegistry {
    pub fn new(request_timeout: Duration) -> Self {
        ExchangeRegistry {
            clients: Vec::new(),
            request_timeout,
        }
    }

    /// Build REST clients for every configured exchange
    pub fn from_config(config: &ScannerConfig) -> Result<Self> {
        Self::build(&config.exchanges, config.request_timeout(), &|exchange, timeout| {
            let client = RestExchangeClient::new(exchange, timeout)?;
            Ok(Arc::new(client) as Arc<dyn ExchangeClient>)
        })
    }

    /// Resolve `names` and build one client each through `factory`.
    ///
    /// Unknown names and client build failures are logged and skipped; only
    /// an empty result is an error.
    pub fn build(names: &[String], request_timeout: Duration, factory: &ClientFactory) -> Result<Self> {
        let mut registry = Self::new(request_timeout);

        for name in names {
            let exchange = match name.parse::<ExchangeId>() {
                Ok(id) => id,
                Err(e) => {
                    warn!("Skipping exchange: {}", e);
                    continue;
                }
            };

            if registry.contains(exchange) {
                warn!("Exchange '{}' listed more than once, keeping the first", name);
                continue;
            }

            match factory(exchange, request_timeout) {
                Ok(client) => {
                    registry.register_rate_limited(
                        exchange,
                        client,
                        profile_for(exchange).min_request_spacing,
                    );
                    info!("✓ Exchange client initialized: {}", exchange);
                }
                Err(e) => error!("✗ Failed to initialize {} client: {}", exchange, e),
            }
        }

        if registry.is_empty() {
            return Err(ScannerError::NoExchanges(names.join(", ")));
        }

        Ok(registry)
    }

    /// Add a client with no request spacing
    pub fn register(&mut self, exchange: ExchangeId, client: Arc<dyn ExchangeClient>) {
        self.register_rate_limited(exchange, client, Duration::ZERO);
    }

    /// Add a client whose requests are spaced at least `min_spacing` apart.
    /// An already registered exchange keeps its existing client.
    pub fn register_rate_limited(
        &mut self,
        exchange: ExchangeId,
        client: Arc<dyn ExchangeClient>,
        min_spacing: Duration,
    ) {
        if self.contains(exchange) {
            warn!("Exchange {} already registered", exchange);
            return;
        }
        self.clients.push(RegisteredClient {
            exchange,
            client,
            rate_limiter: RateLimiter::new(min_spacing),
        });
    }

    pub fn contains(&self, exchange: ExchangeId) -> bool {
        self.clients.iter().any(|c| c.exchange == exchange)
    }

    /// Registered exchanges in configured order
    pub fn exchanges(&self) -> Vec<ExchangeId> {
        self.clients.iter().map(|c| c.exchange).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Fetch one quote. Never fails: every problem becomes `Unavailable`.
    pub async fn fetch_quote(
        &self,
        exchange: ExchangeId,
        pair: &TradingPair,
    ) -> std::result::Result<Quote, Unavailable> {
        let unavailable = |reason: String| Unavailable {
            exchange,
            pair: pair.clone(),
            reason,
        };

        let registered = self
            .clients
            .iter()
            .find(|c| c.exchange == exchange)
            .ok_or_else(|| unavailable("exchange not registered".to_string()))?;

        let symbol = normalize(pair, exchange);

        // Queueing behind our own rate limiter is not the exchange's fault,
        // so only the request itself is timed
        registered.rate_limiter.acquire().await;

        let fetch = registered.client.fetch_ticker(&symbol);
        let ticker = match tokio::time::timeout(self.request_timeout, fetch).await {
            Ok(Ok(ticker)) => ticker,
            Ok(Err(e)) => {
                debug!("{} {} ({}) failed: {}", exchange, pair, symbol, e);
                return Err(unavailable(e.to_string()));
            }
            Err(_) => {
                debug!("{} {} ({}) timed out", exchange, pair, symbol);
                return Err(unavailable(format!(
                    "timed out after {}ms",
                    self.request_timeout.as_millis()
                )));
            }
        };

        let quote = Quote::new(exchange, pair.clone(), ticker.bid, ticker.ask);
        if !quote.is_usable() {
            debug!(
                "{} {} returned unusable quote bid={} ask={}",
                exchange, pair, quote.bid, quote.ask
            );
            return Err(unavailable(format!(
                "unusable quote bid={} ask={}",
                quote.bid, quote.ask
            )));
        }

        Ok(quote)
    }
}

impl std::fmt::Debug for ExchangeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeRegistry")
            .field("exchanges", &self.exchanges())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
