//! aggregator.rs - Per-pair quote collection across all exchanges
//!
//! Queries every registered exchange concurrently and keeps the mid-price of
//! each usable answer. Failed exchanges are simply absent from the result.

use futures::future::join_all;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::exchanges::ExchangeRegistry;
use crate::models::{ExchangeId, TradingPair};

/// Mid-prices for one pair, in registry (configured) order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairPrices {
    entries: Vec<(ExchangeId, Decimal)>,
}

impl PairPrices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a price; a repeated exchange keeps its first price
    pub fn insert(&mut self, exchange: ExchangeId, mid_price: Decimal) {
        if self.get(exchange).is_none() {
            self.entries.push((exchange, mid_price));
        }
    }

    pub fn get(&self, exchange: ExchangeId) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|(id, _)| *id == exchange)
            .map(|(_, price)| *price)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ExchangeId, Decimal)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ExchangeId, Decimal)> for PairPrices {
    fn from_iter<I: IntoIterator<Item = (ExchangeId, Decimal)>>(iter: I) -> Self {
        let mut prices = PairPrices::new();
        for (exchange, price) in iter {
            prices.insert(exchange, price);
        }
        prices
    }
}

#[derive(Debug, Clone)]
pub struct QuoteAggregator {
    registry: Arc<ExchangeRegistry>,
}

impl QuoteAggregator {
    pub fn new(registry: Arc<ExchangeRegistry>) -> Self {
        QuoteAggregator { registry }
    }

    pub fn exchanges(&self) -> Vec<ExchangeId> {
        self.registry.exchanges()
    }

    /// One concurrent fetch per exchange; only usable quotes are kept
    pub async fn aggregate(&self, pair: &TradingPair) -> PairPrices {
        let exchanges = self.registry.exchanges();
        let fetches = exchanges
            .iter()
            .map(|exchange| self.registry.fetch_quote(*exchange, pair));

        // join_all preserves input order, so iteration order stays deterministic
        let prices: PairPrices = join_all(fetches)
            .await
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(quote) => Some((quote.exchange, quote.mid_price())),
                Err(unavailable) => {
                    debug!("Skipping {}", unavailable);
                    None
                }
            })
            .collect();

        debug!(
            "{}: {}/{} exchanges answered",
            pair,
            prices.len(),
            exchanges.len()
        );
        prices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::{ExchangeClient, MockExchangeClient};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn registry(clients: Vec<(ExchangeId, MockExchangeClient)>) -> Arc<ExchangeRegistry> {
        let mut registry = ExchangeRegistry::new(Duration::from_millis(200));
        for (exchange, client) in clients {
            registry.register(exchange, Arc::new(client) as Arc<dyn ExchangeClient>);
        }
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_aggregate_computes_mid_prices_in_order() {
        let aggregator = QuoteAggregator::new(registry(vec![
            (ExchangeId::Binance, MockExchangeClient::new().with_fallback(dec!(49000), dec!(49500))),
            (ExchangeId::Kraken, MockExchangeClient::new().with_fallback(dec!(48000), dec!(49000))),
            (ExchangeId::Coinbase, MockExchangeClient::new().with_fallback(dec!(50000), dec!(50500))),
        ]));

        let prices = aggregator.aggregate(&"BTC/USDT".into()).await;
        let collected: Vec<_> = prices.iter().copied().collect();
        assert_eq!(
            collected,
            vec![
                (ExchangeId::Binance, dec!(49250)),
                (ExchangeId::Kraken, dec!(48500)),
                (ExchangeId::Coinbase, dec!(50250)),
            ]
        );
    }

    #[tokio::test]
    async fn test_aggregate_drops_failures() {
        let aggregator = QuoteAggregator::new(registry(vec![
            (ExchangeId::Binance, MockExchangeClient::failing()),
            (ExchangeId::Okx, MockExchangeClient::new().with_fallback(dec!(100), dec!(102))),
            (ExchangeId::Bybit, MockExchangeClient::new().with_delay(Duration::from_secs(3))),
        ]));

        let prices = aggregator.aggregate(&"ETH/USDT".into()).await;
        assert_eq!(prices.len(), 1);
        assert_eq!(prices.get(ExchangeId::Okx), Some(dec!(101)));
        assert_eq!(prices.get(ExchangeId::Binance), None);
    }

    #[tokio::test]
    async fn test_aggregate_all_failed_is_empty() {
        let aggregator = QuoteAggregator::new(registry(vec![
            (ExchangeId::Binance, MockExchangeClient::failing()),
            (ExchangeId::Kraken, MockExchangeClient::failing()),
        ]));

        let prices = aggregator.aggregate(&"SOL/USDT".into()).await;
        assert!(prices.is_empty());
    }

    #[test]
    fn test_pair_prices_keeps_first_duplicate() {
        let prices: PairPrices = vec![
            (ExchangeId::Binance, dec!(1)),
            (ExchangeId::Binance, dec!(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices.get(ExchangeId::Binance), Some(dec!(1)));
    }
}
