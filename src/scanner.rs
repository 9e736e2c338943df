//! scanner.rs - One full scan pass over every configured pair
//!
//! `Scanner::scan` is a stateless callable unit: no loop, no cache. The
//! caller owns the scheduling and whatever it does with the `ScanResult`.

use chrono::Utc;
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::aggregator::QuoteAggregator;
use crate::alerts::AlertSink;
use crate::config::ScannerConfig;
use crate::evaluator::SpreadEvaluator;
use crate::exchanges::ExchangeRegistry;
use crate::models::{ArbitrageOpportunity, PriceMatrix, PriceRow, ScanResult, TradingPair};

pub struct Scanner {
    aggregator: QuoteAggregator,
    evaluator: SpreadEvaluator,
    pairs: Vec<TradingPair>,
    alert_sink: Option<Arc<dyn AlertSink>>,
}

impl Scanner {
    pub fn new(
        registry: Arc<ExchangeRegistry>,
        pairs: Vec<TradingPair>,
        evaluator: SpreadEvaluator,
    ) -> Self {
        Scanner {
            aggregator: QuoteAggregator::new(registry),
            evaluator,
            pairs,
            alert_sink: None,
        }
    }

    pub fn from_config(config: &ScannerConfig, registry: Arc<ExchangeRegistry>) -> Self {
        Self::new(
            registry,
            config.trading_pairs(),
            SpreadEvaluator::new(config.fee_rate, config.min_profit_pct),
        )
    }

    /// Notify `sink` of every opportunity a scan finds
    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert_sink = Some(sink);
        self
    }

    pub fn pairs(&self) -> &[TradingPair] {
        &self.pairs
    }

    /// Fetch, aggregate and evaluate every pair.
    ///
    /// All (pair, exchange) requests run concurrently; results are merged back
    /// in configured pair and exchange order.
    pub async fn scan(&self) -> ScanResult {
        let started_at = Utc::now();
        let exchanges = self.aggregator.exchanges();

        let per_pair = join_all(self.pairs.iter().map(|pair| self.aggregator.aggregate(pair))).await;

        let mut price_matrix = PriceMatrix::new(exchanges.clone());
        let mut opportunities = Vec::new();

        for (pair, prices) in self.pairs.iter().zip(per_pair) {
            price_matrix.rows.push(PriceRow {
                pair: pair.clone(),
                prices: exchanges.iter().map(|e| prices.get(*e)).collect(),
            });

            match self.evaluator.evaluate(pair, &prices) {
                Some(opportunity) => {
                    info!(
                        "💡 {} | Spread: {:.2}% | Profit: {:.2}%",
                        pair,
                        opportunity.spread_pct.round_dp(2),
                        opportunity.profit_pct.round_dp(2)
                    );
                    info!(
                        "   Buy on {} @ ${:.4} → Sell on {} @ ${:.4}",
                        opportunity.buy_exchange,
                        opportunity.buy_price.round_dp(4),
                        opportunity.sell_exchange,
                        opportunity.sell_price.round_dp(4)
                    );
                    opportunities.push(opportunity);
                }
                None => debug!("{}: no opportunity ({} prices)", pair, prices.len()),
            }
        }

        self.dispatch_alerts(&opportunities);

        let result = ScanResult {
            opportunities,
            price_matrix,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "Scan complete in {}ms: {} opportunities, {}/{} prices available",
            result.duration_ms(),
            result.opportunities.len(),
            result.price_matrix.available_count(),
            self.pairs.len() * exchanges.len()
        );

        result
    }

    /// Opportunities only, for callers that do not need the matrix
    pub async fn find_arbitrage(&self) -> Vec<ArbitrageOpportunity> {
        self.scan().await.opportunities
    }

    /// Full pair x exchange price matrix, for callers that only display prices
    pub async fn price_matrix(&self) -> PriceMatrix {
        self.scan().await.price_matrix
    }

    fn dispatch_alerts(&self, opportunities: &[ArbitrageOpportunity]) {
        let Some(sink) = &self.alert_sink else {
            return;
        };

        for opportunity in opportunities {
            let sink = Arc::clone(sink);
            let message = opportunity.summary();
            tokio::spawn(async move {
                if let Err(e) = sink.notify(&message).await {
                    warn!("Alert delivery failed: {}", e);
                }
            });
        }
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("aggregator", &self.aggregator)
            .field("evaluator", &self.evaluator)
            .field("pairs", &self.pairs)
            .field("alerts", &self.alert_sink.is_some())
            .finish()
    }
}
