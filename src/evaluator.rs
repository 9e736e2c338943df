//! evaluator.rs - Spread and after-fee profit for one pair
//!
//! Pure decision logic: buy where the mid-price is lowest, sell where it is
//! highest, and charge the configured fee on both legs.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::aggregator::PairPrices;
use crate::models::{ArbitrageOpportunity, ExchangeId, TradingPair};

/// Fewest exchanges with a usable quote needed to evaluate a pair
pub const QUORUM: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadEvaluator {
    /// Per-trade fee as a fraction
    fee_rate: Decimal,
    /// Minimum profit after fees, in percent
    min_profit_pct: Decimal,
}

impl SpreadEvaluator {
    pub fn new(fee_rate: Decimal, min_profit_pct: Decimal) -> Self {
        SpreadEvaluator {
            fee_rate,
            min_profit_pct,
        }
    }

    /// Round-trip fee cost in percent (buy leg + sell leg)
    pub fn round_trip_fee_pct(&self) -> Decimal {
        Decimal::TWO * self.fee_rate * Decimal::ONE_HUNDRED
    }

    /// An opportunity when profit after fees strictly exceeds the threshold.
    ///
    /// Ties on the min or max price go to the exchange seen first.
    pub fn evaluate(&self, pair: &TradingPair, prices: &PairPrices) -> Option<ArbitrageOpportunity> {
        if prices.len() < QUORUM {
            return None;
        }

        let mut iter = prices.iter();
        let &(first_exchange, first_price) = iter.next()?;
        let mut low: (ExchangeId, Decimal) = (first_exchange, first_price);
        let mut high: (ExchangeId, Decimal) = (first_exchange, first_price);

        for &(exchange, price) in iter {
            if price < low.1 {
                low = (exchange, price);
            }
            if price > high.1 {
                high = (exchange, price);
            }
        }

        if low.1 <= Decimal::ZERO {
            return None;
        }

        let spread_pct = (high.1 - low.1) / low.1 * Decimal::ONE_HUNDRED;
        let profit_pct = spread_pct - self.round_trip_fee_pct();

        if profit_pct <= self.min_profit_pct {
            return None;
        }

        Some(ArbitrageOpportunity {
            pair: pair.clone(),
            buy_exchange: low.0,
            buy_price: low.1,
            sell_exchange: high.0,
            sell_price: high.1,
            spread_pct,
            profit_pct,
            detected_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn evaluator() -> SpreadEvaluator {
        SpreadEvaluator::new(dec!(0.002), dec!(1.0))
    }

    fn prices(entries: &[(ExchangeId, Decimal)]) -> PairPrices {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_single_exchange_has_no_quorum() {
        let p = prices(&[(ExchangeId::Binance, dec!(50000))]);
        assert!(evaluator().evaluate(&"BTC/USDT".into(), &p).is_none());
        assert!(evaluator().evaluate(&"BTC/USDT".into(), &PairPrices::new()).is_none());
    }

    #[test]
    fn test_three_exchange_opportunity() {
        let p = prices(&[
            (ExchangeId::Binance, dec!(49250)),
            (ExchangeId::Kraken, dec!(48500)),
            (ExchangeId::Coinbase, dec!(50250)),
        ]);

        let opp = evaluator().evaluate(&"BTC/USDT".into(), &p).unwrap();
        assert_eq!(opp.pair.as_str(), "BTC/USDT");
        assert_eq!(opp.buy_exchange, ExchangeId::Kraken);
        assert_eq!(opp.buy_price, dec!(48500));
        assert_eq!(opp.sell_exchange, ExchangeId::Coinbase);
        assert_eq!(opp.sell_price, dec!(50250));
        assert_eq!(opp.spread_pct.round_dp(3), dec!(3.608));
        assert_eq!(opp.profit_pct.round_dp(3), dec!(3.208));
    }

    #[test]
    fn test_identical_prices_produce_nothing() {
        let p = prices(&[
            (ExchangeId::Binance, dec!(50250)),
            (ExchangeId::Kraken, dec!(50250)),
            (ExchangeId::Coinbase, dec!(50250)),
        ]);
        // Even with zero fees and a negative threshold the spread is zero
        let free = SpreadEvaluator::new(dec!(0), dec!(0));
        assert!(free.evaluate(&"BTC/USDT".into(), &p).is_none());
        assert!(evaluator().evaluate(&"BTC/USDT".into(), &p).is_none());
    }

    #[test]
    fn test_spread_below_fees_is_rejected() {
        // 0.3% spread < 0.4% round-trip fee
        let p = prices(&[(ExchangeId::Okx, dec!(100)), (ExchangeId::Bybit, dec!(100.3))]);
        let lenient = SpreadEvaluator::new(dec!(0.002), dec!(-1));
        let opp = lenient.evaluate(&"ETH/USDT".into(), &p).unwrap();
        assert!(opp.profit_pct < Decimal::ZERO);

        let strict = SpreadEvaluator::new(dec!(0.002), dec!(0.05));
        assert!(strict.evaluate(&"ETH/USDT".into(), &p).is_none());
    }

    #[test]
    fn test_threshold_is_strict() {
        // spread 1.4% - fee 0.4% = exactly 1.0%
        let p = prices(&[(ExchangeId::Binance, dec!(100)), (ExchangeId::Kraken, dec!(101.4))]);
        assert!(evaluator().evaluate(&"SOL/USDT".into(), &p).is_none());
    }

    #[test]
    fn test_tie_break_picks_first_in_order() {
        let p = prices(&[
            (ExchangeId::Okx, dec!(100)),
            (ExchangeId::Binance, dec!(100)),
            (ExchangeId::Kraken, dec!(110)),
            (ExchangeId::Bybit, dec!(110)),
        ]);

        let opp = evaluator().evaluate(&"XRP/USDT".into(), &p).unwrap();
        assert_eq!(opp.buy_exchange, ExchangeId::Okx);
        assert_eq!(opp.sell_exchange, ExchangeId::Kraken);
    }

    #[test]
    fn test_round_trip_fee() {
        assert_eq!(evaluator().round_trip_fee_pct(), dec!(0.4));
    }
}
