//! symbols.rs - Canonical pair -> exchange wire symbol mapping
//!
//! Pure and table-driven: every exchange gets a `SymbolRule` describing its
//! separator and ticker substitutions. Adding an exchange means adding a row.

use crate::models::{ExchangeId, TradingPair};

/// Wire-format rules for one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRule {
    pub separator: &'static str,
    /// (canonical, wire) substitutions applied to the base asset
    pub base_aliases: &'static [(&'static str, &'static str)],
    /// (canonical, wire) substitutions applied to the quote asset
    pub quote_aliases: &'static [(&'static str, &'static str)],
}

const NO_ALIASES: &[(&str, &str)] = &[];

// Kraken and Coinbase list USD markets rather than USDT for the majors
const USDT_AS_USD: &[(&str, &str)] = &[("USDT", "USD")];

const KRAKEN_BASES: &[(&str, &str)] = &[("BTC", "XBT"), ("DOGE", "XDG")];

pub fn rule_for(exchange: ExchangeId) -> SymbolRule {
    match exchange {
        ExchangeId::Binance => SymbolRule {
            separator: "",
            base_aliases: NO_ALIASES,
            quote_aliases: NO_ALIASES,
        },
        ExchangeId::Kraken => SymbolRule {
            separator: "",
            base_aliases: KRAKEN_BASES,
            quote_aliases: USDT_AS_USD,
        },
        ExchangeId::Coinbase => SymbolRule {
            separator: "-",
            base_aliases: NO_ALIASES,
            quote_aliases: USDT_AS_USD,
        },
        ExchangeId::Okx => SymbolRule {
            separator: "-",
            base_aliases: NO_ALIASES,
            quote_aliases: NO_ALIASES,
        },
        ExchangeId::Bybit => SymbolRule {
            separator: "",
            base_aliases: NO_ALIASES,
            quote_aliases: NO_ALIASES,
        },
    }
}

fn alias<'a>(asset: &'a str, table: &'static [(&'static str, &'static str)]) -> &'a str {
    table
        .iter()
        .find(|(canonical, _)| *canonical == asset)
        .map(|(_, wire)| *wire)
        .unwrap_or(asset)
}

/// Map a canonical pair to the symbol `exchange` expects on the wire.
///
/// Total: a pair without a "/" is passed through upper-cased, and the
/// exchange itself gets to reject it at fetch time.
pub fn normalize(pair: &TradingPair, exchange: ExchangeId) -> String {
    let rule = rule_for(exchange);

    match pair.split() {
        Some((base, quote)) => {
            let base = base.trim().to_ascii_uppercase();
            let quote = quote.trim().to_ascii_uppercase();
            format!(
                "{}{}{}",
                alias(&base, rule.base_aliases),
                rule.separator,
                alias(&quote, rule.quote_aliases)
            )
        }
        None => pair.as_str().trim().to_ascii_uppercase(),
    }
}
