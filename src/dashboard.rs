//! dashboard.rs - Display-side state and console tables
//!
//! `LatestScan` is the display layer's cache of the most recent scan: one
//! writer (the refresh loop), any number of readers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{ArbitrageOpportunity, PriceMatrix, ScanResult};

#[derive(Debug, Clone, Default)]
pub struct LatestScan {
    inner: Arc<RwLock<Option<ScanResult>>>,
}

impl LatestScan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached result; readers keep seeing the old one until this returns
    pub async fn publish(&self, result: ScanResult) {
        *self.inner.write().await = Some(result);
    }

    pub async fn get_opportunities(&self) -> Vec<ArbitrageOpportunity> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|r| r.opportunities.clone())
            .unwrap_or_default()
    }

    pub async fn get_price_matrix(&self) -> PriceMatrix {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|r| r.price_matrix.clone())
            .unwrap_or_default()
    }

    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.as_ref().map(|r| r.finished_at)
    }
}

const PAIR_WIDTH: usize = 12;
const PRICE_WIDTH: usize = 16;

fn rule(left: char, mid: char, right: char, widths: &[usize]) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}", left, segments.join(mid.to_string().as_str()), right)
}

fn row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!(" {:<width$} ", cell, width = *w))
        .collect();
    format!("│{}│", padded.join("│"))
}

fn table(header: &[String], body: &[Vec<String>], widths: &[usize]) -> String {
    let mut lines = vec![
        rule('┌', '┬', '┐', widths),
        row(header, widths),
        rule('├', '┼', '┤', widths),
    ];
    lines.extend(body.iter().map(|cells| row(cells, widths)));
    lines.push(rule('└', '┴', '┘', widths));
    lines.join("\n")
}

/// Pair rows x exchange columns. Highest price in a row is marked ▲, lowest ▼.
pub fn render_price_matrix(matrix: &PriceMatrix) -> String {
    if matrix.rows.is_empty() {
        return "Loading price matrix...".to_string();
    }

    let mut header = vec!["Pair".to_string()];
    header.extend(matrix.exchanges.iter().map(|e| e.as_str().to_uppercase()));

    let mut widths = vec![PAIR_WIDTH];
    widths.extend(std::iter::repeat(PRICE_WIDTH).take(matrix.exchanges.len()));

    let body: Vec<Vec<String>> = matrix
        .rows
        .iter()
        .map(|price_row| {
            let present: Vec<Decimal> = price_row.prices.iter().flatten().copied().collect();
            let high = present.iter().max().copied();
            let low = present.iter().min().copied();
            let marked = present.len() >= 2 && high != low;

            let mut cells = vec![price_row.pair.to_string()];
            cells.extend(price_row.prices.iter().map(|price| match price {
                None => "-".to_string(),
                Some(p) => {
                    let mark = if marked && Some(*p) == high {
                        " ▲"
                    } else if marked && Some(*p) == low {
                        " ▼"
                    } else {
                        ""
                    };
                    format!("${:.2}{}", p.round_dp(2), mark)
                }
            }));
            cells
        })
        .collect();

    table(&header, &body, &widths)
}

/// Pair / Buy / Sell / Spread / Profit / Time table
pub fn render_opportunities(opportunities: &[ArbitrageOpportunity]) -> String {
    if opportunities.is_empty() {
        return "No profitable opportunities right now. Waiting for refresh...".to_string();
    }

    let header: Vec<String> = ["Pair", "Buy", "Sell", "Spread", "Profit (after fees)", "Time"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let widths = [PAIR_WIDTH, 24, 24, 8, 19, 8];

    let body: Vec<Vec<String>> = opportunities
        .iter()
        .map(|o| {
            vec![
                o.pair.to_string(),
                format!("{} @ ${:.2}", o.buy_exchange.as_str().to_uppercase(), o.buy_price.round_dp(2)),
                format!("{} @ ${:.2}", o.sell_exchange.as_str().to_uppercase(), o.sell_price.round_dp(2)),
                format!("{:.2}%", o.spread_pct.round_dp(2)),
                format!("{:.2}%", o.profit_pct.round_dp(2)),
                o.detected_at.format("%H:%M:%S").to_string(),
            ]
        })
        .collect();

    table(&header, &body, &widths)
}
