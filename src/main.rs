//! main.rs - Entry point for the crypto arbitrage scanner
//!
//! - Loads configuration once (YAML file or defaults)
//! - Builds one exchange client per enabled exchange
//! - Scans on a fixed interval and prints the price matrix and opportunities

use crypto_arbitrage_scanner::dashboard::{render_opportunities, render_price_matrix};
use crypto_arbitrage_scanner::{
    AlertSink, ExchangeRegistry, LatestScan, LogAlertSink, Scanner, ScannerConfig,
    WebhookAlertSink, NAME, VERSION,
};
use log::{info, warn};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Print startup banner
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║     🚀 Live Crypto Arbitrage Scanner v{:<19}║", VERSION);
    println!("║     Monitoring only. Not financial advice.               ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    info!("Starting {} v{}", NAME, VERSION);

    let cli_path = std::env::args().nth(1);
    let config = ScannerConfig::load(cli_path.as_deref())?;

    let registry = Arc::new(ExchangeRegistry::from_config(&config)?);
    let exchanges: Vec<String> = registry.exchanges().iter().map(|e| e.to_string()).collect();
    info!("✓ Exchanges: {}", exchanges.join(", "));
    info!("✓ Pairs: {}", config.pairs.join(", "));
    info!(
        "  - Fee rate: {}% per trade, min profit: {}%",
        config.fee_rate * rust_decimal::Decimal::ONE_HUNDRED,
        config.min_profit_pct
    );

    let alert_sink: Arc<dyn AlertSink> = match &config.alert_webhook_url {
        Some(url) => match WebhookAlertSink::new(url, config.request_timeout()) {
            Ok(sink) => {
                info!("✓ Webhook alerts enabled");
                Arc::new(sink)
            }
            Err(e) => {
                warn!("Webhook alerts disabled, falling back to log alerts: {}", e);
                Arc::new(LogAlertSink)
            }
        },
        None => Arc::new(LogAlertSink),
    };

    let scanner = Scanner::from_config(&config, registry).with_alert_sink(alert_sink);
    let latest = LatestScan::new();

    info!("🔄 Starting scan loop (interval: {}s)...", config.refresh_interval_secs);
    println!();

    // A slow scan delays the next tick instead of overlapping it
    let mut interval = tokio::time::interval(config.refresh_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut scan_count: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        scan_count += 1;
        info!("📡 Scan #{}: fetching quotes...", scan_count);

        // Ctrl-C mid-scan drops the in-flight requests; nothing is shared across scans
        let result = tokio::select! {
            result = scanner.scan() => result,
            _ = tokio::signal::ctrl_c() => break,
        };

        latest.publish(result).await;
        display(&latest, config.refresh_interval_secs).await;

        // Stats every 10 scans
        if scan_count % 10 == 0 {
            info!("📈 Stats: {} scans completed", scan_count);
        }
    }

    info!("Shutting down after {} scans", scan_count);
    Ok(())
}

/// Print the cached price matrix and opportunity table
async fn display(latest: &LatestScan, refresh_secs: u64) {
    let matrix = latest.get_price_matrix().await;
    let opportunities = latest.get_opportunities().await;

    println!("Live Price Overview");
    println!("{}", render_price_matrix(&matrix));
    println!();

    println!("Arbitrage Opportunities (profit after fees)");
    println!("{}", render_opportunities(&opportunities));
    if !opportunities.is_empty() {
        info!("🎯 {} active arbitrage(s) right now!", opportunities.len());
    }

    match latest.last_updated().await {
        Some(at) => println!(
            "Last update: {} UTC | Next refresh in {}s",
            at.format("%b %d, %Y %H:%M:%S"),
            refresh_secs
        ),
        None => warn!("No scan result available yet"),
    }
    println!();
}
