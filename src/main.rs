//! Entry point. Wires config -> quote sources -> refresh loop -> JSON on stdout.

mod config;
mod error;
mod fallback;
mod merge;
mod primary;
mod registry;
mod scrape;
mod service;
mod stats;
mod types;
mod utils;

use dotenvy::dotenv;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use crate::primary::YahooQuoteClient;
use crate::scrape::GoogleFinanceScraper;
use crate::service::RefreshService;
use crate::types::{HoldingShare, PortfolioResponse, PortfolioStats, SectorSummary};

/// What one cycle prints: the merged response plus its aggregates.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot<'a> {
    success: bool,
    #[serde(flatten)]
    response: &'a PortfolioResponse,
    stats: PortfolioStats,
    holdings: Vec<HoldingShare>,
    sectors: Vec<SectorSummary>,
}

fn emit(resp: &PortfolioResponse) -> anyhow::Result<()> {
    let snap = Snapshot {
        success: true,
        response: resp,
        stats: stats::portfolio_stats(&resp.data),
        holdings: stats::holding_shares(&resp.data),
        sectors: stats::sector_summaries(&resp.data),
    };
    println!("{}", serde_json::to_string(&snap)?);
    info!(
        "Portfolio value {:.2} vs cost {:.2} ({:+.2}%)",
        snap.stats.total_present_value, snap.stats.total_investment, snap.stats.gain_loss_percent
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    // logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cfg_path = std::env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());
    let cfg = if std::path::Path::new(&cfg_path).exists() {
        config::AppConfig::load(&cfg_path)?
    } else {
        info!("{} not found, using built-in defaults", cfg_path);
        config::AppConfig::from_yaml("{}")?
    };

    let primary = Arc::new(YahooQuoteClient::new(&cfg.primary)?);
    let secondary = Arc::new(GoogleFinanceScraper::new(&cfg.secondary)?);
    let svc = RefreshService::new(
        cfg.holdings.clone(),
        primary,
        secondary,
        cfg.refresh.cycle_timeout(),
    );
    info!(
        "Tracking {} holdings. RefreshEvery={}s, RunOnce={}",
        svc.holdings().len(),
        cfg.refresh.interval_sec,
        cfg.refresh.run_once
    );

    if cfg.refresh.run_once {
        let resp = svc.refresh().await;
        return emit(&resp);
    }

    // Cycles run back to back on one task, so a late cycle never overwrites a newer one.
    let mut ticker = tokio::time::interval(cfg.refresh.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let resp = svc.refresh().await;
                if let Err(e) = emit(&resp) {
                    error!("Failed to write snapshot: {:#}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }
    Ok(())
}
