//! One refresh cycle: both sources concurrently, then merge. Never fails.

use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::QuoteError;
use crate::merge::merge;
use crate::primary::QuoteProvider;
use crate::scrape::FundamentalsSource;
use crate::types::{Holding, PortfolioResponse, PrimarySymbol, SecondarySymbol};

pub struct RefreshService {
    holdings: Vec<Holding>,
    primary: Arc<dyn QuoteProvider>,
    secondary: Arc<dyn FundamentalsSource>,
    cycle_timeout: Duration,
}

impl RefreshService {
    pub fn new(
        holdings: Vec<Holding>,
        primary: Arc<dyn QuoteProvider>,
        secondary: Arc<dyn FundamentalsSource>,
        cycle_timeout: Duration,
    ) -> Self {
        Self {
            holdings,
            primary,
            secondary,
            cycle_timeout,
        }
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub async fn refresh(&self) -> PortfolioResponse {
        let primary_ids: Vec<PrimarySymbol> =
            self.holdings.iter().map(|h| h.primary_symbol.clone()).collect();
        let secondary_ids: Vec<SecondarySymbol> =
            self.holdings.iter().map(Holding::secondary_id).collect();

        let limit = self.cycle_timeout;
        let (primary, scraped) = tokio::join!(
            async {
                match tokio::time::timeout(limit, self.primary.fetch_quotes(&primary_ids)).await {
                    Ok(res) => res,
                    Err(_) => Err(QuoteError::Timeout {
                        secs: limit.as_secs(),
                    }),
                }
            },
            // bounded per page, so one slow page cannot blank the whole batch
            self.secondary.fetch_all(&secondary_ids, limit)
        );

        if let Err(e) = &primary {
            warn!("Primary quote batch failed, using fallback data: {}", e);
        }

        let (data, source) = {
            let mut rng = rand::thread_rng();
            merge(&self.holdings, primary.as_ref(), &scraped, &mut rng)
        };
        info!(
            "Refreshed {} holdings (price={:?}, pe={:?}, earnings={:?})",
            data.len(),
            source.price,
            source.pe_ratio,
            source.latest_earnings
        );

        PortfolioResponse {
            data,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            source,
        }
    }
}
