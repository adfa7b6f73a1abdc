//! Load and validate runtime configuration.

use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

use crate::registry::default_holdings;
use crate::types::Holding;
use crate::utils::sanitize_symbol;

const BROWSER_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PrimaryCfg {
    pub base_url: String,
    /// Hands out the session cookie the crumb is bound to.
    pub cookie_url: String,
    pub timeout_sec: u64,
    pub user_agent: String,
}

impl Default for PrimaryCfg {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            cookie_url: "https://fc.yahoo.com".to_string(),
            timeout_sec: 10,
            user_agent: BROWSER_UA.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SecondaryCfg {
    pub base_url: String,
    pub timeout_sec: u64,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for SecondaryCfg {
    fn default() -> Self {
        Self {
            base_url: "https://www.google.com/finance".to_string(),
            timeout_sec: 10,
            user_agent: BROWSER_UA.to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshCfg {
    pub interval_sec: u64,
    /// Upper bound for each source branch of one cycle.
    pub cycle_timeout_sec: u64,
    pub run_once: bool,
}

impl Default for RefreshCfg {
    fn default() -> Self {
        Self {
            interval_sec: 15,
            cycle_timeout_sec: 20,
            run_once: false,
        }
    }
}

impl RefreshCfg {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_sec.max(1))
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_sec.max(1))
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub primary: PrimaryCfg,
    pub secondary: SecondaryCfg,
    pub refresh: RefreshCfg,
    pub holdings: Vec<Holding>,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let s = fs::read_to_string(path)?;
        Self::from_yaml(&s)
    }

    pub fn from_yaml(s: &str) -> anyhow::Result<Self> {
        let mut cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        if cfg.holdings.is_empty() {
            cfg.holdings = default_holdings();
        }
        for h in &mut cfg.holdings {
            h.symbol = sanitize_symbol(&h.symbol);
            h.exchange = sanitize_symbol(&h.exchange);
        }
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.primary.timeout_sec == 0 {
            anyhow::bail!("primary.timeout_sec must be at least 1");
        }
        if self.secondary.timeout_sec == 0 {
            anyhow::bail!("secondary.timeout_sec must be at least 1");
        }
        for h in &self.holdings {
            if !h.purchase_price.is_finite() || h.purchase_price < 0.0 {
                anyhow::bail!("holding {}: purchase price must be a non-negative number", h.id);
            }
            if !h.quantity.is_finite() || h.quantity < 0.0 {
                anyhow::bail!("holding {}: quantity must be a non-negative number", h.id);
            }
        }
        Ok(())
    }
}
