//! Core domain types for holdings, source quotes, merged records and aggregates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier understood by the primary quote provider, e.g. "RELIANCE.NS".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimarySymbol(pub String);

/// Identifier understood by the scraped quote page, e.g. "RELIANCE:NSE".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecondarySymbol(pub String);

impl fmt::Display for PrimarySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SecondarySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    /// Display symbol.
    pub symbol: String,
    pub primary_symbol: PrimarySymbol,
    /// Defaults to "{symbol}:{exchange}" when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_symbol: Option<SecondarySymbol>,
    pub name: String,
    pub purchase_price: f64,
    pub quantity: f64,
    pub exchange: String,
    pub sector: String,
}

impl Holding {
    pub fn secondary_id(&self) -> SecondarySymbol {
        match &self.secondary_symbol {
            Some(s) => s.clone(),
            None => SecondarySymbol(format!("{}:{}", self.symbol, self.exchange)),
        }
    }

    pub fn investment(&self) -> f64 {
        self.purchase_price * self.quantity
    }
}

/// One entry of a primary batch response. Every field may be missing upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryQuote {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default, rename = "trailingPE")]
    pub trailing_pe: Option<f64>,
    #[serde(default)]
    pub eps_trailing_twelve_months: Option<f64>,
}

/// Values pulled from the scraped page. Either side is `None` when not found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedFields {
    pub pe_ratio: Option<f64>,
    pub latest_earnings: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFields {
    pub current_price: f64,
    pub pe_ratio: f64,
    pub latest_earnings: f64,
}

/// Holding plus fully resolved quote values. Numbers are always finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    #[serde(flatten)]
    pub holding: Holding,
    #[serde(flatten)]
    pub quote: QuoteFields,
}

impl MergedRecord {
    pub fn investment(&self) -> f64 {
        self.holding.investment()
    }

    pub fn present_value(&self) -> f64 {
        self.quote.current_price * self.holding.quantity
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Primary,
    Secondary,
    Fallback,
}

/// Which source supplied each metric, for the whole batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceProvenance {
    pub price: Source,
    pub pe_ratio: Source,
    pub latest_earnings: Source,
}

impl SourceProvenance {
    pub fn all(source: Source) -> Self {
        Self {
            price: source,
            pe_ratio: source,
            latest_earnings: source,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub data: Vec<MergedRecord>,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub source: SourceProvenance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub total_investment: f64,
    pub total_present_value: f64,
    pub total_gain_loss: f64,
    pub gain_loss_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingShare {
    pub id: String,
    pub symbol: String,
    pub investment: f64,
    pub present_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
    pub portfolio_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorSummary {
    pub sector: String,
    pub total_investment: f64,
    pub total_present_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
}
