//! Best-effort P/E and earnings from a public quote page.
//!
//! The page is plain HTML with no stable API, so extraction is a list of
//! patterns tried in order. Anything that does not match yields `None`.

use async_trait::async_trait;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::SecondaryCfg;
use crate::error::ScrapeError;
use crate::types::{ScrapedFields, SecondarySymbol};
use crate::utils::{parse_grouped_number, round2};

static PRICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"(?i)data-last-price="([\d,.]+)""#).unwrap(),
        Regex::new(r"₹([\d,]+(?:\.\d+)?)").unwrap(),
    ]
});

static PE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"(?i)P/E ratio</div>[^<]*<div[^>]*>[^<]*</div>[^<]*<div[^>]*>([\d,.]+)</div>",
        )
        .unwrap(),
        Regex::new(r"(?is)P/E ratio.{0,500}?(\d+\.\d+)").unwrap(),
    ]
});

/// First capture of the first pattern whose value passes `accept`.
fn first_match(html: &str, patterns: &[Regex], accept: impl Fn(f64) -> bool) -> Option<f64> {
    patterns.iter().find_map(|re| {
        let c = re.captures(html)?;
        let v = parse_grouped_number(c.get(1)?.as_str())?;
        accept(v).then_some(v)
    })
}

pub fn extract_price(html: &str) -> Option<f64> {
    first_match(html, &PRICE_PATTERNS, |v| v > 0.0)
}

pub fn extract_pe_ratio(html: &str) -> Option<f64> {
    first_match(html, &PE_PATTERNS, |v| v > 0.0 && v < 1000.0)
}

/// Earnings per share implied by price and P/E.
pub fn derive_earnings(price: Option<f64>, pe: Option<f64>) -> Option<f64> {
    match (price, pe) {
        (Some(p), Some(pe)) if pe > 0.0 => Some(round2(p / pe)),
        _ => None,
    }
}

pub fn parse_page(html: &str) -> ScrapedFields {
    let pe_ratio = extract_pe_ratio(html);
    let price = extract_price(html);
    ScrapedFields {
        pe_ratio,
        latest_earnings: derive_earnings(price, pe_ratio),
    }
}

#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    /// Never fails: a page that cannot be fetched or parsed gives empty fields.
    async fn fetch_fundamentals(&self, symbol: &SecondarySymbol) -> ScrapedFields;

    /// One request per symbol, all in flight together. A page that takes longer
    /// than `page_timeout` gives empty fields without holding up the others.
    async fn fetch_all(
        &self,
        symbols: &[SecondarySymbol],
        page_timeout: Duration,
    ) -> HashMap<SecondarySymbol, ScrapedFields> {
        let results = join_all(symbols.iter().map(|s| async move {
            let fields = match tokio::time::timeout(page_timeout, self.fetch_fundamentals(s)).await {
                Ok(f) => f,
                Err(_) => {
                    debug!("Scrape for {} timed out after {:?}", s, page_timeout);
                    ScrapedFields::default()
                }
            };
            (s.clone(), fields)
        }))
        .await;
        results.into_iter().collect()
    }
}

pub struct GoogleFinanceScraper {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleFinanceScraper {
    pub fn new(cfg: &SecondaryCfg) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&cfg.user_agent)?);
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&cfg.accept_language)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(cfg.timeout_sec))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn page_url(&self, symbol: &SecondarySymbol) -> String {
        format!("{}/quote/{}", self.base_url, symbol.0)
    }

    async fn fetch_page(&self, symbol: &SecondarySymbol) -> Result<String, ScrapeError> {
        let resp = self.client.get(self.page_url(symbol)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl FundamentalsSource for GoogleFinanceScraper {
    async fn fetch_fundamentals(&self, symbol: &SecondarySymbol) -> ScrapedFields {
        match self.fetch_page(symbol).await {
            Ok(html) => {
                let fields = parse_page(&html);
                if fields.pe_ratio.is_none() {
                    debug!("No P/E found on page for {}", symbol);
                }
                fields
            }
            Err(e) => {
                debug!("Scrape failed for {}: {}", symbol, e);
                ScrapedFields::default()
            }
        }
    }
}
