//! Batched live quotes from a Yahoo-style `v7/finance/quote` endpoint.
//!
//! The endpoint wants a session cookie plus a matching crumb. Both are fetched
//! once per client and reused until the provider rejects them.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::PrimaryCfg;
use crate::error::QuoteError;
use crate::types::{PrimaryQuote, PrimarySymbol};

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Quotes for the identifiers the provider recognizes. Unknown identifiers are
    /// absent from the map; any failure of the call itself fails the whole batch.
    async fn fetch_quotes(
        &self,
        symbols: &[PrimarySymbol],
    ) -> Result<HashMap<PrimarySymbol, PrimaryQuote>, QuoteError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Option<OneOrMany<PrimaryQuote>>,
    #[serde(default)]
    error: Option<ProviderErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Single-symbol requests may come back as a bare object instead of an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(x) => vec![x],
        }
    }
}

#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

pub struct YahooQuoteClient {
    client: reqwest::Client,
    base_url: String,
    cookie_url: String,
    timeout_sec: u64,
    crumb: RwLock<Option<CrumbData>>,
}

impl YahooQuoteClient {
    pub fn new(cfg: &PrimaryCfg) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&cfg.user_agent)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(cfg.timeout_sec))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            cookie_url: cfg.cookie_url.clone(),
            timeout_sec: cfg.timeout_sec,
            crumb: RwLock::new(None),
        })
    }

    fn quote_url(&self) -> String {
        format!("{}/v7/finance/quote", self.base_url)
    }

    fn crumb_url(&self) -> String {
        format!("{}/v1/test/getcrumb", self.base_url)
    }

    fn map_send_error(&self, e: reqwest::Error) -> QuoteError {
        if e.is_timeout() {
            QuoteError::Timeout {
                secs: self.timeout_sec,
            }
        } else {
            QuoteError::Network(e)
        }
    }

    async fn ensure_crumb(&self) -> Result<CrumbData, QuoteError> {
        if let Some(c) = self.crumb.read().await.as_ref() {
            return Ok(c.clone());
        }
        let fresh = self.fetch_crumb().await?;
        *self.crumb.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    async fn fetch_crumb(&self) -> Result<CrumbData, QuoteError> {
        // the cookie endpoint answers 404 but still sets the session cookie
        let resp = self
            .client
            .get(&self.cookie_url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let cookie = resp
            .headers()
            .get(SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.split_once(';').map_or(s, |(v, _)| v).to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| QuoteError::Auth("no session cookie in response".to_string()))?;

        let resp = self
            .client
            .get(self.crumb_url())
            .header(COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(QuoteError::Auth(format!("crumb request returned HTTP {}", status.as_u16())));
        }
        let crumb = resp.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(QuoteError::Auth("unusable crumb".to_string()));
        }

        info!("Acquired primary provider session");
        Ok(CrumbData { cookie, crumb })
    }

    async fn clear_crumb(&self) {
        *self.crumb.write().await = None;
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteClient {
    async fn fetch_quotes(
        &self,
        symbols: &[PrimarySymbol],
    ) -> Result<HashMap<PrimarySymbol, PrimaryQuote>, QuoteError> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = symbols
            .iter()
            .map(|s| s.0.as_str())
            .filter(|s| seen.insert(*s))
            .collect();
        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let auth = self.ensure_crumb().await?;
        let joined = unique.join(",");
        debug!("Fetching {} primary quotes", unique.len());
        let resp = self
            .client
            .get(self.quote_url())
            .header(COOKIE, &auth.cookie)
            .query(&[("symbols", joined.as_str()), ("crumb", auth.crumb.as_str())])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            // session expired; the next cycle starts a new one
            self.clear_crumb().await;
        }
        if !status.is_success() {
            return Err(QuoteError::Status {
                status: status.as_u16(),
            });
        }

        let env: QuoteEnvelope = resp
            .json()
            .await
            .map_err(|e| QuoteError::Decode(e.to_string()))?;
        let quotes = match quotes_from_envelope(env) {
            Err(e @ QuoteError::Provider { .. }) => {
                self.clear_crumb().await;
                return Err(e);
            }
            other => other?,
        };
        if quotes.len() < unique.len() {
            warn!(
                "Primary provider answered {} of {} symbols",
                quotes.len(),
                unique.len()
            );
        }
        Ok(quotes)
    }
}

fn quotes_from_envelope(
    env: QuoteEnvelope,
) -> Result<HashMap<PrimarySymbol, PrimaryQuote>, QuoteError> {
    if let Some(err) = env.quote_response.error {
        return Err(QuoteError::Provider {
            code: err.code.unwrap_or_else(|| "unknown".to_string()),
            description: err.description.unwrap_or_default(),
        });
    }

    let list = env
        .quote_response
        .result
        .map(OneOrMany::into_vec)
        .unwrap_or_default();

    let mut out = HashMap::with_capacity(list.len());
    for q in list {
        if let Some(sym) = q.symbol.clone() {
            out.insert(PrimarySymbol(sym), q);
        }
    }
    Ok(out)
}
