use crate::data::Symbol;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const EXMO_TICKER_URL: &str = "https://api.exmo.com/v1.1/ticker";

/// Anything that can produce the current price of a symbol.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self, symbol: Symbol) -> Result<f64, FetchError>;
}

#[derive(Debug, Deserialize)]
struct TickerEntry {
    #[serde(default)]
    avg: Option<String>,
}

/// Price source backed by the Exmo public ticker.
pub struct ExmoSource {
    client: Client,
    url: String,
}

impl ExmoSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PriceSource for ExmoSource {
    async fn fetch(&self, symbol: Symbol) -> Result<f64, FetchError> {
        let res = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = res.text().await?;
        parse_ticker(&body, symbol)
    }
}

/// Pulls the average price of `symbol` out of a ticker body keyed by pair.
pub fn parse_ticker(body: &str, symbol: Symbol) -> Result<f64, FetchError> {
    let mut pairs: HashMap<String, TickerEntry> = serde_json::from_str(body)?;
    let entry = pairs
        .remove(symbol.pair())
        .ok_or_else(|| FetchError::MissingPair(symbol.pair().to_string()))?;

    let raw = entry.avg.unwrap_or_default();
    match raw.trim().parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(FetchError::BadPrice { symbol, raw }),
    }
}
