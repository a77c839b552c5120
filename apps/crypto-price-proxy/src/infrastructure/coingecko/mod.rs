//! CoinGecko price source adapter.
//!
//! Implements `PriceSource` against CoinGecko's `simple/price` endpoint:
//!
//! ```text
//! GET {url}?ids=bitcoin,ethereum&vs_currencies=usd
//! ```

use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{PriceSource, PriceSourceError, QuoteRequest};
use crate::infrastructure::config::{ApiKey, UpstreamSettings};

/// Header carrying a CoinGecko demo-plan API key.
pub const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Longest error body kept in a `PriceSourceError::Status`.
const MAX_ERROR_BODY_LEN: usize = 512;

/// CoinGecko price source adapter.
#[derive(Debug)]
pub struct CoinGeckoClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<ApiKey>,
    timeout: Duration,
}

impl CoinGeckoClient {
    /// Create a new adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: &UpstreamSettings) -> Result<Self, PriceSourceError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("crypto-price-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PriceSourceError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: settings.url.clone(),
            api_key: settings.api_key.clone(),
            timeout: settings.timeout,
        })
    }

    /// Endpoint this adapter queries.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_error(&self, error: &reqwest::Error) -> PriceSourceError {
        if error.is_timeout() {
            PriceSourceError::Timeout(self.timeout)
        } else if error.is_connect() {
            PriceSourceError::Connect(error.to_string())
        } else {
            PriceSourceError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch(&self, request: &QuoteRequest) -> Result<Vec<u8>, PriceSourceError> {
        let mut builder = self.client.get(&self.url).query(&[
            ("ids", request.ids_param()),
            ("vs_currencies", request.vs_currencies_param()),
        ]);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key.expose());
        }

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY_LEN);
            return Err(PriceSourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| self.map_error(&e))
    }
}

fn truncate_at_char_boundary(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}
