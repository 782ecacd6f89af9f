//! Remote price backend client.
//!
//! # Responsibilities
//! - Fetch the current price of a product from the price backend
//! - Enforce a deadline on every lookup
//! - Classify failures (transport, status, timeout, malformed body)
//!
//! # Wire Format
//! ```text
//! GET {base_url}/prices/{product_id}
//! 200 {"product_id": "sku-1", "price": "12.34"}
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::PriceClientConfig;
use crate::observability::metrics;
use crate::pricing::types::{Price, ProductId};
use crate::resilience::timeouts::{with_timeout, TimeoutError};

/// Errors that can occur while fetching a price.
#[derive(Debug, Error)]
pub enum PriceClientError {
    /// Connection or request failed before a response arrived.
    #[error("price backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Lookup exceeded its deadline.
    #[error("price backend {0}")]
    Timeout(#[from] TimeoutError),

    /// Backend answered with a non-success status.
    #[error("price backend returned status {status} for product {product_id}")]
    Status { status: u16, product_id: ProductId },

    /// Backend answered 2xx with a body we could not use.
    #[error("price backend sent an invalid body: {0}")]
    Decode(String),

    /// Base URL cannot carry path segments.
    #[error("price backend URL '{0}' cannot be used as a base")]
    InvalidBaseUrl(String),
}

/// Result type for price lookups.
pub type PriceResult<T> = Result<T, PriceClientError>;

/// Source of live product prices.
#[async_trait]
pub trait PriceClient: Send + Sync {
    async fn fetch_price(&self, product_id: &ProductId) -> PriceResult<Price>;
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    product_id: ProductId,
    price: Price,
}

/// HTTP client for the price backend.
#[derive(Debug, Clone)]
pub struct HttpPriceClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpPriceClient {
    /// Create a client from configuration.
    pub fn new(config: &PriceClientConfig) -> PriceResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|_| PriceClientError::InvalidBaseUrl(config.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(PriceClientError::InvalidBaseUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout(),
        })
    }

    /// URL of the price resource for `product_id`; the id is percent-encoded.
    pub fn price_url(&self, product_id: &ProductId) -> PriceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PriceClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("prices")
            .push(product_id.as_str());
        Ok(url)
    }

    async fn request(&self, product_id: &ProductId) -> PriceResult<Price> {
        let url = self.price_url(product_id)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceClientError::Status {
                status: status.as_u16(),
                product_id: product_id.clone(),
            });
        }

        let body = response.bytes().await?;
        let parsed: PriceResponse =
            serde_json::from_slice(&body).map_err(|e| PriceClientError::Decode(e.to_string()))?;

        if &parsed.product_id != product_id {
            return Err(PriceClientError::Decode(format!(
                "asked for product {} but got {}",
                product_id, parsed.product_id
            )));
        }

        Ok(parsed.price)
    }
}

#[async_trait]
impl PriceClient for HttpPriceClient {
    async fn fetch_price(&self, product_id: &ProductId) -> PriceResult<Price> {
        let start = Instant::now();
        let result = with_timeout(self.timeout, self.request(product_id)).await;

        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::record_price_lookup(outcome, start);
        if let Err(e) = &result {
            tracing::debug!(product_id = %product_id, error = %e, "Price lookup failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpPriceClient {
        HttpPriceClient::new(&PriceClientConfig {
            base_url: base_url.into(),
            timeout_ms: 100,
        })
        .unwrap()
    }

    #[test]
    fn test_price_url() {
        let id = ProductId::from("sku-1");
        assert_eq!(
            client("http://prices:9000").price_url(&id).unwrap().as_str(),
            "http://prices:9000/prices/sku-1"
        );
        assert_eq!(
            client("http://prices:9000/api/").price_url(&id).unwrap().as_str(),
            "http://prices:9000/api/prices/sku-1"
        );
    }

    #[test]
    fn test_price_url_encodes_id() {
        let id = ProductId::from("a/b c");
        assert_eq!(
            client("http://prices").price_url(&id).unwrap().as_str(),
            "http://prices/prices/a%2Fb%20c"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let err = HttpPriceClient::new(&PriceClientConfig {
            base_url: "mailto:prices@example.com".into(),
            timeout_ms: 100,
        })
        .unwrap_err();
        assert!(matches!(err, PriceClientError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_error_display() {
        let err = PriceClientError::Status {
            status: 503,
            product_id: ProductId::from("sku-1"),
        };
        assert_eq!(err.to_string(), "price backend returned status 503 for product sku-1");

        let err = PriceClientError::from(TimeoutError(Duration::from_millis(250)));
        assert_eq!(err.to_string(), "price backend timed out after 250ms");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr))
            .fetch_price(&ProductId::from("sku-1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PriceClientError::Transport(_) | PriceClientError::Timeout(_)
        ));
    }
}
