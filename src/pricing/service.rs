//! Price lookup with circuit breaker protection.
//!
//! The live price comes from the price backend through the `get_price` breaker.
//! When the lookup fails, or the breaker refuses to attempt it, the product's
//! stored price is served instead, so a lookup never fails.

use std::sync::Arc;

use crate::pricing::catalog::Catalog;
use crate::pricing::client::PriceClient;
use crate::pricing::types::{Price, PriceQuote, PriceSource, Product, ProductId};
use crate::resilience::{BreakerRegistry, CircuitBreaker};

/// Name of the breaker guarding remote price lookups.
pub const PRICE_BREAKER: &str = "get_price";

#[derive(Clone)]
pub struct PriceService {
    client: Arc<dyn PriceClient>,
    breaker: Arc<CircuitBreaker>,
    catalog: Catalog,
}

impl PriceService {
    pub fn new(client: Arc<dyn PriceClient>, breakers: &BreakerRegistry, catalog: Catalog) -> Self {
        Self {
            client,
            breaker: breakers.breaker(PRICE_BREAKER),
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Current price of `product`, falling back to its stored price.
    pub async fn price_for_product(&self, product: &Product) -> Price {
        self.quote(product).await.price
    }

    /// Price of `product` along with where it came from.
    pub async fn quote(&self, product: &Product) -> PriceQuote {
        let client = &self.client;
        self.breaker
            .fallback_on_failure(
                || async {
                    client.fetch_price(&product.id).await.map(|price| PriceQuote {
                        product_id: product.id.clone(),
                        price,
                        source: PriceSource::Live,
                    })
                },
                |err| {
                    tracing::info!(
                        product_id = %product.id,
                        error = %err,
                        short_circuited = err.is_open(),
                        fallback_price = %product.price,
                        "Price lookup failed, serving stored product price"
                    );
                    PriceQuote {
                        product_id: product.id.clone(),
                        price: product.price,
                        source: PriceSource::Fallback,
                    }
                },
            )
            .await
    }

    /// Quote for a catalog product; `None` if the product is unknown.
    pub async fn quote_by_id(&self, id: &ProductId) -> Option<PriceQuote> {
        let product = self.catalog.get(id)?;
        Some(self.quote(&product).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::config::CircuitBreakerConfig;
    use crate::pricing::client::{PriceClientError, PriceResult};
    use crate::resilience::CircuitState;

    /// Client answering from a script; counts invocations.
    struct ScriptedClient {
        calls: AtomicU32,
        healthy_after: u32,
    }

    impl ScriptedClient {
        fn failing() -> Self {
            Self {
                calls: AtomicU32::new(0),
                healthy_after: u32::MAX,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceClient for ScriptedClient {
        async fn fetch_price(&self, product_id: &ProductId) -> PriceResult<Price> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.healthy_after {
                Ok(Price::from_cents(999))
            } else {
                Err(PriceClientError::Status {
                    status: 503,
                    product_id: product_id.clone(),
                })
            }
        }
    }

    fn product() -> Product {
        Product {
            id: ProductId::from("sku-1"),
            name: "Keyboard".into(),
            price: Price::from_cents(4990),
        }
    }

    fn service(client: Arc<ScriptedClient>, config: CircuitBreakerConfig) -> PriceService {
        let registry = BreakerRegistry::new(config);
        PriceService::new(client, &registry, Catalog::from_products(vec![product()]))
    }

    #[tokio::test]
    async fn test_live_price() {
        let client = Arc::new(ScriptedClient {
            calls: AtomicU32::new(0),
            healthy_after: 0,
        });
        let service = service(client.clone(), CircuitBreakerConfig::default());

        let quote = service.quote(&product()).await;
        assert_eq!(quote.price, Price::from_cents(999));
        assert_eq!(quote.source, PriceSource::Live);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_breaker_scenario() {
        // Threshold 3% evaluated from the first call: one failure opens the breaker.
        let client = Arc::new(ScriptedClient::failing());
        let service = service(client.clone(), CircuitBreakerConfig::default());

        for _ in 0..3 {
            assert_eq!(service.price_for_product(&product()).await, Price::from_cents(4990));
        }
        assert_eq!(client.calls(), 1);
        assert_eq!(service.breaker().state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(44)).await;
        assert_eq!(service.price_for_product(&product()).await, Price::from_cents(4990));
        assert_eq!(client.calls(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(service.price_for_product(&product()).await, Price::from_cents(4990));
        assert_eq!(client.calls(), 2);
        assert_eq!(service.breaker().state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_then_probe() {
        let client = Arc::new(ScriptedClient {
            calls: AtomicU32::new(0),
            healthy_after: 3,
        });
        let config = CircuitBreakerConfig {
            failure_rate_threshold: 1.0,
            minimum_calls: 3,
            sliding_window_size: 3,
            open_duration_secs: 45,
        };
        let service = service(client.clone(), config);

        for _ in 0..3 {
            let quote = service.quote(&product()).await;
            assert_eq!(quote.source, PriceSource::Fallback);
        }
        assert_eq!(client.calls(), 3);
        assert_eq!(service.breaker().state(), CircuitState::Open);

        let quote = service.quote(&product()).await;
        assert_eq!(quote.price, Price::from_cents(4990));
        assert_eq!(client.calls(), 3);

        tokio::time::advance(Duration::from_secs(45)).await;
        let quote = service.quote(&product()).await;
        assert_eq!(quote.source, PriceSource::Live);
        assert_eq!(quote.price, Price::from_cents(999));
        assert_eq!(client.calls(), 4);
        assert_eq!(service.breaker().state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_quote_by_id() {
        let client = Arc::new(ScriptedClient::failing());
        let service = service(client, CircuitBreakerConfig::default());

        let quote = service.quote_by_id(&ProductId::from("sku-1")).await.unwrap();
        assert_eq!(quote.source, PriceSource::Fallback);
        assert!(service.quote_by_id(&ProductId::from("unknown")).await.is_none());
    }
}
