//! Product price service.
//!
//! Serves product prices fetched from a remote price backend. Lookups run
//! through a circuit breaker; when the backend fails or the breaker is open,
//! the product's stored price is served instead.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pricing;
pub mod resilience;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pricing::PriceService;
pub use resilience::{BreakerRegistry, CircuitBreaker};
