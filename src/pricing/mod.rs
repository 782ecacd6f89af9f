//! Product pricing subsystem.
//!
//! # Data Flow
//! ```text
//! price request for a product id
//!     → catalog.rs (product with stored price)
//!     → service.rs (breaker-guarded lookup)
//!     → client.rs (HTTP call to the price backend, with deadline)
//!     → live price, or the stored price on failure
//! ```

pub mod catalog;
pub mod client;
pub mod service;
pub mod types;

pub use catalog::Catalog;
pub use client::{HttpPriceClient, PriceClient, PriceClientError, PriceResult};
pub use service::{PriceService, PRICE_BREAKER};
pub use types::{Price, PriceError, PriceQuote, PriceSource, Product, ProductId};
