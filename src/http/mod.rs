//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (request ID assigned, echoed on the response)
//!     → server.rs (trace span, timeout, routing)
//!     → price handler → pricing::PriceService
//!     → admin routes → resilience::BreakerRegistry
//! ```

pub mod request;
pub mod server;

pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
