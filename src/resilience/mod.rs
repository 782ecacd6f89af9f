//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a remote dependency:
//!     → registry.rs (look up the breaker for the operation name)
//!     → circuit_breaker.rs (admit, short-circuit or probe; record outcome)
//!     → timeouts.rs (the operation itself carries its deadline)
//!     → On error: fallback.rs (substitute a value, count the reason)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every remote call has a deadline
//! - Circuit breaker prevents cascading failures and wasted latency
//! - Short-circuits are a distinct error from operation failures

pub mod circuit_breaker;
pub mod fallback;
pub mod registry;
pub mod timeouts;

pub use circuit_breaker::{BreakerError, BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use fallback::FallbackReason;
pub use registry::BreakerRegistry;
pub use timeouts::{with_timeout, TimeoutError};
