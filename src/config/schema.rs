//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the price service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pricing::Product;

/// Root configuration for the price service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Remote price backend settings.
    pub price_client: PriceClientConfig,

    /// Circuit breaker guarding the remote price lookup.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    /// Products known to the catalog, with their stored prices.
    pub products: Vec<Product>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time allowed to answer one request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Remote price backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PriceClientConfig {
    /// Base URL of the price backend (e.g., "http://127.0.0.1:9000").
    pub base_url: String,

    /// Deadline for a single price lookup in milliseconds.
    pub timeout_ms: u64,
}

impl PriceClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PriceClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9000".to_string(),
            timeout_ms: 2000,
        }
    }
}

/// Circuit breaker configuration.
///
/// Defaults match the production price lookup: any failure rate of 3% or more
/// opens the breaker, evaluated from the very first call, for 45 seconds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Fraction of failed calls (0.0 exclusive to 1.0 inclusive) that opens the breaker.
    pub failure_rate_threshold: f64,

    /// Calls that must be recorded before the failure rate is evaluated.
    pub minimum_calls: usize,

    /// Number of most recent outcomes kept for the failure rate.
    pub sliding_window_size: usize,

    /// Seconds the breaker stays open before admitting a probe.
    pub open_duration_secs: u64,
}

impl CircuitBreakerConfig {
    pub fn open_duration(&self) -> Duration {
        Duration::from_secs(self.open_duration_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.03,
            minimum_calls: 0,
            sliding_window_size: 100,
            open_duration_secs: 45,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token required by the admin routes. Unset leaves them open.
    pub api_key: Option<String>,
}
