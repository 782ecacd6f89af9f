//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds, timeouts, window sizes)
//! - Check addresses and URLs parse
//! - Detect duplicate product identifiers
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{CircuitBreakerConfig, ServiceConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("listener.request_timeout_secs must be greater than zero")]
    RequestTimeout,

    #[error("price_client.base_url '{0}' is not an absolute http(s) URL")]
    BaseUrl(String),

    #[error("price_client.timeout_ms must be greater than zero")]
    ClientTimeout,

    #[error("circuit_breaker.failure_rate_threshold {0} must be within (0, 1]")]
    FailureRate(f64),

    #[error("circuit_breaker.sliding_window_size must be greater than zero")]
    WindowSize,

    #[error("circuit_breaker.minimum_calls {minimum} exceeds sliding_window_size {window}")]
    MinimumCalls { minimum: usize, window: usize },

    #[error("circuit_breaker.open_duration_secs must be greater than zero")]
    OpenDuration,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("product '{0}' is defined more than once")]
    DuplicateProduct(String),
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    match Url::parse(&config.price_client.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => {}
        _ => errors.push(ValidationError::BaseUrl(config.price_client.base_url.clone())),
    }
    if config.price_client.timeout_ms == 0 {
        errors.push(ValidationError::ClientTimeout);
    }

    errors.extend(validate_breaker(&config.circuit_breaker));

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for product in &config.products {
        if !seen.insert(product.id.as_str()) {
            errors.push(ValidationError::DuplicateProduct(product.id.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Range checks for a single breaker configuration.
pub fn validate_breaker(config: &CircuitBreakerConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let rate = config.failure_rate_threshold;
    if !(rate > 0.0 && rate <= 1.0) {
        errors.push(ValidationError::FailureRate(rate));
    }
    if config.sliding_window_size == 0 {
        errors.push(ValidationError::WindowSize);
    } else if config.minimum_calls > config.sliding_window_size {
        errors.push(ValidationError::MinimumCalls {
            minimum: config.minimum_calls,
            window: config.sliding_window_size,
        });
    }
    if config.open_duration_secs == 0 {
        errors.push(ValidationError::OpenDuration);
    }

    errors
}
