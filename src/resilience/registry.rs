//! Named circuit breaker registry.
//!
//! # Responsibilities
//! - Own one breaker per protected operation name for the process lifetime
//! - Hand out shared references to injected components
//! - Summarize and reset breakers for the admin API
//!
//! # Design Decisions
//! - Created by the service root and injected, never a global
//! - Get-or-create is atomic per name (DashMap entry)

use std::sync::Arc;

use dashmap::DashMap;

use crate::resilience::circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig};

#[derive(Debug, Default)]
pub struct BreakerRegistry {
    default_config: CircuitBreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        Self {
            default_config,
            breakers: DashMap::new(),
        }
    }

    /// Breaker for `name`, created with the registry's default config on first use.
    pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breaker_with_config(name, &self.default_config)
    }

    /// Breaker for `name`, created with `config` on first use. An existing breaker
    /// keeps the config it was created with.
    pub fn breaker_with_config(&self, name: &str, config: &CircuitBreakerConfig) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return existing.value().clone();
        }

        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(breaker = %name, "Registering circuit breaker");
                Arc::new(CircuitBreaker::new(name, config.clone()))
            })
            .value()
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|r| r.value().clone())
    }

    /// Snapshots of every registered breaker, sorted by name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let breakers: Vec<Arc<CircuitBreaker>> =
            self.breakers.iter().map(|r| r.value().clone()).collect();
        let mut snapshots: Vec<_> = breakers.iter().map(|b| b.snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    /// Reset the named breaker. Returns false if no such breaker exists.
    pub fn reset(&self, name: &str) -> bool {
        match self.get(name) {
            Some(breaker) => {
                breaker.reset();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
