//! Named circuit breakers.
//!
//! # Responsibilities
//! - Hold one breaker per backend name, created on first use
//! - Gate each downstream attempt through `admit`
//! - Report every breaker's state for the management endpoint
//!
//! # Design Decisions
//! - Sharded map (`DashMap`); a breaker's own lock is never taken while a
//!   shard guard is held
//! - Breakers share one configuration; names come from route policies

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::CircuitBreakerConfig;
use crate::resilience::circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitState, Permit};

#[derive(Debug)]
pub struct BreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Registry with breakers pre-created, so they show up in snapshots
    /// before the first call.
    pub fn with_breakers<I, S>(config: CircuitBreakerConfig, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new(config);
        for name in names {
            registry.get(&name.into());
        }
        registry
    }

    /// Breaker for `name`, created Closed if absent.
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return Arc::clone(existing.value());
        }
        let entry = self
            .breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.config.clone())));
        Arc::clone(entry.value())
    }

    /// Ask the named breaker for permission to make one call.
    pub fn admit(&self, name: &str) -> Option<Permit> {
        let breaker = self.get(name);
        breaker.try_acquire()
    }

    pub fn state(&self, name: &str) -> Option<CircuitState> {
        let breaker = self.breakers.get(name).map(|b| Arc::clone(b.value()))?;
        Some(breaker.state())
    }

    /// Snapshots of every breaker, sorted by name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let breakers: Vec<Arc<CircuitBreaker>> =
            self.breakers.iter().map(|b| Arc::clone(b.value())).collect();
        let mut snapshots: Vec<BreakerSnapshot> = breakers.iter().map(|b| b.snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CallOutcome;

    fn config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            wait_duration_ms: 60_000,
            ..CircuitBreakerConfig::default()
        }
    }

    #[test]
    fn test_breakers_are_independent() {
        let registry = BreakerRegistry::with_breakers(config(), ["live-lecture-service", "signaling-service"]);

        for _ in 0..5 {
            registry.admit("live-lecture-service").unwrap().record(CallOutcome::Failure);
        }

        assert_eq!(registry.state("live-lecture-service"), Some(CircuitState::Open));
        assert!(registry.admit("live-lecture-service").is_none());
        assert_eq!(registry.state("signaling-service"), Some(CircuitState::Closed));
        assert!(registry.admit("signaling-service").is_some());
    }

    #[test]
    fn test_same_name_same_breaker() {
        let registry = BreakerRegistry::new(config());
        let a = registry.get("recorded-lecture-service");
        let b = registry.get("recorded-lecture-service");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_breaker_has_no_state() {
        let registry = BreakerRegistry::new(config());
        assert!(registry.is_empty());
        assert_eq!(registry.state("missing"), None);
    }

    #[test]
    fn test_snapshots_sorted() {
        let registry = BreakerRegistry::with_breakers(config(), ["b", "a", "c"]);
        let names: Vec<String> = registry.snapshots().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
