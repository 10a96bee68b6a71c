//! Breaker registry.
//!
//! # Responsibilities
//! - Build every configured breaker at startup
//! - Enforce one breaker per name
//! - Provide stats for all breakers to operator tooling
//!
//! # Design Decisions
//! - Owned by the composition root and injected, never global
//! - Stores clones; a breaker handed out shares state with the registry copy

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use crate::config::{ConfigError, ResilienceConfig};
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::dependency::DependencyBreaker;
use crate::resilience::state::BreakerStats;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("breaker '{0}' is already registered")]
    Duplicate(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// All breakers of the process, keyed by name.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: DashMap<String, CircuitBreaker>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the database wrapper and every named breaker from config.
    pub fn from_config(
        config: &ResilienceConfig,
    ) -> Result<(Self, DependencyBreaker), RegistryError> {
        let registry = Self::new();

        let database = DependencyBreaker::from_config(&config.database)?;
        registry.register(database.breaker().clone())?;

        for breaker_config in &config.breakers {
            registry.register(CircuitBreaker::new(breaker_config.clone())?)?;
        }

        tracing::info!(breakers = registry.len(), "Breaker registry initialized");
        Ok((registry, database))
    }

    /// Add a breaker. Fails if the name is taken.
    pub fn register(&self, breaker: CircuitBreaker) -> Result<(), RegistryError> {
        match self.breakers.entry(breaker.name().to_string()) {
            Entry::Occupied(entry) => Err(RegistryError::Duplicate(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(breaker);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<CircuitBreaker> {
        self.breakers.get(name).map(|entry| entry.value().clone())
    }

    /// Stats for every breaker, sorted by name.
    pub fn snapshot_all(&self) -> Vec<BreakerStats> {
        let mut stats: Vec<BreakerStats> = self
            .breakers
            .iter()
            .map(|entry| entry.value().stats())
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
