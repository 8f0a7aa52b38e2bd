//! Validator registry.
//!
//! Registrations are keyed by id and kept in registration order, which is
//! also the order the engine invokes them in and aggregates their evidence.
//!
//! ## Usage
//!
//! ```ignore
//! let mut registry = ValidatorRegistry::new();
//! registry.register("fact_check", Arc::new(agent), 2.0, Duration::from_secs(3))?;
//!
//! for registration in registry.select(ValidationMode::Factual) {
//!     // ...
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use lithium_core::evidence::check_weight;
use lithium_core::{Capability, ValidationMode};
use thiserror::Error;

use crate::agents::ValidatorAgent;

/// Errors from building a registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Validator '{0}' is already registered")]
    DuplicateValidator(String),

    #[error("Invalid weight {weight} for validator '{id}': must be finite and positive")]
    InvalidWeight { id: String, weight: f64 },

    #[error("Validator '{0}' has a zero timeout")]
    ZeroTimeout(String),
}

/// One registered validator.
#[derive(Clone)]
pub struct Registration {
    id: String,
    weight: f64,
    timeout: Duration,
    agent: Arc<dyn ValidatorAgent>,
}

impl Registration {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn capability(&self) -> Capability {
        self.agent.capability()
    }

    pub fn agent(&self) -> &Arc<dyn ValidatorAgent> {
        &self.agent
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("capability", &self.capability())
            .field("weight", &self.weight)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Append-only set of validators.
#[derive(Default, Clone, Debug)]
pub struct ValidatorRegistry {
    registrations: Vec<Registration>,
}

impl ValidatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under `id`.
    ///
    /// Ids are unique. The weight must be finite and positive and the
    /// timeout non-zero.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        agent: Arc<dyn ValidatorAgent>,
        weight: f64,
        timeout: Duration,
    ) -> Result<(), RegistryError> {
        let id = id.into();

        if self.contains(&id) {
            return Err(RegistryError::DuplicateValidator(id));
        }
        if check_weight(weight).is_err() {
            return Err(RegistryError::InvalidWeight { id, weight });
        }
        if timeout.is_zero() {
            return Err(RegistryError::ZeroTimeout(id));
        }

        tracing::debug!(
            validator = %id,
            capability = ?agent.capability(),
            weight,
            timeout = ?timeout,
            "Registered validator"
        );

        self.registrations.push(Registration {
            id,
            weight,
            timeout,
            agent,
        });
        Ok(())
    }

    /// Registrations a mode runs, in registration order.
    pub fn select(&self, mode: ValidationMode) -> impl Iterator<Item = &Registration> {
        self.registrations
            .iter()
            .filter(move |r| mode.includes(r.capability()))
    }

    /// Registrations the quick path runs.
    pub fn select_quick(&self) -> impl Iterator<Item = &Registration> {
        self.registrations
            .iter()
            .filter(|r| r.capability() == Capability::LogicalConsistency)
    }

    pub fn get(&self, id: &str) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
