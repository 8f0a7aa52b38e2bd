//! Adapter that lets the engine dispatch any core [`Validator`].

use std::sync::Arc;

use async_trait::async_trait;
use lithium_core::{Assessment, Capability, ValidationRequest, Validator};

use super::traits::panic_message;
use super::{AgentError, ValidatorAgent};

/// Wraps a synchronous, rule-based validator.
///
/// The validator runs on tokio's blocking pool so that the engine's timer
/// keeps running while it works. A validator that overruns its budget is
/// reported as timed out; its thread finishes in the background and the
/// result is dropped.
pub struct DeterministicAgent<V> {
    inner: Arc<V>,
}

impl<V: Validator + 'static> DeterministicAgent<V> {
    pub fn new(inner: V) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }
}

#[async_trait]
impl<V: Validator + 'static> ValidatorAgent for DeterministicAgent<V> {
    fn name(&self) -> &str {
        self.inner.id()
    }

    fn capability(&self) -> Capability {
        self.inner.capability()
    }

    async fn assess(&self, request: &ValidationRequest) -> Result<Assessment, AgentError> {
        let validator = Arc::clone(&self.inner);
        let request = request.clone();

        match tokio::task::spawn_blocking(move || validator.assess(&request)).await {
            Ok(result) => Ok(result?),
            Err(e) if e.is_panic() => Err(AgentError::Panicked(panic_message(e.into_panic().as_ref()))),
            Err(e) => Err(AgentError::Panicked(e.to_string())),
        }
    }
}
