//! Validator agent trait and common types.

use async_trait::async_trait;
use lithium_core::{Assessment, Capability, ValidationRequest, ValidatorError};
use std::any::Any;
use std::time::Duration;
use thiserror::Error;

/// Errors from validator agents.
///
/// The engine never propagates these to the caller; each one turns into a
/// diagnostic on the report.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Validator(#[from] ValidatorError),

    #[error("Knowledge source failed: {0}")]
    Knowledge(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Validator panicked: {0}")]
    Panicked(String),
}

/// Trait for everything the engine can dispatch.
///
/// # Isolation Contract
/// Each agent operates in isolation:
/// - No shared mutable state between agents
/// - No access to other agents' evidence during assessment
/// - The request is borrowed immutably and not retained
#[async_trait]
pub trait ValidatorAgent: Send + Sync {
    /// Name used when the agent is registered without an explicit id.
    fn name(&self) -> &str;

    /// The capability this agent provides; decides which modes run it.
    fn capability(&self) -> Capability;

    /// Assess a request, or abstain.
    async fn assess(&self, request: &ValidationRequest) -> Result<Assessment, AgentError>;

    /// Preferred time budget, if the agent has one. The registration's
    /// timeout wins when given explicitly.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
