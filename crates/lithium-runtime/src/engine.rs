//! Validation engine: concurrent dispatch of registered validators.
//!
//! The engine implements:
//! - Mode resolution against the registry
//! - Parallel fan-out, one tokio task per validator in a `JoinSet`
//! - A time budget per validator via `tokio::time::timeout`
//! - Isolation of errors, timeouts and panics into report diagnostics
//! - Deterministic fan-in through the `Aggregator`, in registration order

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use lithium_core::{
    Aggregator, ConfigError, Diagnostic, EngineConfig, FactualValidator, InvalidRequest,
    LogicalConsistencyValidator, SourceAttributionValidator, ValidationMode, ValidationReport,
    ValidationRequest, ValidatorOutcome,
};
use thiserror::Error;
use tokio::task::JoinSet;

use crate::agents::{panic_message, AgentError, DeterministicAgent, ValidatorAgent};
use crate::registry::{Registration, RegistryError, ValidatorRegistry};

/// Errors a validation call can return to its caller.
///
/// Validator failures are not here: they end up in the report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] InvalidRequest),

    #[error("Validation cancelled")]
    Cancelled,
}

/// Builder for [`ValidationEngine`].
///
/// Set the config first: the default validators and any registration
/// without an explicit timeout read it.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    registry: ValidatorRegistry,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the built-in validators the config enables, with the
    /// config's weights.
    pub fn with_default_validators(mut self) -> Result<Self, RegistryError> {
        let timeout = self.config.default_timeout;
        let weights = self.config.weights.clone();

        if self.config.enable_factual {
            self.registry.register(
                "factual",
                Arc::new(DeterministicAgent::new(FactualValidator::new())),
                weights.factual,
                timeout,
            )?;
        }
        if self.config.enable_logical_consistency {
            self.registry.register(
                "logical_consistency",
                Arc::new(DeterministicAgent::new(LogicalConsistencyValidator::new())),
                weights.logical_consistency,
                timeout,
            )?;
        }
        if self.config.enable_source_attribution {
            self.registry.register(
                "source_attribution",
                Arc::new(DeterministicAgent::new(SourceAttributionValidator::new())),
                weights.source_attribution,
                timeout,
            )?;
        }

        Ok(self)
    }

    /// Register an agent under its own name with the default weight and
    /// its preferred (or the configured) timeout.
    pub fn validator(self, agent: Arc<dyn ValidatorAgent>) -> Result<Self, RegistryError> {
        let id = agent.name().to_string();
        self.register_validator(id, agent, None, None)
    }

    /// Register an agent.
    ///
    /// `weight` defaults to 1.0. `timeout` defaults to the agent's
    /// preferred timeout, then to the configured default.
    pub fn register_validator(
        mut self,
        id: impl Into<String>,
        agent: Arc<dyn ValidatorAgent>,
        weight: Option<f64>,
        timeout: Option<Duration>,
    ) -> Result<Self, RegistryError> {
        let timeout = timeout
            .or_else(|| agent.timeout())
            .unwrap_or(self.config.default_timeout);
        let weight = weight.unwrap_or(lithium_core::config::DEFAULT_WEIGHT);

        self.registry.register(id, agent, weight, timeout)?;
        Ok(self)
    }

    /// Freeze the registry into an engine.
    pub fn build(self) -> ValidationEngine {
        tracing::info!(
            validators = ?self.registry.ids(),
            default_timeout = ?self.config.default_timeout,
            "Validation engine ready"
        );

        ValidationEngine {
            registry: self.registry,
            config: self.config,
        }
    }
}

/// The validation engine.
///
/// Immutable once built. It is `Send + Sync`; share it behind an `Arc` to
/// serve concurrent requests.
#[derive(Debug)]
pub struct ValidationEngine {
    registry: ValidatorRegistry,
    config: EngineConfig,
}

impl ValidationEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// An engine with the built-in validators and default settings.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::from_config(EngineConfig::default())
    }

    /// An engine with the built-in validators `config` enables.
    pub fn from_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let builder = EngineBuilder::new()
            .config(config)
            .with_default_validators()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(builder.build())
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate a request with every validator its mode selects.
    pub async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationReport, ValidationError> {
        let registrations: Vec<Registration> =
            self.registry.select(request.mode()).cloned().collect();

        let aggregator = Aggregator::new().with_max_warnings(self.config.max_warnings);
        Ok(dispatch(request, registrations, &aggregator).await)
    }

    /// Validate, giving up as soon as `cancel` resolves.
    ///
    /// On cancellation the running validator tasks are aborted and no
    /// partial report is produced.
    pub async fn validate_until<F>(
        &self,
        request: &ValidationRequest,
        cancel: F,
    ) -> Result<ValidationReport, ValidationError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            report = self.validate(request) => report,
            _ = cancel => {
                tracing::debug!(mode = %request.mode(), "Validation cancelled");
                Err(ValidationError::Cancelled)
            }
        }
    }

    /// Fast screening with the logical-consistency validators only.
    ///
    /// `topic_hint` is used as context. The score is capped below the HIGH
    /// band; a quick report never claims high confidence.
    pub async fn quick_validate(
        &self,
        output: &str,
        topic_hint: Option<&str>,
    ) -> Result<ValidationReport, ValidationError> {
        let mut request = ValidationRequest::new(output, ValidationMode::LogicalConsistency)?;
        if let Some(hint) = topic_hint {
            request = request.with_context(hint);
        }

        let registrations: Vec<Registration> = self.registry.select_quick().cloned().collect();

        let aggregator = Aggregator::quick().with_max_warnings(self.config.max_warnings);
        Ok(dispatch(&request, registrations, &aggregator).await)
    }

    /// Whether `output` passes the quick path.
    pub async fn quick_check(&self, output: &str) -> Result<bool, ValidationError> {
        Ok(self.quick_validate(output, None).await?.is_valid())
    }

    /// Confidence score of the quick path.
    pub async fn confidence_score(&self, output: &str) -> Result<f64, ValidationError> {
        Ok(self.quick_validate(output, None).await?.confidence_score())
    }

    /// Validate from raw boundary input, parsing the mode string.
    pub async fn validate_text(
        &self,
        output: &str,
        context: Option<&str>,
        mode: &str,
    ) -> Result<ValidationReport, ValidationError> {
        let mode: ValidationMode = mode.parse()?;
        let mut request = ValidationRequest::new(output, mode)?;
        if let Some(context) = context {
            request = request.with_context(context);
        }

        self.validate(&request).await
    }

    /// Validate many outputs concurrently.
    ///
    /// Results keep input order. An invalid output fails only its own slot.
    pub async fn batch_validate<I, S>(
        &self,
        outputs: I,
        mode: ValidationMode,
    ) -> Vec<Result<ValidationReport, ValidationError>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requests: Vec<Result<ValidationRequest, InvalidRequest>> = outputs
            .into_iter()
            .map(|output| ValidationRequest::new(output, mode))
            .collect();

        tracing::debug!(count = requests.len(), mode = %mode, "Batch validation");

        join_all(requests.iter().map(|request| async move {
            match request {
                Ok(request) => self.validate(request).await,
                Err(e) => Err(ValidationError::InvalidRequest(e.clone())),
            }
        }))
        .await
    }
}

/// Fan out to `registrations`, wait for all of them and aggregate.
///
/// Dropping the returned future drops the `JoinSet`, which aborts every
/// task still running.
async fn dispatch(
    request: &ValidationRequest,
    registrations: Vec<Registration>,
    aggregator: &Aggregator,
) -> ValidationReport {
    if registrations.is_empty() {
        tracing::debug!(mode = %request.mode(), "No validators selected");
    }

    let shared = Arc::new(request.clone());
    let mut tasks = JoinSet::new();

    for (index, registration) in registrations.iter().cloned().enumerate() {
        let request = Arc::clone(&shared);
        tasks.spawn(async move {
            let outcome = run_validator(&registration, &request).await;
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<ValidatorOutcome>> = vec![None; registrations.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(e) => tracing::warn!(error = %e, "Validator task did not complete"),
        }
    }

    // Fan-in in registration order
    let outcomes = slots
        .into_iter()
        .zip(&registrations)
        .map(|(slot, registration)| {
            slot.unwrap_or_else(|| {
                ValidatorOutcome::Failed(Diagnostic::failed(
                    registration.id(),
                    "validator task did not complete",
                ))
            })
        })
        .collect();

    aggregator.aggregate(request.mode(), outcomes)
}

/// Run one validator under its time budget and seal the result.
async fn run_validator(registration: &Registration, request: &ValidationRequest) -> ValidatorOutcome {
    let id = registration.id();
    let timeout = registration.timeout();

    let assess = AssertUnwindSafe(registration.agent().assess(request)).catch_unwind();

    let result = match tokio::time::timeout(timeout, assess).await {
        Ok(Ok(result)) => result,
        Ok(Err(panic)) => Err(AgentError::Panicked(panic_message(panic.as_ref()))),
        Err(_) => Err(AgentError::Timeout(timeout)),
    };

    let record = result.and_then(|assessment| {
        assessment
            .into_record(id, registration.weight())
            .map_err(|e| AgentError::Validator(e.into()))
    });

    match record {
        Ok(record) => {
            if record.abstained() {
                tracing::debug!(validator = id, reason = record.rationale(), "Validator abstained");
            }
            ValidatorOutcome::Evidence(record)
        }
        Err(AgentError::Timeout(after)) => {
            tracing::warn!(validator = id, timeout = ?after, "Validator timed out");
            ValidatorOutcome::Failed(Diagnostic::timed_out(id, after))
        }
        Err(e) => {
            tracing::warn!(validator = id, error = %e, "Validator failed");
            ValidatorOutcome::Failed(Diagnostic::failed(id, e.to_string()))
        }
    }
}
