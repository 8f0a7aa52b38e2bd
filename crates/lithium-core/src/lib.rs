//! # lithium-core
//!
//! Deterministic validation of AI-generated text.
//!
//! This crate provides the core validation logic for Lithium:
//! - Validators that each score one correctness signal (factual
//!   assertions, logical consistency, source attribution) or abstain
//! - Evidence records carrying a validator's score, weight and rationale
//! - The aggregator that reduces evidence to one confidence verdict
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No I/O**: All validators here are rule-based
//! 3. **Abstention is not failure**: a validator with nothing to check
//!    stays out of the weighted mean
//! 4. **Bounded**: Scores are always in `[0, 1]`
//!
//! ## Example
//!
//! ```rust,ignore
//! use lithium_core::{validate, ValidationMode, ValidationRequest};
//!
//! let request = ValidationRequest::new("Paris is the capital of France.", ValidationMode::Comprehensive)?;
//! let report = validate(&request);
//!
//! println!("{} ({:.2})", report.confidence_level(), report.confidence_score());
//! ```
//!
//! The concurrent engine with timeouts, custom validators and the quick
//! path lives in `lithium-runtime`.

pub mod aggregator;
pub mod config;
pub mod evidence;
pub mod types;
pub mod validators;

// Re-export main types at crate root
pub use aggregator::{Aggregator, ValidatorOutcome, Verdict, QUICK_SCORE_CEILING};
pub use config::{CacheConfig, ConfigError, EngineConfig, WeightConfig};
pub use evidence::{EvidenceBuilder, EvidenceError, EvidenceRecord};
pub use types::{
    Capability, ConfidenceLevel, Diagnostic, DiagnosticKind, InvalidReport, InvalidRequest,
    ValidationMode, ValidationReport, ValidationRequest, ValidationSummary,
};
pub use validators::{
    patterns::Claim, Assessment, FactualValidator, LogicalConsistencyValidator,
    SourceAttributionValidator, Validator, ValidatorError,
};

/// Validate a request with the built-in validators and default weights.
///
/// Runs sequentially in the current thread. Use `lithium-runtime` for
/// concurrent dispatch with time budgets.
pub fn validate(request: &ValidationRequest) -> ValidationReport {
    validate_with_config(request, &EngineConfig::default())
}

/// Validate with the built-in validators enabled and weighted by `config`.
pub fn validate_with_config(request: &ValidationRequest, config: &EngineConfig) -> ValidationReport {
    let builtins: [(bool, f64, Box<dyn Validator>); 3] = [
        (
            config.enable_factual,
            config.weights.factual,
            Box::new(FactualValidator::new()),
        ),
        (
            config.enable_logical_consistency,
            config.weights.logical_consistency,
            Box::new(LogicalConsistencyValidator::new()),
        ),
        (
            config.enable_source_attribution,
            config.weights.source_attribution,
            Box::new(SourceAttributionValidator::new()),
        ),
    ];

    let outcomes = builtins
        .iter()
        .filter(|(enabled, _, validator)| *enabled && request.mode().includes(validator.capability()))
        .map(|(_, weight, validator)| run_validator(validator.as_ref(), *weight, request))
        .collect();

    Aggregator::new()
        .with_max_warnings(config.max_warnings)
        .aggregate(request.mode(), outcomes)
}

/// Run one validator and fold any error into a failure outcome.
fn run_validator(validator: &dyn Validator, weight: f64, request: &ValidationRequest) -> ValidatorOutcome {
    let result = validator
        .assess(request)
        .and_then(|assessment| Ok(assessment.into_record(validator.id(), weight)?));

    match result {
        Ok(record) => ValidatorOutcome::Evidence(record),
        Err(e) => {
            tracing::warn!(validator = validator.id(), error = %e, "Validator failed");
            ValidatorOutcome::Failed(Diagnostic::failed(validator.id(), e.to_string()))
        }
    }
}
