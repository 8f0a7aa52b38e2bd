//! Validators: one capability each.
//!
//! A validator inspects a [`ValidationRequest`] and either scores it or
//! abstains. Validators are stateless with respect to a request; they take
//! it by shared reference and keep nothing after returning.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evidence::{EvidenceBuilder, EvidenceError, EvidenceRecord};
use crate::types::{Capability, ValidationRequest};

mod attribution;
mod factual;
mod logical;
pub mod patterns;

pub use attribution::SourceAttributionValidator;
pub use factual::FactualValidator;
pub use logical::LogicalConsistencyValidator;

/// Errors a validator may raise. The engine isolates these per validator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidatorError {
    #[error("Validator failed: {0}")]
    Failed(String),

    #[error("Invalid evidence: {0}")]
    Evidence(#[from] EvidenceError),
}

/// The outcome of one assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assessment {
    Scored {
        score: f64,
        rationale: String,
        #[serde(default)]
        findings: Vec<String>,
    },

    /// The validator cannot meaningfully evaluate this request.
    Abstain { reason: String },
}

impl Assessment {
    pub fn scored(score: f64, rationale: impl Into<String>) -> Self {
        Assessment::Scored {
            score,
            rationale: rationale.into(),
            findings: Vec::new(),
        }
    }

    pub fn abstain(reason: impl Into<String>) -> Self {
        Assessment::Abstain {
            reason: reason.into(),
        }
    }

    /// Attach findings to a scored assessment. No-op for abstentions.
    pub fn with_findings(mut self, new_findings: Vec<String>) -> Self {
        if let Assessment::Scored { findings, .. } = &mut self {
            findings.extend(new_findings);
        }
        self
    }

    pub fn is_abstain(&self) -> bool {
        matches!(self, Assessment::Abstain { .. })
    }

    /// Seal into an immutable record under a registration's id and weight.
    pub fn into_record(
        self,
        validator_id: impl Into<String>,
        weight: f64,
    ) -> Result<EvidenceRecord, EvidenceError> {
        let builder = EvidenceBuilder::new(validator_id).weight(weight);
        match self {
            Assessment::Scored {
                score,
                rationale,
                findings,
            } => builder.rationale(rationale).findings(findings).score(score),
            Assessment::Abstain { reason } => builder.rationale(reason).abstain(),
        }
    }
}

/// Trait for all deterministic validators.
pub trait Validator: Send + Sync {
    /// Default registration id.
    fn id(&self) -> &'static str;

    /// What this validator checks.
    fn capability(&self) -> Capability;

    /// Assess a request.
    ///
    /// MUST NOT keep per-request state. Abstain rather than guess when the
    /// request has nothing this validator can evaluate.
    fn assess(&self, request: &ValidationRequest) -> Result<Assessment, ValidatorError>;
}

/// Clamp a heuristic score into `[0, 1]`.
pub(crate) fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 1.0)
}
