//! Request, mode and report types shared by validators, the aggregator and
//! the runtime engine.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evidence::EvidenceRecord;

/// Errors for requests that are rejected before any validator runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("Output text is empty")]
    EmptyOutput,

    #[error("Unknown validation mode: {0}")]
    UnknownMode(String),
}

/// Which validator set a request asks for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    Factual,
    LogicalConsistency,
    SourceAttribution,
    #[default]
    Comprehensive,
}

impl ValidationMode {
    /// All modes, in a stable order.
    pub const ALL: [ValidationMode; 4] = [
        ValidationMode::Factual,
        ValidationMode::LogicalConsistency,
        ValidationMode::SourceAttribution,
        ValidationMode::Comprehensive,
    ];

    /// Whether a validator with the given capability runs in this mode.
    ///
    /// | Mode | Runs |
    /// |------|------|
    /// | Factual | Factual |
    /// | LogicalConsistency | LogicalConsistency |
    /// | SourceAttribution | SourceAttribution |
    /// | Comprehensive | everything registered |
    pub fn includes(&self, capability: Capability) -> bool {
        match self {
            ValidationMode::Comprehensive => true,
            ValidationMode::Factual => capability == Capability::Factual,
            ValidationMode::LogicalConsistency => capability == Capability::LogicalConsistency,
            ValidationMode::SourceAttribution => capability == Capability::SourceAttribution,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Factual => "factual",
            ValidationMode::LogicalConsistency => "logical_consistency",
            ValidationMode::SourceAttribution => "source_attribution",
            ValidationMode::Comprehensive => "comprehensive",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationMode {
    type Err = InvalidRequest;

    /// Accepts both the canonical names and the short forms remote callers
    /// send (`logical`, `sources`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "factual" => Ok(ValidationMode::Factual),
            "logical" | "logical_consistency" => Ok(ValidationMode::LogicalConsistency),
            "sources" | "source_attribution" => Ok(ValidationMode::SourceAttribution),
            "comprehensive" => Ok(ValidationMode::Comprehensive),
            other => Err(InvalidRequest::UnknownMode(other.to_string())),
        }
    }
}

/// What a registered validator checks. Decides which modes dispatch it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Factual,
    LogicalConsistency,
    SourceAttribution,
    /// Extra checks that only run in comprehensive mode.
    Supplementary,
}

/// An output submitted for validation.
///
/// The output text is guaranteed non-empty; construct through
/// [`ValidationRequest::new`] or deserialize (which applies the same check).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "RawRequest")]
pub struct ValidationRequest {
    output: String,
    context: Option<String>,
    mode: ValidationMode,
}

#[derive(Deserialize)]
struct RawRequest {
    output: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    mode: ValidationMode,
}

impl TryFrom<RawRequest> for ValidationRequest {
    type Error = InvalidRequest;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        let request = ValidationRequest::new(raw.output, raw.mode)?;
        Ok(match raw.context {
            Some(context) => request.with_context(context),
            None => request,
        })
    }
}

impl ValidationRequest {
    pub fn new(output: impl Into<String>, mode: ValidationMode) -> Result<Self, InvalidRequest> {
        let output = output.into();
        if output.trim().is_empty() {
            return Err(InvalidRequest::EmptyOutput);
        }

        Ok(Self {
            output,
            context: None,
            mode,
        })
    }

    /// Attach supporting context. Blank context is treated as absent.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = if context.trim().is_empty() {
            None
        } else {
            Some(context)
        };
        self
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }
}

/// Discretized confidence band.
///
/// Ordered `Insufficient < Low < Medium < High`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    /// [0.00, 0.50)
    Insufficient,
    /// [0.50, 0.70)
    Low,
    /// [0.70, 0.90)
    Medium,
    /// [0.90, 1.00]
    High,
}

impl ConfidenceLevel {
    /// Band lookup. Lower edges are closed; non-finite scores are
    /// `Insufficient`.
    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            return ConfidenceLevel::Insufficient;
        }

        if score >= 0.90 {
            ConfidenceLevel::High
        } else if score >= 0.70 {
            ConfidenceLevel::Medium
        } else if score >= 0.50 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::Insufficient
        }
    }

    /// Whether this band counts as a passing verdict.
    pub fn is_valid(&self) -> bool {
        *self >= ConfidenceLevel::Low
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Insufficient => "INSUFFICIENT",
            ConfidenceLevel::Low => "LOW",
            ConfidenceLevel::Medium => "MEDIUM",
            ConfidenceLevel::High => "HIGH",
        }
    }

    /// Remediation hints for an output that landed in this band.
    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            ConfidenceLevel::Insufficient => &[
                "Consider adding more supporting evidence",
                "Review factual claims for accuracy",
                "Add proper citations and sources",
            ],
            ConfidenceLevel::Low => &[
                "Add more context or supporting information",
                "Consider adding uncertainty indicators",
            ],
            ConfidenceLevel::Medium => &[
                "Good validation score",
                "Consider minor improvements for higher confidence",
            ],
            ConfidenceLevel::High => &[
                "Excellent validation score",
                "Output meets high quality standards",
            ],
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a validator contributed no evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The validator declared it could not score the request.
    Abstained { reason: String },

    /// The validator returned an error or panicked.
    Failed { error: String },

    /// The validator exceeded its time budget.
    TimedOut { after_ms: u64 },
}

/// One entry per validator that is listed in `abstained_validators`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnostic {
    pub validator_id: String,

    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn abstained(validator_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            validator_id: validator_id.into(),
            kind: DiagnosticKind::Abstained {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(validator_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            validator_id: validator_id.into(),
            kind: DiagnosticKind::Failed {
                error: error.into(),
            },
        }
    }

    pub fn timed_out(validator_id: impl Into<String>, after: std::time::Duration) -> Self {
        Self {
            validator_id: validator_id.into(),
            kind: DiagnosticKind::TimedOut {
                after_ms: after.as_millis().min(u64::MAX as u128) as u64,
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self.kind, DiagnosticKind::Abstained { .. })
    }
}

/// A serialized report whose verdict contradicts its own score.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidReport {
    #[error("Confidence score {0} is outside [0, 1]")]
    ScoreOutOfRange(f64),

    #[error("Confidence level {level} does not match score {score}")]
    LevelMismatch { score: f64, level: ConfidenceLevel },

    #[error("is_valid = {0} contradicts the confidence level")]
    ValidityMismatch(bool),
}

/// The final, immutable answer for one validation request.
///
/// Deserializing re-derives the level and validity from the score and
/// rejects reports where they disagree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawReport")]
pub struct ValidationReport {
    pub(crate) confidence_score: f64,
    pub(crate) confidence_level: ConfidenceLevel,
    pub(crate) is_valid: bool,
    pub(crate) evidence: Vec<EvidenceRecord>,
    pub(crate) abstained_validators: BTreeSet<String>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) warnings: Vec<String>,
    pub(crate) mode: ValidationMode,
    pub(crate) quick: bool,
    pub(crate) capped: bool,
    pub(crate) validated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawReport {
    confidence_score: f64,
    confidence_level: ConfidenceLevel,
    is_valid: bool,
    evidence: Vec<EvidenceRecord>,
    abstained_validators: BTreeSet<String>,
    diagnostics: Vec<Diagnostic>,
    warnings: Vec<String>,
    mode: ValidationMode,
    quick: bool,
    capped: bool,
    validated_at: DateTime<Utc>,
}

impl TryFrom<RawReport> for ValidationReport {
    type Error = InvalidReport;

    fn try_from(raw: RawReport) -> Result<Self, Self::Error> {
        let score = raw.confidence_score;
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(InvalidReport::ScoreOutOfRange(score));
        }
        if ConfidenceLevel::from_score(score) != raw.confidence_level {
            return Err(InvalidReport::LevelMismatch {
                score,
                level: raw.confidence_level,
            });
        }
        if raw.confidence_level.is_valid() != raw.is_valid {
            return Err(InvalidReport::ValidityMismatch(raw.is_valid));
        }

        Ok(Self {
            confidence_score: score,
            confidence_level: raw.confidence_level,
            is_valid: raw.is_valid,
            evidence: raw.evidence,
            abstained_validators: raw.abstained_validators,
            diagnostics: raw.diagnostics,
            warnings: raw.warnings,
            mode: raw.mode,
            quick: raw.quick,
            capped: raw.capped,
            validated_at: raw.validated_at,
        })
    }
}

impl ValidationReport {
    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        self.confidence_level
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Records from validators that did not abstain, in invocation order.
    pub fn evidence(&self) -> &[EvidenceRecord] {
        &self.evidence
    }

    /// Ids of validators that abstained, failed or timed out.
    pub fn abstained_validators(&self) -> &BTreeSet<String> {
        &self.abstained_validators
    }

    /// Why each id in `abstained_validators` is there, in invocation order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Findings of all evidence, truncated to the configured limit.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Whether this report came from the reduced quick path.
    pub fn is_quick(&self) -> bool {
        self.quick
    }

    /// Whether the quick-path ceiling lowered the score.
    pub fn is_capped(&self) -> bool {
        self.capped
    }

    pub fn validated_at(&self) -> DateTime<Utc> {
        self.validated_at
    }

    /// Evidence from one validator, if it contributed any.
    pub fn evidence_for(&self, validator_id: &str) -> Option<&EvidenceRecord> {
        self.evidence
            .iter()
            .find(|record| record.validator_id() == validator_id)
    }

    /// Compact view of the verdict.
    pub fn summary(&self) -> ValidationSummary {
        ValidationSummary {
            is_valid: self.is_valid,
            confidence: self.confidence_level,
            score: self.confidence_score,
            warning_count: self.warnings.len(),
            mode: self.mode,
            validated_at: self.validated_at,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Compact verdict summary for callers that don't need the breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationSummary {
    pub is_valid: bool,
    pub confidence: ConfidenceLevel,
    pub score: f64,
    pub warning_count: usize,
    pub mode: ValidationMode,
    pub validated_at: DateTime<Utc>,
}
