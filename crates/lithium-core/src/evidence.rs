//! Evidence records: one validator's opinion about one request.
//!
//! A record is either scored (a value in `[0, 1]`) or abstained. Records
//! are immutable once built; constructors reject scores outside `[0, 1]`,
//! non-finite values and non-positive weights.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from building an evidence record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvidenceError {
    #[error("Score {0} is outside [0, 1]")]
    ScoreOutOfRange(f64),

    #[error("Weight {0} must be finite and greater than zero")]
    InvalidWeight(f64),
}

/// Check a weight without building a record.
pub fn check_weight(weight: f64) -> Result<f64, EvidenceError> {
    if weight.is_finite() && weight > 0.0 {
        Ok(weight)
    } else {
        Err(EvidenceError::InvalidWeight(weight))
    }
}

fn check_score(score: f64) -> Result<f64, EvidenceError> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(EvidenceError::ScoreOutOfRange(score))
    }
}

/// A single validator's contribution to a report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawEvidence")]
pub struct EvidenceRecord {
    validator_id: String,
    score: f64,
    abstained: bool,
    rationale: String,
    weight: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    findings: Vec<String>,
}

#[derive(Deserialize)]
struct RawEvidence {
    validator_id: String,
    score: f64,
    abstained: bool,
    rationale: String,
    weight: f64,
    #[serde(default)]
    findings: Vec<String>,
}

impl TryFrom<RawEvidence> for EvidenceRecord {
    type Error = EvidenceError;

    fn try_from(raw: RawEvidence) -> Result<Self, Self::Error> {
        let builder = EvidenceBuilder::new(raw.validator_id)
            .weight(raw.weight)
            .rationale(raw.rationale)
            .findings(raw.findings);

        if raw.abstained {
            builder.abstain()
        } else {
            builder.score(raw.score)
        }
    }
}

impl EvidenceRecord {
    /// A scored record.
    pub fn scored(
        validator_id: impl Into<String>,
        score: f64,
        weight: f64,
        rationale: impl Into<String>,
    ) -> Result<Self, EvidenceError> {
        EvidenceBuilder::new(validator_id)
            .weight(weight)
            .rationale(rationale)
            .score(score)
    }

    /// An abstention. The score is stored as 0.0 and never read.
    pub fn abstention(
        validator_id: impl Into<String>,
        weight: f64,
        reason: impl Into<String>,
    ) -> Result<Self, EvidenceError> {
        EvidenceBuilder::new(validator_id)
            .weight(weight)
            .rationale(reason)
            .abstain()
    }

    pub fn validator_id(&self) -> &str {
        &self.validator_id
    }

    /// Meaningless when `abstained()` is true.
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn abstained(&self) -> bool {
        self.abstained
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Individual observations behind the score.
    pub fn findings(&self) -> &[String] {
        &self.findings
    }
}

/// Builder for creating evidence records with a fluent API.
pub struct EvidenceBuilder {
    validator_id: String,
    weight: f64,
    rationale: String,
    findings: Vec<String>,
}

impl EvidenceBuilder {
    /// Start building a record for a validator. Weight defaults to 1.0.
    pub fn new(validator_id: impl Into<String>) -> Self {
        Self {
            validator_id: validator_id.into(),
            weight: 1.0,
            rationale: String::new(),
            findings: Vec::new(),
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn finding(mut self, finding: impl Into<String>) -> Self {
        self.findings.push(finding.into());
        self
    }

    pub fn findings(mut self, findings: Vec<String>) -> Self {
        self.findings.extend(findings);
        self
    }

    /// Finish as a scored record.
    pub fn score(self, score: f64) -> Result<EvidenceRecord, EvidenceError> {
        Ok(EvidenceRecord {
            score: check_score(score)?,
            weight: check_weight(self.weight)?,
            validator_id: self.validator_id,
            abstained: false,
            rationale: self.rationale,
            findings: self.findings,
        })
    }

    /// Finish as an abstention.
    pub fn abstain(self) -> Result<EvidenceRecord, EvidenceError> {
        Ok(EvidenceRecord {
            score: 0.0,
            weight: check_weight(self.weight)?,
            validator_id: self.validator_id,
            abstained: true,
            rationale: self.rationale,
            findings: self.findings,
        })
    }
}
