//! Aggregator: reduces evidence records to a confidence verdict.
//!
//! The aggregation policy is fixed:
//! 1. Abstained records are set aside.
//! 2. No scored record left → score 0.0, INSUFFICIENT, not valid.
//! 3. Otherwise the score is the weighted arithmetic mean of the scored
//!    records, accumulated in invocation order, rounded to
//!    `1 / SCORE_STEPS` and clamped to `[0, 1]`.
//! 4. The level is the band lookup of the score; valid iff level >= LOW.
//!
//! Weight is the only mechanism for differential trust. No single record
//! can veto the consensus; it can only pull the mean in proportion to its
//! weight.

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceRecord;
use crate::types::{ConfidenceLevel, Diagnostic, ValidationMode, ValidationReport};

/// Highest score the quick path may report. Keeps quick results below HIGH.
pub const QUICK_SCORE_CEILING: f64 = 0.89;

/// Default cap on the number of warnings kept in a report.
pub const DEFAULT_MAX_WARNINGS: usize = 10;

/// Reported scores are rounded to this many steps per unit. Rounding
/// absorbs floating-point drift in the weighted mean, so a mean that is
/// exactly 0.7 in decimal never lands in the band below.
pub const SCORE_STEPS: f64 = 1e12;

/// Round to the nearest `1 / SCORE_STEPS`. Dividing the integral step count
/// yields the same double as a decimal literal with at most twelve places.
fn snap(score: f64) -> f64 {
    (score * SCORE_STEPS).round() / SCORE_STEPS
}

/// The score part of a report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub confidence_score: f64,
    pub confidence_level: ConfidenceLevel,
    pub is_valid: bool,
}

impl Verdict {
    fn from_score(score: f64) -> Self {
        let confidence_score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let confidence_level = ConfidenceLevel::from_score(confidence_score);

        Self {
            confidence_score,
            confidence_level,
            is_valid: confidence_level.is_valid(),
        }
    }

    /// The verdict when no validator produced a score.
    pub fn insufficient() -> Self {
        Self::from_score(0.0)
    }
}

/// What one dispatched validator produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorOutcome {
    /// A scored or abstained record.
    Evidence(EvidenceRecord),

    /// The validator errored, panicked or timed out.
    Failed(Diagnostic),
}

/// The Aggregator turns validator outcomes into a report.
#[derive(Debug, Clone)]
pub struct Aggregator {
    ceiling: Option<f64>,
    max_warnings: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            ceiling: None,
            max_warnings: DEFAULT_MAX_WARNINGS,
        }
    }

    /// An aggregator for the quick path: scores are capped at
    /// [`QUICK_SCORE_CEILING`].
    pub fn quick() -> Self {
        Self::new().with_ceiling(QUICK_SCORE_CEILING)
    }

    pub fn with_ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = Some(ceiling.clamp(0.0, 1.0));
        self
    }

    pub fn with_max_warnings(mut self, max_warnings: usize) -> Self {
        self.max_warnings = max_warnings;
        self
    }

    /// Weighted consensus over scored records.
    ///
    /// Pure: the same records in the same order always give bit-identical
    /// output. Ignores any ceiling.
    pub fn verdict(&self, records: &[EvidenceRecord]) -> Verdict {
        let scored: Vec<&EvidenceRecord> = records.iter().filter(|r| !r.abstained()).collect();

        // Weights are relative; scaling by the largest keeps both sums
        // finite however large the weights are.
        let max_weight = scored.iter().map(|r| r.weight()).fold(0.0_f64, f64::max);
        if max_weight <= 0.0 {
            return Verdict::insufficient();
        }

        let mut weighted_sum = 0.0_f64;
        let mut total_weight = 0.0_f64;

        for record in &scored {
            let weight = record.weight() / max_weight;
            weighted_sum += record.score() * weight;
            total_weight += weight;
        }

        if total_weight <= 0.0 {
            return Verdict::insufficient();
        }

        Verdict::from_score(snap(weighted_sum / total_weight))
    }

    /// Build the report for one request.
    ///
    /// `outcomes` must be in invocation order.
    pub fn aggregate(&self, mode: ValidationMode, outcomes: Vec<ValidatorOutcome>) -> ValidationReport {
        let mut evidence = Vec::new();
        let mut abstained_validators = BTreeSet::new();
        let mut diagnostics = Vec::new();

        for outcome in outcomes {
            match outcome {
                ValidatorOutcome::Evidence(record) if record.abstained() => {
                    abstained_validators.insert(record.validator_id().to_string());
                    diagnostics.push(Diagnostic::abstained(
                        record.validator_id(),
                        record.rationale(),
                    ));
                }
                ValidatorOutcome::Evidence(record) => evidence.push(record),
                ValidatorOutcome::Failed(diagnostic) => {
                    abstained_validators.insert(diagnostic.validator_id.clone());
                    diagnostics.push(diagnostic);
                }
            }
        }

        let uncapped = self.verdict(&evidence);
        let (verdict, capped) = match self.ceiling {
            Some(ceiling) if uncapped.confidence_score > ceiling => {
                (Verdict::from_score(ceiling), true)
            }
            _ => (uncapped, false),
        };

        let warnings = self.collect_warnings(&evidence);

        ValidationReport {
            confidence_score: verdict.confidence_score,
            confidence_level: verdict.confidence_level,
            is_valid: verdict.is_valid,
            evidence,
            abstained_validators,
            diagnostics,
            warnings,
            mode,
            quick: self.ceiling.is_some(),
            capped,
            validated_at: Utc::now(),
        }
    }

    /// Flatten findings, keeping at most `max_warnings` plus a tail line.
    fn collect_warnings(&self, evidence: &[EvidenceRecord]) -> Vec<String> {
        let all: Vec<&String> = evidence.iter().flat_map(|r| r.findings()).collect();

        let mut warnings: Vec<String> = all
            .iter()
            .take(self.max_warnings)
            .map(|w| (*w).clone())
            .collect();

        if all.len() > self.max_warnings {
            warnings.push(format!(
                "... and {} more warnings",
                all.len() - self.max_warnings
            ));
        }

        warnings
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}
