//! Factual Validator (heuristic)
//!
//! **Question**: Does this output assert facts it cannot back up?
//!
//! Without a ground-truth source this validator looks at *how* facts are
//! asserted: appeals to unnamed authority ("studies show") lower the score,
//! calibrated hedging raises it. The runtime's fact-check agent replaces it
//! when a knowledge source is available.
//!
//! | Signal | Effect |
//! |--------|--------|
//! | Each distinct unsupported-assertion phrase | −0.20 |
//! | Each hedge ("might be", "possibly", …) | +0.10, at most +0.30 |
//! | No declarative claim in the output | abstain |

use crate::types::{Capability, ValidationRequest};

use super::patterns::{count_hedges, extract_claims, find_factual_assertions};
use super::{clamp_score, Assessment, Validator, ValidatorError};

const ASSERTION_PENALTY: f64 = 0.2;
const HEDGE_BONUS: f64 = 0.1;
const MAX_HEDGE_BONUS: f64 = 0.3;

/// The heuristic factual validator.
pub struct FactualValidator;

impl FactualValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FactualValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for FactualValidator {
    fn id(&self) -> &'static str {
        "factual"
    }

    fn capability(&self) -> Capability {
        Capability::Factual
    }

    fn assess(&self, request: &ValidationRequest) -> Result<Assessment, ValidatorError> {
        let content = request.output();

        let claims = extract_claims(content);
        if claims.is_empty() {
            return Ok(Assessment::abstain("No declarative claims to check"));
        }

        let mut score: f64 = 1.0;
        let mut findings = Vec::new();

        let assertions = find_factual_assertions(content);
        for (_, span) in &assertions {
            findings.push(format!(
                "Unsupported factual claim detected: {}",
                span.text(content)
            ));
            score -= ASSERTION_PENALTY;
        }

        let hedges = count_hedges(content);
        if hedges > 0 {
            score += (hedges as f64 * HEDGE_BONUS).min(MAX_HEDGE_BONUS);
        }

        let rationale = if assertions.is_empty() {
            format!(
                "No unsupported factual assertions across {} claim(s)",
                claims.len()
            )
        } else {
            format!(
                "{} unsupported factual assertion(s) across {} claim(s), {} hedge(s)",
                assertions.len(),
                claims.len(),
                hedges
            )
        };

        Ok(Assessment::scored(clamp_score(score), rationale).with_findings(findings))
    }
}
