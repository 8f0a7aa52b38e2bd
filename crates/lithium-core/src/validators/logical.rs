//! Logical Consistency Validator
//!
//! **Question**: Does this output contradict itself (or its context)?
//!
//! Never abstains: any non-empty text can be checked for self-contradiction.

use crate::types::{Capability, ValidationRequest};

use super::patterns::{has_transitions, split_sentences, ANTONYM_PAIRS};
use super::{clamp_score, Assessment, Validator, ValidatorError};

const CONTRADICTION_PENALTY: f64 = 0.3;
const CONTEXT_CONFLICT_PENALTY: f64 = 0.1;
const TRANSITION_BONUS: f64 = 0.1;

/// The logical consistency validator.
pub struct LogicalConsistencyValidator;

impl LogicalConsistencyValidator {
    pub fn new() -> Self {
        Self
    }

    /// Antonym pairs asserted together in the output.
    fn self_contradictions(&self, content: &str) -> Vec<String> {
        ANTONYM_PAIRS
            .iter()
            .filter(|pair| pair.both_in(content))
            .map(|pair| {
                format!(
                    "Potential contradiction detected: {} vs {}",
                    pair.positive, pair.negative
                )
            })
            .collect()
    }

    /// Absolute quantifiers in the output that the context asserts the
    /// opposite of.
    fn context_conflicts(&self, content: &str, context: &str) -> Vec<String> {
        let mut conflicts = Vec::new();

        for pair in ANTONYM_PAIRS.iter() {
            if pair.both_in(content) {
                // Already reported as a self-contradiction.
                continue;
            }
            if pair.positive_in(content) && pair.negative_in(context) {
                conflicts.push(format!(
                    "Output says '{}' where context says '{}'",
                    pair.positive, pair.negative
                ));
            } else if pair.negative_in(content) && pair.positive_in(context) {
                conflicts.push(format!(
                    "Output says '{}' where context says '{}'",
                    pair.negative, pair.positive
                ));
            }
        }

        conflicts
    }
}

impl Default for LogicalConsistencyValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for LogicalConsistencyValidator {
    fn id(&self) -> &'static str {
        "logical_consistency"
    }

    fn capability(&self) -> Capability {
        Capability::LogicalConsistency
    }

    fn assess(&self, request: &ValidationRequest) -> Result<Assessment, ValidatorError> {
        let content = request.output();
        let mut score: f64 = 1.0;

        let contradictions = self.self_contradictions(content);
        score -= contradictions.len() as f64 * CONTRADICTION_PENALTY;

        let conflicts = request
            .context()
            .map(|context| self.context_conflicts(content, context))
            .unwrap_or_default();
        score -= conflicts.len() as f64 * CONTEXT_CONFLICT_PENALTY;

        let structured = split_sentences(content).len() > 1 && has_transitions(content);
        if structured {
            score += TRANSITION_BONUS;
        }

        let rationale = match (contradictions.len(), conflicts.len()) {
            (0, 0) if structured => "No contradictions; reasoning uses explicit transitions".to_string(),
            (0, 0) => "No contradictions detected".to_string(),
            (own, ctx) => format!(
                "{} potential self-contradiction(s), {} conflict(s) with context",
                own, ctx
            ),
        };

        let mut findings = contradictions;
        findings.extend(conflicts);

        Ok(Assessment::scored(clamp_score(score), rationale).with_findings(findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationMode;

    fn score(text: &str, context: Option<&str>) -> (f64, Vec<String>) {
        let mut request = ValidationRequest::new(text, ValidationMode::LogicalConsistency).unwrap();
        if let Some(context) = context {
            request = request.with_context(context);
        }
        match LogicalConsistencyValidator::new().assess(&request).unwrap() {
            Assessment::Scored { score, findings, .. } => (score, findings),
            Assessment::Abstain { reason } => panic!("unexpected abstain: {}", reason),
        }
    }

    #[test]
    fn test_consistent_text() {
        let (score, findings) = score("All birds can fly, but penguins cannot fly.", None);
        assert_eq!(score, 1.0);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_contradiction_penalized() {
        let (score, findings) = score("It always rains here and it never rains here.", None);
        assert!((score - 0.7).abs() < 1e-9);
        assert_eq!(findings, vec!["Potential contradiction detected: always vs never"]);
    }

    #[test]
    fn test_multiple_contradictions_floor_at_zero() {
        let text = "Always and never. All and none. Every and no. Completely and partially.";
        let (score, findings) = score(text, None);
        assert_eq!(score, 0.0);
        assert_eq!(findings.len(), 4);
    }

    #[test]
    fn test_transitions_bonus_after_penalty() {
        let text = "It always works. However, it never fails on Sundays.";
        let (score, _) = score(text, None);
        // 1.0 - 0.3 + 0.1
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_context_conflict() {
        let (score, findings) = score(
            "The service is always available.",
            Some("The service is never available on holidays."),
        );
        assert!((score - 0.9).abs() < 1e-9);
        assert_eq!(findings, vec!["Output says 'always' where context says 'never'"]);
    }
}
