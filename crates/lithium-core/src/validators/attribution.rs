//! Source Attribution Validator
//!
//! **Question**: Are the citations in this output well-formed, and do they
//! accompany actual claims?
//!
//! | Condition | Effect |
//! |-----------|--------|
//! | No citation-like span at all | abstain |
//! | Bracketed citation shorter than 5 chars (`[1]`, `[]`) | −0.10 each |
//! | Citation whose sentence carries no claim text | −0.10 each |

use crate::types::{Capability, ValidationRequest};

use super::patterns::{bracket_citations, citation_spans, split_sentences, Span};
use super::{clamp_score, Assessment, Validator, ValidatorError};

const INCOMPLETE_PENALTY: f64 = 0.1;
const UNSUPPORTED_PENALTY: f64 = 0.1;
const MIN_CITATION_LEN: usize = 5;
const MIN_SUPPORTED_WORDS: usize = 3;

/// The source attribution validator.
pub struct SourceAttributionValidator;

impl SourceAttributionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Whether the sentence holding `citation` says something besides the
    /// citation itself.
    fn accompanies_claim(&self, content: &str, citation: Span) -> bool {
        let sentences = split_sentences(content);
        let Some((sentence, _)) = sentences
            .iter()
            .find(|(span, _)| span.start <= citation.start && citation.start < span.end)
        else {
            return false;
        };

        let before = &content[sentence.start..citation.start];
        let after = &content[citation.end.min(sentence.end)..sentence.end];
        let words = before
            .split_whitespace()
            .chain(after.split_whitespace())
            .filter(|word| word.chars().any(char::is_alphanumeric))
            .count();

        words >= MIN_SUPPORTED_WORDS
    }
}

impl Default for SourceAttributionValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for SourceAttributionValidator {
    fn id(&self) -> &'static str {
        "source_attribution"
    }

    fn capability(&self) -> Capability {
        Capability::SourceAttribution
    }

    fn assess(&self, request: &ValidationRequest) -> Result<Assessment, ValidatorError> {
        let content = request.output();

        let citations = citation_spans(content);
        if citations.is_empty() {
            return Ok(Assessment::abstain(
                "No citations or source attributions found",
            ));
        }

        let mut score: f64 = 1.0;
        let mut findings = Vec::new();

        for bracket in bracket_citations(content) {
            if bracket.len() < MIN_CITATION_LEN {
                findings.push(format!("Incomplete citation: {}", bracket.text(content)));
                score -= INCOMPLETE_PENALTY;
            }
        }

        let mut unsupported = 0;
        for citation in &citations {
            if !self.accompanies_claim(content, *citation) {
                findings.push(format!(
                    "Citation '{}' does not accompany a claim",
                    citation.text(content).trim()
                ));
                score -= UNSUPPORTED_PENALTY;
                unsupported += 1;
            }
        }

        let rationale = format!(
            "{} citation(s) found, {} issue(s), {} without a supported claim",
            citations.len(),
            findings.len(),
            unsupported
        );

        Ok(Assessment::scored(clamp_score(score), rationale).with_findings(findings))
    }
}
