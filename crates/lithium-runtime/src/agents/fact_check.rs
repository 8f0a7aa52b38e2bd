//! Fact-check agent backed by an injected knowledge source.
//!
//! The agent splits the output into claims and asks the source about each
//! one. How the source decides truth (a search API, a model, a curated
//! store) is the source's business; the agent only turns its answers into
//! a score.

use std::collections::HashMap;

use async_trait::async_trait;
use lithium_core::validators::patterns::extract_claims;
use lithium_core::{Assessment, Capability, Claim, ValidationRequest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AgentError, ValidatorAgent};

/// What a knowledge source says about one claim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClaimVerdict {
    Supported,
    Refuted,
    Unknown,
}

/// Errors from a knowledge source.
#[derive(Error, Debug)]
#[error("{source_name}: {message}")]
pub struct KnowledgeError {
    pub source_name: String,
    pub message: String,
}

impl KnowledgeError {
    pub fn new(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Ground-truth dependency of the fact-check agent.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    fn name(&self) -> &str;

    /// Verify one claim, optionally using the request's context.
    async fn verify(&self, claim: &Claim, context: Option<&str>) -> Result<ClaimVerdict, KnowledgeError>;
}

/// An in-memory source keyed by normalized claim text.
///
/// Useful for tests and for small curated fact sets.
#[derive(Debug, Clone, Default)]
pub struct StaticKnowledge {
    facts: HashMap<String, ClaimVerdict>,
}

impl StaticKnowledge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fact(mut self, claim: &str, verdict: ClaimVerdict) -> Self {
        self.facts.insert(normalize(claim), verdict);
        self
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[async_trait]
impl KnowledgeSource for StaticKnowledge {
    fn name(&self) -> &str {
        "static"
    }

    async fn verify(&self, claim: &Claim, _context: Option<&str>) -> Result<ClaimVerdict, KnowledgeError> {
        Ok(self
            .facts
            .get(&normalize(&claim.text))
            .copied()
            .unwrap_or(ClaimVerdict::Unknown))
    }
}

/// Lowercase, drop trailing punctuation, collapse whitespace.
fn normalize(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '!', '?'])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Factual validator that checks claims against a [`KnowledgeSource`].
///
/// Score = supported / (supported + refuted). Abstains when no claim gets a
/// definite answer. A source error fails the whole assessment.
pub struct FactCheckAgent<K> {
    source: K,
}

impl<K: KnowledgeSource> FactCheckAgent<K> {
    pub fn new(source: K) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<K: KnowledgeSource> ValidatorAgent for FactCheckAgent<K> {
    fn name(&self) -> &str {
        "fact_check"
    }

    fn capability(&self) -> Capability {
        Capability::Factual
    }

    async fn assess(&self, request: &ValidationRequest) -> Result<Assessment, AgentError> {
        let claims = extract_claims(request.output());
        if claims.is_empty() {
            return Ok(Assessment::abstain("No declarative claims to check"));
        }

        let mut supported = 0usize;
        let mut refuted = 0usize;
        let mut findings = Vec::new();

        // Sequential so that findings follow claim order.
        for claim in &claims {
            let verdict = self
                .source
                .verify(claim, request.context())
                .await
                .map_err(|e| AgentError::Knowledge(e.to_string()))?;

            match verdict {
                ClaimVerdict::Supported => supported += 1,
                ClaimVerdict::Refuted => {
                    refuted += 1;
                    findings.push(format!("Claim refuted by {}: {}", self.source.name(), claim.text));
                }
                ClaimVerdict::Unknown => {}
            }
        }

        let decided = supported + refuted;
        if decided == 0 {
            return Ok(Assessment::abstain(format!(
                "{} could not verify any of {} claim(s)",
                self.source.name(),
                claims.len()
            )));
        }

        let score = supported as f64 / decided as f64;
        let rationale = format!(
            "{} of {} verifiable claim(s) supported by {} ({} unverified)",
            supported,
            decided,
            self.source.name(),
            claims.len() - decided
        );

        Ok(Assessment::scored(score, rationale).with_findings(findings))
    }
}
