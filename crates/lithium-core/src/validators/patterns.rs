//! Shared detection patterns for validators.
//!
//! Regexes for factual assertions, hedging language, contradictory
//! quantifiers and citation-like spans, plus the sentence and claim
//! splitter the factual validators use. Add new patterns here without
//! touching validator logic.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // =========================================================================
    // FACTUAL ASSERTION PATTERNS
    // =========================================================================

    /// Phrases that assert a fact on someone else's authority without
    /// saying whose.
    pub static ref FACTUAL_ASSERTION_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("attributed claim", Regex::new(r"(?i)according to [^,]+,").unwrap()),
        ("studies show", Regex::new(r"(?i)\bstudies show\b").unwrap()),
        ("research indicates", Regex::new(r"(?i)\bresearch indicates\b").unwrap()),
        ("data suggests", Regex::new(r"(?i)\bdata suggests\b").unwrap()),
        ("statistics show", Regex::new(r"(?i)\bstatistics show\b").unwrap()),
    ];

    /// Hedging language. Calibrated uncertainty is a good sign.
    pub static ref HEDGING_PATTERN: Regex = Regex::new(
        r"(?i)\b(might be|could be|possibly|perhaps|it seems|appears to)\b"
    ).unwrap();

    // =========================================================================
    // LOGICAL CONSISTENCY PATTERNS
    // =========================================================================

    /// Quantifier pairs that contradict each other when both are asserted.
    pub static ref ANTONYM_PAIRS: Vec<AntonymPair> = vec![
        AntonymPair::new("always", "never"),
        AntonymPair::new("all", "none"),
        AntonymPair::new("every", "no"),
        AntonymPair::new("completely", "partially"),
    ];

    /// Discourse markers that signal structured reasoning.
    pub static ref TRANSITION_PATTERN: Regex = Regex::new(
        r"(?i)\b(however|therefore|moreover|furthermore|additionally)\b"
    ).unwrap();

    // =========================================================================
    // CITATION PATTERNS
    // =========================================================================

    /// Citation-like spans: `[1]`, `[Smith 2020]`, `(Doe et al., 2023)`,
    /// `source:`, `reference:`, `according to`.
    pub static ref CITATION_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"\[[\w\s,.]+\]").unwrap(),
        Regex::new(r"\([^)]*(?:19|20)\d{2}[^)]*\)").unwrap(),
        Regex::new(r"(?i)\bsource:").unwrap(),
        Regex::new(r"(?i)\breference:").unwrap(),
        Regex::new(r"(?i)\baccording to\b").unwrap(),
    ];

    /// Any bracketed span, used to spot truncated citations.
    pub static ref BRACKET_CITATION: Regex = Regex::new(r"\[[^\]]*\]").unwrap();

    /// A sentence: everything up to and including its terminator.
    static ref SENTENCE: Regex = Regex::new(r"[^.!?]+[.!?]*").unwrap();
}

/// A pair of quantifiers that contradict each other.
pub struct AntonymPair {
    pub positive: &'static str,
    pub negative: &'static str,
    positive_re: Regex,
    negative_re: Regex,
}

impl AntonymPair {
    fn new(positive: &'static str, negative: &'static str) -> Self {
        Self {
            positive,
            negative,
            positive_re: word_regex(positive),
            negative_re: word_regex(negative),
        }
    }

    pub fn positive_in(&self, content: &str) -> bool {
        self.positive_re.is_match(content)
    }

    pub fn negative_in(&self, content: &str) -> bool {
        self.negative_re.is_match(content)
    }

    /// Both sides asserted in the same text.
    pub fn both_in(&self, content: &str) -> bool {
        self.positive_in(content) && self.negative_in(content)
    }
}

fn word_regex(word: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))).unwrap()
}

/// A byte range in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn text<'a>(&self, content: &'a str) -> &'a str {
        &content[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A declarative sentence that could be checked against ground truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub text: String,
    pub span: Span,
}

/// Minimum words for a sentence to count as a claim.
const MIN_CLAIM_WORDS: usize = 3;

/// Split content into trimmed, non-empty sentences with their spans.
pub fn split_sentences(content: &str) -> Vec<(Span, &str)> {
    SENTENCE
        .find_iter(content)
        .filter_map(|m| {
            let raw = m.as_str();
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.chars().all(|c| matches!(c, '.' | '!' | '?')) {
                return None;
            }
            let leading = raw.len() - raw.trim_start().len();
            let start = m.start() + leading;
            Some((
                Span {
                    start,
                    end: start + trimmed.len(),
                },
                trimmed,
            ))
        })
        .collect()
}

/// Extract declarative claims: sentences of at least three words that are
/// not questions.
pub fn extract_claims(content: &str) -> Vec<Claim> {
    split_sentences(content)
        .into_iter()
        .filter(|(_, sentence)| !sentence.ends_with('?'))
        .filter(|(_, sentence)| sentence.split_whitespace().count() >= MIN_CLAIM_WORDS)
        .map(|(span, sentence)| Claim {
            text: sentence.to_string(),
            span,
        })
        .collect()
}

/// First match of each factual-assertion pattern, in pattern order.
pub fn find_factual_assertions(content: &str) -> Vec<(&'static str, Span)> {
    FACTUAL_ASSERTION_PATTERNS
        .iter()
        .filter_map(|(name, regex)| {
            regex.find(content).map(|m| {
                (
                    *name,
                    Span {
                        start: m.start(),
                        end: m.end(),
                    },
                )
            })
        })
        .collect()
}

/// Number of hedging phrases.
pub fn count_hedges(content: &str) -> usize {
    HEDGING_PATTERN.find_iter(content).count()
}

pub fn has_transitions(content: &str) -> bool {
    TRANSITION_PATTERN.is_match(content)
}

/// Citation-like spans, merged where patterns overlap, sorted by position.
pub fn citation_spans(content: &str) -> Vec<Span> {
    let mut spans: Vec<Span> = CITATION_PATTERNS
        .iter()
        .flat_map(|regex| regex.find_iter(content))
        .map(|m| Span {
            start: m.start(),
            end: m.end(),
        })
        .collect();

    spans.sort_by_key(|span| (span.start, span.end));

    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start < last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

/// Bracketed spans (`[...]`) in the content.
pub fn bracket_citations(content: &str) -> Vec<Span> {
    BRACKET_CITATION
        .find_iter(content)
        .map(|m| Span {
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

pub fn contains_citation(content: &str) -> bool {
    CITATION_PATTERNS.iter().any(|regex| regex.is_match(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factual_assertion_detection() {
        let found = find_factual_assertions("According to recent studies, the sky is blue.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "attributed claim");

        let found = find_factual_assertions("Studies show that research indicates growth.");
        assert_eq!(found.len(), 2);

        assert!(find_factual_assertions("Water is H2O.").is_empty());
    }

    #[test]
    fn test_hedge_counting() {
        assert_eq!(count_hedges("It might be 42, or perhaps 43."), 2);
        assert_eq!(count_hedges("It is 42."), 0);
    }

    #[test]
    fn test_antonym_pairs_match_whole_words() {
        let pair = &ANTONYM_PAIRS[0];
        assert!(pair.both_in("It always rains and never stops."));
        assert!(!pair.both_in("It always rains."));

        let all_none = &ANTONYM_PAIRS[1];
        // "ball" and "nonetheless" must not count.
        assert!(!all_none.both_in("The ball is red, nonetheless."));
    }

    #[test]
    fn test_citation_spans() {
        assert!(citation_spans("Paris is the capital of France.").is_empty());
        assert_eq!(citation_spans("Paris is the capital [1].").len(), 1);
        assert_eq!(citation_spans("As shown (Smith, 2023), it works.").len(), 1);
        assert_eq!(citation_spans("Source: the annual report.").len(), 1);
        assert!(contains_citation("According to Smith (2023), the results show growth."));
    }

    #[test]
    fn test_overlapping_citations_merge() {
        // "[Smith, 2020]" matches the bracket pattern only, "(Doe 2021)" the
        // year pattern; neither overlaps.
        let spans = citation_spans("One [Smith, 2020] and two (Doe 2021).");
        assert_eq!(spans.len(), 2);
        assert!(spans[0].start < spans[1].start);
    }

    #[test]
    fn test_split_sentences() {
        let content = "First one. Second one!  Third?";
        let sentences = split_sentences(content);
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0].1, "First one.");
        assert_eq!(sentences[1].0.text(content), "Second one!");
        assert_eq!(sentences[2].1, "Third?");
    }

    #[test]
    fn test_extract_claims_skips_questions_and_fragments() {
        let claims = extract_claims("Is it true? Paris is in France. Yes.");
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].text, "Paris is in France.");
    }
}
