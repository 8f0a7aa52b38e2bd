//! Engine integration tests: dispatch, isolation, aggregation and
//! cancellation through the public API.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lithium_core::{DiagnosticKind, Validator, ValidatorError};
use lithium_runtime::{
    AgentError, Assessment, Capability, ConfidenceLevel, DeterministicAgent, InvalidRequest,
    RegistryError, ValidationEngine, ValidationError, ValidationMode, ValidationRequest, ValidatorAgent,
};
use proptest::prelude::*;

/// Returns a fixed assessment.
struct Fixed {
    capability: Capability,
    score: Option<f64>,
}

impl Fixed {
    fn scored(capability: Capability, score: f64) -> Arc<Self> {
        Arc::new(Self {
            capability,
            score: Some(score),
        })
    }

    fn abstaining(capability: Capability) -> Arc<Self> {
        Arc::new(Self {
            capability,
            score: None,
        })
    }
}

#[async_trait]
impl ValidatorAgent for Fixed {
    fn name(&self) -> &str {
        "fixed"
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn assess(&self, _request: &ValidationRequest) -> Result<Assessment, AgentError> {
        Ok(match self.score {
            Some(score) => Assessment::scored(score, "fixed"),
            None => Assessment::abstain("nothing to check"),
        })
    }
}

struct Failing;

#[async_trait]
impl ValidatorAgent for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn capability(&self) -> Capability {
        Capability::Factual
    }

    async fn assess(&self, _request: &ValidationRequest) -> Result<Assessment, AgentError> {
        Err(AgentError::Knowledge("upstream unavailable".to_string()))
    }
}

struct Panicking;

#[async_trait]
impl ValidatorAgent for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn capability(&self) -> Capability {
        Capability::LogicalConsistency
    }

    async fn assess(&self, _request: &ValidationRequest) -> Result<Assessment, AgentError> {
        panic!("validator bug");
    }
}

/// Sleeps before scoring.
struct Slow {
    delay: Duration,
    score: f64,
}

#[async_trait]
impl ValidatorAgent for Slow {
    fn name(&self) -> &str {
        "slow"
    }

    fn capability(&self) -> Capability {
        Capability::Supplementary
    }

    async fn assess(&self, _request: &ValidationRequest) -> Result<Assessment, AgentError> {
        tokio::time::sleep(self.delay).await;
        Ok(Assessment::scored(self.score, "slept"))
    }
}

struct Counting {
    capability: Capability,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ValidatorAgent for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn assess(&self, _request: &ValidationRequest) -> Result<Assessment, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Assessment::scored(1.0, "counted"))
    }
}

/// Never finishes; records when its future is dropped.
struct Hanging {
    dropped: Arc<AtomicBool>,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ValidatorAgent for Hanging {
    fn name(&self) -> &str {
        "hanging"
    }

    fn capability(&self) -> Capability {
        Capability::Factual
    }

    async fn assess(&self, _request: &ValidationRequest) -> Result<Assessment, AgentError> {
        let _flag = DropFlag(self.dropped.clone());
        std::future::pending::<()>().await;
        unreachable!()
    }
}

/// A rule-based validator that blocks its thread.
struct Sluggish {
    delay: Duration,
}

impl Validator for Sluggish {
    fn id(&self) -> &'static str {
        "sluggish"
    }

    fn capability(&self) -> Capability {
        Capability::Factual
    }

    fn assess(&self, _request: &ValidationRequest) -> Result<Assessment, ValidatorError> {
        std::thread::sleep(self.delay);
        Ok(Assessment::scored(1.0, "eventually"))
    }
}

fn request(mode: ValidationMode) -> ValidationRequest {
    ValidationRequest::new("The service handles ten thousand requests per second.", mode).unwrap()
}

#[tokio::test]
async fn test_weighted_consensus_with_abstention() {
    let engine = ValidationEngine::builder()
        .register_validator("a", Fixed::scored(Capability::Factual, 0.9), Some(1.0), None)
        .unwrap()
        .register_validator("b", Fixed::abstaining(Capability::LogicalConsistency), Some(1.0), None)
        .unwrap()
        .register_validator("c", Fixed::scored(Capability::SourceAttribution, 0.8), Some(2.0), None)
        .unwrap()
        .build();

    let report = engine
        .validate(&request(ValidationMode::Comprehensive))
        .await
        .unwrap();

    assert!((report.confidence_score() - 2.5 / 3.0).abs() < 1e-9);
    assert_eq!(report.confidence_level(), ConfidenceLevel::Medium);
    assert!(report.is_valid());
    assert_eq!(report.evidence().len(), 2);
    assert!(report.abstained_validators().contains("b"));
}

#[tokio::test]
async fn test_level_boundaries_through_engine() {
    let table = [
        (0.499, ConfidenceLevel::Insufficient),
        (0.500, ConfidenceLevel::Low),
        (0.699, ConfidenceLevel::Low),
        (0.700, ConfidenceLevel::Medium),
        (0.899, ConfidenceLevel::Medium),
        (0.900, ConfidenceLevel::High),
    ];

    for (score, expected) in table {
        let engine = ValidationEngine::builder()
            .register_validator("only", Fixed::scored(Capability::Factual, score), None, None)
            .unwrap()
            .build();

        let report = engine.validate(&request(ValidationMode::Factual)).await.unwrap();
        assert_eq!(report.confidence_score(), score);
        assert_eq!(report.confidence_level(), expected, "score {}", score);
        assert_eq!(report.is_valid(), score >= 0.5);
    }
}

#[tokio::test]
async fn test_all_abstain_is_insufficient() {
    let engine = ValidationEngine::builder()
        .register_validator("a", Fixed::abstaining(Capability::Factual), None, None)
        .unwrap()
        .register_validator("b", Fixed::abstaining(Capability::SourceAttribution), None, None)
        .unwrap()
        .build();

    let report = engine
        .validate(&request(ValidationMode::Comprehensive))
        .await
        .unwrap();

    assert_eq!(report.confidence_score(), 0.0);
    assert_eq!(report.confidence_level(), ConfidenceLevel::Insufficient);
    assert!(!report.is_valid());
    assert_eq!(report.abstained_validators().len(), 2);
}

#[tokio::test]
async fn test_failures_do_not_hide_evidence() {
    let engine = ValidationEngine::builder()
        .register_validator("failing", Arc::new(Failing), None, None)
        .unwrap()
        .register_validator("panicking", Arc::new(Panicking), None, None)
        .unwrap()
        .register_validator("good", Fixed::scored(Capability::SourceAttribution, 0.6), None, None)
        .unwrap()
        .build();

    let report = engine
        .validate(&request(ValidationMode::Comprehensive))
        .await
        .unwrap();

    assert!((report.confidence_score() - 0.6).abs() < 1e-12);
    assert_eq!(report.confidence_level(), ConfidenceLevel::Low);
    assert_eq!(report.evidence().len(), 1);
    assert!(report.abstained_validators().contains("failing"));
    assert!(report.abstained_validators().contains("panicking"));

    let panicked = report
        .diagnostics()
        .iter()
        .find(|d| d.validator_id == "panicking")
        .unwrap();
    assert!(matches!(&panicked.kind, DiagnosticKind::Failed { error } if error.contains("validator bug")));
    assert!(report.diagnostics().iter().all(|d| d.is_failure()));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_a_failure() {
    let engine = ValidationEngine::builder()
        .register_validator(
            "slow",
            Arc::new(Slow {
                delay: Duration::from_secs(60),
                score: 0.1,
            }),
            None,
            Some(Duration::from_millis(100)),
        )
        .unwrap()
        .register_validator("fast", Fixed::scored(Capability::Factual, 0.95), None, None)
        .unwrap()
        .build();

    let report = engine
        .validate(&request(ValidationMode::Comprehensive))
        .await
        .unwrap();

    assert_eq!(report.confidence_level(), ConfidenceLevel::High);
    let diagnostic = &report.diagnostics()[0];
    assert_eq!(diagnostic.validator_id, "slow");
    assert_eq!(diagnostic.kind, DiagnosticKind::TimedOut { after_ms: 100 });
}

#[tokio::test]
async fn test_blocking_validator_times_out() {
    let engine = ValidationEngine::builder()
        .register_validator(
            "sluggish",
            Arc::new(DeterministicAgent::new(Sluggish {
                delay: Duration::from_millis(400),
            })),
            None,
            Some(Duration::from_millis(50)),
        )
        .unwrap()
        .register_validator("fast", Fixed::scored(Capability::Factual, 0.75), None, None)
        .unwrap()
        .build();

    let started = std::time::Instant::now();
    let report = engine
        .validate(&request(ValidationMode::Factual))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_millis(350));
    assert_eq!(report.evidence().len(), 1);
    assert!(report.abstained_validators().contains("sluggish"));
    assert_eq!(
        report.diagnostics()[0].kind,
        DiagnosticKind::TimedOut { after_ms: 50 }
    );
    assert_eq!(report.confidence_level(), ConfidenceLevel::Medium);
}

#[tokio::test(start_paused = true)]
async fn test_evidence_follows_registration_order() {
    let engine = ValidationEngine::builder()
        .register_validator(
            "first",
            Arc::new(Slow {
                delay: Duration::from_millis(500),
                score: 0.4,
            }),
            None,
            None,
        )
        .unwrap()
        .register_validator("second", Fixed::scored(Capability::Factual, 0.8), None, None)
        .unwrap()
        .build();

    let report = engine
        .validate(&request(ValidationMode::Comprehensive))
        .await
        .unwrap();

    let ids: Vec<_> = report.evidence().iter().map(|r| r.validator_id()).collect();
    assert_eq!(ids, vec!["first", "second"]);
}

#[tokio::test]
async fn test_supplementary_runs_only_in_comprehensive() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = ValidationEngine::builder()
        .register_validator(
            "extra",
            Arc::new(Counting {
                capability: Capability::Supplementary,
                calls: calls.clone(),
            }),
            None,
            None,
        )
        .unwrap()
        .build();

    for mode in [
        ValidationMode::Factual,
        ValidationMode::LogicalConsistency,
        ValidationMode::SourceAttribution,
    ] {
        engine.validate(&request(mode)).await.unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    engine
        .validate(&request(ValidationMode::Comprehensive))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_quick_validate_is_capped() {
    let factual_calls = Arc::new(AtomicUsize::new(0));
    let engine = ValidationEngine::builder()
        .register_validator("logic", Fixed::scored(Capability::LogicalConsistency, 1.0), None, None)
        .unwrap()
        .register_validator(
            "facts",
            Arc::new(Counting {
                capability: Capability::Factual,
                calls: factual_calls.clone(),
            }),
            None,
            None,
        )
        .unwrap()
        .build();

    let report = engine
        .quick_validate("A perfectly consistent statement.", Some("testing"))
        .await
        .unwrap();

    assert_eq!(report.confidence_score(), 0.89);
    assert_eq!(report.confidence_level(), ConfidenceLevel::Medium);
    assert!(report.is_quick());
    assert!(report.is_capped());
    assert_eq!(factual_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_quick_validate_never_high_with_builtins() {
    let engine = ValidationEngine::with_defaults().unwrap();

    for text in [
        "The sky is blue.",
        "First we measure. Therefore we know. However, we verify again.",
        "It is always on and never off.",
    ] {
        let report = engine.quick_validate(text, None).await.unwrap();
        assert_ne!(report.confidence_level(), ConfidenceLevel::High, "{}", text);
    }
}

#[tokio::test]
async fn test_empty_output_rejected_before_dispatch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = ValidationEngine::builder()
        .register_validator(
            "counting",
            Arc::new(Counting {
                capability: Capability::LogicalConsistency,
                calls: calls.clone(),
            }),
            None,
            None,
        )
        .unwrap()
        .build();

    let result = engine.validate_text("   \n\t", None, "comprehensive").await;
    assert_eq!(
        result,
        Err(ValidationError::InvalidRequest(InvalidRequest::EmptyOutput))
    );

    let result = engine.quick_validate("", None).await;
    assert!(matches!(result, Err(ValidationError::InvalidRequest(_))));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_batch_keeps_order_and_isolates_invalid() {
    let engine = ValidationEngine::with_defaults().unwrap();

    let results = engine
        .batch_validate(
            vec![
                "It always works and it never works.",
                "",
                "The library compiles on stable.",
            ],
            ValidationMode::LogicalConsistency,
        )
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].as_ref().unwrap().confidence_level(),
        ConfidenceLevel::Medium
    );
    assert!(matches!(
        results[1],
        Err(ValidationError::InvalidRequest(InvalidRequest::EmptyOutput))
    ));
    assert_eq!(
        results[2].as_ref().unwrap().confidence_level(),
        ConfidenceLevel::High
    );
}

#[tokio::test]
async fn test_cancellation_aborts_validators() {
    let dropped = Arc::new(AtomicBool::new(false));
    let engine = ValidationEngine::builder()
        .register_validator(
            "hanging",
            Arc::new(Hanging {
                dropped: dropped.clone(),
            }),
            None,
            Some(Duration::from_secs(3600)),
        )
        .unwrap()
        .build();

    let result = engine
        .validate_until(
            &request(ValidationMode::Factual),
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await;

    assert_eq!(result, Err(ValidationError::Cancelled));

    for _ in 0..100 {
        if dropped.load(Ordering::SeqCst) {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let result = ValidationEngine::builder()
        .with_default_validators()
        .unwrap()
        .register_validator("factual", Fixed::scored(Capability::Factual, 0.5), None, None);

    assert!(matches!(
        result,
        Err(RegistryError::DuplicateValidator(id)) if id == "factual"
    ));
}

#[tokio::test]
async fn test_agent_default_name_and_weight() {
    let engine = ValidationEngine::builder()
        .validator(Fixed::scored(Capability::Factual, 0.7))
        .unwrap()
        .build();

    let registration = engine.registry().get("fixed").unwrap();
    assert_eq!(registration.weight(), 1.0);
    assert_eq!(registration.timeout(), Duration::from_secs(5));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_engine_score_stays_in_range(scores in prop::collection::vec(0.0f64..=1.0, 1..6)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let mut builder = ValidationEngine::builder();
        for (i, score) in scores.iter().enumerate() {
            builder = builder
                .register_validator(format!("v{}", i), Fixed::scored(Capability::Factual, *score), None, None)
                .unwrap();
        }
        let engine = builder.build();

        let report = runtime
            .block_on(engine.validate(&request(ValidationMode::Factual)))
            .unwrap();

        let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(report.confidence_score() >= min - 1e-12);
        prop_assert!(report.confidence_score() <= max + 1e-12);
        prop_assert_eq!(report.evidence().len(), scores.len());
    }
}
