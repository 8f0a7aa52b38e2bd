//! Basic usage of the validation engine.
//!
//! Run with `RUST_LOG=debug cargo run --example basic_usage` to see the
//! dispatch log.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use lithium_runtime::{
    CachedEngine, ClaimVerdict, EngineConfig, FactCheckAgent, StaticKnowledge, ValidationEngine,
    ValidationMode, ValidationRequest,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = EngineConfig::from_yaml(
        r#"
default_timeout: 2s
max_warnings: 5
weights:
  factual: 2.0
"#,
    )?;

    let knowledge = StaticKnowledge::new()
        .with_fact("Water boils at 100 degrees Celsius at sea level", ClaimVerdict::Supported)
        .with_fact("The Great Wall is visible from the Moon", ClaimVerdict::Refuted);

    let engine = ValidationEngine::builder()
        .config(config)
        .with_default_validators()?
        .register_validator(
            "fact_check",
            Arc::new(FactCheckAgent::new(knowledge)),
            Some(2.5),
            Some(Duration::from_secs(3)),
        )?
        .build();
    let engine = Arc::new(engine);

    // Full validation
    let request = ValidationRequest::new(
        "Water boils at 100 degrees Celsius at sea level. \
         The Great Wall is visible from the Moon. \
         Studies show that this is always true and never false [1].",
        ValidationMode::Comprehensive,
    )?
    .with_context("Physical geography");

    let report = engine.validate(&request).await?;
    println!("{}", report.to_json()?);

    for warning in report.warnings() {
        println!("warning: {}", warning);
    }
    for recommendation in report.confidence_level().recommendations() {
        println!("recommendation: {}", recommendation);
    }

    // Quick screening never reports HIGH
    let quick = engine
        .quick_validate("The API returns JSON. However, errors return plain text.", Some("REST APIs"))
        .await?;
    println!(
        "quick: {} ({:.2}, capped: {})",
        quick.confidence_level(),
        quick.confidence_score(),
        quick.is_capped()
    );

    // Batch
    let outputs = vec![
        "Paris is the capital of France.",
        "",
        "According to the report, sales rose.",
    ];
    for (output, result) in outputs
        .iter()
        .zip(engine.batch_validate(outputs.clone(), ValidationMode::Factual).await)
    {
        match result {
            Ok(report) => println!("{:?}: {}", output, report.confidence_level()),
            Err(e) => println!("{:?}: {}", output, e),
        }
    }

    // Cached
    let cached = CachedEngine::new(engine.clone());
    let first = cached.validate(&request).await?;
    let second = cached.validate(&request).await?;
    println!("cached: {}", first.validated_at() == second.validated_at());

    Ok(())
}
