//! # lithium-runtime
//!
//! Concurrent validation engine for Lithium.
//!
//! This crate runs the validators of `lithium-core`, and any custom
//! [`ValidatorAgent`], as concurrent tokio tasks with a time budget each,
//! then folds their evidence into one report with the core aggregator.
//!
//! A validator that errors, panics or overruns its budget never fails the
//! request: it is recorded in the report's diagnostics and left out of the
//! weighted mean.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lithium_runtime::{ValidationEngine, ValidationMode, ValidationRequest};
//!
//! let engine = ValidationEngine::with_defaults()?;
//!
//! let request = ValidationRequest::new("Water boils at 100 C at sea level.", ValidationMode::Comprehensive)?
//!     .with_context("Physics of water");
//! let report = engine.validate(&request).await?;
//!
//! println!("{} ({:.2})", report.confidence_level(), report.confidence_score());
//! ```

pub mod agents;
pub mod cache;
pub mod engine;
pub mod registry;

pub use agents::{
    AgentError, ClaimVerdict, DeterministicAgent, FactCheckAgent, KnowledgeError,
    KnowledgeSource, StaticKnowledge, ValidatorAgent,
};
pub use cache::{CacheKey, CachedEngine};
pub use engine::{EngineBuilder, ValidationEngine, ValidationError};
pub use registry::{Registration, RegistryError, ValidatorRegistry};

// Re-export the core types callers need for every request
pub use lithium_core::{
    Assessment, Capability, ConfidenceLevel, EngineConfig, EvidenceRecord, InvalidRequest,
    ValidationMode, ValidationReport, ValidationRequest,
};
