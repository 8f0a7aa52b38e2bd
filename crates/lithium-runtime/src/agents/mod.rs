//! Validator agents the engine dispatches.
//!
//! Rule-based validators from `lithium-core` are wrapped in
//! [`DeterministicAgent`]; agents that call out to external services
//! implement [`ValidatorAgent`] directly.

mod deterministic;
mod fact_check;
mod traits;

pub use deterministic::DeterministicAgent;
pub use fact_check::{ClaimVerdict, FactCheckAgent, KnowledgeError, KnowledgeSource, StaticKnowledge};
pub use traits::{AgentError, ValidatorAgent};

pub(crate) use traits::panic_message;
