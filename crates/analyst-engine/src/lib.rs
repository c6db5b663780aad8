//! Orchestration engine for analyst-rs
//!
//! This crate is the coordination core of the platform:
//!
//! - [`AgentRegistry`]: shared load/performance state per agent, with
//!   scoped concurrency leases
//! - [`AgentSelector`]: pure, deterministic multi-key agent selection
//! - [`TaskManager`]: the task lifecycle state machine, serialized per
//!   task id with write-ahead persistence
//! - execution strategies ([`ParallelAnalysis`], [`SequentialPipeline`],
//!   [`DebateStrategy`]) running participants through one shared
//!   [`WorkerPool`] with per-call timeouts and partial-failure accounting
//! - [`Synthesizer`]: merges opinions into a single result with a
//!   confidence-weighted consensus level and extracted key insights
//! - [`Orchestrator`]: the facade that drives a task from submission to a
//!   terminal state and owns the [`ResultCache`]
//!
//! # Example
//!
//! ```rust,ignore
//! use analyst_engine::Orchestrator;
//! use analyst_core::{AgentType, TaskKind, TaskSpec};
//! use std::sync::Arc;
//!
//! # async fn example(store: Arc<dyn analyst_core::Store>) -> analyst_core::Result<()> {
//! let orchestrator = Orchestrator::builder()
//!     .store(store)
//!     .producer(Arc::new(my_technical_producer))
//!     .build()?;
//!
//! orchestrator.register_agent("tech-1", AgentType::Technical, 4).await?;
//!
//! let task = orchestrator
//!     .submit(TaskSpec::collaboration(
//!         "AAPL outlook",
//!         TaskKind::MarketAnalysis,
//!         vec!["tech-1".to_string()],
//!         "desk",
//!     ))
//!     .await?;
//! let outcome = orchestrator.run(&task.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod consensus;
pub mod lifecycle;
pub mod orchestrator;
pub mod pool;
pub mod registry;
pub mod selector;
pub mod strategies;

// Re-export main types for convenience
pub use aggregator::Synthesizer;
pub use cache::ResultCache;
pub use config::EngineConfig;
pub use lifecycle::TaskManager;
pub use orchestrator::{Orchestrator, OrchestratorBuilder, RunOutcome};
pub use pool::WorkerPool;
pub use registry::{AgentLease, AgentRegistry, RegisteredAgent};
pub use selector::AgentSelector;
pub use strategies::{
    DebateStrategy, ExecutionStrategy, ParallelAnalysis, ParticipantRunner, RunControl,
    SequentialPipeline, StrategyOutcome,
};
