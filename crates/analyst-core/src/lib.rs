//! Core abstractions for the analyst-rs orchestration platform
//!
//! This crate defines the data model shared by the orchestration engine and
//! its collaborators:
//!
//! - [`AgentSnapshot`] and the agent type/status enums describing a unit of
//!   analytical capability and its load/performance state
//! - [`Task`], the orchestrated unit of work, with its explicit state
//!   machine (pending, running, completed, failed, cancelled)
//! - [`Opinion`], one agent's contribution to a task, and
//!   [`SynthesisResult`], the merged outcome
//! - [`Context`], the key-value execution context passed to producers
//! - the collaborator boundary traits: [`Store`] (persistence),
//!   [`AnalysisProducer`] (pluggable analysis capability), [`Notifier`]
//!   (fire-and-forget events) and [`Clock`]
//!
//! The orchestration machinery itself (registry, selector, strategies,
//! aggregation, scheduling) lives in `analyst-engine` and
//! `analyst-scheduler`.

pub mod agent;
pub mod collab;
pub mod context;
pub mod error;
pub mod opinion;
pub mod synthesis;
pub mod task;

pub use agent::{AgentSnapshot, AgentStatus, AgentType};
pub use collab::{AnalysisProducer, Clock, Notifier, NoopNotifier, ProducerOutput, Store, SystemClock, TaskEvent};
pub use context::Context;
pub use error::{Error, Result};
pub use opinion::{Opinion, ParticipantFailure};
pub use synthesis::{ConsensusLevel, SynthesisResult};
pub use task::{AnalysisDepth, ExecutionMode, Task, TaskKind, TaskSpec, TaskStatus};
