//! Collaborator boundary traits
//!
//! The orchestration engine depends on four external collaborators, each
//! specified here at its boundary only: persistence ([`Store`]), the
//! pluggable analysis capability ([`AnalysisProducer`]), fire-and-forget
//! notifications ([`Notifier`]), and the time source ([`Clock`]).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentSnapshot, AgentType};
use crate::context::Context;
use crate::error::Result;
use crate::synthesis::{ConsensusLevel, SynthesisResult};
use crate::task::Task;

/// Persistence collaborator
///
/// All calls are fallible I/O that can fail independently of orchestration
/// logic. The task manager writes ahead: a state transition is applied
/// in memory only after the corresponding `put_task` succeeds, so stored
/// and in-memory state never diverge.
#[async_trait]
pub trait Store: Send + Sync {
    async fn put_agent(&self, agent: &AgentSnapshot) -> Result<()>;
    async fn get_agent(&self, id: &str) -> Result<Option<AgentSnapshot>>;
    /// Agents of the given type whose stored status is active
    async fn active_agents_by_type(&self, agent_type: AgentType) -> Result<Vec<AgentSnapshot>>;

    async fn put_task(&self, task: &Task) -> Result<()>;
    async fn get_task(&self, id: &str) -> Result<Option<Task>>;

    async fn put_result(&self, task_id: &str, result: &SynthesisResult) -> Result<()>;
}

/// Raw output of an analysis producer, before the engine stamps it into
/// an [`crate::Opinion`] with agent identity, round, and timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerOutput {
    pub content: String,
    pub reasoning: String,
    /// Clamped to [0, 1] when converted into an opinion
    pub confidence: f64,
}

/// Pluggable analysis capability, one implementation per agent type
///
/// The internal method (keyword heuristics, scraped data, template text,
/// a model call) is opaque to the engine. Producers may retry their own
/// transient fetch failures; the engine never retries a whole task
/// silently.
#[async_trait]
pub trait AnalysisProducer: Send + Sync {
    /// The capability this producer implements
    fn agent_type(&self) -> AgentType;

    /// Analyze the topic in the given context and return an opinion payload
    async fn produce(&self, topic: &str, context: &Context, round: u32)
    -> Result<ProducerOutput>;
}

/// Best-effort progress/result/error events, keyed by task id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskEvent {
    Created {
        task_id: String,
        topic: String,
    },
    Progress {
        task_id: String,
        percent: u8,
        step: String,
    },
    Completed {
        task_id: String,
        consensus: ConsensusLevel,
        confidence: f64,
    },
    Failed {
        task_id: String,
        reason: String,
    },
    Cancelled {
        task_id: String,
        by: String,
    },
}

/// Notification collaborator
///
/// Delivery is fire-and-forget from the engine's perspective: no
/// acknowledgement is awaited and no retry is owned by the core.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &TaskEvent);
}

/// A notifier that drops every event
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: &TaskEvent) {}
}

/// Time source collaborator, injectable so window and health logic are
/// deterministic under test
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation of [`Clock`]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
