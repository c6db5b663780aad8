//! Execution strategies
//!
//! A strategy runs a set of participants against a topic and produces raw
//! per-agent opinions. Strategies never raise on an individual agent's
//! failure: the failure is recorded in the outcome and the run proceeds
//! with the remaining agents. Only a run in which *zero* agents produce an
//! opinion fails, with `AllParticipantsFailed`.
//!
//! All producer calls go through the shared [`WorkerPool`] and carry a
//! per-call timeout; a timeout is recorded as that agent's failure.
//! Cancellation is observed at suspension points (fan-in, step and round
//! boundaries) - strategies return what they have and the orchestrator
//! discards it.

mod debate;
mod parallel;
mod sequential;

pub use debate::DebateStrategy;
pub use parallel::ParallelAnalysis;
pub use sequential::SequentialPipeline;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use analyst_core::{
    AnalysisProducer, AgentType, Context, Error, Opinion, ParticipantFailure, Result,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::lifecycle::TaskManager;
use crate::pool::WorkerPool;
use crate::registry::RegisteredAgent;

/// What a strategy run produced: the opinions it gathered and the
/// participants that failed along the way
#[derive(Debug, Default)]
pub struct StrategyOutcome {
    pub opinions: Vec<Opinion>,
    pub failures: Vec<ParticipantFailure>,
}

impl StrategyOutcome {
    /// Error when nothing was produced at all
    pub fn ensure_any_opinion(self, attempted: usize) -> Result<Self> {
        if self.opinions.is_empty() {
            Err(Error::AllParticipantsFailed { attempted })
        } else {
            Ok(self)
        }
    }
}

/// Handle into the owning task, used by strategies for progress reporting
/// and cancellation checks
#[derive(Clone)]
pub struct RunControl {
    manager: Arc<TaskManager>,
    task_id: String,
}

impl RunControl {
    pub fn new(manager: Arc<TaskManager>, task_id: impl Into<String>) -> Self {
        Self {
            manager,
            task_id: task_id.into(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Whether the owning task has been cancelled
    pub async fn is_cancelled(&self) -> bool {
        self.manager.is_cancelled(&self.task_id).await
    }

    /// Best-effort progress update; failures are logged and swallowed
    /// because the task may legitimately have left `Running` underneath us
    pub async fn update_progress(&self, percent: u8, step: &str) {
        if let Err(err) = self
            .manager
            .update_progress(&self.task_id, percent, step)
            .await
        {
            debug!(task_id = %self.task_id, %err, "Progress update dropped");
        }
    }
}

/// Runs individual participants for a strategy
///
/// The runner owns the per-run wiring: the resolved participant entries,
/// the producer for each agent type, the shared worker pool, and the
/// per-call timeout. Concurrency is leased per call and released on every
/// exit path via the lease guard.
pub struct ParticipantRunner {
    participants: Vec<Arc<RegisteredAgent>>,
    producers: Arc<HashMap<AgentType, Arc<dyn AnalysisProducer>>>,
    pool: Arc<WorkerPool>,
    agent_timeout: Duration,
    control: RunControl,
}

impl ParticipantRunner {
    pub fn new(
        participants: Vec<Arc<RegisteredAgent>>,
        producers: Arc<HashMap<AgentType, Arc<dyn AnalysisProducer>>>,
        pool: Arc<WorkerPool>,
        agent_timeout: Duration,
        control: RunControl,
    ) -> Self {
        Self {
            participants,
            producers,
            pool,
            agent_timeout,
            control,
        }
    }

    pub fn participants(&self) -> &[Arc<RegisteredAgent>] {
        &self.participants
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    /// Run one participant against the topic and convert the result into
    /// an opinion or a recorded failure
    pub async fn call(
        &self,
        agent: &Arc<RegisteredAgent>,
        topic: &str,
        context: &Context,
        round: u32,
    ) -> std::result::Result<Opinion, ParticipantFailure> {
        let Some(producer) = self.producers.get(&agent.agent_type()) else {
            return Err(ParticipantFailure::new(
                agent.id(),
                format!("no producer registered for {} agents", agent.agent_type()),
                round,
            ));
        };

        let Some(lease) = agent.try_lease() else {
            return Err(ParticipantFailure::new(
                agent.id(),
                "agent is at its concurrency limit",
                round,
            ));
        };

        let started = Instant::now();
        let outcome = self
            .pool
            .run(tokio::time::timeout(
                self.agent_timeout,
                producer.produce(topic, context, round),
            ))
            .await;

        match outcome {
            Ok(Ok(Ok(output))) => {
                lease.record_success(started.elapsed(), output.confidence.clamp(0.0, 1.0));
                Ok(Opinion::new(
                    agent.id(),
                    agent.agent_type(),
                    output.content,
                    output.reasoning,
                    output.confidence,
                    round,
                    Utc::now(),
                ))
            }
            Ok(Ok(Err(err))) => {
                lease.record_failure(started.elapsed());
                warn!(agent_id = %agent.id(), %err, "Producer call failed");
                Err(ParticipantFailure::new(agent.id(), err.to_string(), round))
            }
            Ok(Err(_)) => {
                lease.record_failure(started.elapsed());
                let err = Error::AgentTimeout {
                    agent_id: agent.id().to_string(),
                    timeout_ms: self.agent_timeout.as_millis() as u64,
                };
                warn!(agent_id = %agent.id(), "Producer call timed out");
                Err(ParticipantFailure::new(agent.id(), err.to_string(), round))
            }
            Err(err) => {
                lease.record_failure(started.elapsed());
                Err(ParticipantFailure::new(agent.id(), err.to_string(), round))
            }
        }
    }

    /// Fan all participants out concurrently and fan their results back in
    pub(crate) async fn fan_out(
        &self,
        topic: &str,
        context: &Context,
        round: u32,
    ) -> (Vec<Opinion>, Vec<ParticipantFailure>) {
        let calls = self
            .participants
            .iter()
            .map(|agent| self.call(agent, topic, context, round));

        let mut opinions = Vec::new();
        let mut failures = Vec::new();
        for result in join_all(calls).await {
            match result {
                Ok(opinion) => opinions.push(opinion),
                Err(failure) => failures.push(failure),
            }
        }
        (opinions, failures)
    }
}

/// Pluggable algorithm for running participants against a topic
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run the participants; `rounds` bounds the multi-round modes and is
    /// ignored by the single-round ones
    async fn execute(
        &self,
        runner: &ParticipantRunner,
        topic: &str,
        context: &Context,
        rounds: u32,
    ) -> Result<StrategyOutcome>;
}
