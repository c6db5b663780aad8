//! Orchestration facade
//!
//! The [`Orchestrator`] ties the engine together: it owns the agent
//! registry, the task manager, the producer table, the shared worker pool,
//! and the result cache, and drives a task from `Running` to a terminal
//! state. Faults during execution - selection failures, timeouts, every
//! participant failing, persistence outages - are converted into a `fail`
//! transition at this boundary; they never leave a task stuck in `Running`.

use std::collections::HashMap;
use std::sync::Arc;

use analyst_core::{
    AgentSnapshot, AgentType, AnalysisProducer, Clock, Error, ExecutionMode, Notifier,
    NoopNotifier, Result, Store, SynthesisResult, SystemClock, Task, TaskSpec,
};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::aggregator::Synthesizer;
use crate::cache::ResultCache;
use crate::config::EngineConfig;
use crate::lifecycle::TaskManager;
use crate::pool::WorkerPool;
use crate::registry::{AgentRegistry, RegisteredAgent};
use crate::selector::AgentSelector;
use crate::strategies::{
    DebateStrategy, ExecutionStrategy, ParallelAnalysis, ParticipantRunner, RunControl,
    SequentialPipeline,
};

/// How a driven task ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The task completed and this is its synthesized result
    Completed(SynthesisResult),
    /// The task was cancelled while work was in flight; any produced
    /// opinions were discarded
    Cancelled,
}

/// The orchestration engine
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    tasks: Arc<TaskManager>,
    producers: Arc<HashMap<AgentType, Arc<dyn AnalysisProducer>>>,
    pool: Arc<WorkerPool>,
    cache: ResultCache,
    synthesizer: Synthesizer,
    selector: AgentSelector,
    store: Arc<dyn Store>,
    config: EngineConfig,
}

impl Orchestrator {
    /// Create a new orchestrator builder
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Register an agent and persist its initial snapshot
    ///
    /// If the snapshot cannot be stored the agent is deactivated again so
    /// registry and store stay consistent.
    pub async fn register_agent(
        &self,
        id: impl Into<String>,
        agent_type: AgentType,
        max_concurrency: u32,
    ) -> Result<AgentSnapshot> {
        let agent = self.registry.register(id, agent_type, max_concurrency)?;
        let snapshot = agent.snapshot();
        if let Err(err) = self.store.put_agent(&snapshot).await {
            warn!(agent_id = %snapshot.id, %err, "Deactivating agent after failed persist");
            self.registry.deactivate(&snapshot.id)?;
            return Err(err);
        }
        Ok(snapshot)
    }

    /// Create a task from a spec; it stays `Pending` until [`Self::run`]
    pub async fn submit(&self, spec: TaskSpec) -> Result<Task> {
        self.tasks.create(spec).await
    }

    /// Drive a pending task to a terminal state
    ///
    /// `InvalidTransition` and `Unauthorized` are caller contract errors
    /// and are returned without touching the task; any fault after the
    /// task entered `Running` is recorded via `fail` before this returns.
    pub async fn run(&self, task_id: &str) -> Result<RunOutcome> {
        self.tasks.start(task_id).await?;

        match self.drive(task_id).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if self.tasks.is_cancelled(task_id).await {
                    // The error lost a race against a cancellation; the
                    // cancellation wins and the error is moot
                    return Ok(RunOutcome::Cancelled);
                }
                let reason = err.to_string();
                if let Err(fail_err) = self.tasks.fail(task_id, &reason).await {
                    debug!(task_id, %fail_err, "Failure transition not recorded");
                }
                Err(err)
            }
        }
    }

    /// Submit-and-run convenience for scheduler triggers
    pub async fn submit_and_run(&self, spec: TaskSpec) -> Result<RunOutcome> {
        let task = self.submit(spec).await?;
        self.run(&task.id).await
    }

    /// Wait for a batch of dispatched analyses to finish
    pub async fn run_batch(&self, task_ids: &[String]) -> Vec<(String, Result<RunOutcome>)> {
        let runs = task_ids.iter().map(|id| async move {
            let outcome = self.run(id).await;
            (id.clone(), outcome)
        });
        join_all(runs).await
    }

    async fn drive(&self, task_id: &str) -> Result<RunOutcome> {
        let task = self.tasks.get(task_id).await?;
        let control = RunControl::new(Arc::clone(&self.tasks), task_id);
        control.update_progress(5, "resolving participants").await;

        let participants = self.resolve_participants(&task)?;
        let runner = ParticipantRunner::new(
            participants,
            Arc::clone(&self.producers),
            Arc::clone(&self.pool),
            self.config.agent_timeout,
            control,
        );

        let strategy = self.strategy_for(&task);
        let mut context = task.context.clone();
        if context.requested_by().is_none() {
            context = context.with_requested_by(task.owner.clone());
        }

        let outcome = tokio::time::timeout(
            self.config.session_timeout,
            strategy.execute(&runner, &task.topic, &context, task.rounds),
        )
        .await
        .map_err(|_| Error::SessionTimeout {
            task_id: task_id.to_string(),
            timeout_ms: self.config.session_timeout.as_millis() as u64,
        })??;

        if self.tasks.is_cancelled(task_id).await {
            info!(task_id, "Task cancelled mid-flight, discarding opinions");
            return Ok(RunOutcome::Cancelled);
        }

        self.tasks
            .record_outcome(task_id, outcome.opinions.clone(), outcome.failures.clone())
            .await?;

        let result = self
            .synthesizer
            .synthesize(&outcome.opinions, &outcome.failures)?;
        self.tasks.complete(task_id, result.clone()).await?;
        self.cache.insert(task_id, result.clone()).await;

        info!(
            task_id,
            participants = result.participants,
            consensus = %result.consensus,
            "Task completed"
        );
        Ok(RunOutcome::Completed(result))
    }

    /// Resolve the task's participant ids against the registry
    ///
    /// Single-agent mode treats the participant list as a candidate pool
    /// and lets the selector pick; the other modes run the full roster.
    fn resolve_participants(&self, task: &Task) -> Result<Vec<Arc<RegisteredAgent>>> {
        let mut resolved = Vec::with_capacity(task.participants.len());
        for id in &task.participants {
            resolved.push(self.registry.get(id)?);
        }

        if task.mode == ExecutionMode::SingleAgent {
            let snapshots: Vec<AgentSnapshot> = resolved.iter().map(|a| a.snapshot()).collect();
            let chosen = self.selector.select(&snapshots, true)?.id.clone();
            resolved.retain(|a| a.id() == chosen);
        }
        Ok(resolved)
    }

    fn strategy_for(&self, task: &Task) -> Box<dyn ExecutionStrategy> {
        match task.mode {
            ExecutionMode::SingleAgent | ExecutionMode::Parallel => Box::new(ParallelAnalysis::new()),
            ExecutionMode::Sequential => Box::new(SequentialPipeline::new()),
            ExecutionMode::StructuredDebate => Box::new(DebateStrategy::structured(
                self.config.debate_consensus_threshold,
            )),
            ExecutionMode::ConsensusBuilding => Box::new(DebateStrategy::consensus_building(
                task.consensus_target
                    .unwrap_or(self.config.debate_consensus_threshold),
            )),
        }
    }

    /// Shared agent registry
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Task manager (cancel, retry, progress, history)
    pub fn tasks(&self) -> &Arc<TaskManager> {
        &self.tasks
    }

    /// TTL cache of synthesized results
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Agent types with a registered producer
    pub fn producer_types(&self) -> Vec<AgentType> {
        let mut types: Vec<AgentType> = self.producers.keys().copied().collect();
        types.sort_by_key(|t| t.label());
        types
    }
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    store: Option<Arc<dyn Store>>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    producers: HashMap<AgentType, Arc<dyn AnalysisProducer>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            notifier: Arc::new(NoopNotifier),
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
            producers: HashMap::new(),
        }
    }

    /// Set the persistence collaborator (required)
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the notification collaborator
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Set the time source
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an analysis producer; one per agent type, last wins
    pub fn producer(mut self, producer: Arc<dyn AnalysisProducer>) -> Self {
        self.producers.insert(producer.agent_type(), producer);
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if the store is not set or the configuration is
    /// invalid
    pub fn build(self) -> Result<Orchestrator> {
        let store = self
            .store
            .ok_or_else(|| Error::Config("store not set".to_string()))?;
        self.config.validate()?;

        let registry = Arc::new(AgentRegistry::new());
        let tasks = Arc::new(TaskManager::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            self.notifier,
            self.clock,
        ));

        Ok(Orchestrator {
            registry,
            tasks,
            producers: Arc::new(self.producers),
            pool: Arc::new(WorkerPool::new(self.config.worker_pool_size)),
            cache: ResultCache::new(self.config.result_cache_ttl),
            synthesizer: Synthesizer::from_config(&self.config),
            selector: AgentSelector::new(),
            store,
            config: self.config,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
