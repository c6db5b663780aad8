//! Task lifecycle management
//!
//! The [`TaskManager`] owns every live and historical task and serializes
//! transitions per task id: each task sits behind its own async mutex, so
//! two competing transitions (say a concurrent `cancel` and `complete`)
//! can never both succeed.
//!
//! Persistence is write-ahead: the next state is validated on a clone,
//! written to the store, and only then committed in memory. A store
//! failure surfaces as `PersistenceUnavailable` and leaves the in-memory
//! task exactly where it was.

use std::collections::HashMap;
use std::sync::Arc;

use analyst_core::{
    Clock, Error, Notifier, Opinion, ParticipantFailure, Result, Store, SynthesisResult, Task,
    TaskEvent, TaskSpec, TaskStatus,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::registry::AgentRegistry;

/// Owns task state and enforces the lifecycle state machine
pub struct TaskManager {
    tasks: RwLock<HashMap<String, Arc<Mutex<Task>>>>,
    registry: Arc<AgentRegistry>,
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl TaskManager {
    pub fn new(
        registry: Arc<AgentRegistry>,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            registry,
            store,
            notifier,
            clock,
        }
    }

    async fn entry(&self, task_id: &str) -> Result<Arc<Mutex<Task>>> {
        self.tasks
            .read()
            .await
            .get(task_id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
    }

    /// Create a task from a validated spec
    pub async fn create(&self, spec: TaskSpec) -> Result<Task> {
        let task = Task::from_spec(spec, self.clock.now())?;
        self.store.put_task(&task).await?;

        self.tasks
            .write()
            .await
            .insert(task.id.clone(), Arc::new(Mutex::new(task.clone())));

        self.notifier.notify(&TaskEvent::Created {
            task_id: task.id.clone(),
            topic: task.topic.clone(),
        });
        debug!(task_id = %task.id, priority = task.priority, "Task created");
        Ok(task)
    }

    /// `Pending -> Running`; counts an attempt against every participant
    pub async fn start(&self, task_id: &str) -> Result<()> {
        let entry = self.entry(task_id).await?;
        let mut guard = entry.lock().await;

        let mut next = guard.clone();
        next.start(self.clock.now())?;
        self.store.put_task(&next).await?;
        *guard = next;

        for participant in &guard.participants {
            match self.registry.get(participant) {
                Ok(agent) => agent.record_task_attempt(),
                Err(_) => warn!(task_id, agent_id = %participant, "Participant not in registry"),
            }
        }
        Ok(())
    }

    /// Record progress on a running task; the stored percentage never
    /// decreases
    pub async fn update_progress(&self, task_id: &str, percent: u8, step: &str) -> Result<()> {
        let entry = self.entry(task_id).await?;
        let mut guard = entry.lock().await;

        let mut next = guard.clone();
        next.update_progress(percent, step)?;
        self.store.put_task(&next).await?;
        *guard = next;

        self.notifier.notify(&TaskEvent::Progress {
            task_id: task_id.to_string(),
            percent: guard.progress,
            step: guard.current_step.clone(),
        });
        Ok(())
    }

    /// Append a strategy run's opinions and partial failures to the task log
    pub async fn record_outcome(
        &self,
        task_id: &str,
        opinions: Vec<Opinion>,
        failures: Vec<ParticipantFailure>,
    ) -> Result<()> {
        let entry = self.entry(task_id).await?;
        let mut guard = entry.lock().await;

        if guard.status != TaskStatus::Running {
            return Err(Error::InvalidTransition {
                from: guard.status,
                to: TaskStatus::Running,
            });
        }
        let mut next = guard.clone();
        next.opinions.extend(opinions);
        next.partial_failures.extend(failures);
        self.store.put_task(&next).await?;
        *guard = next;
        Ok(())
    }

    /// `Running -> Completed`, storing the synthesized result
    pub async fn complete(&self, task_id: &str, result: SynthesisResult) -> Result<()> {
        let entry = self.entry(task_id).await?;
        let mut guard = entry.lock().await;

        let mut next = guard.clone();
        next.complete(result.clone(), self.clock.now())?;
        self.store.put_result(task_id, &result).await?;
        self.store.put_task(&next).await?;
        *guard = next;

        for participant in &guard.participants {
            if let Ok(agent) = self.registry.get(participant) {
                agent.record_task_completed();
            }
        }
        self.notifier.notify(&TaskEvent::Completed {
            task_id: task_id.to_string(),
            consensus: result.consensus,
            confidence: result.confidence,
        });
        Ok(())
    }

    /// `Running -> Failed`, recording the reason
    pub async fn fail(&self, task_id: &str, reason: &str) -> Result<()> {
        let entry = self.entry(task_id).await?;
        let mut guard = entry.lock().await;

        let mut next = guard.clone();
        next.fail(reason, self.clock.now())?;
        self.store.put_task(&next).await?;
        *guard = next;

        for participant in &guard.participants {
            if let Ok(agent) = self.registry.get(participant) {
                agent.record_task_failed();
            }
        }
        self.notifier.notify(&TaskEvent::Failed {
            task_id: task_id.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// Cancel a pending or running task; owner only
    pub async fn cancel(&self, task_id: &str, requester: &str) -> Result<()> {
        let entry = self.entry(task_id).await?;
        let mut guard = entry.lock().await;

        let mut next = guard.clone();
        next.cancel(requester, self.clock.now())?;
        self.store.put_task(&next).await?;
        *guard = next;

        self.notifier.notify(&TaskEvent::Cancelled {
            task_id: task_id.to_string(),
            by: requester.to_string(),
        });
        Ok(())
    }

    /// `Failed -> Pending`, bounded by the task's retry limit
    pub async fn retry(&self, task_id: &str) -> Result<()> {
        let entry = self.entry(task_id).await?;
        let mut guard = entry.lock().await;

        let mut next = guard.clone();
        next.retry()?;
        self.store.put_task(&next).await?;
        *guard = next;
        debug!(task_id, retry_count = guard.retry_count, "Task reset for retry");
        Ok(())
    }

    /// Current copy of a task
    pub async fn get(&self, task_id: &str) -> Result<Task> {
        let entry = self.entry(task_id).await?;
        let guard = entry.lock().await;
        Ok(guard.clone())
    }

    /// Current status of a task
    pub async fn status(&self, task_id: &str) -> Result<TaskStatus> {
        Ok(self.get(task_id).await?.status)
    }

    /// Whether a task has been cancelled; unknown tasks count as cancelled
    /// so in-flight work for them stops at the next suspension point
    pub async fn is_cancelled(&self, task_id: &str) -> bool {
        matches!(
            self.status(task_id).await,
            Ok(TaskStatus::Cancelled) | Err(_)
        )
    }

    /// Ids of all retained tasks (live and historical)
    pub async fn task_ids(&self) -> Vec<String> {
        self.tasks.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_core::{
        AgentSnapshot, AgentType, AnalysisDepth, ConsensusLevel, ExecutionMode, NoopNotifier,
        SystemClock, TaskKind,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Store that remembers writes and can be told to fail the next one
    struct MemStore {
        tasks: std::sync::Mutex<HashMap<String, Task>>,
        fail_next: AtomicBool,
    }

    impl MemStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                tasks: std::sync::Mutex::new(HashMap::new()),
                fail_next: AtomicBool::new(false),
            })
        }

        fn stored_status(&self, task_id: &str) -> Option<TaskStatus> {
            self.tasks
                .lock()
                .unwrap()
                .get(task_id)
                .map(|t| t.status)
        }
    }

    #[async_trait]
    impl Store for MemStore {
        async fn put_agent(&self, _agent: &AgentSnapshot) -> Result<()> {
            Ok(())
        }
        async fn get_agent(&self, _id: &str) -> Result<Option<AgentSnapshot>> {
            Ok(None)
        }
        async fn active_agents_by_type(
            &self,
            _agent_type: AgentType,
        ) -> Result<Vec<AgentSnapshot>> {
            Ok(vec![])
        }
        async fn put_task(&self, task: &Task) -> Result<()> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(Error::PersistenceUnavailable("disk gone".to_string()));
            }
            self.tasks
                .lock()
                .unwrap()
                .insert(task.id.clone(), task.clone());
            Ok(())
        }
        async fn get_task(&self, id: &str) -> Result<Option<Task>> {
            Ok(self.tasks.lock().unwrap().get(id).cloned())
        }
        async fn put_result(&self, _task_id: &str, _result: &SynthesisResult) -> Result<()> {
            Ok(())
        }
    }

    fn spec(participants: Vec<&str>) -> TaskSpec {
        TaskSpec {
            topic: "semis outlook".to_string(),
            kind: TaskKind::Research,
            mode: ExecutionMode::Parallel,
            depth: AnalysisDepth::Standard,
            participants: participants.into_iter().map(String::from).collect(),
            owner: "desk".to_string(),
            rounds: 1,
            retry_limit: 2,
            consensus_target: None,
            context: analyst_core::Context::new(),
        }
    }

    fn result() -> SynthesisResult {
        SynthesisResult {
            confidence: 0.75,
            consensus: ConsensusLevel::Medium,
            participants: 1,
            key_insights: vec![],
            summary: "done".to_string(),
            generated_at: Utc::now(),
        }
    }

    fn manager_with(store: Arc<MemStore>) -> (TaskManager, Arc<AgentRegistry>) {
        let registry = Arc::new(AgentRegistry::new());
        registry.register("t-1", AgentType::Technical, 2).unwrap();
        let manager = TaskManager::new(
            Arc::clone(&registry),
            store,
            Arc::new(NoopNotifier),
            Arc::new(SystemClock),
        );
        (manager, registry)
    }

    #[tokio::test]
    async fn test_full_lifecycle_updates_counters() {
        let store = MemStore::new();
        let (manager, registry) = manager_with(Arc::clone(&store));

        let task = manager.create(spec(vec!["t-1"])).await.unwrap();
        manager.start(&task.id).await.unwrap();
        manager.update_progress(&task.id, 40, "running").await.unwrap();
        manager.complete(&task.id, result()).await.unwrap();

        let agent = registry.get("t-1").unwrap().snapshot();
        assert_eq!(agent.total_tasks, 1);
        assert_eq!(agent.completed_tasks, 1);
        assert_eq!(store.stored_status(&task.id), Some(TaskStatus::Completed));
    }

    #[tokio::test]
    async fn test_failure_updates_failed_counter() {
        let store = MemStore::new();
        let (manager, registry) = manager_with(store);

        let task = manager.create(spec(vec!["t-1"])).await.unwrap();
        manager.start(&task.id).await.unwrap();
        manager.fail(&task.id, "producer down").await.unwrap();

        let agent = registry.get("t-1").unwrap().snapshot();
        assert_eq!(agent.failed_tasks, 1);
        let task = manager.get(&task.id).await.unwrap();
        assert_eq!(task.failure_reason.as_deref(), Some("producer down"));
    }

    #[tokio::test]
    async fn test_store_failure_rolls_back_transition() {
        let store = MemStore::new();
        let (manager, _registry) = manager_with(Arc::clone(&store));

        let task = manager.create(spec(vec!["t-1"])).await.unwrap();

        store.fail_next.store(true, Ordering::SeqCst);
        let err = manager.start(&task.id).await.unwrap_err();
        assert!(matches!(err, Error::PersistenceUnavailable(_)));

        // In-memory and stored state both still pending
        assert_eq!(manager.status(&task.id).await.unwrap(), TaskStatus::Pending);
        assert_eq!(store.stored_status(&task.id), Some(TaskStatus::Pending));

        // The transition can be replayed once the store recovers
        manager.start(&task.id).await.unwrap();
        assert_eq!(manager.status(&task.id).await.unwrap(), TaskStatus::Running);
    }

    #[tokio::test]
    async fn test_concurrent_cancel_and_complete_cannot_both_win() {
        let store = MemStore::new();
        let (manager, _registry) = manager_with(store);
        let manager = Arc::new(manager);

        let task = manager.create(spec(vec!["t-1"])).await.unwrap();
        manager.start(&task.id).await.unwrap();

        let cancel = {
            let manager = Arc::clone(&manager);
            let id = task.id.clone();
            tokio::spawn(async move { manager.cancel(&id, "desk").await })
        };
        let complete = {
            let manager = Arc::clone(&manager);
            let id = task.id.clone();
            tokio::spawn(async move { manager.complete(&id, result()).await })
        };

        let outcomes = [cancel.await.unwrap(), complete.await.unwrap()];
        let wins = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);

        let status = manager.status(&task.id).await.unwrap();
        assert!(matches!(
            status,
            TaskStatus::Cancelled | TaskStatus::Completed
        ));
    }

    #[tokio::test]
    async fn test_cancel_requires_ownership() {
        let store = MemStore::new();
        let (manager, _registry) = manager_with(store);

        let task = manager.create(spec(vec!["t-1"])).await.unwrap();
        let err = manager.cancel(&task.id, "someone-else").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized { .. }));

        manager.cancel(&task.id, "desk").await.unwrap();
        assert!(manager.is_cancelled(&task.id).await);
    }

    #[tokio::test]
    async fn test_retry_cycle_matches_bound() {
        let store = MemStore::new();
        let (manager, _registry) = manager_with(store);

        let task = manager.create(spec(vec!["t-1"])).await.unwrap();

        for _ in 0..2 {
            manager.start(&task.id).await.unwrap();
            manager.fail(&task.id, "flaky").await.unwrap();
            manager.retry(&task.id).await.unwrap();
        }
        manager.start(&task.id).await.unwrap();
        manager.fail(&task.id, "flaky").await.unwrap();

        let err = manager.retry(&task.id).await.unwrap_err();
        assert!(matches!(err, Error::RetryExhausted { retry_limit: 2, .. }));
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let store = MemStore::new();
        let (manager, _registry) = manager_with(store);
        assert!(matches!(
            manager.start("nope").await.unwrap_err(),
            Error::TaskNotFound(_)
        ));
    }
}
