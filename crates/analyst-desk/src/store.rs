//! In-memory persistence
//!
//! Reference implementation of the [`Store`] boundary, used by the CLI
//! and by integration tests. Swap it for a database-backed store without
//! touching the engine.

use std::collections::HashMap;

use analyst_core::{
    AgentSnapshot, AgentStatus, AgentType, Result, Store, SynthesisResult, Task,
};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Keeps every record in process memory
#[derive(Default)]
pub struct InMemoryStore {
    agents: RwLock<HashMap<String, AgentSnapshot>>,
    tasks: RwLock<HashMap<String, Task>>,
    results: RwLock<HashMap<String, SynthesisResult>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tasks
    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Stored result for a task, if any
    pub async fn result_for(&self, task_id: &str) -> Option<SynthesisResult> {
        self.results.read().await.get(task_id).cloned()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn put_agent(&self, agent: &AgentSnapshot) -> Result<()> {
        self.agents
            .write()
            .await
            .insert(agent.id.clone(), agent.clone());
        Ok(())
    }

    async fn get_agent(&self, id: &str) -> Result<Option<AgentSnapshot>> {
        Ok(self.agents.read().await.get(id).cloned())
    }

    async fn active_agents_by_type(&self, agent_type: AgentType) -> Result<Vec<AgentSnapshot>> {
        let mut matches: Vec<AgentSnapshot> = self
            .agents
            .read()
            .await
            .values()
            .filter(|a| a.agent_type == agent_type && a.status == AgentStatus::Active)
            .cloned()
            .collect();
        matches.sort_by_key(|a| a.seq);
        Ok(matches)
    }

    async fn put_task(&self, task: &Task) -> Result<()> {
        self.tasks
            .write()
            .await
            .insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.tasks.read().await.get(id).cloned())
    }

    async fn put_result(&self, task_id: &str, result: &SynthesisResult) -> Result<()> {
        self.results
            .write()
            .await
            .insert(task_id.to_string(), result.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_core::{TaskKind, TaskSpec};
    use chrono::Utc;

    fn snapshot(id: &str, agent_type: AgentType, status: AgentStatus, seq: u64) -> AgentSnapshot {
        AgentSnapshot {
            id: id.to_string(),
            agent_type,
            status,
            current_concurrency: 0,
            max_concurrency: 2,
            total_tasks: 0,
            completed_tasks: 0,
            failed_tasks: 0,
            avg_response_ms: 0.0,
            avg_confidence: 0.5,
            accuracy: 0.5,
            last_active: Utc::now(),
            seq,
        }
    }

    #[tokio::test]
    async fn test_agent_round_trip() {
        let store = InMemoryStore::new();
        store
            .put_agent(&snapshot("a", AgentType::Risk, AgentStatus::Active, 0))
            .await
            .unwrap();

        let loaded = store.get_agent("a").await.unwrap().unwrap();
        assert_eq!(loaded.agent_type, AgentType::Risk);
        assert!(store.get_agent("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_by_type_filters_status_and_type() {
        let store = InMemoryStore::new();
        store
            .put_agent(&snapshot("r-1", AgentType::Risk, AgentStatus::Active, 0))
            .await
            .unwrap();
        store
            .put_agent(&snapshot("r-2", AgentType::Risk, AgentStatus::Error, 1))
            .await
            .unwrap();
        store
            .put_agent(&snapshot("t-1", AgentType::Technical, AgentStatus::Active, 2))
            .await
            .unwrap();

        let active = store.active_agents_by_type(AgentType::Risk).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "r-1");
    }

    #[tokio::test]
    async fn test_task_round_trip() {
        let store = InMemoryStore::new();
        let task = Task::from_spec(
            TaskSpec::collaboration(
                "topic",
                TaskKind::Research,
                vec!["a".to_string()],
                "owner",
            ),
            Utc::now(),
        )
        .unwrap();

        store.put_task(&task).await.unwrap();
        let loaded = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(loaded.topic, "topic");
        assert_eq!(store.task_count().await, 1);
    }
}
