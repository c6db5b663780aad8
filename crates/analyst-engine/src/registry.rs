//! Agent registry
//!
//! The registry is the shared read/write record of every known agent: its
//! capability type, status, concurrency budget, and rolling performance
//! counters. Entries are mutated concurrently by many task executions, so
//! the hot counter (`in_flight`) is atomic and the remaining stats sit
//! behind a short-lived mutex per agent.
//!
//! Concurrency accounting uses a scoped lease: [`RegisteredAgent::try_lease`]
//! increments the in-flight count and the returned [`AgentLease`] decrements
//! it on drop, so the decrement cannot be skipped on any exit path -
//! success, failure, or cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use analyst_core::{AgentSnapshot, AgentStatus, AgentType, Error, Result};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Mutable per-agent statistics, guarded by the entry's mutex
#[derive(Debug, Clone)]
struct AgentStats {
    status: AgentStatus,
    total_tasks: u64,
    completed_tasks: u64,
    failed_tasks: u64,
    avg_response_ms: f64,
    response_samples: u64,
    avg_confidence: f64,
    confidence_samples: u64,
    accuracy: f64,
    last_active: DateTime<Utc>,
}

/// A live registry entry for one agent
pub struct RegisteredAgent {
    id: String,
    agent_type: AgentType,
    max_concurrency: u32,
    seq: u64,
    in_flight: AtomicU32,
    stats: Mutex<AgentStats>,
}

impl RegisteredAgent {
    fn new(
        id: String,
        agent_type: AgentType,
        max_concurrency: u32,
        seq: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            agent_type,
            max_concurrency,
            seq,
            in_flight: AtomicU32::new(0),
            stats: Mutex::new(AgentStats {
                status: AgentStatus::Active,
                total_tasks: 0,
                completed_tasks: 0,
                failed_tasks: 0,
                avg_response_ms: 0.0,
                response_samples: 0,
                avg_confidence: 0.5,
                confidence_samples: 0,
                accuracy: 0.5,
                last_active: now,
            }),
        }
    }

    fn stats(&self) -> MutexGuard<'_, AgentStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    pub fn status(&self) -> AgentStatus {
        self.stats().status
    }

    pub fn set_status(&self, status: AgentStatus) {
        self.stats().status = status;
    }

    /// Units of work currently leased to this agent
    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Try to lease one unit of concurrency
    ///
    /// Returns `None` when the agent is already at its maximum. On success
    /// the agent's last-active time is refreshed and the lease must be held
    /// for the duration of the call it covers.
    pub fn try_lease(self: &Arc<Self>) -> Option<AgentLease> {
        let mut current = self.in_flight.load(Ordering::SeqCst);
        loop {
            if current >= self.max_concurrency {
                return None;
            }
            match self.in_flight.compare_exchange(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
        self.stats().last_active = Utc::now();
        Some(AgentLease {
            agent: Arc::clone(self),
        })
    }

    fn release(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "lease released more than once");
    }

    /// Record one producer call's outcome into the rolling averages
    fn record_call(&self, elapsed: Duration, confidence: Option<f64>) {
        let mut stats = self.stats();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        stats.response_samples += 1;
        let n = stats.response_samples as f64;
        stats.avg_response_ms += (elapsed_ms - stats.avg_response_ms) / n;

        if let Some(confidence) = confidence {
            stats.confidence_samples += 1;
            let n = stats.confidence_samples as f64;
            stats.avg_confidence += (confidence - stats.avg_confidence) / n;
        }
        stats.last_active = Utc::now();
    }

    /// Fold an externally reviewed accuracy observation into the average
    pub fn record_accuracy(&self, observed: f64) {
        let mut stats = self.stats();
        stats.accuracy = (stats.accuracy + observed.clamp(0.0, 1.0)) / 2.0;
    }

    /// Count a task assignment against this agent
    pub fn record_task_attempt(&self) {
        self.stats().total_tasks += 1;
    }

    /// Count a task that reached `Completed`
    pub fn record_task_completed(&self) {
        self.stats().completed_tasks += 1;
    }

    /// Count a task that reached `Failed`
    pub fn record_task_failed(&self) {
        self.stats().failed_tasks += 1;
    }

    /// Immutable view of this entry
    ///
    /// A saturated active agent is reported as `Busy`; the stored status is
    /// otherwise passed through.
    pub fn snapshot(&self) -> AgentSnapshot {
        let stats = self.stats();
        let current = self.in_flight();
        let status = if stats.status == AgentStatus::Active && current >= self.max_concurrency {
            AgentStatus::Busy
        } else {
            stats.status
        };
        AgentSnapshot {
            id: self.id.clone(),
            agent_type: self.agent_type,
            status,
            current_concurrency: current,
            max_concurrency: self.max_concurrency,
            total_tasks: stats.total_tasks,
            completed_tasks: stats.completed_tasks,
            failed_tasks: stats.failed_tasks,
            avg_response_ms: stats.avg_response_ms,
            avg_confidence: stats.avg_confidence,
            accuracy: stats.accuracy,
            last_active: stats.last_active,
            seq: self.seq,
        }
    }
}

/// RAII concurrency lease for one agent
///
/// Dropping the lease releases the concurrency slot; recording the call's
/// outcome is a separate, explicit step so a cancelled caller that merely
/// drops the lease leaves the averages untouched.
pub struct AgentLease {
    agent: Arc<RegisteredAgent>,
}

impl AgentLease {
    pub fn agent(&self) -> &Arc<RegisteredAgent> {
        &self.agent
    }

    /// Record a successful producer call
    pub fn record_success(&self, elapsed: Duration, confidence: f64) {
        self.agent.record_call(elapsed, Some(confidence));
    }

    /// Record a failed or timed-out producer call
    pub fn record_failure(&self, elapsed: Duration) {
        self.agent.record_call(elapsed, None);
    }
}

impl Drop for AgentLease {
    fn drop(&mut self) {
        self.agent.release();
    }
}

/// Shared registry of known agents
///
/// Agents are never hard-deleted while referenced by task history; they are
/// deactivated instead.
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, Arc<RegisteredAgent>>>,
    next_seq: AtomicU64,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<RegisteredAgent>>> {
        self.agents.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new agent; ids must be unique
    pub fn register(
        &self,
        id: impl Into<String>,
        agent_type: AgentType,
        max_concurrency: u32,
    ) -> Result<Arc<RegisteredAgent>> {
        let id = id.into();
        if max_concurrency == 0 {
            return Err(Error::Config(format!(
                "agent '{id}' needs max_concurrency of at least 1"
            )));
        }

        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        if agents.contains_key(&id) {
            return Err(Error::Config(format!("agent '{id}' is already registered")));
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let agent = Arc::new(RegisteredAgent::new(
            id.clone(),
            agent_type,
            max_concurrency,
            seq,
            Utc::now(),
        ));
        agents.insert(id.clone(), Arc::clone(&agent));
        debug!(agent_id = %id, agent_type = %agent_type, "Agent registered");
        Ok(agent)
    }

    /// Look up an agent by id
    pub fn get(&self, id: &str) -> Result<Arc<RegisteredAgent>> {
        self.read_map()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::AgentNotFound(id.to_string()))
    }

    /// All live entries, registration order
    pub fn agents(&self) -> Vec<Arc<RegisteredAgent>> {
        let mut agents: Vec<_> = self.read_map().values().cloned().collect();
        agents.sort_by_key(|a| a.seq);
        agents
    }

    /// Snapshots of all agents, registration order
    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents().iter().map(|a| a.snapshot()).collect()
    }

    /// Active agents of the given type, registration order
    pub fn active_by_type(&self, agent_type: AgentType) -> Vec<Arc<RegisteredAgent>> {
        self.agents()
            .into_iter()
            .filter(|a| a.agent_type() == agent_type && a.status() == AgentStatus::Active)
            .collect()
    }

    /// Deactivate an agent (operator action; never auto-reversed)
    pub fn deactivate(&self, id: &str) -> Result<()> {
        self.get(id)?.set_status(AgentStatus::Inactive);
        Ok(())
    }

    /// Number of registered agents
    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    /// Whether no agents are registered
    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }
}
