//! Agent capability model
//!
//! An agent is a typed unit of analytical capability with load and
//! performance state. The live registry entry (with its atomic in-flight
//! counter) lives in `analyst-engine`; this module defines the passive
//! shapes shared across crate boundaries: the type and status enums and
//! the immutable [`AgentSnapshot`] consumed by the selector, the scheduler
//! health sweep, and the persistence collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Analytical capability of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    Technical,
    Fundamental,
    Sentiment,
    Risk,
    Market,
    Decision,
    Monitoring,
}

impl AgentType {
    /// All capability types, in display order
    pub fn all() -> [AgentType; 7] {
        [
            Self::Technical,
            Self::Fundamental,
            Self::Sentiment,
            Self::Risk,
            Self::Market,
            Self::Decision,
            Self::Monitoring,
        ]
    }

    /// Human-readable label used in synthesis text and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Technical => "Technical",
            Self::Fundamental => "Fundamental",
            Self::Sentiment => "Sentiment",
            Self::Risk => "Risk",
            Self::Market => "Market",
            Self::Decision => "Decision",
            Self::Monitoring => "Monitoring",
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Operational status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    /// Eligible for selection
    Active,
    /// Deactivated by an operator; never selected, never auto-reactivated
    Inactive,
    /// Flagged unhealthy by the health sweep; reactivated once it recovers
    Error,
    /// Saturated at max concurrency
    Busy,
}

/// Immutable view of an agent's registry state
///
/// Snapshots are what the (pure) selector ranks and what the persistence
/// collaborator stores. The registration sequence number keeps selection
/// deterministic when every other key ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: String,
    pub agent_type: AgentType,
    pub status: AgentStatus,
    pub current_concurrency: u32,
    pub max_concurrency: u32,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    /// Rolling average response time across producer calls, in milliseconds
    pub avg_response_ms: f64,
    /// Rolling average confidence across produced opinions
    pub avg_confidence: f64,
    /// Rolling accuracy estimate fed back by downstream review
    pub accuracy: f64,
    pub last_active: DateTime<Utc>,
    /// Registration order, used as the final selection tie-break
    pub seq: u64,
}

impl AgentSnapshot {
    /// Fraction of the agent's concurrency budget currently in use
    pub fn load_rate(&self) -> f64 {
        if self.max_concurrency == 0 {
            return 1.0;
        }
        f64::from(self.current_concurrency) / f64::from(self.max_concurrency)
    }

    /// Completed / total, undefined until the agent has attempted a task
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_tasks == 0 {
            None
        } else {
            Some(self.completed_tasks as f64 / self.total_tasks as f64)
        }
    }

    /// Composite performance score in [0, 1]
    ///
    /// Weights: success rate 0.5, average confidence 0.3, accuracy 0.2.
    /// An agent with no history scores a neutral 0.5 on the success
    /// component so fresh agents are neither favored nor starved.
    pub fn performance_score(&self) -> f64 {
        let success = self.success_rate().unwrap_or(0.5);
        success * 0.5 + self.avg_confidence * 0.3 + self.accuracy * 0.2
    }

    /// Whether the selector may hand this agent more work
    pub fn is_available(&self) -> bool {
        self.status == AgentStatus::Active && self.current_concurrency < self.max_concurrency
    }
}
