//! Opinion types
//!
//! An [`Opinion`] is one agent's contribution within a task or session.
//! Opinions are created once per agent per round and appended to the
//! owning task's log; they are never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentType;

/// One agent's contribution to a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opinion {
    pub agent_id: String,
    pub agent_type: AgentType,
    pub content: String,
    pub reasoning: String,
    /// Always in [0, 1]; clamped at construction
    pub confidence: f64,
    /// Debate round this opinion belongs to; 1 for single-round modes
    pub round: u32,
    pub created_at: DateTime<Utc>,
}

impl Opinion {
    pub fn new(
        agent_id: impl Into<String>,
        agent_type: AgentType,
        content: impl Into<String>,
        reasoning: impl Into<String>,
        confidence: f64,
        round: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_type,
            content: content.into(),
            reasoning: reasoning.into(),
            confidence: confidence.clamp(0.0, 1.0),
            round,
            created_at: now,
        }
    }
}

/// A participant that failed during a strategy run
///
/// Partial failures are data, not errors: strategies record them and keep
/// going, and callers inspect the list alongside the opinions produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantFailure {
    pub agent_id: String,
    pub error: String,
    pub round: u32,
}

impl ParticipantFailure {
    pub fn new(agent_id: impl Into<String>, error: impl Into<String>, round: u32) -> Self {
        Self {
            agent_id: agent_id.into(),
            error: error.into(),
            round,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        let high = Opinion::new("a", AgentType::Risk, "c", "r", 1.7, 1, Utc::now());
        assert!((high.confidence - 1.0).abs() < f64::EPSILON);

        let low = Opinion::new("a", AgentType::Risk, "c", "r", -0.2, 1, Utc::now());
        assert!(low.confidence.abs() < f64::EPSILON);
    }
}
