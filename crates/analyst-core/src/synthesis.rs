//! Synthesized outcome types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categorical agreement level across participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusLevel {
    High,
    Medium,
    Low,
    /// No opinions were available to measure agreement on
    Error,
}

impl ConsensusLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ConsensusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The merged outcome of a task: one result built from all opinions
///
/// Created once at the terminal `Completed` transition and immutable
/// thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisResult {
    /// Arithmetic mean of participant confidences
    pub confidence: f64,
    pub consensus: ConsensusLevel,
    /// Number of opinions that fed the synthesis
    pub participants: usize,
    /// Extracted key insights, insertion order, capped by the engine config
    pub key_insights: Vec<String>,
    /// Free-text synthesis, one paragraph per agent type plus a closing
    /// recommendation
    pub summary: String,
    pub generated_at: DateTime<Utc>,
}
