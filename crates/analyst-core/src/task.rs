//! Task and session model
//!
//! A [`Task`] is the orchestrated unit of work. It generalizes single-agent
//! analysis tasks and multi-agent collaboration sessions into one shape:
//! a topic, an execution mode, a participant list, and an explicit status
//! state machine. Tasks own their opinion log and synthesized result;
//! agents are referenced by id only.
//!
//! The legality rules live here on the value itself so they are enforced
//! (and testable) independent of locking and persistence, which the
//! engine's task manager layers on top.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::opinion::{Opinion, ParticipantFailure};
use crate::synthesis::SynthesisResult;

/// Status of a task within its lifecycle
///
/// Transitions: `Pending -> Running -> {Completed, Failed}`,
/// `Pending|Running -> Cancelled`, and `Failed -> Pending` via a bounded
/// retry. Completed, Cancelled, and Failed-without-retry are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Whether no further transitions are possible (retry aside)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// How the participants are run against the topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// One agent, chosen from the participant pool by the selector
    SingleAgent,
    /// All participants fan out concurrently against the same topic
    Parallel,
    /// Participants run strictly one after another, each seeing prior opinions
    Sequential,
    /// Multi-round debate with early stop at the engine's consensus threshold
    StructuredDebate,
    /// Debate against a caller-supplied consensus target
    ConsensusBuilding,
}

/// What kind of work the task represents, used for priority scoring
/// and by the scheduler's recurring triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    MarketAnalysis,
    RiskAssessment,
    StrategyReview,
    Emergency,
    Research,
}

/// Requested depth of analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisDepth {
    Quick,
    Standard,
    Deep,
}

/// Specification for creating a task
///
/// Plain data; validation happens in [`Task::from_spec`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub topic: String,
    pub kind: TaskKind,
    pub mode: ExecutionMode,
    pub depth: AnalysisDepth,
    /// Agent ids; the candidate pool for `SingleAgent`, the full roster otherwise
    pub participants: Vec<String>,
    pub owner: String,
    /// Maximum debate rounds for the multi-round modes
    pub rounds: u32,
    pub retry_limit: u32,
    /// Consensus target for `ConsensusBuilding`, in (0, 1]
    pub consensus_target: Option<f64>,
    /// Caller-supplied execution context handed to every producer call
    pub context: Context,
}

impl TaskSpec {
    /// A standard-depth parallel collaboration with sensible defaults
    pub fn collaboration(
        topic: impl Into<String>,
        kind: TaskKind,
        participants: Vec<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            kind,
            mode: ExecutionMode::Parallel,
            depth: AnalysisDepth::Standard,
            participants,
            owner: owner.into(),
            rounds: 1,
            retry_limit: 1,
            consensus_target: None,
            context: Context::new(),
        }
    }

    /// Attach an execution context
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

/// Priority score for a task, clamped to [1, 10]
///
/// Base 5, adjusted by kind and requested depth.
pub fn priority_for(kind: TaskKind, depth: AnalysisDepth) -> u8 {
    let mut score: i8 = 5;
    score += match kind {
        TaskKind::Emergency => 3,
        TaskKind::RiskAssessment => 2,
        TaskKind::MarketAnalysis => 1,
        TaskKind::StrategyReview => 0,
        TaskKind::Research => -1,
    };
    score += match depth {
        AnalysisDepth::Deep => 2,
        AnalysisDepth::Standard => 0,
        AnalysisDepth::Quick => -1,
    };
    score.clamp(1, 10) as u8
}

/// The orchestrated unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub topic: String,
    pub kind: TaskKind,
    pub mode: ExecutionMode,
    pub depth: AnalysisDepth,
    pub participants: Vec<String>,
    pub owner: String,
    pub status: TaskStatus,
    /// Progress percentage, monotone non-decreasing while running
    pub progress: u8,
    pub current_step: String,
    pub priority: u8,
    pub rounds: u32,
    pub retry_count: u32,
    pub retry_limit: u32,
    pub consensus_target: Option<f64>,
    pub context: Context,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub cancelled_by: Option<String>,
    /// Opinion log, appended once per agent per round, never mutated
    pub opinions: Vec<Opinion>,
    /// Participants that failed during execution; informational, not fatal
    pub partial_failures: Vec<ParticipantFailure>,
    pub result: Option<SynthesisResult>,
}

impl Task {
    /// Validated factory: topic and participants must be non-empty,
    /// the consensus target (when present) must be in (0, 1]
    pub fn from_spec(spec: TaskSpec, now: DateTime<Utc>) -> Result<Self> {
        if spec.topic.trim().is_empty() {
            return Err(Error::InvalidSpec("topic must not be empty".to_string()));
        }
        if spec.participants.is_empty() {
            return Err(Error::InvalidSpec(
                "at least one participant is required".to_string(),
            ));
        }
        if spec.participants.iter().any(|p| p.trim().is_empty()) {
            return Err(Error::InvalidSpec(
                "participant ids must not be empty".to_string(),
            ));
        }
        if spec.owner.trim().is_empty() {
            return Err(Error::InvalidSpec("owner must not be empty".to_string()));
        }
        if spec.rounds == 0 {
            return Err(Error::InvalidSpec("rounds must be at least 1".to_string()));
        }
        if let Some(target) = spec.consensus_target {
            if !(target > 0.0 && target <= 1.0) {
                return Err(Error::InvalidSpec(format!(
                    "consensus target {target} is outside (0, 1]"
                )));
            }
        }

        let priority = priority_for(spec.kind, spec.depth);
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic: spec.topic,
            kind: spec.kind,
            mode: spec.mode,
            depth: spec.depth,
            participants: spec.participants,
            owner: spec.owner,
            status: TaskStatus::Pending,
            progress: 0,
            current_step: "created".to_string(),
            priority,
            rounds: spec.rounds,
            retry_count: 0,
            retry_limit: spec.retry_limit,
            consensus_target: spec.consensus_target,
            context: spec.context,
            created_at: now,
            started_at: None,
            completed_at: None,
            failure_reason: None,
            cancelled_by: None,
            opinions: Vec::new(),
            partial_failures: Vec::new(),
            result: None,
        })
    }

    fn illegal(&self, to: TaskStatus) -> Error {
        Error::InvalidTransition {
            from: self.status,
            to,
        }
    }

    /// `Pending -> Running`
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != TaskStatus::Pending {
            return Err(self.illegal(TaskStatus::Running));
        }
        if self.participants.is_empty() {
            return Err(Error::InvalidSpec(
                "cannot start a task with no participants".to_string(),
            ));
        }
        self.status = TaskStatus::Running;
        self.started_at = Some(now);
        self.current_step = "started".to_string();
        Ok(())
    }

    /// Record progress; legal only while running, never decreases
    pub fn update_progress(&mut self, percent: u8, step: impl Into<String>) -> Result<()> {
        if self.status != TaskStatus::Running {
            return Err(self.illegal(TaskStatus::Running));
        }
        self.progress = percent.min(100).max(self.progress);
        self.current_step = step.into();
        Ok(())
    }

    /// `Running -> Completed`, storing the synthesized result
    pub fn complete(&mut self, result: SynthesisResult, now: DateTime<Utc>) -> Result<()> {
        if self.status != TaskStatus::Running {
            return Err(self.illegal(TaskStatus::Completed));
        }
        self.status = TaskStatus::Completed;
        self.progress = 100;
        self.current_step = "completed".to_string();
        self.completed_at = Some(now);
        self.result = Some(result);
        Ok(())
    }

    /// `Running -> Failed`, recording the reason
    pub fn fail(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> Result<()> {
        if self.status != TaskStatus::Running {
            return Err(self.illegal(TaskStatus::Failed));
        }
        self.status = TaskStatus::Failed;
        self.current_step = "failed".to_string();
        self.completed_at = Some(now);
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// `Pending|Running -> Cancelled`, owner only
    pub fn cancel(&mut self, requester: &str, now: DateTime<Utc>) -> Result<()> {
        if requester != self.owner {
            return Err(Error::Unauthorized {
                actor: requester.to_string(),
                task_id: self.id.clone(),
            });
        }
        if self.status.is_terminal() {
            return Err(self.illegal(TaskStatus::Cancelled));
        }
        self.status = TaskStatus::Cancelled;
        self.current_step = "cancelled".to_string();
        self.completed_at = Some(now);
        self.cancelled_by = Some(requester.to_string());
        Ok(())
    }

    /// `Failed -> Pending`, bounded by the retry limit; clears partial state
    pub fn retry(&mut self) -> Result<()> {
        if self.status != TaskStatus::Failed {
            return Err(self.illegal(TaskStatus::Pending));
        }
        if self.retry_count >= self.retry_limit {
            return Err(Error::RetryExhausted {
                task_id: self.id.clone(),
                retry_limit: self.retry_limit,
            });
        }
        self.retry_count += 1;
        self.status = TaskStatus::Pending;
        self.progress = 0;
        self.current_step = "retry scheduled".to_string();
        self.started_at = None;
        self.completed_at = None;
        self.failure_reason = None;
        self.opinions.clear();
        self.partial_failures.clear();
        self.result = None;
        Ok(())
    }

    /// Whether a failed task may still be retried
    pub fn can_retry(&self) -> bool {
        self.status == TaskStatus::Failed && self.retry_count < self.retry_limit
    }
}
