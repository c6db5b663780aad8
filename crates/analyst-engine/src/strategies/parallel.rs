//! Parallel analysis strategy

use analyst_core::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::{ExecutionStrategy, ParticipantRunner, StrategyOutcome};

/// Fan every participant out concurrently against the same topic
///
/// No ordering is guaranteed between agents; the fan-in waits until every
/// call has finished or failed before the outcome is assembled. Used when
/// agents analyze independent facets of the topic, and by emergency
/// escalation for fastest turnaround.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelAnalysis;

impl ParallelAnalysis {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionStrategy for ParallelAnalysis {
    fn name(&self) -> &'static str {
        "parallel"
    }

    async fn execute(
        &self,
        runner: &ParticipantRunner,
        topic: &str,
        context: &Context,
        _rounds: u32,
    ) -> Result<StrategyOutcome> {
        let attempted = runner.participants().len();
        if runner.control().is_cancelled().await {
            return Ok(StrategyOutcome::default());
        }

        runner
            .control()
            .update_progress(20, "dispatching participants")
            .await;

        let (opinions, failures) = runner.fan_out(topic, context, 1).await;

        info!(
            task_id = %runner.control().task_id(),
            produced = opinions.len(),
            failed = failures.len(),
            "Parallel analysis finished"
        );
        runner.control().update_progress(80, "fan-in complete").await;

        StrategyOutcome { opinions, failures }.ensure_any_opinion(attempted)
    }
}
