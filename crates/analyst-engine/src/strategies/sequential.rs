//! Sequential pipeline strategy

use analyst_core::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use super::{ExecutionStrategy, ParticipantRunner, StrategyOutcome};

/// Run participants strictly one after another
///
/// Each step receives the accumulated context plus every prior step's
/// opinion. A failure at step *k* is recorded and the pipeline still offers
/// step *k+1* the context without step *k*'s opinion - the pipeline
/// degrades, it does not abort.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialPipeline;

impl SequentialPipeline {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionStrategy for SequentialPipeline {
    fn name(&self) -> &'static str {
        "sequential"
    }

    async fn execute(
        &self,
        runner: &ParticipantRunner,
        topic: &str,
        context: &Context,
        _rounds: u32,
    ) -> Result<StrategyOutcome> {
        let attempted = runner.participants().len();
        let mut outcome = StrategyOutcome::default();
        let mut step_context = context.clone();

        for (index, agent) in runner.participants().iter().enumerate() {
            if runner.control().is_cancelled().await {
                debug!(task_id = %runner.control().task_id(), "Pipeline stopped by cancellation");
                return Ok(outcome);
            }

            step_context.set_prior_opinions(&outcome.opinions);
            match runner.call(agent, topic, &step_context, 1).await {
                Ok(opinion) => outcome.opinions.push(opinion),
                Err(failure) => outcome.failures.push(failure),
            }

            let percent = 10 + (80 * (index + 1) / attempted.max(1)) as u8;
            runner
                .control()
                .update_progress(percent, &format!("step {}/{}", index + 1, attempted))
                .await;
        }

        info!(
            task_id = %runner.control().task_id(),
            produced = outcome.opinions.len(),
            failed = outcome.failures.len(),
            "Sequential pipeline finished"
        );
        outcome.ensure_any_opinion(attempted)
    }
}
