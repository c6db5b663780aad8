//! Structured debate and consensus building

use analyst_core::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use super::{ExecutionStrategy, ParticipantRunner, StrategyOutcome};
use crate::consensus;

/// Multi-round debate with consensus-based early termination
///
/// Every round, each participant produces one opinion informed by the
/// previous round's opinions (round 1 has none). After a round the mean
/// pairwise similarity of that round's opinions is measured; once it
/// exceeds the threshold the debate stops early, even with rounds left in
/// the budget.
///
/// Structured debate uses the engine's configured threshold; consensus
/// building is the same algorithm with a caller-supplied target, for when
/// a specific agreement bar must be met before proceeding.
#[derive(Debug, Clone, Copy)]
pub struct DebateStrategy {
    threshold: f64,
    name: &'static str,
}

impl DebateStrategy {
    /// Structured debate at the engine's configured threshold
    pub fn structured(threshold: f64) -> Self {
        Self {
            threshold,
            name: "structured-debate",
        }
    }

    /// Consensus building toward a caller-supplied target
    pub fn consensus_building(target: f64) -> Self {
        Self {
            threshold: target,
            name: "consensus-building",
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[async_trait]
impl ExecutionStrategy for DebateStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(
        &self,
        runner: &ParticipantRunner,
        topic: &str,
        context: &Context,
        rounds: u32,
    ) -> Result<StrategyOutcome> {
        let attempted = runner.participants().len();
        let rounds = rounds.max(1);
        let mut outcome = StrategyOutcome::default();
        let mut previous_round = Vec::new();

        for round in 1..=rounds {
            if runner.control().is_cancelled().await {
                debug!(task_id = %runner.control().task_id(), round, "Debate stopped by cancellation");
                return Ok(outcome);
            }

            let mut round_context = context.clone();
            round_context.set_round_opinions(&previous_round);

            let (round_opinions, round_failures) =
                runner.fan_out(topic, &round_context, round).await;

            let agreement = consensus::mean_pairwise(&round_opinions);
            debug!(
                task_id = %runner.control().task_id(),
                round,
                produced = round_opinions.len(),
                agreement,
                "Debate round finished"
            );

            outcome.failures.extend(round_failures);
            outcome.opinions.extend(round_opinions.iter().cloned());
            previous_round = round_opinions;

            let percent = 10 + (80 * round / rounds) as u8;
            runner
                .control()
                .update_progress(percent, &format!("round {round}/{rounds}"))
                .await;

            if !previous_round.is_empty() && agreement > self.threshold {
                info!(
                    task_id = %runner.control().task_id(),
                    round,
                    agreement,
                    threshold = self.threshold,
                    "Consensus reached early, ending debate"
                );
                break;
            }
        }

        outcome.ensure_any_opinion(attempted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testing::{ScriptedProducer, fixture};
    use analyst_core::{AgentType, Context, Error};
    use std::time::Duration;

    #[tokio::test]
    async fn test_identical_opinions_stop_after_round_one() {
        // Two agents whose round-1 opinions are textually identical:
        // round consensus is 1.0, so the 3-round budget is not used
        let fx = fixture(
            &[
                ("tech-1", AgentType::Technical),
                ("fund-1", AgentType::Fundamental),
            ],
            vec![
                ScriptedProducer::ok(AgentType::Technical, "hold through earnings", 0.8),
                ScriptedProducer::ok(AgentType::Fundamental, "hold through earnings", 0.8),
            ],
            Duration::from_secs(5),
        )
        .await;

        let outcome = DebateStrategy::structured(0.8)
            .execute(&fx.runner, "NVDA", &Context::new(), 3)
            .await
            .unwrap();

        assert_eq!(outcome.opinions.len(), 2); // one round only
        assert!(outcome.opinions.iter().all(|o| o.round == 1));
    }

    #[tokio::test]
    async fn test_disagreement_runs_all_rounds() {
        let fx = fixture(
            &[
                ("tech-1", AgentType::Technical),
                ("fund-1", AgentType::Fundamental),
            ],
            vec![
                ScriptedProducer::per_round(
                    AgentType::Technical,
                    &["breakout coming", "still bullish", "momentum confirms"],
                    0.7,
                ),
                ScriptedProducer::per_round(
                    AgentType::Fundamental,
                    &["overvalued badly", "fading revenue", "margins compressing"],
                    0.7,
                ),
            ],
            Duration::from_secs(5),
        )
        .await;

        let outcome = DebateStrategy::structured(0.8)
            .execute(&fx.runner, "NVDA", &Context::new(), 3)
            .await
            .unwrap();

        assert_eq!(outcome.opinions.len(), 6); // 2 agents x 3 rounds
        let max_round = outcome.opinions.iter().map(|o| o.round).max();
        assert_eq!(max_round, Some(3));
    }

    #[tokio::test]
    async fn test_consensus_building_uses_caller_target() {
        // Opinions share half their tokens; similarity is ~0.33, which
        // clears a target of 0.2 in round 1 but not the default 0.8
        let fx = fixture(
            &[
                ("tech-1", AgentType::Technical),
                ("fund-1", AgentType::Fundamental),
            ],
            vec![
                ScriptedProducer::ok(AgentType::Technical, "hold steady", 0.7),
                ScriptedProducer::ok(AgentType::Fundamental, "hold cash", 0.7),
            ],
            Duration::from_secs(5),
        )
        .await;

        let outcome = DebateStrategy::consensus_building(0.2)
            .execute(&fx.runner, "NVDA", &Context::new(), 3)
            .await
            .unwrap();
        assert_eq!(outcome.opinions.len(), 2); // stopped in round 1
    }

    #[tokio::test]
    async fn test_later_rounds_see_previous_round() {
        use analyst_core::{AnalysisProducer, ProducerOutput};
        use async_trait::async_trait;
        use std::sync::{Arc, Mutex};

        struct RoundSpy {
            seen: Arc<Mutex<Vec<usize>>>,
        }

        #[async_trait]
        impl AnalysisProducer for RoundSpy {
            fn agent_type(&self) -> AgentType {
                AgentType::Technical
            }
            async fn produce(
                &self,
                _topic: &str,
                context: &Context,
                round: u32,
            ) -> Result<ProducerOutput> {
                self.seen
                    .lock()
                    .unwrap()
                    .push(context.round_opinions().len());
                Ok(ProducerOutput {
                    content: format!("round {round} thoughts"),
                    reasoning: String::new(),
                    confidence: 0.6,
                })
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let fx = fixture(
            &[("tech-1", AgentType::Technical)],
            vec![Arc::new(RoundSpy {
                seen: Arc::clone(&seen),
            })],
            Duration::from_secs(5),
        )
        .await;

        // A lone participant scores a vacuous 1.0 per round, which never
        // strictly exceeds a threshold of 1.0, so both rounds run
        DebateStrategy::structured(1.0)
            .execute(&fx.runner, "NVDA", &Context::new(), 2)
            .await
            .unwrap();

        let seen = seen.lock().unwrap().clone();
        // Round 1 saw no previous opinions, round 2 saw round 1's single one
        assert_eq!(seen, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_all_failing_raises() {
        let fx = fixture(
            &[("risk-1", AgentType::Risk)],
            vec![ScriptedProducer::failing(AgentType::Risk)],
            Duration::from_secs(5),
        )
        .await;

        let err = DebateStrategy::structured(0.8)
            .execute(&fx.runner, "NVDA", &Context::new(), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AllParticipantsFailed { .. }));
    }
}
