//! Risk assessment producer

use analyst_core::{AgentType, AnalysisProducer, Context, ProducerOutput, Result};
use async_trait::async_trait;

use super::{mentions_any, scope_label, seeded_confidence};

const STRESS: &[&str] = &[
    "volatility", "drawdown", "crash", "spike", "liquidity", "contagion", "margin call",
    "emergency",
];

/// Exposure-focused analyst: volatility regime and position sizing
pub struct RiskProducer;

impl RiskProducer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RiskProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisProducer for RiskProducer {
    fn agent_type(&self) -> AgentType {
        AgentType::Risk
    }

    async fn produce(
        &self,
        topic: &str,
        context: &Context,
        _round: u32,
    ) -> Result<ProducerOutput> {
        let confidence = seeded_confidence(topic, 0x215c, 0.6, 0.85);
        let var = 1.0 + seeded_confidence(topic, 0xacdc, 0.0, 1.0) * 3.0;
        let scope = scope_label(context);

        let (stance, signal) = if mentions_any(topic, STRESS) {
            (
                "the volatility regime has shifted; cut gross exposure and widen stops",
                "sell",
            )
        } else if var > 3.0 {
            ("tail risk is above budget for current sizing", "hold")
        } else {
            ("risk is within budget at current position sizes", "hold")
        };

        Ok(ProducerOutput {
            content: format!("Risk read on {scope}: {stance}; signal: {signal}"),
            reasoning: format!("One-day 99% VaR estimate near {var:.1}% of book"),
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stress_topics_cut_exposure() {
        let producer = RiskProducer::new();
        let output = producer
            .produce("volatility spike across indices", &Context::new(), 1)
            .await
            .unwrap();
        assert!(output.content.contains("cut gross exposure"));
        assert!(output.content.contains("signal: sell"));
    }

    #[tokio::test]
    async fn test_calm_topics_hold() {
        let producer = RiskProducer::new();
        let output = producer
            .produce("quiet summer tape", &Context::new(), 1)
            .await
            .unwrap();
        assert!(output.content.contains("signal: hold"));
    }
}
