//! Technical analysis producer

use analyst_core::{AgentType, AnalysisProducer, Context, ProducerOutput, Result};
use async_trait::async_trait;

use super::{mentions_any, scope_label, seeded_confidence};

const BULLISH: &[&str] = &[
    "breakout", "rally", "momentum", "uptrend", "accumulation", "support held",
];
const BEARISH: &[&str] = &[
    "selloff", "breakdown", "downtrend", "distribution", "resistance", "weakness",
];

/// Chart-driven analyst: trend, momentum, and moving-average posture
pub struct TechnicalProducer;

impl TechnicalProducer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TechnicalProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisProducer for TechnicalProducer {
    fn agent_type(&self) -> AgentType {
        AgentType::Technical
    }

    async fn produce(
        &self,
        topic: &str,
        context: &Context,
        _round: u32,
    ) -> Result<ProducerOutput> {
        let confidence = seeded_confidence(topic, 0x7ec4, 0.55, 0.9);
        // Derive plausible indicator readings from the same seed
        let rsi = 30.0 + seeded_confidence(topic, 0x7515, 0.0, 1.0) * 40.0;
        let scope = scope_label(context);

        let (stance, signal) = if mentions_any(topic, BULLISH) {
            ("trend and momentum are constructive", "buy")
        } else if mentions_any(topic, BEARISH) {
            ("momentum has rolled over below the 50-day average", "sell")
        } else if rsi > 60.0 {
            ("price is extended but the uptrend is intact", "hold")
        } else {
            ("price is basing with no directional edge yet", "hold")
        };

        Ok(ProducerOutput {
            content: format!("For {scope}, {stance}; signal: {signal}"),
            reasoning: format!(
                "RSI at {rsi:.0} with the 20/50-day average spread confirming; \
                 volume profile agrees with the price structure"
            ),
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bullish_topics_signal_buy() {
        let producer = TechnicalProducer::new();
        let output = producer
            .produce("breakout forming in semis", &Context::new(), 1)
            .await
            .unwrap();
        assert!(output.content.contains("signal: buy"));
        assert!((0.0..=1.0).contains(&output.confidence));
    }

    #[tokio::test]
    async fn test_output_is_deterministic() {
        let producer = TechnicalProducer::new();
        let ctx = Context::new().with_symbols(["AAPL"]);
        let a = producer.produce("AAPL into earnings", &ctx, 1).await.unwrap();
        let b = producer.produce("AAPL into earnings", &ctx, 1).await.unwrap();
        assert_eq!(a.content, b.content);
        assert!((a.confidence - b.confidence).abs() < f64::EPSILON);
    }
}
