//! Fundamental analysis producer

use analyst_core::{AgentType, AnalysisProducer, Context, ProducerOutput, Result};
use async_trait::async_trait;

use super::{mentions_any, scope_label, seeded_confidence};

const CHEAP: &[&str] = &["undervalued", "cheap", "discount", "value", "washed out"];
const RICH: &[&str] = &["overvalued", "expensive", "stretched", "bubble", "frothy"];

/// Valuation-driven analyst: multiples, margins, and balance sheet
pub struct FundamentalProducer;

impl FundamentalProducer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FundamentalProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisProducer for FundamentalProducer {
    fn agent_type(&self) -> AgentType {
        AgentType::Fundamental
    }

    async fn produce(
        &self,
        topic: &str,
        context: &Context,
        _round: u32,
    ) -> Result<ProducerOutput> {
        let confidence = seeded_confidence(topic, 0xf0da, 0.6, 0.9);
        let pe = 10.0 + seeded_confidence(topic, 0xbeef, 0.0, 1.0) * 30.0;
        let scope = scope_label(context);

        let (stance, signal) = if mentions_any(topic, CHEAP) {
            ("valuation is attractive relative to normalized earnings", "buy")
        } else if mentions_any(topic, RICH) || pe > 32.0 {
            ("the multiple already prices in flawless execution", "sell")
        } else {
            ("valuation is fair against the sector median", "hold")
        };

        Ok(ProducerOutput {
            content: format!("For {scope}, {stance}; signal: {signal}"),
            reasoning: format!(
                "Forward P/E near {pe:.1}x against stable gross margins and \
                 modest net leverage"
            ),
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rich_valuation_signals_sell() {
        let producer = FundamentalProducer::new();
        let output = producer
            .produce("is this overvalued after the run", &Context::new(), 1)
            .await
            .unwrap();
        assert!(output.content.contains("signal: sell"));
    }

    #[tokio::test]
    async fn test_confidence_in_range() {
        let producer = FundamentalProducer::new();
        let output = producer
            .produce("steady compounder", &Context::new(), 1)
            .await
            .unwrap();
        assert!((0.6..=0.9).contains(&output.confidence));
    }
}
