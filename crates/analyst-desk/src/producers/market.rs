//! Market regime producer

use analyst_core::{AgentType, AnalysisProducer, Context, ProducerOutput, Result};
use async_trait::async_trait;

use super::{mentions_any, scope_label, seeded_confidence};

const TIGHTENING: &[&str] = &["rate hike", "inflation", "tightening", "hawkish", "yields"];
const EASING: &[&str] = &["rate cut", "easing", "dovish", "stimulus", "liquidity injection"];

/// Macro analyst: rates, breadth, and regime
pub struct MarketProducer;

impl MarketProducer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarketProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisProducer for MarketProducer {
    fn agent_type(&self) -> AgentType {
        AgentType::Market
    }

    async fn produce(
        &self,
        topic: &str,
        context: &Context,
        _round: u32,
    ) -> Result<ProducerOutput> {
        let confidence = seeded_confidence(topic, 0xa4ce, 0.55, 0.85);
        let breadth = seeded_confidence(topic, 0x1dea, 0.3, 0.9);
        let scope = scope_label(context);

        let (regime, signal) = if mentions_any(topic, TIGHTENING) {
            ("the regime is risk-off while policy tightens", "sell")
        } else if mentions_any(topic, EASING) {
            ("easier policy supports risk assets", "buy")
        } else if breadth > 0.6 {
            ("breadth is healthy and leadership is broadening", "buy")
        } else {
            ("leadership is narrow; the tape needs confirmation", "hold")
        };

        Ok(ProducerOutput {
            content: format!("Macro backdrop for {scope}: {regime}; signal: {signal}"),
            reasoning: format!(
                "Advance/decline breadth at {:.0}% with credit spreads steady",
                breadth * 100.0
            ),
            confidence,
        })
    }
}
