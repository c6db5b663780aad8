//! Decision and monitoring producers
//!
//! The decision producer is the only one that reads other agents'
//! opinions out of the context: it tallies the signals accumulated by a
//! sequential pipeline or the previous debate round and takes a stance.
//! The monitoring producer reports on feed health.

use analyst_core::{AgentType, AnalysisProducer, Context, Opinion, ProducerOutput, Result};
use async_trait::async_trait;

use super::{scope_label, seeded_confidence};

/// Stance-taking analyst that weighs the other participants' opinions
pub struct DecisionProducer;

impl DecisionProducer {
    pub fn new() -> Self {
        Self
    }

    fn tally(opinions: &[Opinion]) -> (usize, usize, usize) {
        let mut buy = 0;
        let mut sell = 0;
        let mut hold = 0;
        for opinion in opinions {
            let lower = opinion.content.to_lowercase();
            if lower.contains("buy") {
                buy += 1;
            } else if lower.contains("sell") {
                sell += 1;
            } else {
                hold += 1;
            }
        }
        (buy, sell, hold)
    }
}

impl Default for DecisionProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisProducer for DecisionProducer {
    fn agent_type(&self) -> AgentType {
        AgentType::Decision
    }

    async fn produce(
        &self,
        topic: &str,
        context: &Context,
        _round: u32,
    ) -> Result<ProducerOutput> {
        // Sequential pipelines accumulate prior opinions; debates carry
        // the previous round instead
        let mut peers = context.prior_opinions();
        if peers.is_empty() {
            peers = context.round_opinions();
        }
        let (buy, sell, hold) = Self::tally(&peers);
        let scope = scope_label(context);

        let (stance, signal) = if peers.is_empty() {
            ("no peer input yet; defaulting to patience", "hold")
        } else if buy > sell && buy > hold {
            ("the panel leans constructive; act on it", "buy")
        } else if sell > buy && sell > hold {
            ("the panel leans defensive; reduce", "sell")
        } else {
            ("the panel is split; stay put until it resolves", "hold")
        };

        Ok(ProducerOutput {
            content: format!("Decision on {scope}: {stance}; signal: {signal}"),
            reasoning: format!(
                "Peer signals tallied as {buy} buy / {sell} sell / {hold} hold"
            ),
            confidence: seeded_confidence(topic, 0xdec1, 0.6, 0.9),
        })
    }
}

/// Feed-health analyst
pub struct MonitoringProducer;

impl MonitoringProducer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MonitoringProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisProducer for MonitoringProducer {
    fn agent_type(&self) -> AgentType {
        AgentType::Monitoring
    }

    async fn produce(
        &self,
        topic: &str,
        context: &Context,
        _round: u32,
    ) -> Result<ProducerOutput> {
        let staleness = seeded_confidence(topic, 0x0b5e, 0.0, 1.0);
        let scope = scope_label(context);

        let status = if context.trigger() == Some("data_anomaly") {
            "an upstream feed is reporting inconsistent ticks; quarantine it and replay"
        } else if staleness > 0.8 {
            "one vendor feed is lagging; failover is armed"
        } else {
            "all data feeds are current and within latency budget"
        };

        Ok(ProducerOutput {
            content: format!("Monitoring status for {scope}: {status}; signal: hold"),
            reasoning: format!("Max observed feed staleness score {staleness:.2}"),
            confidence: seeded_confidence(topic, 0x3017, 0.7, 0.95),
        })
    }
}
