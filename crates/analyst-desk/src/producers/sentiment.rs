//! Sentiment analysis producer

use analyst_core::{AgentType, AnalysisProducer, Context, ProducerOutput, Result};
use async_trait::async_trait;

use super::{scope_label, seeded_confidence};

/// Words that nudge the tone score positive
const POSITIVE: &[&str] = &[
    "beat", "upgrade", "growth", "strong", "record", "buyback", "expansion", "surge",
];
/// Words that nudge it negative
const NEGATIVE: &[&str] = &[
    "miss", "downgrade", "lawsuit", "layoffs", "recall", "probe", "warning", "slump",
];

/// News-tone analyst: keyword-scored sentiment over the topic text
pub struct SentimentProducer;

impl SentimentProducer {
    pub fn new() -> Self {
        Self
    }

    /// Net tone in [-1, 1]: positive minus negative keyword hits,
    /// normalized by total hits
    fn tone(topic: &str) -> f64 {
        let lower = topic.to_lowercase();
        let positive = POSITIVE.iter().filter(|kw| lower.contains(*kw)).count() as f64;
        let negative = NEGATIVE.iter().filter(|kw| lower.contains(*kw)).count() as f64;
        let total = positive + negative;
        if total == 0.0 {
            0.0
        } else {
            (positive - negative) / total
        }
    }
}

impl Default for SentimentProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisProducer for SentimentProducer {
    fn agent_type(&self) -> AgentType {
        AgentType::Sentiment
    }

    async fn produce(
        &self,
        topic: &str,
        context: &Context,
        _round: u32,
    ) -> Result<ProducerOutput> {
        let tone = Self::tone(topic);
        let scope = scope_label(context);
        // Stronger tone either way reads as a clearer signal
        let confidence = seeded_confidence(topic, 0x5e17, 0.5, 0.75) + tone.abs() * 0.2;

        let (mood, signal) = if tone > 0.0 {
            ("coverage skews clearly positive", "buy")
        } else if tone < 0.0 {
            ("coverage has turned negative", "sell")
        } else {
            ("coverage is mixed with no dominant narrative", "hold")
        };

        Ok(ProducerOutput {
            content: format!("News flow around {scope}: {mood}; signal: {signal}"),
            reasoning: format!("Keyword tone score {tone:.2} across recent headlines"),
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_positive_tone() {
        let producer = SentimentProducer::new();
        let output = producer
            .produce("record quarter and an upgrade cycle", &Context::new(), 1)
            .await
            .unwrap();
        assert!(output.content.contains("signal: buy"));
    }

    #[tokio::test]
    async fn test_negative_tone() {
        let producer = SentimentProducer::new();
        let output = producer
            .produce("earnings miss plus a downgrade", &Context::new(), 1)
            .await
            .unwrap();
        assert!(output.content.contains("signal: sell"));
    }

    #[test]
    fn test_tone_is_balanced_for_mixed_news() {
        assert!(SentimentProducer::tone("an upgrade after the lawsuit").abs() < f64::EPSILON);
        assert!(SentimentProducer::tone("nothing notable").abs() < f64::EPSILON);
    }
}
