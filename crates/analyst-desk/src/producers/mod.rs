//! Templated analysis producers
//!
//! One producer per analyst capability. These are the pluggable, opaque
//! "analysis producer" collaborators of the engine: each turns a topic
//! and context into canned-but-plausible analysis text with a
//! deterministic confidence, which keeps every orchestration path fully
//! exercisable without any external data source. Swap them for real
//! implementations by registering different [`AnalysisProducer`]s.

pub mod fundamental;
pub mod market;
pub mod oversight;
pub mod risk;
pub mod sentiment;
pub mod technical;

pub use fundamental::FundamentalProducer;
pub use market::MarketProducer;
pub use oversight::{DecisionProducer, MonitoringProducer};
pub use risk::RiskProducer;
pub use sentiment::SentimentProducer;
pub use technical::TechnicalProducer;

use std::hash::{DefaultHasher, Hash, Hasher};

use analyst_core::AnalysisProducer;
use std::sync::Arc;

/// Deterministic confidence in `[low, high]` derived from the topic
///
/// Producers must be repeatable for the same input, so "confidence" is a
/// hash of the topic and a per-producer salt rather than anything random.
pub(crate) fn seeded_confidence(topic: &str, salt: u64, low: f64, high: f64) -> f64 {
    let mut hasher = DefaultHasher::new();
    topic.hash(&mut hasher);
    salt.hash(&mut hasher);
    let unit = (hasher.finish() % 1000) as f64 / 1000.0;
    low + unit * (high - low)
}

/// Whether the topic mentions any of the given keywords
pub(crate) fn mentions_any(topic: &str, keywords: &[&str]) -> bool {
    let lower = topic.to_lowercase();
    keywords.iter().any(|kw| lower.contains(kw))
}

/// The symbols in scope, or a readable fallback
pub(crate) fn scope_label(context: &analyst_core::Context) -> String {
    let symbols = context.symbols();
    if symbols.is_empty() {
        "the broad market".to_string()
    } else {
        symbols.join(", ")
    }
}

/// The full desk: one templated producer per agent type
pub fn default_producers() -> Vec<Arc<dyn AnalysisProducer>> {
    vec![
        Arc::new(TechnicalProducer::new()),
        Arc::new(FundamentalProducer::new()),
        Arc::new(SentimentProducer::new()),
        Arc::new(RiskProducer::new()),
        Arc::new(MarketProducer::new()),
        Arc::new(DecisionProducer::new()),
        Arc::new(MonitoringProducer::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_confidence_is_deterministic_and_bounded() {
        let first = seeded_confidence("AAPL outlook", 7, 0.55, 0.95);
        let second = seeded_confidence("AAPL outlook", 7, 0.55, 0.95);
        assert!((first - second).abs() < f64::EPSILON);
        assert!((0.55..=0.95).contains(&first));
        assert!((0.55..=0.95).contains(&seeded_confidence("TSLA outlook", 7, 0.55, 0.95)));
    }

    #[test]
    fn test_default_producers_cover_every_type() {
        let producers = default_producers();
        let mut types: Vec<_> = producers.iter().map(|p| p.agent_type()).collect();
        types.dedup();
        assert_eq!(types.len(), analyst_core::AgentType::all().len());
    }
}
