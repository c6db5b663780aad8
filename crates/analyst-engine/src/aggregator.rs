//! Result synthesis
//!
//! Merges the per-agent opinions of a finished strategy run into one
//! [`SynthesisResult`]: averaged confidence, a categorical consensus level
//! from confidence-weighted pairwise similarity, extracted key insights,
//! and a readable summary grouped by agent type.

use std::collections::HashMap;

use analyst_core::{
    AgentType, ConsensusLevel, Error, Opinion, ParticipantFailure, Result, SynthesisResult,
};
use chrono::Utc;

use crate::config::EngineConfig;
use crate::consensus;

/// Builds one result out of many opinions
///
/// Pure: persistence and caching of the produced result are the caller's
/// responsibility.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    high_consensus_threshold: f64,
    medium_consensus_threshold: f64,
    high_confidence_threshold: f64,
    recurring_prefix_len: usize,
    max_key_insights: usize,
}

impl Synthesizer {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            high_consensus_threshold: config.high_consensus_threshold,
            medium_consensus_threshold: config.medium_consensus_threshold,
            high_confidence_threshold: config.high_confidence_threshold,
            recurring_prefix_len: config.recurring_prefix_len,
            max_key_insights: config.max_key_insights,
        }
    }

    /// Merge opinions and recorded failures into a single result
    ///
    /// Fails with `AllParticipantsFailed` only when there are no opinions
    /// at all; a result built from partial participation is legitimate and
    /// its confidence and consensus simply reflect the smaller panel.
    pub fn synthesize(
        &self,
        opinions: &[Opinion],
        failures: &[ParticipantFailure],
    ) -> Result<SynthesisResult> {
        if opinions.is_empty() {
            return Err(Error::AllParticipantsFailed {
                attempted: failures.len(),
            });
        }

        let confidence =
            opinions.iter().map(|o| o.confidence).sum::<f64>() / opinions.len() as f64;

        let agreement = consensus::weighted_pairwise(opinions);
        let level = if agreement > self.high_consensus_threshold {
            ConsensusLevel::High
        } else if agreement > self.medium_consensus_threshold {
            ConsensusLevel::Medium
        } else {
            ConsensusLevel::Low
        };

        Ok(SynthesisResult {
            confidence,
            consensus: level,
            participants: opinions.len(),
            key_insights: self.key_insights(opinions),
            summary: self.summary(opinions, failures, level, confidence),
            generated_at: Utc::now(),
        })
    }

    /// Extract key insights, insertion order, capped
    ///
    /// Two sources: opinions whose confidence clears the high bar, and
    /// opinion content whose normalized prefix recurs across two or more
    /// opinions.
    fn key_insights(&self, opinions: &[Opinion]) -> Vec<String> {
        let mut insights = Vec::new();

        for opinion in opinions {
            if insights.len() >= self.max_key_insights {
                return insights;
            }
            if opinion.confidence > self.high_confidence_threshold {
                insights.push(format!(
                    "High confidence ({}): {}",
                    opinion.agent_id, opinion.content
                ));
            }
        }

        // Count recurring prefixes while remembering first-seen order
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        for opinion in opinions {
            let prefix = self.prefix_of(&opinion.content);
            if prefix.is_empty() {
                continue;
            }
            let count = counts.entry(prefix.clone()).or_insert(0);
            if *count == 0 {
                order.push(prefix);
            }
            *count += 1;
        }

        for prefix in order {
            if insights.len() >= self.max_key_insights {
                break;
            }
            if counts.get(&prefix).copied().unwrap_or(0) >= 2 {
                insights.push(format!("Recurring view: {prefix}"));
            }
        }

        insights
    }

    fn prefix_of(&self, content: &str) -> String {
        content
            .to_lowercase()
            .chars()
            .take(self.recurring_prefix_len)
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// One paragraph per agent type, then failures, then the closing
    /// recommendation sentence
    fn summary(
        &self,
        opinions: &[Opinion],
        failures: &[ParticipantFailure],
        level: ConsensusLevel,
        confidence: f64,
    ) -> String {
        let mut sections = Vec::new();

        for agent_type in AgentType::all() {
            let of_type: Vec<&Opinion> = opinions
                .iter()
                .filter(|o| o.agent_type == agent_type)
                .collect();
            if of_type.is_empty() {
                continue;
            }
            let mut lines = vec![format!("{} view:", agent_type.label())];
            for opinion in of_type {
                lines.push(format!(
                    "- {} (confidence {:.2}): {}",
                    opinion.agent_id, opinion.confidence, opinion.content
                ));
            }
            sections.push(lines.join("\n"));
        }

        if !failures.is_empty() {
            let ids: Vec<&str> = failures.iter().map(|f| f.agent_id.as_str()).collect();
            sections.push(format!("No input from: {}", ids.join(", ")));
        }

        sections.push(format!(
            "Recommendation: {} ({} consensus, average confidence {:.2}).",
            recommendation_signal(opinions),
            level,
            confidence
        ));
        sections.join("\n\n")
    }
}

/// Majority buy/hold/sell signal across opinion contents
///
/// Counts signal tokens in each opinion once; ties fall back to HOLD.
fn recommendation_signal(opinions: &[Opinion]) -> &'static str {
    let mut buy = 0_usize;
    let mut sell = 0_usize;
    let mut hold = 0_usize;

    for opinion in opinions {
        let tokens = consensus::token_set(&opinion.content);
        if tokens.contains("buy") {
            buy += 1;
        }
        if tokens.contains("sell") {
            sell += 1;
        }
        if tokens.contains("hold") {
            hold += 1;
        }
    }

    if buy > sell && buy > hold {
        "BUY"
    } else if sell > buy && sell > hold {
        "SELL"
    } else {
        "HOLD"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn synthesizer() -> Synthesizer {
        Synthesizer::from_config(&EngineConfig::default())
    }

    fn opinion(agent_id: &str, agent_type: AgentType, content: &str, confidence: f64) -> Opinion {
        Opinion::new(agent_id, agent_type, content, "reasoning", confidence, 1, Utc::now())
    }

    #[test]
    fn test_empty_input_fails() {
        let failures = vec![ParticipantFailure::new("a", "down", 1)];
        let err = synthesizer().synthesize(&[], &failures).unwrap_err();
        assert!(matches!(err, Error::AllParticipantsFailed { attempted: 1 }));
    }

    #[test]
    fn test_confidence_is_mean() {
        let opinions = vec![
            opinion("a", AgentType::Technical, "alpha", 0.6),
            opinion("b", AgentType::Risk, "beta", 0.8),
        ];
        let result = synthesizer().synthesize(&opinions, &[]).unwrap();
        assert!((result.confidence - 0.7).abs() < 1e-9);
        assert_eq!(result.participants, 2);
    }

    #[test]
    fn test_consensus_levels() {
        let agreeing = vec![
            opinion("a", AgentType::Technical, "buy the breakout now", 0.9),
            opinion("b", AgentType::Fundamental, "buy the breakout now", 0.9),
        ];
        let result = synthesizer().synthesize(&agreeing, &[]).unwrap();
        assert_eq!(result.consensus, ConsensusLevel::High);

        let disjoint = vec![
            opinion("a", AgentType::Technical, "rates climbing fast", 0.9),
            opinion("b", AgentType::Fundamental, "margins look awful", 0.9),
        ];
        let result = synthesizer().synthesize(&disjoint, &[]).unwrap();
        assert_eq!(result.consensus, ConsensusLevel::Low);
    }

    #[test]
    fn test_high_confidence_insights() {
        let opinions = vec![
            opinion("a", AgentType::Technical, "breakout imminent", 0.95),
            opinion("b", AgentType::Risk, "nothing to flag", 0.4),
        ];
        let result = synthesizer().synthesize(&opinions, &[]).unwrap();
        assert_eq!(result.key_insights.len(), 1);
        assert!(result.key_insights[0].contains("High confidence (a)"));
        assert!(result.key_insights[0].contains("breakout imminent"));
    }

    #[test]
    fn test_recurring_insights_need_two_occurrences() {
        let opinions = vec![
            opinion("a", AgentType::Technical, "Rotation into value underway", 0.5),
            opinion("b", AgentType::Market, "rotation into value underway", 0.5),
            opinion("c", AgentType::Risk, "credit spreads widening", 0.5),
        ];
        let result = synthesizer().synthesize(&opinions, &[]).unwrap();
        let recurring: Vec<&String> = result
            .key_insights
            .iter()
            .filter(|i| i.starts_with("Recurring view:"))
            .collect();
        assert_eq!(recurring.len(), 1);
        assert!(recurring[0].contains("rotation into value"));
    }

    #[test]
    fn test_insights_capped_and_ordered() {
        let opinions: Vec<Opinion> = (0..15)
            .map(|i| {
                opinion(
                    &format!("agent-{i}"),
                    AgentType::Technical,
                    &format!("distinct signal number {i}"),
                    0.9,
                )
            })
            .collect();
        let result = synthesizer().synthesize(&opinions, &[]).unwrap();
        assert_eq!(result.key_insights.len(), 10);
        // Insertion order preserved
        assert!(result.key_insights[0].contains("agent-0"));
        assert!(result.key_insights[9].contains("agent-9"));
    }

    #[test]
    fn test_summary_groups_by_type_and_reports_failures() {
        let opinions = vec![
            opinion("tech-1", AgentType::Technical, "buy weakness", 0.7),
            opinion("tech-2", AgentType::Technical, "buy breakout", 0.6),
            opinion("risk-1", AgentType::Risk, "size down", 0.5),
        ];
        let failures = vec![ParticipantFailure::new("fund-1", "timeout", 1)];
        let result = synthesizer().synthesize(&opinions, &failures).unwrap();

        assert!(result.summary.contains("Technical view:"));
        assert!(result.summary.contains("Risk view:"));
        assert!(!result.summary.contains("Sentiment view:"));
        assert!(result.summary.contains("No input from: fund-1"));
        assert!(result.summary.contains("Recommendation: BUY"));
    }

    #[test]
    fn test_recommendation_tie_is_hold() {
        let opinions = vec![
            opinion("a", AgentType::Technical, "buy it", 0.7),
            opinion("b", AgentType::Fundamental, "sell it", 0.7),
        ];
        let result = synthesizer().synthesize(&opinions, &[]).unwrap();
        assert!(result.summary.contains("Recommendation: HOLD"));
    }
}
