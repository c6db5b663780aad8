//! Engine configuration

use std::time::Duration;

use analyst_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the orchestration engine
///
/// The similarity and insight constants are deliberate defaults rather
/// than tuned business rules; override them per deployment as needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Size of the shared worker pool bounding concurrent producer calls
    pub worker_pool_size: usize,

    /// Time budget for a single agent call; exceeding it records that
    /// agent as failed without aborting the strategy
    pub agent_timeout: Duration,

    /// Wall-clock budget for a whole task; exceeding it fails the task
    pub session_timeout: Duration,

    /// Round-consensus threshold at which a structured debate stops early
    pub debate_consensus_threshold: f64,

    /// Weighted-similarity floor for a High consensus level
    pub high_consensus_threshold: f64,

    /// Weighted-similarity floor for a Medium consensus level
    pub medium_consensus_threshold: f64,

    /// Confidence above which an opinion becomes a key insight
    pub high_confidence_threshold: f64,

    /// Prefix length used when matching recurring opinion content
    pub recurring_prefix_len: usize,

    /// Maximum number of key insights in a synthesis
    pub max_key_insights: usize,

    /// TTL for cached synthesis results
    pub result_cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 8,
            agent_timeout: Duration::from_secs(30),
            session_timeout: Duration::from_secs(300),
            debate_consensus_threshold: 0.8,
            high_consensus_threshold: 0.8,
            medium_consensus_threshold: 0.6,
            high_confidence_threshold: 0.8,
            recurring_prefix_len: 40,
            max_key_insights: 10,
            result_cache_ttl: Duration::from_secs(3600),
        }
    }
}

impl EngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.worker_pool_size == 0 {
            return Err(Error::Config(
                "worker_pool_size must be greater than 0".to_string(),
            ));
        }
        if self.agent_timeout > self.session_timeout {
            return Err(Error::Config(
                "agent_timeout must not exceed session_timeout".to_string(),
            ));
        }
        for (name, value) in [
            ("debate_consensus_threshold", self.debate_consensus_threshold),
            ("high_consensus_threshold", self.high_consensus_threshold),
            ("medium_consensus_threshold", self.medium_consensus_threshold),
            ("high_confidence_threshold", self.high_confidence_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::Config(format!("{name} must be in (0, 1]")));
            }
        }
        if self.medium_consensus_threshold >= self.high_consensus_threshold {
            return Err(Error::Config(
                "medium_consensus_threshold must be below high_consensus_threshold".to_string(),
            ));
        }
        if self.recurring_prefix_len == 0 || self.max_key_insights == 0 {
            return Err(Error::Config(
                "recurring_prefix_len and max_key_insights must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.worker_pool_size, 8);
        assert!((config.debate_consensus_threshold - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validation_rejects_zero_pool() {
        let config = EngineConfig {
            worker_pool_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_inverted_thresholds() {
        let config = EngineConfig {
            medium_consensus_threshold: 0.9,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_agent_timeout_above_session() {
        let config = EngineConfig {
            agent_timeout: Duration::from_secs(600),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
