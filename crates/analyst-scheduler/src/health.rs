//! Agent health policy

use std::time::Duration;

use analyst_core::{AgentSnapshot, AgentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Thresholds for the periodic agent health sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthPolicy {
    /// An agent idle longer than this is considered unhealthy
    pub inactive_after: Duration,
    /// Minimum acceptable success rate once enough tasks were attempted
    pub min_success_rate: f64,
    /// Tasks an agent must have attempted before its success rate counts
    pub min_task_samples: u64,
    /// Ceiling on the rolling average response time
    pub max_avg_response_ms: f64,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            inactive_after: Duration::from_secs(30 * 60),
            min_success_rate: 0.5,
            min_task_samples: 4,
            max_avg_response_ms: 60_000.0,
        }
    }
}

/// Outcome of assessing one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthVerdict {
    Healthy,
    Unhealthy(String),
}

impl HealthPolicy {
    /// Assess one agent snapshot against the policy
    pub fn assess(&self, agent: &AgentSnapshot, now: DateTime<Utc>) -> HealthVerdict {
        if agent.status == AgentStatus::Inactive {
            return HealthVerdict::Unhealthy("agent is deactivated".to_string());
        }

        let idle = now.signed_duration_since(agent.last_active);
        let inactive_after =
            chrono::Duration::from_std(self.inactive_after).unwrap_or(chrono::Duration::MAX);
        if idle > inactive_after {
            return HealthVerdict::Unhealthy(format!(
                "inactive for {} minutes",
                idle.num_minutes()
            ));
        }

        if agent.total_tasks >= self.min_task_samples {
            if let Some(rate) = agent.success_rate() {
                if rate < self.min_success_rate {
                    return HealthVerdict::Unhealthy(format!(
                        "success rate {rate:.2} below {:.2}",
                        self.min_success_rate
                    ));
                }
            }
        }

        if agent.avg_response_ms > self.max_avg_response_ms {
            return HealthVerdict::Unhealthy(format!(
                "average response time {:.0}ms above {:.0}ms",
                agent.avg_response_ms, self.max_avg_response_ms
            ));
        }

        HealthVerdict::Healthy
    }
}
