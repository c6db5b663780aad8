//! Agent selection
//!
//! Selection is pure: it ranks candidate snapshots and returns the winner
//! without touching registry state. The caller leases concurrency after a
//! successful selection and releases it on every exit path.

use analyst_core::{AgentSnapshot, Error, Result};

/// Deterministic multi-key agent selector
///
/// Ordering (first element wins): load rate ascending, then performance
/// score descending, then average response time ascending. The sort is
/// stable, so candidates that tie on all three keys fall back to their
/// input order - registration order when the registry supplied them -
/// keeping selection deterministic for testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentSelector;

impl AgentSelector {
    pub fn new() -> Self {
        Self
    }

    /// Rank candidates best-first
    ///
    /// With `require_available` set, candidates that are not active or are
    /// at their concurrency ceiling are filtered out first.
    pub fn rank<'a>(
        &self,
        candidates: &'a [AgentSnapshot],
        require_available: bool,
    ) -> Vec<&'a AgentSnapshot> {
        let mut eligible: Vec<&AgentSnapshot> = candidates
            .iter()
            .filter(|c| !require_available || c.is_available())
            .collect();

        eligible.sort_by(|a, b| {
            a.load_rate()
                .total_cmp(&b.load_rate())
                .then_with(|| b.performance_score().total_cmp(&a.performance_score()))
                .then_with(|| a.avg_response_ms.total_cmp(&b.avg_response_ms))
        });
        eligible
    }

    /// Pick the single best candidate
    pub fn select<'a>(
        &self,
        candidates: &'a [AgentSnapshot],
        require_available: bool,
    ) -> Result<&'a AgentSnapshot> {
        self.rank(candidates, require_available)
            .into_iter()
            .next()
            .ok_or(Error::NoAvailableAgent {
                candidates: candidates.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_core::{AgentStatus, AgentType};
    use chrono::Utc;

    fn snapshot(id: &str, seq: u64) -> AgentSnapshot {
        AgentSnapshot {
            id: id.to_string(),
            agent_type: AgentType::Technical,
            status: AgentStatus::Active,
            current_concurrency: 0,
            max_concurrency: 10,
            total_tasks: 0,
            completed_tasks: 0,
            failed_tasks: 0,
            avg_response_ms: 100.0,
            avg_confidence: 0.5,
            accuracy: 0.5,
            last_active: Utc::now(),
            seq,
        }
    }

    fn with_load(mut snap: AgentSnapshot, current: u32) -> AgentSnapshot {
        snap.current_concurrency = current;
        snap
    }

    #[test]
    fn test_least_loaded_wins() {
        // Load rates 0.2, 0.5, 0.1 with equal performance and response time
        let candidates = vec![
            with_load(snapshot("a", 0), 2),
            with_load(snapshot("b", 1), 5),
            with_load(snapshot("c", 2), 1),
        ];

        let selector = AgentSelector::new();
        let winner = selector.select(&candidates, true).unwrap();
        assert_eq!(winner.id, "c");

        // Winner's load is <= every other eligible candidate's
        for other in selector.rank(&candidates, true) {
            assert!(winner.load_rate() <= other.load_rate());
        }
    }

    #[test]
    fn test_selection_is_deterministic() {
        let candidates = vec![
            with_load(snapshot("a", 0), 2),
            with_load(snapshot("b", 1), 5),
            with_load(snapshot("c", 2), 1),
        ];
        let selector = AgentSelector::new();

        let first = selector.select(&candidates, true).unwrap().id.clone();
        for _ in 0..5 {
            assert_eq!(selector.select(&candidates, true).unwrap().id, first);
        }
    }

    #[test]
    fn test_performance_breaks_load_ties() {
        let mut strong = snapshot("strong", 0);
        strong.total_tasks = 10;
        strong.completed_tasks = 9;
        let mut weak = snapshot("weak", 1);
        weak.total_tasks = 10;
        weak.completed_tasks = 2;

        let selector = AgentSelector::new();
        // Same load either way round; the high performer wins
        let candidates = [weak.clone(), strong.clone()];
        let winner = selector
            .select(&candidates, true)
            .unwrap();
        assert_eq!(winner.id, "strong");
    }

    #[test]
    fn test_response_time_breaks_remaining_ties() {
        let mut fast = snapshot("fast", 1);
        fast.avg_response_ms = 50.0;
        let slow = snapshot("slow", 0);

        let selector = AgentSelector::new();
        let candidates = [slow, fast];
        let winner = selector.select(&candidates, true).unwrap();
        assert_eq!(winner.id, "fast");
    }

    #[test]
    fn test_full_tie_falls_back_to_input_order() {
        let candidates = vec![snapshot("first", 0), snapshot("second", 1)];
        let selector = AgentSelector::new();
        assert_eq!(selector.select(&candidates, true).unwrap().id, "first");
    }

    #[test]
    fn test_unavailable_candidates_are_filtered() {
        let mut inactive = snapshot("inactive", 0);
        inactive.status = AgentStatus::Inactive;
        let saturated = with_load(snapshot("saturated", 1), 10);
        let open = snapshot("open", 2);

        let selector = AgentSelector::new();
        let candidates = [inactive, saturated, open];
        let winner = selector
            .select(&candidates, true)
            .unwrap();
        assert_eq!(winner.id, "open");
    }

    #[test]
    fn test_no_available_agent() {
        let mut inactive = snapshot("a", 0);
        inactive.status = AgentStatus::Error;

        let selector = AgentSelector::new();
        let err = selector.select(&[inactive], true).unwrap_err();
        assert!(matches!(err, Error::NoAvailableAgent { candidates: 1 }));

        let err = selector.select(&[], true).unwrap_err();
        assert!(matches!(err, Error::NoAvailableAgent { candidates: 0 }));
    }

    #[test]
    fn test_require_available_false_keeps_everyone() {
        let mut flagged = snapshot("flagged", 0);
        flagged.status = AgentStatus::Error;

        let selector = AgentSelector::new();
        assert_eq!(selector.select(&[flagged], false).unwrap().id, "flagged");
    }
}
