//! TTL cache for synthesized results
//!
//! An explicit, owned store with timed eviction, injected into the
//! orchestrator rather than living as a process-wide static. Entries are
//! keyed by task id; the scheduler's maintenance sweep clears the cache
//! wholesale.

use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use analyst_core::SynthesisResult;

/// Thread-safe TTL cache of task results
pub struct ResultCache {
    cache: Arc<RwLock<TimedCache<String, SynthesisResult>>>,
}

impl ResultCache {
    /// Create a new cache with the given entry lifespan
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a cached result by task id
    pub async fn get(&self, task_id: &str) -> Option<SynthesisResult> {
        let mut cache = self.cache.write().await;
        cache.cache_get(task_id).cloned()
    }

    /// Insert a result for a task id
    pub async fn insert(&self, task_id: impl Into<String>, result: SynthesisResult) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(task_id.into(), result);
    }

    /// Remove a single entry
    pub async fn invalidate(&self, task_id: &str) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(task_id);
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Whether the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Clone for ResultCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_core::ConsensusLevel;
    use chrono::Utc;

    fn result(confidence: f64) -> SynthesisResult {
        SynthesisResult {
            confidence,
            consensus: ConsensusLevel::Medium,
            participants: 2,
            key_insights: vec![],
            summary: "cached".to_string(),
            generated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.insert("task-1", result(0.7)).await;

        let hit = cache.get("task-1").await;
        assert!(hit.is_some());
        assert!((hit.unwrap().confidence - 0.7).abs() < f64::EPSILON);
        assert!(cache.get("task-2").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.insert("task-1", result(0.5)).await;
        cache.invalidate("task-1").await;
        assert!(cache.get("task-1").await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ResultCache::new(Duration::from_secs(60));
        for i in 0..4 {
            cache.insert(format!("task-{i}"), result(0.5)).await;
        }
        assert_eq!(cache.len().await, 4);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
