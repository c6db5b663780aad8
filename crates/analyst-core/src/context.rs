//! Execution context for analysis runs
//!
//! The `Context` struct is the key-value bag handed to analysis producers
//! alongside the topic. Strategies enrich it between steps and rounds:
//! the sequential pipeline accumulates prior opinions into it, and the
//! debate strategies inject the previous round's opinions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::opinion::Opinion;

/// Well-known context keys
pub mod keys {
    /// Ticker symbols in scope for the analysis
    pub const SYMBOLS: &str = "symbols";
    /// Who asked for the run (user id, "scheduler", "emergency")
    pub const REQUESTED_BY: &str = "requested_by";
    /// Opinions accumulated by earlier pipeline steps
    pub const PRIOR_OPINIONS: &str = "prior_opinions";
    /// Opinions from the previous debate round
    pub const ROUND_OPINIONS: &str = "round_opinions";
    /// What fired the run (e.g. "volatility_spike")
    pub const TRIGGER: &str = "trigger";
}

/// Context passed to producers during execution
///
/// # Example
///
/// ```
/// use analyst_core::Context;
///
/// let ctx = Context::new()
///     .with_symbols(["AAPL", "MSFT"])
///     .with_requested_by("user-42");
///
/// assert_eq!(ctx.symbols(), vec!["AAPL", "MSFT"]);
/// assert_eq!(ctx.requested_by(), Some("user-42"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticker symbols in scope
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        self.insert(keys::SYMBOLS, serde_json::json!(symbols));
        self
    }

    /// Set the requester id
    pub fn with_requested_by(mut self, requester: impl Into<String>) -> Self {
        self.insert(keys::REQUESTED_BY, serde_json::json!(requester.into()));
        self
    }

    /// Set the trigger label
    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.insert(keys::TRIGGER, serde_json::json!(trigger.into()));
        self
    }

    /// Ticker symbols in scope, empty when unset
    pub fn symbols(&self) -> Vec<String> {
        self.get_typed(keys::SYMBOLS).unwrap_or_default()
    }

    /// Requester id
    pub fn requested_by(&self) -> Option<&str> {
        self.get(keys::REQUESTED_BY).and_then(|v| v.as_str())
    }

    /// Trigger label
    pub fn trigger(&self) -> Option<&str> {
        self.get(keys::TRIGGER).and_then(|v| v.as_str())
    }

    /// Replace the accumulated prior opinions
    pub fn set_prior_opinions(&mut self, opinions: &[Opinion]) {
        self.insert_serialized(keys::PRIOR_OPINIONS, opinions);
    }

    /// Opinions accumulated by earlier pipeline steps, empty when unset
    pub fn prior_opinions(&self) -> Vec<Opinion> {
        self.get_typed(keys::PRIOR_OPINIONS).unwrap_or_default()
    }

    /// Replace the previous debate round's opinions
    pub fn set_round_opinions(&mut self, opinions: &[Opinion]) {
        self.insert_serialized(keys::ROUND_OPINIONS, opinions);
    }

    /// Opinions from the previous debate round, empty when unset
    pub fn round_opinions(&self) -> Vec<Opinion> {
        self.get_typed(keys::ROUND_OPINIONS).unwrap_or_default()
    }

    /// Insert a raw value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a raw value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Get a typed value, `None` when missing or of the wrong shape
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    fn insert_serialized<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        if let Ok(json) = serde_json::to_value(value) {
            self.data.insert(key.to_string(), json);
        }
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merge another context into this one (other values override)
    pub fn merge(&mut self, other: Context) {
        self.data.extend(other.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentType;
    use chrono::Utc;

    #[test]
    fn test_basic_operations() {
        let mut ctx = Context::new();
        assert!(ctx.is_empty());

        ctx.insert("key", serde_json::json!("value"));
        assert_eq!(ctx.len(), 1);
        assert!(ctx.contains_key("key"));
        assert_eq!(ctx.get("key"), Some(&serde_json::json!("value")));
    }

    #[test]
    fn test_builder_chain() {
        let ctx = Context::new()
            .with_symbols(["TSLA"])
            .with_requested_by("scheduler")
            .with_trigger("market_open");

        assert_eq!(ctx.symbols(), vec!["TSLA"]);
        assert_eq!(ctx.requested_by(), Some("scheduler"));
        assert_eq!(ctx.trigger(), Some("market_open"));
    }

    #[test]
    fn test_opinion_round_trip() {
        let opinion = Opinion::new(
            "tech-1",
            AgentType::Technical,
            "momentum is fading",
            "RSI divergence",
            0.7,
            1,
            Utc::now(),
        );

        let mut ctx = Context::new();
        assert!(ctx.prior_opinions().is_empty());

        ctx.set_prior_opinions(std::slice::from_ref(&opinion));
        let restored = ctx.prior_opinions();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].agent_id, "tech-1");
        assert_eq!(restored[0].content, opinion.content);
    }

    #[test]
    fn test_merge() {
        let mut base = Context::new().with_requested_by("a");
        let other = Context::new().with_requested_by("b").with_symbols(["NVDA"]);

        base.merge(other);
        assert_eq!(base.requested_by(), Some("b")); // overridden
        assert_eq!(base.symbols(), vec!["NVDA"]); // merged
    }
}
