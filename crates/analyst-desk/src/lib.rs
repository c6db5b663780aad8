//! Reference desk for analyst-rs
//!
//! Concrete implementations of the engine's collaborator boundaries:
//!
//! - templated [`AnalysisProducer`](analyst_core::AnalysisProducer)s, one
//!   per analyst capability (technical, fundamental, sentiment, risk,
//!   market, decision, monitoring)
//! - [`InMemoryStore`], an in-process persistence collaborator
//! - [`TracingNotifier`], a fire-and-forget event sink backed by tracing
//!
//! Together with `analyst-engine` this crate makes the platform runnable
//! end to end without any external service; production deployments
//! replace these pieces at the trait boundary.

pub mod notify;
pub mod producers;
pub mod store;

pub use notify::TracingNotifier;
pub use producers::{
    DecisionProducer, FundamentalProducer, MarketProducer, MonitoringProducer, RiskProducer,
    SentimentProducer, TechnicalProducer, default_producers,
};
pub use store::InMemoryStore;
