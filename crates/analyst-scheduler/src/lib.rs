//! Time- and event-driven triggers for analyst-rs
//!
//! The scheduler fires orchestration work on fixed intervals and on
//! demand for anomaly handling:
//!
//! - an agent health sweep driven by a configurable [`HealthPolicy`]
//! - recurring market-trend analysis restricted to an [`ActiveWindow`]
//! - periodic risk assessment and a daily strategy review that drafts one
//!   agent per available type
//! - a daily maintenance sweep that clears the result cache, computes
//!   fleet metrics, and warns on degradation
//! - [`Scheduler::trigger_emergency`] for immediate escalation with
//!   participants biased toward the anomaly kind
//!
//! Every trigger runs in its own spawned loop, so a slow collaboration
//! never delays the next health check.

pub mod health;
pub mod scheduler;
pub mod window;

pub use health::{HealthPolicy, HealthVerdict};
pub use scheduler::{EmergencyKind, FleetMetrics, Scheduler, SchedulerConfig};
pub use window::ActiveWindow;
