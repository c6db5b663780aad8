//! Tracing-backed notifier

use analyst_core::{Notifier, TaskEvent};
use tracing::{info, warn};

/// Emits task events as structured log lines
///
/// Fire-and-forget by construction: logging either happens or it does
/// not, and the engine never waits on it.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Created { task_id, topic } => {
                info!(task_id, topic, "task created");
            }
            TaskEvent::Progress {
                task_id,
                percent,
                step,
            } => {
                info!(task_id, percent, step, "task progress");
            }
            TaskEvent::Completed {
                task_id,
                consensus,
                confidence,
            } => {
                info!(task_id, consensus = %consensus, confidence, "task completed");
            }
            TaskEvent::Failed { task_id, reason } => {
                warn!(task_id, reason, "task failed");
            }
            TaskEvent::Cancelled { task_id, by } => {
                info!(task_id, by, "task cancelled");
            }
        }
    }
}
