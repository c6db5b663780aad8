//! Scheduled triggers and emergency escalation
//!
//! Every trigger runs in its own spawned loop so a slow collaboration can
//! never delay the next health check. Triggers share one global enable
//! flag and are individually toggleable through [`SchedulerConfig`].
//! Missed ticks are not compensated; a trigger body that errors is logged
//! and the loop keeps ticking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use analyst_core::{
    AgentStatus, AgentType, AnalysisDepth, Clock, Context, ExecutionMode, TaskKind, TaskSpec,
};
use analyst_engine::{AgentSelector, Orchestrator, RunOutcome};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::health::{HealthPolicy, HealthVerdict};
use crate::window::ActiveWindow;

/// Anomalies the scheduler escalates on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmergencyKind {
    VolatilitySpike,
    DataAnomaly,
}

impl EmergencyKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::VolatilitySpike => "volatility_spike",
            Self::DataAnomaly => "data_anomaly",
        }
    }

    /// Agent types best placed to handle this kind of emergency, in
    /// preference order
    pub fn preferred_types(&self) -> &'static [AgentType] {
        match self {
            Self::VolatilitySpike => &[
                AgentType::Technical,
                AgentType::Market,
                AgentType::Risk,
                AgentType::Decision,
            ],
            Self::DataAnomaly => &[
                AgentType::Monitoring,
                AgentType::Technical,
                AgentType::Fundamental,
            ],
        }
    }
}

/// Intervals and toggles for the recurring triggers
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub health_interval: Duration,
    pub market_interval: Duration,
    pub risk_interval: Duration,
    pub review_interval: Duration,
    pub maintenance_interval: Duration,

    pub health_enabled: bool,
    pub market_enabled: bool,
    pub risk_enabled: bool,
    pub review_enabled: bool,
    pub maintenance_enabled: bool,

    /// Window outside which the market-trend trigger stays quiet
    pub window: ActiveWindow,
    pub market_topic: String,

    /// Fleet success-rate floor; the maintenance sweep warns below it
    pub min_fleet_success_rate: f64,
    /// Fleet confidence floor; the maintenance sweep warns below it
    pub min_fleet_confidence: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            health_interval: Duration::from_secs(5 * 60),
            market_interval: Duration::from_secs(60 * 60),
            risk_interval: Duration::from_secs(4 * 60 * 60),
            review_interval: Duration::from_secs(24 * 60 * 60),
            maintenance_interval: Duration::from_secs(24 * 60 * 60),
            health_enabled: true,
            market_enabled: true,
            risk_enabled: true,
            review_enabled: true,
            maintenance_enabled: true,
            window: ActiveWindow::default(),
            market_topic: "broad market trend and sector rotation".to_string(),
            min_fleet_success_rate: 0.8,
            min_fleet_confidence: 0.7,
        }
    }
}

/// Aggregate fleet metrics computed by the maintenance sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetMetrics {
    pub agents: usize,
    /// Completed over attempted across the whole fleet; `None` with no
    /// attempts yet
    pub success_rate: Option<f64>,
    pub mean_confidence: f64,
}

/// Fires orchestration work on intervals and escalates anomalies
pub struct Scheduler {
    engine: Arc<Orchestrator>,
    config: SchedulerConfig,
    policy: HealthPolicy,
    clock: Arc<dyn Clock>,
    enabled: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(
        engine: Arc<Orchestrator>,
        config: SchedulerConfig,
        policy: HealthPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            config,
            policy,
            clock,
            enabled: Arc::new(AtomicBool::new(true)),
            handles: Vec::new(),
        }
    }

    /// Global enable flag shared by every trigger loop
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Spawn all enabled trigger loops
    pub fn start(&mut self) {
        if !self.handles.is_empty() {
            warn!("Scheduler already started");
            return;
        }

        if self.config.health_enabled {
            let engine = Arc::clone(&self.engine);
            let policy = self.policy.clone();
            let clock = Arc::clone(&self.clock);
            let enabled = Arc::clone(&self.enabled);
            self.handles.push(spawn_loop(
                self.config.health_interval,
                enabled,
                move || {
                    let engine = Arc::clone(&engine);
                    let policy = policy.clone();
                    let clock = Arc::clone(&clock);
                    async move {
                        let (flagged, reactivated) =
                            Self::run_health_sweep(&engine, &policy, clock.now());
                        debug!(flagged, reactivated, "Health sweep finished");
                    }
                },
            ));
        }

        if self.config.market_enabled {
            let engine = Arc::clone(&self.engine);
            let config = self.config.clone();
            let clock = Arc::clone(&self.clock);
            let enabled = Arc::clone(&self.enabled);
            self.handles.push(spawn_loop(
                self.config.market_interval,
                enabled,
                move || {
                    let engine = Arc::clone(&engine);
                    let config = config.clone();
                    let clock = Arc::clone(&clock);
                    async move {
                        if !config.window.contains(clock.now()) {
                            debug!("Outside active window, skipping market analysis");
                            return;
                        }
                        Self::run_market_analysis(&engine, &config).await;
                    }
                },
            ));
        }

        if self.config.risk_enabled {
            let engine = Arc::clone(&self.engine);
            let enabled = Arc::clone(&self.enabled);
            self.handles.push(spawn_loop(
                self.config.risk_interval,
                enabled,
                move || {
                    let engine = Arc::clone(&engine);
                    async move {
                        Self::run_risk_assessment(&engine).await;
                    }
                },
            ));
        }

        if self.config.review_enabled {
            let engine = Arc::clone(&self.engine);
            let enabled = Arc::clone(&self.enabled);
            self.handles.push(spawn_loop(
                self.config.review_interval,
                enabled,
                move || {
                    let engine = Arc::clone(&engine);
                    async move {
                        Self::run_strategy_review(&engine).await;
                    }
                },
            ));
        }

        if self.config.maintenance_enabled {
            let engine = Arc::clone(&self.engine);
            let config = self.config.clone();
            let enabled = Arc::clone(&self.enabled);
            self.handles.push(spawn_loop(
                self.config.maintenance_interval,
                enabled,
                move || {
                    let engine = Arc::clone(&engine);
                    let config = config.clone();
                    async move {
                        let metrics = Self::run_maintenance(&engine, &config).await;
                        info!(
                            agents = metrics.agents,
                            success_rate = ?metrics.success_rate,
                            mean_confidence = metrics.mean_confidence,
                            "Maintenance sweep finished"
                        );
                    }
                },
            ));
        }

        info!(triggers = self.handles.len(), "Scheduler started");
    }

    /// Abort all trigger loops
    pub fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Scheduler stopped");
    }

    /// Flag unhealthy agents and reactivate recovered ones
    ///
    /// Returns `(flagged, reactivated)` counts.
    pub fn run_health_sweep(
        engine: &Orchestrator,
        policy: &HealthPolicy,
        now: chrono::DateTime<chrono::Utc>,
    ) -> (usize, usize) {
        let mut flagged = 0;
        let mut reactivated = 0;

        for agent in engine.registry().agents() {
            let snapshot = agent.snapshot();
            match policy.assess(&snapshot, now) {
                HealthVerdict::Unhealthy(reason) => {
                    // Deactivated agents stay deactivated; only healthy
                    // statuses get flipped to the error state
                    if matches!(snapshot.status, AgentStatus::Active | AgentStatus::Busy) {
                        warn!(agent_id = %snapshot.id, %reason, "Agent flagged unhealthy");
                        agent.set_status(AgentStatus::Error);
                        flagged += 1;
                    }
                }
                HealthVerdict::Healthy => {
                    if snapshot.status == AgentStatus::Error {
                        info!(agent_id = %snapshot.id, "Agent recovered, reactivating");
                        agent.set_status(AgentStatus::Active);
                        reactivated += 1;
                    }
                }
            }
        }
        (flagged, reactivated)
    }

    /// Recurring market-trend collaboration (active window checked by the
    /// trigger loop)
    pub async fn run_market_analysis(engine: &Orchestrator, config: &SchedulerConfig) {
        let participants = active_ids_of_types(
            engine,
            &[AgentType::Technical, AgentType::Market, AgentType::Sentiment],
        );
        if participants.len() < 2 {
            debug!("Not enough active market analysts, skipping");
            return;
        }

        let spec = TaskSpec {
            topic: config.market_topic.clone(),
            kind: TaskKind::MarketAnalysis,
            mode: ExecutionMode::Parallel,
            depth: AnalysisDepth::Standard,
            participants,
            owner: "scheduler".to_string(),
            rounds: 1,
            retry_limit: 0,
            consensus_target: None,
            context: Context::new().with_trigger("market_interval"),
        };
        log_outcome("market analysis", engine.submit_and_run(spec).await);
    }

    /// Recurring portfolio risk assessment
    pub async fn run_risk_assessment(engine: &Orchestrator) {
        let participants = active_ids_of_types(
            engine,
            &[AgentType::Risk, AgentType::Fundamental, AgentType::Monitoring],
        );
        if participants.len() < 2 {
            debug!("Not enough active risk analysts, skipping");
            return;
        }

        let spec = TaskSpec {
            topic: "portfolio risk exposure and concentration".to_string(),
            kind: TaskKind::RiskAssessment,
            mode: ExecutionMode::Parallel,
            depth: AnalysisDepth::Deep,
            participants,
            owner: "scheduler".to_string(),
            rounds: 1,
            retry_limit: 0,
            consensus_target: None,
            context: Context::new().with_trigger("risk_interval"),
        };
        log_outcome("risk assessment", engine.submit_and_run(spec).await);
    }

    /// Daily strategy review: one agent per available type, run as a
    /// sequential pipeline so each specialist builds on the last
    pub async fn run_strategy_review(engine: &Orchestrator) {
        let selector = AgentSelector::new();
        let mut participants = Vec::new();
        for agent_type in AgentType::all() {
            let snapshots: Vec<_> = engine
                .registry()
                .active_by_type(agent_type)
                .iter()
                .map(|a| a.snapshot())
                .collect();
            if let Ok(best) = selector.select(&snapshots, true) {
                participants.push(best.id.clone());
            }
        }
        if participants.len() < 2 {
            debug!("Not enough agent types represented, skipping strategy review");
            return;
        }

        let spec = TaskSpec {
            topic: "strategy review of open positions and signals".to_string(),
            kind: TaskKind::StrategyReview,
            mode: ExecutionMode::Sequential,
            depth: AnalysisDepth::Deep,
            participants,
            owner: "scheduler".to_string(),
            rounds: 1,
            retry_limit: 0,
            consensus_target: None,
            context: Context::new().with_trigger("daily_review"),
        };
        log_outcome("strategy review", engine.submit_and_run(spec).await);
    }

    /// Daily maintenance: clear the result cache, compute fleet metrics,
    /// and warn when they fall below the configured floors
    pub async fn run_maintenance(engine: &Orchestrator, config: &SchedulerConfig) -> FleetMetrics {
        engine.cache().clear().await;

        let snapshots = engine.registry().snapshots();
        let total: u64 = snapshots.iter().map(|s| s.total_tasks).sum();
        let completed: u64 = snapshots.iter().map(|s| s.completed_tasks).sum();
        let success_rate = (total > 0).then(|| completed as f64 / total as f64);
        let mean_confidence = if snapshots.is_empty() {
            0.0
        } else {
            snapshots.iter().map(|s| s.avg_confidence).sum::<f64>() / snapshots.len() as f64
        };

        if let Some(rate) = success_rate {
            if rate < config.min_fleet_success_rate {
                warn!(
                    success_rate = rate,
                    floor = config.min_fleet_success_rate,
                    "Fleet success rate degraded"
                );
            }
        }
        if !snapshots.is_empty() && mean_confidence < config.min_fleet_confidence {
            warn!(
                mean_confidence,
                floor = config.min_fleet_confidence,
                "Fleet confidence degraded"
            );
        }

        FleetMetrics {
            agents: snapshots.len(),
            success_rate,
            mean_confidence,
        }
    }

    /// Escalate an anomaly right now
    ///
    /// Participants are biased toward the kind's preferred types and
    /// topped up with any other active agents so at least two take part
    /// when possible. Runs parallel analysis for fastest turnaround.
    /// Fails loudly (logged, not raised) when fewer than two active agents
    /// exist.
    pub async fn trigger_emergency(
        &self,
        kind: EmergencyKind,
        context: Context,
    ) -> Option<RunOutcome> {
        let engine = &self.engine;
        let mut participants = active_ids_of_types(engine, kind.preferred_types());

        if participants.len() < 2 {
            // Top up from the rest of the active fleet
            for snapshot in engine.registry().snapshots() {
                if participants.len() >= 2 {
                    break;
                }
                if snapshot.status == AgentStatus::Active && !participants.contains(&snapshot.id) {
                    participants.push(snapshot.id);
                }
            }
        }
        if participants.len() < 2 {
            error!(
                kind = kind.label(),
                active = participants.len(),
                "Emergency escalation needs at least 2 active agents"
            );
            return None;
        }

        let spec = TaskSpec {
            topic: format!("emergency assessment: {}", kind.label()),
            kind: TaskKind::Emergency,
            mode: ExecutionMode::Parallel,
            depth: AnalysisDepth::Quick,
            participants,
            owner: "scheduler".to_string(),
            rounds: 1,
            retry_limit: 0,
            consensus_target: None,
            context: context.with_trigger(kind.label()),
        };

        match engine.submit_and_run(spec).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                error!(kind = kind.label(), %err, "Emergency escalation failed");
                None
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Active agent ids of the given types, preference order preserved
fn active_ids_of_types(engine: &Orchestrator, types: &[AgentType]) -> Vec<String> {
    let mut ids = Vec::new();
    for agent_type in types {
        for agent in engine.registry().active_by_type(*agent_type) {
            ids.push(agent.id().to_string());
        }
    }
    ids
}

fn log_outcome(trigger: &str, outcome: analyst_core::Result<RunOutcome>) {
    match outcome {
        Ok(RunOutcome::Completed(result)) => {
            info!(
                trigger,
                consensus = %result.consensus,
                confidence = result.confidence,
                "Scheduled collaboration completed"
            );
        }
        Ok(RunOutcome::Cancelled) => {
            info!(trigger, "Scheduled collaboration cancelled");
        }
        Err(err) => {
            warn!(trigger, %err, "Scheduled collaboration failed");
        }
    }
}

/// Spawn one trigger loop; the first tick fires after a full period
fn spawn_loop<F, Fut>(
    period: Duration,
    enabled: Arc<AtomicBool>,
    mut body: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // consume the immediate first tick
        loop {
            ticker.tick().await;
            if !enabled.load(Ordering::SeqCst) {
                continue;
            }
            body().await;
        }
    })
}
