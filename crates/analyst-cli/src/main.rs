//! Command-line interface for analyst-rs
//!
//! Wires the reference desk (templated producers, in-memory store) into
//! the orchestration engine and runs one collaboration - or an emergency
//! escalation - from the terminal.

use std::sync::Arc;

use analyst_core::{
    AgentType, AnalysisDepth, Context, ExecutionMode, SystemClock, TaskKind, TaskSpec,
};
use analyst_engine::{Orchestrator, RunOutcome};
use analyst_scheduler::{EmergencyKind, HealthPolicy, Scheduler, SchedulerConfig};
use clap::{Parser, ValueEnum};
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Single,
    Parallel,
    Sequential,
    Debate,
    Consensus,
}

impl From<Mode> for ExecutionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Single => Self::SingleAgent,
            Mode::Parallel => Self::Parallel,
            Mode::Sequential => Self::Sequential,
            Mode::Debate => Self::StructuredDebate,
            Mode::Consensus => Self::ConsensusBuilding,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Emergency {
    VolatilitySpike,
    DataAnomaly,
}

impl From<Emergency> for EmergencyKind {
    fn from(kind: Emergency) -> Self {
        match kind {
            Emergency::VolatilitySpike => Self::VolatilitySpike,
            Emergency::DataAnomaly => Self::DataAnomaly,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "analyst-cli")]
#[command(about = "Multi-agent equities analysis from the terminal", long_about = None)]
struct Args {
    /// Topic to analyze
    #[arg(short, long, default_value = "broad market outlook into the close")]
    topic: String,

    /// How the desk collaborates on the topic
    #[arg(short, long, value_enum, default_value = "parallel")]
    mode: Mode,

    /// Maximum debate rounds for the multi-round modes
    #[arg(short, long, default_value_t = 3)]
    rounds: u32,

    /// Consensus target for the consensus mode
    #[arg(long)]
    consensus_target: Option<f64>,

    /// Ticker symbols in scope
    #[arg(short, long)]
    symbols: Vec<String>,

    /// Trigger an emergency escalation instead of a normal run
    #[arg(long, value_enum)]
    emergency: Option<Emergency>,
}

/// Register the reference desk: two technical analysts plus one of every
/// other capability
async fn register_desk(orchestrator: &Orchestrator) -> anyhow::Result<Vec<String>> {
    let roster = [
        ("tech-1", AgentType::Technical),
        ("tech-2", AgentType::Technical),
        ("fund-1", AgentType::Fundamental),
        ("sent-1", AgentType::Sentiment),
        ("risk-1", AgentType::Risk),
        ("mkt-1", AgentType::Market),
        ("dec-1", AgentType::Decision),
        ("mon-1", AgentType::Monitoring),
    ];

    let mut ids = Vec::new();
    for (id, agent_type) in roster {
        orchestrator.register_agent(id, agent_type, 4).await?;
        ids.push(id.to_string());
    }
    Ok(ids)
}

fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Completed(result) => {
            println!("\n=== Synthesis ===");
            println!("{}", result.summary);
            println!(
                "\nConsensus: {} | confidence {:.2} | {} participant(s)",
                result.consensus, result.confidence, result.participants
            );
            if !result.key_insights.is_empty() {
                println!("\nKey insights:");
                for insight in &result.key_insights {
                    println!("  - {insight}");
                }
            }
        }
        RunOutcome::Cancelled => println!("Run was cancelled before completion"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    analyst_utils::init_tracing();

    let args = Args::parse();

    let mut builder = Orchestrator::builder()
        .store(Arc::new(analyst_desk::InMemoryStore::new()))
        .notifier(Arc::new(analyst_desk::TracingNotifier));
    for producer in analyst_desk::default_producers() {
        builder = builder.producer(producer);
    }
    let orchestrator = Arc::new(builder.build()?);
    let participants = register_desk(&orchestrator).await?;
    info!(
        agents = participants.len(),
        capabilities = orchestrator.producer_types().len(),
        "Desk registered"
    );

    if let Some(kind) = args.emergency {
        let scheduler = Scheduler::new(
            Arc::clone(&orchestrator),
            SchedulerConfig::default(),
            HealthPolicy::default(),
            Arc::new(SystemClock),
        );
        let context = Context::new().with_symbols(args.symbols);
        match scheduler.trigger_emergency(kind.into(), context).await {
            Some(outcome) => print_outcome(&outcome),
            None => println!("Emergency escalation could not run (see logs)"),
        }
        return Ok(());
    }

    let spec = TaskSpec {
        topic: args.topic,
        kind: TaskKind::Research,
        mode: args.mode.into(),
        depth: AnalysisDepth::Standard,
        participants,
        owner: "cli".to_string(),
        rounds: args.rounds,
        retry_limit: 1,
        consensus_target: args.consensus_target,
        context: Context::new().with_symbols(args.symbols).with_requested_by("cli"),
    };

    let task = orchestrator.submit(spec).await?;
    info!(task_id = %task.id, priority = task.priority, "Task submitted");

    let outcome = orchestrator.run(&task.id).await?;
    print_outcome(&outcome);
    Ok(())
}
