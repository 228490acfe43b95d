//! Command line host for the Squad Room team formation engine
//!
//! Runs either the classic four-participant demo or a simulation with
//! concurrent producers feeding the waiting pool while formation passes run
//! on a schedule.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use squad_room::config::{validate_config, AppConfig};
use squad_room::types::{Participant, QueueRequest, Team};
use squad_room::utils::current_timestamp;
use squad_room::{Matchmaker, PassId};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// Squad Room - skill and latency balanced team formation
#[derive(Parser)]
#[command(
    name = "squad-room",
    version,
    about = "Groups waiting participants into balanced fixed-size teams",
    long_about = "Squad Room keeps a thread-safe pool of waiting participants and periodically \
                 forms fixed-size teams that balance skill spread and latency spread against \
                 how long participants have been waiting, under a per-team candidate budget."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Team size override
    #[arg(long, value_name = "N", help = "Override participants per team")]
    team_size: Option<usize>,

    /// Candidate budget override
    #[arg(
        long,
        value_name = "N",
        help = "Override the cap on candidate combinations scored per team"
    )]
    max_candidates: Option<usize>,

    /// Simulate this many participants instead of running the demo
    #[arg(long, value_name = "COUNT", help = "Simulate COUNT participants arriving")]
    simulate: Option<usize>,

    /// Number of concurrent producers in simulation mode
    #[arg(long, default_value_t = 4, help = "Concurrent producers in simulation mode")]
    producers: usize,

    /// Pass interval override
    #[arg(
        long,
        value_name = "MS",
        help = "Override the interval between formation passes"
    )]
    pass_interval_ms: Option<u64>,

    /// Demo wait before the formation pass
    #[arg(
        long,
        value_name = "MS",
        default_value_t = 2000,
        help = "How long demo participants wait before the pass"
    )]
    demo_wait_ms: u64,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without forming teams")]
    dry_run: bool,

    /// Print Prometheus metrics before exiting
    #[arg(long, help = "Print metrics in Prometheus text format before exiting")]
    print_metrics: bool,
}

/// Team as printed in simulation mode
#[derive(Serialize)]
struct TeamReport<'a> {
    pass_id: PassId,
    members: &'a [Participant],
    skill_spread: u64,
    latency_spread: u64,
    max_wait_seconds: f64,
    score: Option<f64>,
    candidates_evaluated: usize,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file or environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(config_path) => AppConfig::from_file(config_path)?,
        None => AppConfig::from_env()?,
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if args.debug {
        config.service.log_level = "debug".to_string();
    }
    if let Some(team_size) = args.team_size {
        config.formation.team_size = team_size;
    }
    if let Some(max_candidates) = args.max_candidates {
        config.formation.max_candidates_per_team = max_candidates;
    }
    if let Some(interval) = args.pass_interval_ms {
        config.service.pass_interval_ms = interval;
    }

    validate_config(&config)?;
    Ok(config)
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    let scoring = &config.formation.scoring;
    info!("Squad Room team formation");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Team size: {}", config.formation.team_size);
    info!(
        "   Candidate budget: {} per team",
        config.formation.max_candidates_per_team
    );
    info!(
        "   Weights: skill {} / latency {} / wait {}",
        scoring.skill_weight, scoring.latency_weight, scoring.wait_weight
    );
    info!(
        "   Norms: skill {} / latency {} / wait {}s",
        scoring.skill_norm, scoring.latency_norm, scoring.wait_norm
    );
    info!("   Duplicate policy: {}", config.formation.duplicate_policy);
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

fn print_team(index: usize, team: &Team) {
    let now = current_timestamp();
    println!("Team {}:", index + 1);
    for participant in &team.members {
        println!(
            "  Participant {}, skill: {}, latency: {}ms, waiting: {:.1}s",
            participant.id,
            participant.skill,
            participant.latency_ms,
            participant.waiting_time(now).as_secs_f64()
        );
    }
    println!("  Skill spread: {}", team.skill_spread());
    println!("  Latency spread: {}ms", team.latency_spread());
    println!(
        "  Max waiting time: {:.1}s",
        team.max_waiting_time(now).as_secs_f64()
    );
    println!();
}

/// Enqueue the four sample participants, let them wait, then run one pass
async fn run_demo(matchmaker: &Matchmaker, wait: Duration) -> Result<()> {
    for (id, skill) in [("1", 1050), ("2", 1180), ("3", 1220), ("4", 1350)] {
        matchmaker.handle_queue_request(QueueRequest {
            participant_id: id.to_string(),
            skill,
            latency_ms: 50,
        });
    }

    info!("Demo participants enqueued, waiting {:?}", wait);
    sleep(wait).await;

    let outcome = matchmaker.run_pass()?;
    for (index, team) in outcome.teams.iter().enumerate() {
        print_team(index, team);
    }
    if !outcome.residual.is_empty() {
        println!("Unmatched: {}", outcome.residual.len());
    }

    Ok(())
}

/// Deterministic spread of skills and latencies for simulated arrivals
fn simulated_request(index: usize) -> QueueRequest {
    let index = index as i64;
    QueueRequest {
        participant_id: format!("sim-{}", index),
        skill: 800 + (index * 7919) % 1400,
        latency_ms: 10 + (index * 104_729) % 190,
    }
}

/// Feed simulated participants from concurrent producers while passes run periodically
async fn run_simulation(
    matchmaker: Arc<Matchmaker>,
    config: &AppConfig,
    total: usize,
    producers: usize,
) -> Result<()> {
    let producers = producers.max(1);
    let (outcome_tx, mut outcome_rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let pass_task =
        Arc::clone(&matchmaker).spawn_periodic(config.pass_interval(), outcome_tx, shutdown_rx);

    let producer_tasks: Vec<_> = (0..producers)
        .map(|producer| {
            let matchmaker = Arc::clone(&matchmaker);
            tokio::spawn(async move {
                for index in (producer..total).step_by(producers) {
                    matchmaker.handle_queue_request(simulated_request(index));
                    sleep(Duration::from_millis(5)).await;
                }
            })
        })
        .collect();

    // Stop once every producer is done and the pool can no longer fill a team
    let supervisor = {
        let matchmaker = Arc::clone(&matchmaker);
        let shutdown_tx = Arc::clone(&shutdown_tx);
        let team_size = config.formation.team_size;
        let poll = config.pass_interval();
        tokio::spawn(async move {
            for task in producer_tasks {
                if let Err(e) = task.await {
                    warn!("Producer task failed: {}", e);
                }
            }
            while matchmaker.pool().len() >= team_size {
                sleep(poll).await;
            }
            let _ = shutdown_tx.send(true);
        })
    };

    let signal_task = {
        let shutdown_tx = Arc::clone(&shutdown_tx);
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
    };

    while let Some(outcome) = outcome_rx.recv().await {
        for team in &outcome.teams {
            let report = TeamReport {
                pass_id: outcome.pass_id,
                members: &team.members,
                skill_spread: team.skill_spread(),
                latency_spread: team.latency_spread(),
                max_wait_seconds: team.max_waiting_time(current_timestamp()).as_secs_f64(),
                score: team.score,
                candidates_evaluated: team.candidates_evaluated,
            };
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    match tokio::time::timeout(config.shutdown_timeout(), pass_task).await {
        Ok(_) => info!("Formation loop stopped"),
        Err(_) => warn!("Shutdown timeout exceeded waiting for formation loop"),
    }
    supervisor.abort();
    signal_task.abort();

    info!(
        "Simulation finished - {} participants left waiting",
        matchmaker.pool().len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Dry run completed - configuration is valid");
        return Ok(());
    }

    let matchmaker = Arc::new(Matchmaker::new(config.formation.clone())?);

    match args.simulate {
        Some(total) => {
            run_simulation(Arc::clone(&matchmaker), &config, total, args.producers).await?
        }
        None => run_demo(&matchmaker, Duration::from_millis(args.demo_wait_ms)).await?,
    }

    if args.print_metrics {
        print!("{}", matchmaker.metrics().gather_text()?);
    }

    Ok(())
}
