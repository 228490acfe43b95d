//! Matchmaker coordinating the waiting pool and the formation engine
//!
//! A pass snapshots the pool, runs the engine on the copy and then removes
//! the matched identities. Only snapshot members are ever removed, so
//! participants enqueued while the engine runs stay in the pool for the next
//! pass. Passes are serialized by an internal lock.

use crate::clock::{Clock, SystemClock};
use crate::config::formation::FormationConfig;
use crate::error::Result;
use crate::formation::engine::TeamFormationEngine;
use crate::metrics::MetricsCollector;
use crate::queue::WaitingPool;
use crate::types::{FormationOutcome, Participant, QueueRequest};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Owner of the waiting pool and the formation engine
pub struct Matchmaker {
    pool: Arc<WaitingPool>,
    engine: TeamFormationEngine,
    metrics: Arc<MetricsCollector>,
    pass_lock: Mutex<()>,
}

impl Matchmaker {
    /// Create a matchmaker on the system clock
    pub fn new(config: FormationConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a matchmaker on the given clock
    pub fn with_clock(config: FormationConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let engine = TeamFormationEngine::new(config, clock)?;
        let metrics = Arc::new(MetricsCollector::new()?);
        Ok(Self::with_components(
            Arc::new(WaitingPool::new()),
            engine,
            metrics,
        ))
    }

    /// Create a matchmaker from pre-built components
    pub fn with_components(
        pool: Arc<WaitingPool>,
        engine: TeamFormationEngine,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            pool,
            engine,
            metrics,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> Arc<WaitingPool> {
        Arc::clone(&self.pool)
    }

    pub fn config(&self) -> &FormationConfig {
        self.engine.config()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// Stamp a queue request with the current time and add it to the pool
    pub fn handle_queue_request(&self, request: QueueRequest) -> bool {
        let participant = Participant::new(
            request.participant_id,
            request.skill,
            request.latency_ms,
            self.engine.clock().now(),
        );
        self.enqueue(participant)
    }

    /// Add an already stamped participant to the pool
    pub fn enqueue(&self, participant: Participant) -> bool {
        let participant_id = participant.id.clone();
        let accepted = self.pool.enqueue(participant);
        self.metrics.record_enqueue(accepted, self.pool.len());

        if !accepted {
            debug!(
                "Participant '{}' is already waiting, enqueue ignored",
                participant_id
            );
        }
        accepted
    }

    /// Run one formation pass and remove the matched participants from the pool
    pub fn run_pass(&self) -> Result<FormationOutcome> {
        let _pass = self
            .pass_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let timer = self.metrics.start_timer();

        let snapshot = self.pool.snapshot();
        let outcome = match self.engine.form_teams(snapshot) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.metrics.record_pass_error();
                error!("Formation pass failed: {}", e);
                return Err(e);
            }
        };

        let removed = self.pool.remove_all(outcome.matched_participants());
        if removed != outcome.matched_count() {
            warn!(
                "Pass {} matched {} participants but only {} were still pooled",
                outcome.pass_id,
                outcome.matched_count(),
                removed
            );
        }

        let duration = timer.stop();
        self.metrics
            .record_pass(&outcome, duration, self.pool.len());

        for (index, team) in outcome.teams.iter().enumerate() {
            info!(
                "Pass {} team {} - members: {:?}, skill spread: {}, latency spread: {}ms, score: {:?}",
                outcome.pass_id,
                index + 1,
                team.member_ids(),
                team.skill_spread(),
                team.latency_spread(),
                team.score
            );
        }
        info!(
            "Pass {} finished in {:.2}ms - teams: {}, residual: {}",
            outcome.pass_id,
            duration.as_secs_f64() * 1000.0,
            outcome.teams.len(),
            outcome.residual.len()
        );

        Ok(outcome)
    }

    /// Run formation passes every `interval` until `shutdown` flips to true
    ///
    /// Outcomes with at least one team are sent to `outcomes`; the loop also
    /// stops once the receiver is dropped.
    pub fn spawn_periodic(
        self: Arc<Self>,
        interval: Duration,
        outcomes: mpsc::Sender<FormationOutcome>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!("Starting periodic formation passes every {:?}", interval);

            loop {
                if *shutdown.borrow() {
                    break;
                }

                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }

                let matchmaker = Arc::clone(&self);
                match tokio::task::spawn_blocking(move || matchmaker.run_pass()).await {
                    Ok(Ok(outcome)) if !outcome.teams.is_empty() => {
                        if outcomes.send(outcome).await.is_err() {
                            info!("Outcome receiver dropped, stopping periodic passes");
                            break;
                        }
                    }
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => error!("Scheduled formation pass failed: {}", e),
                    Err(e) => error!("Formation pass task panicked: {}", e),
                }
            }

            info!("Periodic formation passes stopped");
        })
    }
}
