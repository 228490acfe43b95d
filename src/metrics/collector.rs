//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the waiting pool and the team
//! formation engine using Prometheus metrics.

use crate::types::FormationOutcome;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the team-formation service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Waiting pool metrics
    pool_metrics: PoolMetrics,

    /// Formation pass metrics
    formation_metrics: FormationMetrics,
}

/// Waiting pool metrics
#[derive(Clone)]
pub struct PoolMetrics {
    /// Participants accepted into the pool
    pub participants_enqueued_total: IntCounter,

    /// Enqueue calls ignored because the identity was already waiting
    pub duplicate_enqueues_total: IntCounter,

    /// Participants currently waiting
    pub pool_size: IntGauge,
}

/// Formation pass metrics
#[derive(Clone)]
pub struct FormationMetrics {
    /// Formation passes run
    pub passes_total: IntCounter,

    /// Formation passes that failed
    pub pass_errors_total: IntCounter,

    /// Teams emitted
    pub teams_formed_total: IntCounter,

    /// Participants placed into teams
    pub participants_matched_total: IntCounter,

    /// Teams chosen by the first-N fallback
    pub fallback_selections_total: IntCounter,

    /// Candidate combinations scored per team
    pub candidates_scored: Histogram,

    /// Wall time of a formation pass
    pub pass_duration_seconds: Histogram,

    /// Participants left over after the last pass
    pub residual_size: IntGauge,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let pool_metrics = PoolMetrics::new(&registry)?;
        let formation_metrics = FormationMetrics::new(&registry)?;

        Ok(Self {
            registry,
            pool_metrics,
            formation_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get pool metrics
    pub fn pool(&self) -> &PoolMetrics {
        &self.pool_metrics
    }

    /// Get formation metrics
    pub fn formation(&self) -> &FormationMetrics {
        &self.formation_metrics
    }

    /// Record an enqueue attempt and the resulting pool size
    pub fn record_enqueue(&self, accepted: bool, pool_size: usize) {
        if accepted {
            self.pool_metrics.participants_enqueued_total.inc();
        } else {
            self.pool_metrics.duplicate_enqueues_total.inc();
        }
        self.pool_metrics.pool_size.set(pool_size as i64);
    }

    /// Record a completed formation pass
    pub fn record_pass(&self, outcome: &FormationOutcome, duration: Duration, pool_size: usize) {
        let formation = &self.formation_metrics;

        formation.passes_total.inc();
        formation
            .pass_duration_seconds
            .observe(duration.as_secs_f64());
        formation.teams_formed_total.inc_by(outcome.teams.len() as u64);
        formation
            .participants_matched_total
            .inc_by(outcome.matched_count() as u64);

        for team in &outcome.teams {
            formation
                .candidates_scored
                .observe(team.candidates_evaluated as f64);
            if team.is_fallback() {
                formation.fallback_selections_total.inc();
            }
        }

        formation.residual_size.set(outcome.residual.len() as i64);
        self.pool_metrics.pool_size.set(pool_size as i64);
    }

    /// Record a formation pass that returned an error
    pub fn record_pass_error(&self) {
        self.formation_metrics.passes_total.inc();
        self.formation_metrics.pass_errors_total.inc();
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn gather_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl PoolMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let participants_enqueued_total = IntCounter::new(
            "squad_room_participants_enqueued_total",
            "Total participants accepted into the waiting pool",
        )?;
        registry.register(Box::new(participants_enqueued_total.clone()))?;

        let duplicate_enqueues_total = IntCounter::new(
            "squad_room_duplicate_enqueues_total",
            "Total enqueue calls ignored for an identity already waiting",
        )?;
        registry.register(Box::new(duplicate_enqueues_total.clone()))?;

        let pool_size = IntGauge::new(
            "squad_room_pool_size",
            "Participants currently waiting in the pool",
        )?;
        registry.register(Box::new(pool_size.clone()))?;

        Ok(Self {
            participants_enqueued_total,
            duplicate_enqueues_total,
            pool_size,
        })
    }
}

impl FormationMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let passes_total =
            IntCounter::new("squad_room_passes_total", "Total formation passes run")?;
        registry.register(Box::new(passes_total.clone()))?;

        let pass_errors_total = IntCounter::new(
            "squad_room_pass_errors_total",
            "Total formation passes that failed",
        )?;
        registry.register(Box::new(pass_errors_total.clone()))?;

        let teams_formed_total =
            IntCounter::new("squad_room_teams_formed_total", "Total teams formed")?;
        registry.register(Box::new(teams_formed_total.clone()))?;

        let participants_matched_total = IntCounter::new(
            "squad_room_participants_matched_total",
            "Total participants placed into teams",
        )?;
        registry.register(Box::new(participants_matched_total.clone()))?;

        let fallback_selections_total = IntCounter::new(
            "squad_room_fallback_selections_total",
            "Total teams chosen without a scored candidate",
        )?;
        registry.register(Box::new(fallback_selections_total.clone()))?;

        let candidates_scored = Histogram::with_opts(
            HistogramOpts::new(
                "squad_room_candidates_scored",
                "Candidate combinations scored per team",
            )
            .buckets(vec![1.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]),
        )?;
        registry.register(Box::new(candidates_scored.clone()))?;

        let pass_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "squad_room_pass_duration_seconds",
                "Formation pass duration in seconds",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(pass_duration_seconds.clone()))?;

        let residual_size = IntGauge::new(
            "squad_room_residual_size",
            "Participants left unmatched by the last formation pass",
        )?;
        registry.register(Box::new(residual_size.clone()))?;

        Ok(Self {
            passes_total,
            pass_errors_total,
            teams_formed_total,
            participants_matched_total,
            fallback_selections_total,
            candidates_scored,
            pass_duration_seconds,
            residual_size,
        })
    }
}
