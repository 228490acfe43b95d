//! Metrics for the squad-room service
//!
//! Prometheus counters, gauges and histograms covering pool traffic and
//! formation passes.

pub mod collector;

pub use collector::{FormationMetrics, MetricsCollector, MetricsTimer, PoolMetrics};
