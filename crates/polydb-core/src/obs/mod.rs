//! Observability: dispatch and schema-emission counters.
//!
//! Runtime code reports through [`MetricsEvent`] and [`MetricsSink`] only;
//! nothing outside this module touches counter state.

mod sink;

pub use sink::{
    ApplicationCounters, DispatchMetrics, MetricsEvent, MetricsSink, MetricsSnapshot,
};
