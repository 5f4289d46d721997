use crate::{connection::BackendErrorKind, routing::ConnectionId};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
};

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    Dispatch {
        app: &'a str,
        rows: u64,
    },
    BackendFailure {
        app: &'a str,
        kind: BackendErrorKind,
    },
    RoutingFailure,
    SchemaEmitted {
        connection: ConnectionId,
        models: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// ApplicationCounters
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ApplicationCounters {
    pub queries: u64,
    pub rows_returned: u64,
    pub backend_errors: u64,
    pub missing_objects: u64,
}

///
/// MetricsSnapshot
///
/// Point-in-time copy of every counter. Connection counters are keyed by
/// connection index.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub queries: u64,
    pub backend_errors: u64,
    pub routing_errors: u64,
    pub applications: BTreeMap<String, ApplicationCounters>,
    pub schema_emissions: BTreeMap<usize, u64>,
    pub models_emitted: u64,
}

///
/// DispatchMetrics
///
/// Default sink: process-local counters behind one lock. Counters
/// saturate instead of wrapping.
///

#[derive(Debug, Default)]
pub struct DispatchMetrics {
    state: Mutex<MetricsSnapshot>,
}

impl DispatchMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state_mut(&self, f: impl FnOnce(&mut MetricsSnapshot)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clear query counters. Schema emission counts are startup facts and
    /// are kept.
    pub fn reset_queries(&self) {
        self.with_state_mut(|m| {
            m.queries = 0;
            m.backend_errors = 0;
            m.routing_errors = 0;
            m.applications.clear();
        });
    }
}

impl MetricsSink for DispatchMetrics {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::Dispatch { app, rows } => self.with_state_mut(|m| {
                m.queries = m.queries.saturating_add(1);

                let entry = m.applications.entry(app.to_string()).or_default();
                entry.queries = entry.queries.saturating_add(1);
                entry.rows_returned = entry.rows_returned.saturating_add(rows);
            }),

            MetricsEvent::BackendFailure { app, kind } => self.with_state_mut(|m| {
                m.queries = m.queries.saturating_add(1);
                m.backend_errors = m.backend_errors.saturating_add(1);

                let entry = m.applications.entry(app.to_string()).or_default();
                entry.queries = entry.queries.saturating_add(1);
                entry.backend_errors = entry.backend_errors.saturating_add(1);
                if kind == BackendErrorKind::MissingObject {
                    entry.missing_objects = entry.missing_objects.saturating_add(1);
                }
            }),

            MetricsEvent::RoutingFailure => self.with_state_mut(|m| {
                m.routing_errors = m.routing_errors.saturating_add(1);
            }),

            MetricsEvent::SchemaEmitted { connection, models } => self.with_state_mut(|m| {
                let count = m.schema_emissions.entry(connection.index()).or_default();
                *count = count.saturating_add(1);
                m.models_emitted = m.models_emitted.saturating_add(models);
            }),
        }
    }
}
