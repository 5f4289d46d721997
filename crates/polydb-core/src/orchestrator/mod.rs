//! Startup orchestration.
//!
//! An [`Orchestrator`] walks one process through
//! `Unstarted → Registering → Validating → SchemaReady → Running`.
//! Transitions only move forward, and a failed transition leaves the
//! phase where it was.

mod group;
mod validate;

use crate::{
    connection::BackendError,
    db::Db,
    error::{Error, ErrorClass},
    obs::{DispatchMetrics, MetricsEvent, MetricsSink},
    routing::{Router, RoutingConfig, RoutingTable},
    schema::{SchemaEmitter, SchemaGroup},
};
use derive_more::Display;
use polydb_schema::{ModelRegistry, node::ModelDescriptor};
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::{debug, info};

///
/// Phase
///

#[derive(Clone, Copy, Debug, Display, Eq, Ord, PartialEq, PartialOrd)]
pub enum Phase {
    #[display("unstarted")]
    Unstarted,
    #[display("registering")]
    Registering,
    #[display("validating")]
    Validating,
    #[display("schema_ready")]
    SchemaReady,
    #[display("running")]
    Running,
}

///
/// OrchestratorError
///

#[derive(Debug, ThisError)]
pub enum OrchestratorError {
    #[error("orchestrator is already running")]
    AlreadyStarted,

    #[error("orchestrator is {found}, expected {expected}")]
    InvalidPhase { expected: Phase, found: Phase },

    #[error(
        "table '{table}' on connection for [{applications}] is claimed by {first} and {second}"
    )]
    TableConflict {
        applications: String,
        table: String,
        first: String,
        second: String,
    },

    #[error("schema emission failed for [{applications}]: {error}")]
    SchemaEmit {
        applications: String,
        #[source]
        error: BackendError,
    },
}

impl OrchestratorError {
    /// Emission failures are reported by a backend; everything else is a
    /// startup configuration error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::SchemaEmit { .. } => ErrorClass::Backend,
            _ => ErrorClass::Configuration,
        }
    }
}

///
/// Orchestrator
///
/// Owns the model registry and routing table for one process. Several
/// orchestrators may coexist; nothing here is global.
///

#[derive(Debug)]
pub struct Orchestrator {
    phase: Phase,
    registry: ModelRegistry,
    table: Option<Arc<RoutingTable>>,
    groups: Vec<SchemaGroup>,
    metrics: Arc<DispatchMetrics>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Unstarted,
            registry: ModelRegistry::new(),
            table: None,
            groups: Vec::new(),
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    /// Run every startup phase and return the live dispatch handle.
    pub async fn init(
        config: RoutingConfig,
        models: impl IntoIterator<Item = ModelDescriptor>,
        emitter: &dyn SchemaEmitter,
    ) -> Result<Db, Error> {
        let mut orchestrator = Self::new();
        orchestrator.configure(config)?;
        orchestrator.register_all(models)?;
        orchestrator.finalize()?;
        orchestrator.emit_schema(emitter).await?;

        orchestrator.start()
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Groups computed by the last successful [`validate`](Self::validate).
    #[must_use]
    pub fn schema_groups(&self) -> &[SchemaGroup] {
        &self.groups
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), OrchestratorError> {
        match self.phase {
            found if found == expected => Ok(()),
            Phase::Running => Err(OrchestratorError::AlreadyStarted),
            found => Err(OrchestratorError::InvalidPhase { expected, found }),
        }
    }

    fn advance(&mut self, next: Phase) {
        info!(from = %self.phase, to = %next, "orchestrator phase");
        self.phase = next;
    }

    fn routing_table(&self) -> Result<Arc<RoutingTable>, OrchestratorError> {
        self.table
            .clone()
            .ok_or(OrchestratorError::InvalidPhase {
                expected: Phase::Registering,
                found: self.phase,
            })
    }

    /// Accept the routing configuration and freeze it into the routing table.
    pub fn configure(&mut self, config: RoutingConfig) -> Result<(), Error> {
        self.expect_phase(Phase::Unstarted)?;

        let table = RoutingTable::new(config);
        debug!(routes = ?table, "routing table built");
        self.table = Some(Arc::new(table));
        self.advance(Phase::Registering);

        Ok(())
    }

    /// Add one model. Models may be registered before or after `configure`,
    /// but not once the registry has been finalized.
    pub fn register(&mut self, model: ModelDescriptor) -> Result<(), Error> {
        if self.phase == Phase::Running {
            return Err(OrchestratorError::AlreadyStarted.into());
        }

        debug!(model = %model.key, table = %model.table, "register model");
        self.registry.register(model)?;

        Ok(())
    }

    pub fn register_all(
        &mut self,
        models: impl IntoIterator<Item = ModelDescriptor>,
    ) -> Result<(), Error> {
        for model in models {
            self.register(model)?;
        }

        Ok(())
    }

    /// Seal the registry and resolve every relation target.
    pub fn finalize(&mut self) -> Result<(), Error> {
        self.expect_phase(Phase::Registering)?;
        self.registry.finalize()?;
        self.advance(Phase::Validating);

        Ok(())
    }

    /// Check routing and relations, then partition models by connection.
    ///
    /// Fails on the first unrouted application (sorted by name), the first
    /// relation leaving its application, or the first table name claimed
    /// twice on one connection.
    pub fn validate(&mut self) -> Result<&[SchemaGroup], Error> {
        self.expect_phase(Phase::Validating)?;
        let table = self.routing_table()?;

        validate::validate_routed(&table, &self.registry)?;
        validate::validate_relations(&table, self.registry.relations()?)?;

        let groups = group::build_groups(&table, &self.registry)?;
        for group in &groups {
            validate::validate_table_names(group)?;
        }

        self.groups = groups;

        Ok(&self.groups)
    }

    /// Validate, then hand each connection its group, in connection order.
    pub async fn emit_schema(&mut self, emitter: &dyn SchemaEmitter) -> Result<(), Error> {
        self.validate()?;
        let table = self.routing_table()?;

        for (group, (connection_id, connection)) in self.groups.iter().zip(table.connections()) {
            debug_assert_eq!(group.connection_id, connection_id);

            info!(
                connection = %connection_id,
                dialect = %connection.dialect(),
                applications = ?group.applications,
                models = group.models.len(),
                "emit schema"
            );
            emitter
                .emit(connection.as_ref(), group)
                .await
                .map_err(|error| OrchestratorError::SchemaEmit {
                    applications: group.applications.join(", "),
                    error,
                })?;

            self.metrics.record(MetricsEvent::SchemaEmitted {
                connection: connection_id,
                models: u64::try_from(group.models.len()).unwrap_or(u64::MAX),
            });
        }

        self.advance(Phase::SchemaReady);

        Ok(())
    }

    /// Open the router for live queries.
    pub fn start(&mut self) -> Result<Db, Error> {
        self.expect_phase(Phase::SchemaReady)?;
        let table = self.routing_table()?;

        let router = Router::new(table, Arc::new(self.registry.clone()));
        self.advance(Phase::Running);

        Ok(Db::new(router, Arc::clone(&self.metrics)))
    }
}
