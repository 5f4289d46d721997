//! Query dispatch.
//!
//! [`Db`] is handed out by a running orchestrator. Every query resolves its
//! connection through the [`Router`] at call time; backend failures come
//! back exactly as the connection reported them.

use crate::{
    connection::{BackendError, ConnectionHandle},
    error::ErrorClass,
    obs::{DispatchMetrics, MetricsEvent, MetricsSink},
    routing::{Router, RoutingError},
    value::Rows,
};
use polydb_schema::node::{ModelDescriptor, ModelKey};
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::{debug, warn};

///
/// QueryError
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl QueryError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Routing(_) => ErrorClass::Routing,
            Self::Backend(_) => ErrorClass::Backend,
        }
    }

    #[must_use]
    pub const fn backend(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Routing(_) => None,
        }
    }

    /// The backend's own error, if the query reached a connection.
    pub fn into_backend(self) -> Result<BackendError, Self> {
        match self {
            Self::Backend(err) => Ok(err),
            other => Err(other),
        }
    }
}

///
/// QueryTarget
///
/// What a query is addressed to: a model, or a whole application.
///

#[derive(Clone, Copy, Debug)]
pub enum QueryTarget<'a> {
    Model(&'a ModelKey),
    Application(&'a str),
}

impl QueryTarget<'_> {
    #[must_use]
    pub fn app(&self) -> &str {
        match self {
            Self::Model(key) => &key.app,
            Self::Application(app) => app,
        }
    }
}

impl<'a> From<&'a ModelKey> for QueryTarget<'a> {
    fn from(key: &'a ModelKey) -> Self {
        Self::Model(key)
    }
}

impl<'a> From<&'a ModelDescriptor> for QueryTarget<'a> {
    fn from(model: &'a ModelDescriptor) -> Self {
        Self::Model(&model.key)
    }
}

impl<'a> From<&'a str> for QueryTarget<'a> {
    fn from(app: &'a str) -> Self {
        Self::Application(app)
    }
}

///
/// Db
///
/// Cheap to clone; clones share the routing table and metrics.
///

#[derive(Clone, Debug)]
pub struct Db {
    router: Router,
    metrics: Arc<DispatchMetrics>,
}

impl Db {
    #[must_use]
    pub(crate) const fn new(router: Router, metrics: Arc<DispatchMetrics>) -> Self {
        Self { router, metrics }
    }

    #[must_use]
    pub const fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Run `sql` on the connection owning `target`.
    pub async fn execute<'a>(
        &self,
        target: impl Into<QueryTarget<'a>>,
        sql: &str,
    ) -> Result<Rows, QueryError> {
        let target = target.into();
        let connection = match target {
            QueryTarget::Model(key) => self.router.connection_for(key),
            QueryTarget::Application(app) => self.router.connection_for_app(app),
        };

        self.dispatch(target.app(), connection, sql).await
    }

    /// Run `sql` on the connection shared by relation `field` of `source`.
    pub async fn execute_for_relation(
        &self,
        source: &ModelKey,
        field: &str,
        sql: &str,
    ) -> Result<Rows, QueryError> {
        let connection = self.router.connection_for_field(source, field);

        self.dispatch(&source.app, connection, sql).await
    }

    async fn dispatch(
        &self,
        app: &str,
        connection: Result<&ConnectionHandle, RoutingError>,
        sql: &str,
    ) -> Result<Rows, QueryError> {
        let connection = connection.inspect_err(|err| {
            warn!(app, error = %err, "query not routed");
            self.metrics.record(MetricsEvent::RoutingFailure);
        })?;

        debug!(app, dialect = %connection.dialect(), sql, "dispatch");

        match connection.execute(sql).await {
            Ok(rows) => {
                self.metrics.record(MetricsEvent::Dispatch {
                    app,
                    rows: u64::try_from(rows.len()).unwrap_or(u64::MAX),
                });
                Ok(rows)
            }
            Err(err) => {
                warn!(app, kind = %err.kind, error = %err, "backend error");
                self.metrics.record(MetricsEvent::BackendFailure {
                    app,
                    kind: err.kind,
                });
                Err(QueryError::Backend(err))
            }
        }
    }
}
