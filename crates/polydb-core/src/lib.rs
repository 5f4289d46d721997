//! Core runtime for PolyDB: the connection capability, application routing,
//! startup orchestration and query dispatch.
//!
//! Startup runs `Orchestrator` through its phases once per process; the
//! resulting [`Db`] handle is the only way queries reach a connection.

pub mod connection;
pub mod db;
pub mod error;
pub mod obs;
pub mod orchestrator;
pub mod routing;
pub mod schema;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use connection::{BackendError, BackendErrorKind, Connection, ConnectionHandle, Dialect};
pub use db::{Db, QueryError, QueryTarget};
pub use error::{Error, ErrorClass};
pub use orchestrator::{Orchestrator, OrchestratorError, Phase};
pub use routing::{ConnectionId, Router, RoutingConfig, RoutingError, RoutingTable};
pub use schema::{JoinTable, SchemaEmitter, SchemaGroup};
pub use value::{Row, Rows, Value};

///
/// Prelude
///
/// Vocabulary needed to declare models, wire connections and issue queries.
///

pub mod prelude {
    pub use crate::{
        connection::{BackendError, BackendErrorKind, Connection, ConnectionHandle, Dialect},
        db::Db,
        orchestrator::Orchestrator,
        routing::RoutingConfig,
        schema::{SchemaEmitter, SchemaGroup},
        value::{Row, Rows, Value},
    };
    pub use polydb_schema::prelude::*;
}
