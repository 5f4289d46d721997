//! SQLite reference backend for PolyDB.
//!
//! [`SqliteBackend`] implements the core `Connection` capability over a
//! single-connection `sqlx` pool, [`SqliteSchemaEmitter`] renders and runs
//! the DDL for one schema group, and [`SqliteRoutingConfig`] opens one
//! backend per configured application.

mod backend;
mod config;
mod emitter;
mod statement;

pub use backend::SqliteBackend;
pub use config::SqliteRoutingConfig;
pub use emitter::{SqliteSchemaEmitter, schema_statements};
pub use statement::{insert_statement, quote_ident, quote_literal, select_all_statement};

use polydb_core::{BackendError, RoutingError};
use polydb_schema::node::ModelKey;
use thiserror::Error as ThisError;

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid sqlite routing config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("cannot open application '{app}' at '{url}': {error}")]
    Open {
        app: String,
        url: String,
        #[source]
        error: BackendError,
    },

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("model '{model}' has no column '{column}'")]
    UnknownColumn { model: ModelKey, column: String },
}
