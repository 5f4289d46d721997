//! Application routing.
//!
//! `RoutingConfig` collects application → connection pairs once at startup,
//! `RoutingTable` freezes them, and `Router` answers every "which connection"
//! question against the frozen table.

mod config;
mod router;
mod table;

pub use config::RoutingConfig;
pub use router::Router;
pub use table::{ConnectionId, RoutingTable};

pub(crate) use router::relation_connection;

use polydb_schema::node::ModelKey;
use thiserror::Error as ThisError;

///
/// RoutingError
///

#[derive(Debug, ThisError)]
pub enum RoutingError {
    #[error("application '{0}' has no routed connection")]
    UnroutedApplication(String),

    #[error("application '{0}' is already routed to a different connection")]
    DuplicateRoute(String),

    #[error("invalid application name: {0}")]
    InvalidApplication(String),

    #[error(
        "relation '{relation}' links application '{source_app}' to application '{target_app}'; relations cannot cross databases"
    )]
    CrossDatabaseRelation {
        relation: String,
        source_app: String,
        target_app: String,
    },

    #[error("model '{0}' is not registered")]
    UnknownModel(ModelKey),

    #[error("model '{model}' has no relation '{field}'")]
    UnknownRelation { model: ModelKey, field: String },
}
