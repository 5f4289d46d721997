//! ## Crate layout
//! - `schema`: model keys, field and relation descriptors, the model registry.
//! - `core`: connections, routing, startup orchestration and query dispatch.
//! - `sqlite`: SQLite reference backend (feature `sqlite`, on by default).
//!
//! Startup is one call to [`Orchestrator::init`](core::Orchestrator::init)
//! with a routing config, the model descriptors and a schema emitter. The
//! returned [`Db`](core::Db) is the only way queries reach a connection.

pub use polydb_core as core;
pub use polydb_schema as schema;

#[cfg(feature = "sqlite")]
pub use polydb_sqlite as sqlite;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use polydb_core::{Db, Error, Orchestrator};

///
/// Prelude
///

pub mod prelude {
    pub use polydb_core::prelude::*;

    #[cfg(feature = "sqlite")]
    pub use polydb_sqlite::{SqliteBackend, SqliteRoutingConfig, SqliteSchemaEmitter};
}
