//! Connection capability.
//!
//! The core never opens, pools or closes connections. It only needs to run
//! a query string and to know which dialect a schema emitter must speak.

use crate::value::Rows;
use async_trait::async_trait;
use derive_more::Display;
use serde::Serialize;
use std::{error::Error as StdError, fmt, sync::Arc};
use thiserror::Error as ThisError;

///
/// Connection
///
/// An opened handle to one storage backend.
///

#[async_trait]
pub trait Connection: Send + Sync {
    /// Dialect spoken by this backend.
    fn dialect(&self) -> Dialect;

    /// Run one query and return its rows, or the backend's own error.
    async fn execute(&self, query: &str) -> Result<Rows, BackendError>;
}

/// Shared handle to a caller-owned connection.
pub type ConnectionHandle = Arc<dyn Connection>;

// Handles are opaque; render the dialect and the shared allocation.
impl fmt::Debug for dyn Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.dialect(), self)
    }
}

///
/// Dialect
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum Dialect {
    #[display("mysql")]
    Mysql,
    #[display("{_0}")]
    Other(&'static str),
    #[display("postgres")]
    Postgres,
    #[display("sqlite")]
    Sqlite,
}

///
/// BackendError
///
/// Failure reported by a connection. The core passes it through untouched:
/// `message` is the backend's own diagnostic and `kind` is the backend's
/// classification of it.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,

    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl BackendError {
    #[must_use]
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the native driver error.
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn missing_object(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::MissingObject, message)
    }

    #[must_use]
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Constraint, message)
    }

    #[must_use]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Syntax, message)
    }

    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Connection, message)
    }

    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Other, message)
    }

    /// The addressed table, column or other object does not exist on this backend.
    #[must_use]
    pub const fn is_missing_object(&self) -> bool {
        matches!(self.kind, BackendErrorKind::MissingObject)
    }
}

///
/// BackendErrorKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum BackendErrorKind {
    Connection,
    Constraint,
    MissingObject,
    Other,
    Syntax,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connection => "connection",
            Self::Constraint => "constraint",
            Self::MissingObject => "missing_object",
            Self::Other => "other",
            Self::Syntax => "syntax",
        };
        write!(f, "{label}")
    }
}
