use crate::{db::QueryError, orchestrator::OrchestratorError, routing::RoutingError};
use polydb_schema::RegistryError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error for startup and dispatch. Every variant wraps the
/// layer error unchanged so callers can match on the precise cause.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    RegistryError(#[from] RegistryError),

    #[error(transparent)]
    RoutingError(#[from] RoutingError),

    #[error(transparent)]
    OrchestratorError(#[from] OrchestratorError),

    #[error(transparent)]
    QueryError(#[from] QueryError),
}

impl Error {
    /// Classify the error. Anything raised outside query dispatch is a
    /// startup configuration failure.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::RegistryError(_) | Self::RoutingError(_) => ErrorClass::Configuration,
            Self::OrchestratorError(err) => err.class(),
            Self::QueryError(err) => err.class(),
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}

///
/// ErrorClass
///
/// - `Configuration`: fatal, startup-only, never retried
/// - `Routing`: routing invariant broken after startup
/// - `Backend`: reported by a connection for one operation
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    Routing,
    Backend,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::Routing => "routing",
            Self::Backend => "backend",
        };
        write!(f, "{label}")
    }
}
