//! Model metadata for PolyDB: model keys, field and relation descriptors,
//! and the registry that seals them before routing takes over.

pub mod node;
pub mod registry;
pub mod types;
pub mod validate;

/// Maximum length for application, model, table and field identifiers.
pub const MAX_IDENT_LEN: usize = 64;

/// Separator between the application and model halves of a model reference.
pub const MODEL_KEY_SEPARATOR: char = '.';

use thiserror::Error as ThisError;

pub use registry::{ModelRegistry, RegistryError};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        node::{
            FieldDescriptor, ModelBuilder, ModelDescriptor, ModelKey, RelationDescriptor,
            ResolvedRelation,
        },
        registry::ModelRegistry,
        types::{FieldKind, RelationKind},
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    RegistryError(#[from] RegistryError),
}
