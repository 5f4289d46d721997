//! Descriptor nodes.
//!
//! Descriptors are plain values: they are assembled by application code at
//! startup, handed to the registry once, and never mutated afterwards.

mod field;
mod key;
mod model;
mod relation;

pub use field::FieldDescriptor;
pub use key::ModelKey;
pub use model::{ModelBuilder, ModelDescriptor};
pub use relation::{RelationDescriptor, ResolvedRelation};
