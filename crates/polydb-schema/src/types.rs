use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// FieldKind
///
/// Storage-neutral value shape of a model field.
/// Backends map each kind onto their own column types.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum FieldKind {
    Blob,
    Bool,
    Float,
    Int,
    Text,
    Timestamp,
}

impl FieldKind {
    /// Integer keys are the only kind a backend may generate on insert.
    #[must_use]
    pub const fn supports_generation(self) -> bool {
        matches!(self, Self::Int)
    }

    #[must_use]
    pub const fn supports_primary_key(self) -> bool {
        !matches!(self, Self::Blob | Self::Bool | Self::Float)
    }
}

///
/// RelationKind
///
/// `ForeignKey` stores the target key in a column on the source table,
/// `ManyToMany` stores pairs in a dedicated join table.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum RelationKind {
    ForeignKey,
    ManyToMany,
}

impl RelationKind {
    #[must_use]
    pub const fn uses_join_table(self) -> bool {
        matches!(self, Self::ManyToMany)
    }
}
