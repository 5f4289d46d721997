use crate::{node::ModelKey, types::RelationKind};
use serde::{Deserialize, Serialize};

///
/// RelationDescriptor
///
/// Outgoing relation as declared on the source model. The target is kept
/// as a reference string because it may name a model that has not been
/// registered yet; the registry resolves it on finalize.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RelationDescriptor {
    pub field: String,
    pub kind: RelationKind,
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub through: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backward_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_key: Option<String>,

    /// Foreign keys only: the source row may exist without a target.
    #[serde(default)]
    pub nullable: bool,
}

impl RelationDescriptor {
    #[must_use]
    pub fn new(field: impl Into<String>, kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            target: target.into(),
            through: None,
            related_name: None,
            backward_key: None,
            forward_key: None,
            nullable: false,
        }
    }

    #[must_use]
    pub fn many_to_many(field: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(field, RelationKind::ManyToMany, target)
    }

    #[must_use]
    pub fn foreign_key(field: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(field, RelationKind::ForeignKey, target)
    }

    /// Join table name (many-to-many only).
    #[must_use]
    pub fn through(mut self, table: impl Into<String>) -> Self {
        self.through = Some(table.into());
        self
    }

    /// Name under which the target model reaches back to the source.
    #[must_use]
    pub fn related_name(mut self, name: impl Into<String>) -> Self {
        self.related_name = Some(name.into());
        self
    }

    /// Join-table column holding the source key.
    #[must_use]
    pub fn backward_key(mut self, column: impl Into<String>) -> Self {
        self.backward_key = Some(column.into());
        self
    }

    /// Join-table column (or foreign-key column) holding the target key.
    #[must_use]
    pub fn forward_key(mut self, column: impl Into<String>) -> Self {
        self.forward_key = Some(column.into());
        self
    }

    /// Allow the foreign-key column to be NULL.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Source-table column of a foreign key; `<field>_id` unless overridden.
    #[must_use]
    pub fn foreign_key_column(&self) -> Option<String> {
        match self.kind {
            RelationKind::ForeignKey => Some(
                self.forward_key
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", self.field)),
            ),
            RelationKind::ManyToMany => None,
        }
    }
}

///
/// ResolvedRelation
///
/// A relation after registry finalization: both endpoints are registered
/// models and every storage name has been defaulted.
///
/// For `ForeignKey` relations `forward_key` is the column on the source
/// table, `through` is `None`, and `nullable` says whether that column
/// accepts NULL. Many-to-many relations are never nullable.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResolvedRelation {
    pub source: ModelKey,
    pub field: String,
    pub kind: RelationKind,
    pub target: ModelKey,
    pub source_table: String,
    pub target_table: String,
    pub through: Option<String>,
    pub related_name: String,
    pub backward_key: String,
    pub forward_key: String,
    pub nullable: bool,
}

impl ResolvedRelation {
    /// Both endpoints are declared in the same application.
    #[must_use]
    pub fn is_same_application(&self) -> bool {
        self.source.app == self.target.app
    }

    #[must_use]
    pub fn involves(&self, model: &ModelKey) -> bool {
        &self.source == model || &self.target == model
    }

    /// `source.field`, used in diagnostics.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.source, self.field)
    }
}
