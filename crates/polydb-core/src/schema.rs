//! Schema emission boundary.
//!
//! The orchestrator partitions finalized models by connection and hands
//! each partition to a [`SchemaEmitter`] exactly once. DDL rendering and
//! idempotency belong to the emitter.

use crate::{
    connection::{BackendError, Connection},
    routing::ConnectionId,
};
use async_trait::async_trait;
use polydb_schema::node::{FieldDescriptor, ModelDescriptor, ModelKey, ResolvedRelation};
use serde::Serialize;

///
/// SchemaEmitter
///

#[async_trait]
pub trait SchemaEmitter: Send + Sync {
    /// Create storage for every model in `group` on `connection`.
    async fn emit(&self, connection: &dyn Connection, group: &SchemaGroup)
    -> Result<(), BackendError>;
}

///
/// SchemaGroup
///
/// Everything routed to one connection. `relations` only holds relations
/// whose source and target are both in `models`.
///

#[derive(Clone, Debug, Serialize)]
pub struct SchemaGroup {
    pub connection_id: ConnectionId,
    pub applications: Vec<String>,
    pub models: Vec<ModelDescriptor>,
    pub relations: Vec<ResolvedRelation>,
}

impl SchemaGroup {
    #[must_use]
    pub fn contains(&self, key: &ModelKey) -> bool {
        self.model(key).is_some()
    }

    #[must_use]
    pub fn model(&self, key: &ModelKey) -> Option<&ModelDescriptor> {
        self.models.iter().find(|model| &model.key == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Join tables required by the group's many-to-many relations.
    #[must_use]
    pub fn join_tables(&self) -> Vec<JoinTable<'_>> {
        self.relations
            .iter()
            .filter_map(|relation| {
                let name = relation.through.as_deref()?;
                let source = self.model(&relation.source)?;
                let target = self.model(&relation.target)?;

                Some(JoinTable {
                    name,
                    source_table: &source.table,
                    source_key: source.primary_key()?,
                    backward_key: &relation.backward_key,
                    target_table: &target.table,
                    target_key: target.primary_key()?,
                    forward_key: &relation.forward_key,
                })
            })
            .collect()
    }

    /// Table names this group will create, models first.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.models
            .iter()
            .map(|model| model.table.as_str())
            .chain(self.relations.iter().filter_map(|r| r.through.as_deref()))
    }
}

///
/// JoinTable
///
/// Link table of one many-to-many relation: `backward_key` references the
/// source table, `forward_key` the target table.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct JoinTable<'a> {
    pub name: &'a str,
    pub source_table: &'a str,
    pub source_key: &'a FieldDescriptor,
    pub backward_key: &'a str,
    pub target_table: &'a str,
    pub target_key: &'a FieldDescriptor,
    pub forward_key: &'a str,
}
