use crate::{
    connection::ConnectionHandle,
    routing::{ConnectionId, RoutingError, RoutingTable},
};
use polydb_schema::{
    ModelRegistry,
    node::{ModelKey, ResolvedRelation},
};
use std::sync::Arc;

///
/// Router
///
/// Resolves models, applications and relations to connections. Every
/// answer is a fresh lookup against the shared table; nothing is cached.
///

#[derive(Clone, Debug)]
pub struct Router {
    table: Arc<RoutingTable>,
    registry: Arc<ModelRegistry>,
}

impl Router {
    #[must_use]
    pub const fn new(table: Arc<RoutingTable>, registry: Arc<ModelRegistry>) -> Self {
        Self { table, registry }
    }

    #[must_use]
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Connection for every model of `app`.
    pub fn connection_for_app(&self, app: &str) -> Result<&ConnectionHandle, RoutingError> {
        self.table.resolve(app)
    }

    /// Connection for a registered model.
    pub fn connection_for(&self, model: &ModelKey) -> Result<&ConnectionHandle, RoutingError> {
        if !self.registry.contains(model) {
            return Err(RoutingError::UnknownModel(model.clone()));
        }

        self.table.resolve(&model.app)
    }

    /// Connection for relation `field` declared on `source`.
    pub fn connection_for_field(
        &self,
        source: &ModelKey,
        field: &str,
    ) -> Result<&ConnectionHandle, RoutingError> {
        let relation =
            self.registry
                .relation(source, field)
                .ok_or_else(|| RoutingError::UnknownRelation {
                    model: source.clone(),
                    field: field.to_string(),
                })?;

        self.connection_for_relation(relation)
    }

    /// Connection shared by both endpoints of `relation`.
    ///
    /// Both endpoints are resolved on every call; a relation whose endpoints
    /// disagree is rejected instead of silently using one side.
    pub fn connection_for_relation(
        &self,
        relation: &ResolvedRelation,
    ) -> Result<&ConnectionHandle, RoutingError> {
        let id = relation_connection(&self.table, relation)?;

        self.table
            .connection(id)
            .ok_or_else(|| RoutingError::UnroutedApplication(relation.source.app.clone()))
    }
}

/// Shared connection of a relation's endpoints.
///
/// Endpoints must belong to the same application. Two applications that
/// happen to share a connection still may not be linked, since nothing
/// guarantees they stay co-located.
pub(crate) fn relation_connection(
    table: &RoutingTable,
    relation: &ResolvedRelation,
) -> Result<ConnectionId, RoutingError> {
    let source = table.connection_id(&relation.source.app)?;
    let target = table.connection_id(&relation.target.app)?;

    if !relation.is_same_application() || source != target {
        return Err(RoutingError::CrossDatabaseRelation {
            relation: relation.label(),
            source_app: relation.source.app.clone(),
            target_app: relation.target.app.clone(),
        });
    }

    Ok(source)
}
