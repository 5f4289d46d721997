use crate::{routing::RoutingTable, schema::SchemaGroup};
use polydb_schema::{ModelRegistry, RegistryError, node::ModelKey};

/// Partition a finalized registry by connection.
///
/// One group per distinct connection in id order, including connections
/// whose applications declare no models. Models keep registry order.
pub(crate) fn build_groups(
    table: &RoutingTable,
    registry: &ModelRegistry,
) -> Result<Vec<SchemaGroup>, RegistryError> {
    let relations = registry.relations()?;

    let groups = table
        .connections()
        .map(|(connection_id, _)| {
            let applications: Vec<String> =
                table.applications_on(connection_id).map(str::to_string).collect();
            let routed_here = |key: &ModelKey| applications.iter().any(|app| key.belongs_to(app));

            let models = registry
                .models()
                .filter(|model| routed_here(&model.key))
                .cloned()
                .collect();
            let relations = relations
                .iter()
                .filter(|relation| routed_here(&relation.source) && routed_here(&relation.target))
                .cloned()
                .collect();

            SchemaGroup {
                connection_id,
                applications,
                models,
                relations,
            }
        })
        .collect();

    Ok(groups)
}
