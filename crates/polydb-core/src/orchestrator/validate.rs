use crate::{
    orchestrator::OrchestratorError,
    routing::{RoutingError, RoutingTable, relation_connection},
    schema::SchemaGroup,
};
use polydb_schema::{ModelRegistry, node::ResolvedRelation};
use std::collections::BTreeMap;

/// Every application that declares a model must be routed.
pub(crate) fn validate_routed(
    table: &RoutingTable,
    registry: &ModelRegistry,
) -> Result<(), RoutingError> {
    match registry
        .applications()
        .into_iter()
        .find(|app| !table.is_routed(app))
    {
        Some(app) => Err(RoutingError::UnroutedApplication(app.to_string())),
        None => Ok(()),
    }
}

/// Every relation must stay inside one application and one connection.
pub(crate) fn validate_relations(
    table: &RoutingTable,
    relations: &[ResolvedRelation],
) -> Result<(), RoutingError> {
    for relation in relations {
        relation_connection(table, relation)?;
    }

    Ok(())
}

/// Table names must be unique per connection. Comparison ignores ASCII
/// case, since most backends fold unquoted identifiers.
pub(crate) fn validate_table_names(group: &SchemaGroup) -> Result<(), OrchestratorError> {
    let mut owners: BTreeMap<String, String> = BTreeMap::new();

    let models = group
        .models
        .iter()
        .map(|model| (model.table.as_str(), format!("model '{}'", model.key)));
    let joins = group.relations.iter().filter_map(|relation| {
        relation
            .through
            .as_deref()
            .map(|table| (table, format!("relation '{}'", relation.label())))
    });

    for (table, owner) in models.chain(joins) {
        if let Some(first) = owners.insert(table.to_ascii_lowercase(), owner.clone()) {
            return Err(OrchestratorError::TableConflict {
                applications: group.applications.join(", "),
                table: table.to_string(),
                first,
                second: owner,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        orchestrator::group::build_groups,
        routing::RoutingConfig,
        test_support::{MemoryConnection, event, finalized, team, tournament},
    };
    use polydb_schema::{node::RelationDescriptor, prelude::ModelDescriptor};

    #[test]
    fn first_unrouted_application_is_reported() {
        let config = RoutingConfig::from_routes([(
            "tournaments",
            MemoryConnection::handle("first"),
        )])
        .expect("routes should build");
        let table = RoutingTable::new(config);
        let registry = finalized([tournament(), event(), team()]);

        let err = validate_routed(&table, &registry).expect_err("events is not routed");
        assert!(matches!(err, RoutingError::UnroutedApplication(ref app) if app == "events"));
    }

    #[test]
    fn cross_application_foreign_key_is_rejected() {
        let config = RoutingConfig::from_routes([
            ("tournaments", MemoryConnection::handle("first")),
            ("events", MemoryConnection::handle("second")),
        ])
        .expect("routes should build");
        let table = RoutingTable::new(config);
        let match_model = ModelDescriptor::builder("events", "Match")
            .id()
            .relation(RelationDescriptor::foreign_key(
                "tournament",
                "tournaments.Tournament",
            ))
            .build();
        let registry = finalized([tournament(), match_model]);

        let err = validate_relations(&table, registry.relations().expect("finalized"))
            .expect_err("relation crosses databases");
        assert!(matches!(
            err,
            RoutingError::CrossDatabaseRelation { ref source_app, ref target_app, .. }
                if source_app == "events" && target_app == "tournaments"
        ));
    }

    #[test]
    fn clashing_tables_on_one_connection_conflict() {
        let shared = MemoryConnection::handle("shared");
        let config = RoutingConfig::from_routes([
            ("tournaments", shared.clone()),
            ("events", shared),
        ])
        .expect("routes should build");
        let table = RoutingTable::new(config);
        let twin = ModelDescriptor::builder("tournaments", "Event").id().build();
        let registry = finalized([event(), team(), twin]);

        let groups = build_groups(&table, &registry).expect("registry is finalized");
        let err = validate_table_names(&groups[0]).expect_err("both apps create 'event'");

        assert_eq!(
            err.to_string(),
            "table 'event' on connection for [events, tournaments] is claimed by model 'events.Event' and model 'tournaments.Event'"
        );
    }

    #[test]
    fn same_table_on_different_connections_is_fine() {
        let config = RoutingConfig::from_routes([
            ("tournaments", MemoryConnection::handle("first")),
            ("events", MemoryConnection::handle("second")),
        ])
        .expect("routes should build");
        let table = RoutingTable::new(config);
        let twin = ModelDescriptor::builder("tournaments", "Event").id().build();
        let registry = finalized([event(), team(), twin]);

        for group in build_groups(&table, &registry).expect("registry is finalized") {
            validate_table_names(&group).expect("tables are unique per connection");
        }
    }

    #[test]
    fn join_table_may_not_shadow_a_model_table() {
        let config =
            RoutingConfig::from_routes([("events", MemoryConnection::handle("second"))])
                .expect("routes should build");
        let table = RoutingTable::new(config);
        let link = ModelDescriptor::builder("events", "EventTeam").id().build();
        let registry = finalized([event(), team(), link]);

        let groups = build_groups(&table, &registry).expect("registry is finalized");
        let err = validate_table_names(&groups[0]).expect_err("event_team is used twice");
        assert!(matches!(
            err,
            OrchestratorError::TableConflict { ref table, ref second, .. }
                if table == "event_team" && second == "relation 'events.Event.participants'"
        ));
    }
}
