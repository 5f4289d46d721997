use crate::{
    node::{ModelDescriptor, ModelKey, ResolvedRelation},
    validate::{model::validate_model, relation::resolve_relations},
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("model '{0}' already registered")]
    DuplicateModel(ModelKey),

    #[error("model '{model}', relation '{field}', targets unknown model '{target}'")]
    UnknownModel {
        model: ModelKey,
        field: String,
        target: ModelKey,
    },

    #[error("model registry is closed; '{0}' cannot be registered after finalize")]
    RegistryClosed(ModelKey),

    #[error("model registry has not been finalized")]
    NotFinalized,

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("model '{model}' is invalid: {reason}")]
    InvalidModel { model: ModelKey, reason: String },

    #[error("model '{model}', relation '{field}', is invalid: {reason}")]
    InvalidRelation {
        model: ModelKey,
        field: String,
        reason: String,
    },

    #[error(
        "related name '{related_name}' on model '{target}' is claimed by both {first} and {second}"
    )]
    RelatedNameConflict {
        target: ModelKey,
        related_name: String,
        first: String,
        second: String,
    },
}

///
/// ModelRegistry
///
/// Collects model descriptors during startup. `finalize` resolves every
/// relation target and seals the registry; from then on it is read-only.
///

#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<ModelKey, ModelDescriptor>,
    relations: Vec<ResolvedRelation>,
    finalized: bool,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one descriptor, keyed by its model identifier.
    pub fn register(&mut self, model: ModelDescriptor) -> Result<(), RegistryError> {
        if self.finalized {
            return Err(RegistryError::RegistryClosed(model.key));
        }
        if self.models.contains_key(&model.key) {
            return Err(RegistryError::DuplicateModel(model.key));
        }
        validate_model(&model)?;

        self.models.insert(model.key.clone(), model);

        Ok(())
    }

    /// Resolve relation targets and seal the registry.
    ///
    /// A failed finalize leaves the registry open and unchanged. Calling it
    /// again once sealed is a no-op.
    pub fn finalize(&mut self) -> Result<(), RegistryError> {
        if self.finalized {
            return Ok(());
        }

        self.relations = resolve_relations(&self.models)?;
        self.finalized = true;

        Ok(())
    }

    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Registered models, sorted by key.
    pub fn models(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.values()
    }

    #[must_use]
    pub fn model(&self, key: &ModelKey) -> Option<&ModelDescriptor> {
        self.models.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &ModelKey) -> bool {
        self.models.contains_key(key)
    }

    /// Distinct application names declared by registered models, sorted.
    #[must_use]
    pub fn applications(&self) -> BTreeSet<&str> {
        self.models.keys().map(|key| key.app.as_str()).collect()
    }

    /// Models declared in `app`, sorted by key.
    pub fn models_in<'a>(&'a self, app: &'a str) -> impl Iterator<Item = &'a ModelDescriptor> {
        self.models.values().filter(move |model| model.key.belongs_to(app))
    }

    /// Resolved relations, sorted by source key then field.
    pub fn relations(&self) -> Result<&[ResolvedRelation], RegistryError> {
        if !self.finalized {
            return Err(RegistryError::NotFinalized);
        }

        Ok(&self.relations)
    }

    /// Resolved relation declared on `source` under `field`.
    #[must_use]
    pub fn relation(&self, source: &ModelKey, field: &str) -> Option<&ResolvedRelation> {
        self.relations
            .iter()
            .find(|relation| &relation.source == source && relation.field == field)
    }

    /// Relations pointing at `target`, i.e. its reverse accessors.
    pub fn reverse_relations<'a>(
        &'a self,
        target: &'a ModelKey,
    ) -> impl Iterator<Item = &'a ResolvedRelation> {
        self.relations
            .iter()
            .filter(move |relation| &relation.target == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        node::{FieldDescriptor, RelationDescriptor},
        types::{FieldKind, RelationKind},
    };

    fn tournament() -> ModelDescriptor {
        ModelDescriptor::builder("tournaments", "Tournament")
            .id()
            .field(FieldDescriptor::new("name", FieldKind::Text))
            .build()
    }

    fn event() -> ModelDescriptor {
        ModelDescriptor::builder("events", "Event")
            .id()
            .field(FieldDescriptor::new("name", FieldKind::Text))
            .field(FieldDescriptor::new("tournament_id", FieldKind::Int))
            .relation(
                RelationDescriptor::many_to_many("participants", "events.Team")
                    .through("event_team")
                    .related_name("events"),
            )
            .build()
    }

    fn team() -> ModelDescriptor {
        ModelDescriptor::builder("events", "Team")
            .id()
            .field(FieldDescriptor::new("name", FieldKind::Text))
            .build()
    }

    fn registry_with(models: impl IntoIterator<Item = ModelDescriptor>) -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        for model in models {
            registry
                .register(model)
                .expect("test model registration should succeed");
        }
        registry
    }

    #[test]
    fn duplicate_model_is_rejected() {
        let mut registry = registry_with([team()]);
        let err = registry
            .register(team())
            .expect_err("duplicate registration should fail");

        assert!(matches!(err, RegistryError::DuplicateModel(_)));
        assert!(
            err.to_string().contains("model 'events.Team' already registered"),
            "duplicate error should name the model, got: {err}"
        );
    }

    #[test]
    fn same_name_in_different_apps_is_allowed() {
        let other_team = ModelDescriptor::builder("tournaments", "Team").id().build();
        let registry = registry_with([team(), other_team]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn target_may_be_registered_after_source() {
        let mut registry = registry_with([event(), team()]);
        registry.finalize().expect("forward reference should resolve");

        let relation = registry
            .relation(&ModelKey::new("events", "Event"), "participants")
            .expect("relation should be resolved");
        assert_eq!(relation.target, ModelKey::new("events", "Team"));
        assert_eq!(relation.through.as_deref(), Some("event_team"));
        assert_eq!(relation.backward_key, "event_id");
        assert_eq!(relation.forward_key, "team_id");
        assert_eq!(relation.related_name, "events");
    }

    #[test]
    fn unknown_target_fails_finalize_and_keeps_registry_open() {
        let mut registry = registry_with([event()]);
        let err = registry
            .finalize()
            .expect_err("missing target should fail finalize");

        assert!(matches!(err, RegistryError::UnknownModel { .. }));
        assert!(
            err.to_string().contains("targets unknown model 'events.Team'"),
            "unknown model error should name the target, got: {err}"
        );
        assert!(!registry.is_finalized());

        registry
            .register(team())
            .expect("registry should stay open after failed finalize");
        registry.finalize().expect("finalize should now succeed");
    }

    #[test]
    fn register_after_finalize_is_closed() {
        let mut registry = registry_with([team()]);
        registry.finalize().expect("finalize should succeed");

        let err = registry
            .register(tournament())
            .expect_err("registration after finalize should fail");
        assert!(matches!(err, RegistryError::RegistryClosed(_)));
        assert!(err.to_string().contains("tournaments.Tournament"));
    }

    #[test]
    fn relations_require_finalize() {
        let registry = registry_with([team()]);
        assert!(matches!(
            registry.relations(),
            Err(RegistryError::NotFinalized)
        ));
    }

    #[test]
    fn cross_application_relation_resolves_but_is_flagged() {
        let ticket = ModelDescriptor::builder("tournaments", "Ticket")
            .id()
            .relation(RelationDescriptor::foreign_key("event", "events.Event"))
            .build();
        let mut registry = registry_with([tournament(), event(), team(), ticket]);
        registry
            .finalize()
            .expect("registry resolution is application-agnostic");

        let relation = registry
            .relation(&ModelKey::new("tournaments", "Ticket"), "event")
            .expect("relation should be resolved");
        assert_eq!(relation.kind, RelationKind::ForeignKey);
        assert_eq!(relation.forward_key, "event_id");
        assert!(relation.through.is_none());
        assert!(!relation.is_same_application());
    }

    #[test]
    fn default_join_table_and_keys() {
        let player = ModelDescriptor::builder("events", "Player")
            .id()
            .relation(RelationDescriptor::many_to_many("teams", "Team"))
            .build();
        let mut registry = registry_with([player, team()]);
        registry.finalize().expect("finalize should succeed");

        let relation = registry
            .relation(&ModelKey::new("events", "Player"), "teams")
            .expect("relation should be resolved");
        assert_eq!(relation.through.as_deref(), Some("player_team"));
        assert_eq!(relation.backward_key, "player_id");
        assert_eq!(relation.forward_key, "team_id");
        assert_eq!(relation.related_name, "players");
    }

    #[test]
    fn self_many_to_many_needs_distinct_keys() {
        let person = ModelDescriptor::builder("events", "Person")
            .id()
            .relation(RelationDescriptor::many_to_many("friends", "Person").related_name("friend_of"))
            .build();
        let mut registry = registry_with([person]);
        let err = registry
            .finalize()
            .expect_err("colliding join columns should fail");
        assert!(matches!(err, RegistryError::InvalidRelation { .. }), "got: {err}");

        let person = ModelDescriptor::builder("events", "Person")
            .id()
            .relation(
                RelationDescriptor::many_to_many("friends", "Person")
                    .related_name("friend_of")
                    .backward_key("from_person_id")
                    .forward_key("to_person_id"),
            )
            .build();
        let mut registry = registry_with([person]);
        registry
            .finalize()
            .expect("explicit join columns should resolve");
    }

    #[test]
    fn related_name_conflict_between_relations() {
        let fixture = ModelDescriptor::builder("events", "Fixture")
            .id()
            .relation(RelationDescriptor::foreign_key("home", "Team"))
            .relation(RelationDescriptor::foreign_key("away", "Team"))
            .build();
        let mut registry = registry_with([fixture, team()]);
        let err = registry
            .finalize()
            .expect_err("two default related names on one target should clash");

        assert!(matches!(err, RegistryError::RelatedNameConflict { .. }));
        assert!(
            err.to_string().contains("'fixtures'"),
            "conflict should name the related name, got: {err}"
        );
    }

    #[test]
    fn foreign_keys_sharing_a_column_fail_register() {
        let fixture = ModelDescriptor::builder("events", "Fixture")
            .id()
            .relation(
                RelationDescriptor::foreign_key("home", "Team")
                    .forward_key("team_id")
                    .related_name("home_fixtures"),
            )
            .relation(
                RelationDescriptor::foreign_key("away", "Team")
                    .forward_key("team_id")
                    .related_name("away_fixtures"),
            )
            .build();

        let mut registry = registry_with([team()]);
        let err = registry
            .register(fixture)
            .expect_err("two relations on one column should fail");
        assert!(matches!(err, RegistryError::InvalidModel { .. }), "got: {err}");
        assert!(err.to_string().contains("'team_id'"), "got: {err}");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn self_foreign_key_must_be_nullable() {
        let node = ModelDescriptor::builder("events", "Node")
            .id()
            .relation(RelationDescriptor::foreign_key("parent", "Node").related_name("children"))
            .build();
        let mut registry = registry_with([node]);
        let err = registry
            .finalize()
            .expect_err("required self-reference should fail");
        assert!(matches!(err, RegistryError::InvalidRelation { .. }), "got: {err}");
        assert!(err.to_string().contains("must be nullable"), "got: {err}");

        let node = ModelDescriptor::builder("events", "Node")
            .id()
            .relation(
                RelationDescriptor::foreign_key("parent", "Node")
                    .related_name("children")
                    .nullable(),
            )
            .build();
        let mut registry = registry_with([node]);
        registry.finalize().expect("nullable self-reference should resolve");

        let relation = registry
            .relation(&ModelKey::new("events", "Node"), "parent")
            .expect("relation should be resolved");
        assert!(relation.nullable);
        assert_eq!(relation.forward_key, "parent_id");
    }

    #[test]
    fn related_name_conflict_with_target_field() {
        let event = ModelDescriptor::builder("events", "Event")
            .id()
            .relation(RelationDescriptor::many_to_many("participants", "Team").related_name("name"))
            .build();
        let mut registry = registry_with([event, team()]);
        let err = registry
            .finalize()
            .expect_err("related name shadowing a field should fail");
        assert!(
            err.to_string().contains("member 'events.Team.name'"),
            "conflict should name the shadowed member, got: {err}"
        );
    }

    #[test]
    fn reverse_relations_and_applications() {
        let mut registry = registry_with([tournament(), event(), team()]);
        registry.finalize().expect("finalize should succeed");

        let team_key = ModelKey::new("events", "Team");
        let reverse: Vec<_> = registry
            .reverse_relations(&team_key)
            .map(|r| r.related_name.as_str())
            .collect();
        assert_eq!(reverse, ["events"]);

        let apps: Vec<_> = registry.applications().into_iter().collect();
        assert_eq!(apps, ["events", "tournaments"]);

        let in_events: Vec<_> = registry.models_in("events").map(ModelDescriptor::name).collect();
        assert_eq!(in_events, ["Event", "Team"]);
    }

    #[test]
    fn relations_are_sorted_by_source_then_field() {
        let a = ModelDescriptor::builder("events", "A")
            .id()
            .relation(RelationDescriptor::foreign_key("zeta", "Team").related_name("a_zeta"))
            .relation(RelationDescriptor::foreign_key("alpha", "Team").related_name("a_alpha"))
            .build();
        let mut registry = registry_with([team(), a]);
        registry.finalize().expect("finalize should succeed");

        let labels: Vec<_> = registry
            .relations()
            .expect("relations available after finalize")
            .iter()
            .map(ResolvedRelation::label)
            .collect();
        assert_eq!(labels, ["events.A.alpha", "events.A.zeta"]);
    }
}
