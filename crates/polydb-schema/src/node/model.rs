use crate::{
    node::{FieldDescriptor, ModelKey, RelationDescriptor},
    types::FieldKind,
};
use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

///
/// ModelDescriptor
///
/// Metadata for one entity type: identity, storage table, ordered fields
/// and outgoing relations.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ModelDescriptor {
    pub key: ModelKey,
    pub table: String,
    pub fields: Vec<FieldDescriptor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<RelationDescriptor>,
}

impl ModelDescriptor {
    /// Start describing model `name` in application `app`.
    #[must_use]
    pub fn builder(app: impl Into<String>, name: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(ModelKey::new(app, name))
    }

    #[must_use]
    pub fn app(&self) -> &str {
        &self.key.app
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.key.name
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.primary_key)
    }

    #[must_use]
    pub fn relation(&self, field: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.field == field)
    }
}

///
/// ModelBuilder
///

#[derive(Clone, Debug)]
pub struct ModelBuilder {
    key: ModelKey,
    table: Option<String>,
    fields: Vec<FieldDescriptor>,
    relations: Vec<RelationDescriptor>,
}

impl ModelBuilder {
    #[must_use]
    pub const fn new(key: ModelKey) -> Self {
        Self {
            key,
            table: None,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Override the default snake_case table name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Shorthand for a generated integer `id` primary key.
    #[must_use]
    pub fn id(self) -> Self {
        self.field(FieldDescriptor::new("id", FieldKind::Int).primary_key())
    }

    #[must_use]
    pub fn relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    #[must_use]
    pub fn build(self) -> ModelDescriptor {
        let table = self
            .table
            .unwrap_or_else(|| self.key.name.to_case(Case::Snake));

        ModelDescriptor {
            key: self.key,
            table,
            fields: self.fields,
            relations: self.relations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_defaults_to_snake_case_name() {
        let model = ModelDescriptor::builder("events", "EventTeam").id().build();
        assert_eq!(model.table, "event_team");

        let model = ModelDescriptor::builder("events", "Event").id().build();
        assert_eq!(model.table, "event");
    }

    #[test]
    fn explicit_table_wins() {
        let model = ModelDescriptor::builder("events", "Event")
            .table("events_v2")
            .id()
            .build();
        assert_eq!(model.table, "events_v2");
    }

    #[test]
    fn lookups_find_fields_and_relations() {
        let model = ModelDescriptor::builder("events", "Event")
            .id()
            .field(FieldDescriptor::new("name", FieldKind::Text))
            .relation(RelationDescriptor::many_to_many("participants", "events.Team"))
            .build();

        assert_eq!(model.app(), "events");
        assert_eq!(model.name(), "Event");
        assert_eq!(model.primary_key().map(|f| f.name.as_str()), Some("id"));
        assert!(model.field("name").is_some());
        assert!(model.field("missing").is_none());
        assert!(model.relation("participants").is_some());
    }
}
