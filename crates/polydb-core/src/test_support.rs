//! In-memory connection, recording emitter and model fixtures shared by
//! the unit tests.

use crate::{
    connection::{BackendError, Connection, ConnectionHandle, Dialect},
    schema::{SchemaEmitter, SchemaGroup},
    value::{Row, Rows, Value},
};
use async_trait::async_trait;
use polydb_schema::{
    ModelRegistry,
    node::{FieldDescriptor, ModelDescriptor, RelationDescriptor},
    types::FieldKind,
};
use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
};

///
/// MemoryConnection
///
/// Understands just enough SQL to create tables and to fail the way a real
/// backend does when a table is missing.
///

#[derive(Debug)]
pub struct MemoryConnection {
    pub label: &'static str,
    tables: Mutex<BTreeSet<String>>,
    queries: Mutex<Vec<String>>,
}

impl MemoryConnection {
    pub fn shared(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            tables: Mutex::new(BTreeSet::new()),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn handle(label: &'static str) -> ConnectionHandle {
        Self::shared(label)
    }

    pub fn tables(&self) -> Vec<String> {
        self.tables
            .lock()
            .expect("tables lock")
            .iter()
            .cloned()
            .collect()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("queries lock").clone()
    }
}

fn table_after<'a>(query: &'a str, keyword: &str) -> Option<&'a str> {
    let upper = query.to_ascii_uppercase();
    let start = upper.find(keyword)? + keyword.len();
    let rest = query[start..].trim_start();
    let rest = rest
        .strip_prefix("IF NOT EXISTS")
        .map_or(rest, str::trim_start);
    let name = rest
        .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .next()?;

    Some(name.trim_matches('"'))
}

#[async_trait]
impl Connection for MemoryConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Other("memory")
    }

    async fn execute(&self, query: &str) -> Result<Rows, BackendError> {
        self.queries
            .lock()
            .expect("queries lock")
            .push(query.to_string());

        if let Some(table) = table_after(query, "CREATE TABLE") {
            self.tables
                .lock()
                .expect("tables lock")
                .insert(table.to_string());
            return Ok(Rows::empty());
        }

        if let Some(table) = table_after(query, "FROM") {
            if !self.tables.lock().expect("tables lock").contains(table) {
                return Err(BackendError::missing_object(format!(
                    "no such table: {table}"
                )));
            }
            return Ok(Rows::new(
                vec!["source".to_string()],
                vec![Row(vec![Value::from(self.label)])],
            ));
        }

        Ok(Rows::empty())
    }
}

///
/// RecordingEmitter
///
/// Creates one table per model and join table, and remembers every group it
/// was handed. Fails for groups containing `fail_for` when set.
///

#[derive(Debug, Default)]
pub struct RecordingEmitter {
    pub fail_for: Option<&'static str>,
    groups: Mutex<Vec<SchemaGroup>>,
}

impl RecordingEmitter {
    pub fn failing_for(app: &'static str) -> Self {
        Self {
            fail_for: Some(app),
            ..Self::default()
        }
    }

    pub fn groups(&self) -> Vec<SchemaGroup> {
        self.groups.lock().expect("groups lock").clone()
    }
}

#[async_trait]
impl SchemaEmitter for RecordingEmitter {
    async fn emit(
        &self,
        connection: &dyn Connection,
        group: &SchemaGroup,
    ) -> Result<(), BackendError> {
        self.groups
            .lock()
            .expect("groups lock")
            .push(group.clone());

        if let Some(app) = self.fail_for
            && group.applications.iter().any(|a| a == app)
        {
            return Err(BackendError::constraint(format!("refusing schema for {app}")));
        }

        for table in group.table_names() {
            connection
                .execute(&format!("CREATE TABLE IF NOT EXISTS \"{table}\" (id)"))
                .await?;
        }

        Ok(())
    }
}

// fixtures

pub fn tournament() -> ModelDescriptor {
    ModelDescriptor::builder("tournaments", "Tournament")
        .id()
        .field(FieldDescriptor::new("name", FieldKind::Text))
        .build()
}

pub fn event() -> ModelDescriptor {
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

pub fn team() -> ModelDescriptor {
    ModelDescriptor::builder("events", "Team")
        .id()
        .field(FieldDescriptor::new("name", FieldKind::Text))
        .build()
}

pub fn finalized(models: impl IntoIterator<Item = ModelDescriptor>) -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    for model in models {
        registry.register(model).expect("fixture should register");
    }
    registry.finalize().expect("fixtures should finalize");

    registry
}
