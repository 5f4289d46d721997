use crate::statement::quote_ident;
use async_trait::async_trait;
use polydb_core::{BackendError, Connection, Dialect, JoinTable, SchemaEmitter, SchemaGroup};
use polydb_schema::{
    node::{FieldDescriptor, ModelDescriptor},
    types::{FieldKind, RelationKind},
};
use tracing::debug;

///
/// SqliteSchemaEmitter
///
/// Creates tables with `IF NOT EXISTS`, so emitting the same group twice
/// is harmless. Refuses connections that are not SQLite.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SqliteSchemaEmitter;

#[async_trait]
impl SchemaEmitter for SqliteSchemaEmitter {
    async fn emit(
        &self,
        connection: &dyn Connection,
        group: &SchemaGroup,
    ) -> Result<(), BackendError> {
        let dialect = connection.dialect();
        if dialect != Dialect::Sqlite {
            return Err(BackendError::other(format!(
                "sqlite schema emitter cannot target a {dialect} connection"
            )));
        }

        for statement in schema_statements(group) {
            debug!(connection = %group.connection_id, %statement, "ddl");
            connection.execute(&statement).await?;
        }

        Ok(())
    }
}

/// DDL for `group`: one `CREATE TABLE` per model, then one per join table.
#[must_use]
pub fn schema_statements(group: &SchemaGroup) -> Vec<String> {
    group
        .models
        .iter()
        .map(|model| create_model_table(group, model))
        .chain(group.join_tables().iter().map(create_join_table))
        .collect()
}

const fn column_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Blob => "BLOB",
        FieldKind::Bool | FieldKind::Int => "INTEGER",
        FieldKind::Float => "REAL",
        FieldKind::Text | FieldKind::Timestamp => "TEXT",
    }
}

fn field_column(field: &FieldDescriptor) -> String {
    let mut column = format!("{} {}", quote_ident(&field.name), column_type(field.kind));
    if field.primary_key {
        column.push_str(" PRIMARY KEY");
        if field.generated && field.kind.supports_generation() {
            column.push_str(" AUTOINCREMENT");
        }
    }
    if !field.nullable {
        column.push_str(" NOT NULL");
    }

    column
}

fn reference_column(column: &str, nullable: bool, table: &str, key: &FieldDescriptor) -> String {
    let (null, on_delete) = if nullable {
        ("", "SET NULL")
    } else {
        (" NOT NULL", "CASCADE")
    };

    format!(
        "{} {}{null} REFERENCES {} ({}) ON DELETE {on_delete}",
        quote_ident(column),
        column_type(key.kind),
        quote_ident(table),
        quote_ident(&key.name),
    )
}

fn create_model_table(group: &SchemaGroup, model: &ModelDescriptor) -> String {
    let foreign_keys = group
        .relations
        .iter()
        .filter(|relation| relation.source == model.key && relation.kind == RelationKind::ForeignKey)
        .filter_map(|relation| {
            let key = group.model(&relation.target)?.primary_key()?;
            Some(reference_column(
                &relation.forward_key,
                relation.nullable,
                &relation.target_table,
                key,
            ))
        });

    let columns: Vec<_> = model.fields.iter().map(field_column).chain(foreign_keys).collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(&model.table),
        columns.join(", ")
    )
}

fn create_join_table(join: &JoinTable<'_>) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({}, {})",
        quote_ident(join.name),
        reference_column(join.backward_key, false, join.source_table, join.source_key),
        reference_column(join.forward_key, false, join.target_table, join.target_key),
    )
}
