use crate::Error;
use polydb_core::Value;
use polydb_schema::node::{ModelDescriptor, RelationDescriptor};

/// Double-quote an identifier, doubling embedded quotes.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Render a value as a SQLite literal.
#[must_use]
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) if v.is_finite() => format!("{v:?}"),
        Value::Float(_) => "NULL".to_string(),
        Value::Text(v) => format!("'{}'", v.replace('\'', "''")),
        Value::Blob(bytes) => {
            let hex: String = bytes.iter().map(|byte| format!("{byte:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}

/// Columns stored on the model's table: fields, then foreign-key columns.
pub(crate) fn columns(model: &ModelDescriptor) -> Vec<String> {
    model
        .fields
        .iter()
        .map(|field| field.name.clone())
        .chain(
            model
                .relations
                .iter()
                .filter_map(RelationDescriptor::foreign_key_column),
        )
        .collect()
}

/// `INSERT` for one row of `model`. Columns must exist on the model's table.
pub fn insert_statement(model: &ModelDescriptor, values: &[(&str, Value)]) -> Result<String, Error> {
    let known = columns(model);
    if let Some((column, _)) = values
        .iter()
        .find(|(column, _)| !known.iter().any(|k| k == *column))
    {
        return Err(Error::UnknownColumn {
            model: model.key.clone(),
            column: (*column).to_string(),
        });
    }

    let table = quote_ident(&model.table);
    if values.is_empty() {
        return Ok(format!("INSERT INTO {table} DEFAULT VALUES"));
    }

    let names: Vec<_> = values.iter().map(|(column, _)| quote_ident(column)).collect();
    let literals: Vec<_> = values.iter().map(|(_, value)| quote_literal(value)).collect();

    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        names.join(", "),
        literals.join(", ")
    ))
}

/// `SELECT` of every stored column of `model`, ordered by primary key.
#[must_use]
pub fn select_all_statement(model: &ModelDescriptor) -> String {
    let names: Vec<_> = columns(model).iter().map(|c| quote_ident(c)).collect();
    let mut sql = format!(
        "SELECT {} FROM {}",
        names.join(", "),
        quote_ident(&model.table)
    );
    if let Some(pk) = model.primary_key() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&quote_ident(&pk.name));
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use polydb_schema::prelude::*;

    fn event() -> ModelDescriptor {
        ModelDescriptor::builder("events", "Event")
            .id()
            .field(FieldDescriptor::new("name", FieldKind::Text))
            .relation(RelationDescriptor::foreign_key("venue", "Venue"))
            .build()
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(quote_literal(&Value::from("O'Neil")), "'O''Neil'");
        assert_eq!(quote_literal(&Value::Blob(vec![0x0a, 0xff])), "X'0AFF'");
        assert_eq!(quote_literal(&Value::Float(2.0)), "2.0");
        assert_eq!(quote_literal(&Value::Float(f64::NAN)), "NULL");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn insert_lists_columns_and_values() {
        let sql = insert_statement(&event(), &[("name", Value::from("Final")), ("venue_id", Value::Int(3))])
            .expect("known columns");
        assert_eq!(sql, "INSERT INTO \"event\" (\"name\", \"venue_id\") VALUES ('Final', 3)");
    }

    #[test]
    fn insert_rejects_unknown_column() {
        let err = insert_statement(&event(), &[("title", Value::Null)])
            .expect_err("title is not a column");
        assert_eq!(err.to_string(), "model 'events.Event' has no column 'title'");
    }

    #[test]
    fn select_covers_foreign_key_columns() {
        assert_eq!(
            select_all_statement(&event()),
            "SELECT \"id\", \"name\", \"venue_id\" FROM \"event\" ORDER BY \"id\""
        );
    }
}
