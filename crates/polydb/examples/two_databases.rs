//! Two applications on two separate SQLite databases.
//!
//! Relations may not cross databases, so `Event` links to `events.Team`
//! and only stores the tournament id as a plain integer.
//!
//! Run with `cargo run --example two_databases`; `RUST_LOG=debug` shows
//! every routed query.

use polydb::prelude::*;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn models() -> [ModelDescriptor; 3] {
    [
        ModelDescriptor::builder("tournaments", "Tournament")
            .id()
            .field(FieldDescriptor::new("name", FieldKind::Text))
            .build(),
        ModelDescriptor::builder("events", "Event")
            .id()
            .field(FieldDescriptor::new("name", FieldKind::Text))
            .field(FieldDescriptor::new("tournament_id", FieldKind::Int))
            .relation(
                RelationDescriptor::many_to_many("participants", "events.Team")
                    .through("event_team")
                    .related_name("events"),
            )
            .build(),
        ModelDescriptor::builder("events", "Team")
            .id()
            .field(FieldDescriptor::new("name", FieldKind::Text))
            .build(),
    ]
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let first = SqliteBackend::memory().await?;
    let second = SqliteBackend::memory().await?;
    let config = RoutingConfig::new()
        .with_route("tournaments", Arc::new(first.clone()))?
        .with_route("events", Arc::new(second.clone()))?;

    let db = Orchestrator::init(config, models(), &SqliteSchemaEmitter).await?;

    let tournament = ModelKey::new("tournaments", "Tournament");
    let event = ModelKey::new("events", "Event");

    db.execute(&tournament, "INSERT INTO \"tournament\" (name) VALUES ('Tournament')")
        .await?;
    let rows = db
        .execute(&tournament, "SELECT id FROM \"tournament\"")
        .await?;
    let tournament_id = rows
        .iter()
        .next()
        .and_then(|row| row.get(0))
        .and_then(Value::as_int)
        .unwrap_or_default();

    db.execute(
        &event,
        &format!("INSERT INTO \"event\" (name, tournament_id) VALUES ('Event', {tournament_id})"),
    )
    .await?;

    match db.execute("tournaments", "SELECT * FROM \"event\"").await {
        Err(err) if err.backend().is_some_and(BackendError::is_missing_object) => {
            info!(error = %err, "expected it to fail");
        }
        other => return Err(format!("tournaments database should not hold events: {other:?}").into()),
    }

    let rows = db.execute("events", "SELECT * FROM \"event\"").await?;
    info!(columns = ?rows.columns, rows = ?rows.rows, "events database");

    let metrics = db.metrics().snapshot();
    info!(queries = metrics.queries, backend_errors = metrics.backend_errors, "done");

    first.close().await;
    second.close().await;

    Ok(())
}
