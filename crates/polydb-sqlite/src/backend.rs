use async_trait::async_trait;
use polydb_core::{BackendError, BackendErrorKind, Connection, Dialect, Row, Rows, Value};
use sqlx::{
    Column, Executor, Row as _, Statement, TypeInfo, ValueRef,
    error::ErrorKind,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
};
use std::str::FromStr;
use tracing::debug;

///
/// SqliteBackend
///
/// One SQLite database behind a single-connection pool. Holding exactly one
/// connection open for the pool's lifetime keeps `sqlite::memory:`
/// databases alive between queries.
///

#[derive(Clone, Debug)]
pub struct SqliteBackend {
    url: String,
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (or create) the database at `url`, e.g. `sqlite://app.db` or
    /// `sqlite::memory:`.
    pub async fn connect(url: &str) -> Result<Self, BackendError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend_error)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(backend_error)?;
        debug!(url, "sqlite backend opened");

        Ok(Self {
            url: url.to_string(),
            pool,
        })
    }

    /// Fresh private in-memory database.
    pub async fn memory() -> Result<Self, BackendError> {
        Self::connect("sqlite::memory:").await
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool. Only the owner of the backend should call this.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Connection for SqliteBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute(&self, query: &str) -> Result<Rows, BackendError> {
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(backend_error)?;

        let mut converted = convert_rows(&rows).map_err(backend_error)?;
        if converted.is_empty() {
            converted.columns = self.statement_columns(query).await;
        }

        Ok(converted)
    }
}

impl SqliteBackend {
    // An empty result carries no rows to read names from, so ask the
    // prepared statement instead. Statements that no longer prepare
    // (e.g. a `DROP TABLE` that just ran) have no columns.
    async fn statement_columns(&self, query: &str) -> Vec<String> {
        match (&self.pool).prepare(query).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect(),
            Err(err) => {
                debug!(error = %err, "statement columns unavailable");
                Vec::new()
            }
        }
    }
}

// Column names come from the first row.
fn convert_rows(rows: &[SqliteRow]) -> Result<Rows, sqlx::Error> {
    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect()
        })
        .unwrap_or_default();

    let rows = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|index| convert_value(row, index))
                .collect::<Result<Vec<_>, _>>()
                .map(Row)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Rows::new(columns, rows))
}

// Converts by the stored value's storage class, not the declared column type.
fn convert_value(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match raw.type_info().name() {
        "INTEGER" | "BOOLEAN" => Value::Int(row.try_get_unchecked::<i64, _>(index)?),
        "REAL" => Value::Float(row.try_get_unchecked::<f64, _>(index)?),
        "BLOB" => Value::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        _ => Value::Text(row.try_get_unchecked::<String, _>(index)?),
    };

    Ok(value)
}

/// Translate a driver error, keeping SQLite's own message and the native
/// error as source.
pub(crate) fn backend_error(err: sqlx::Error) -> BackendError {
    let (kind, message) = match &err {
        sqlx::Error::Database(db) => {
            let message = db.message().to_string();
            let kind = if message.starts_with("no such table")
                || message.starts_with("no such column")
            {
                BackendErrorKind::MissingObject
            } else if message.contains("syntax error") || message.starts_with("incomplete input")
            {
                BackendErrorKind::Syntax
            } else {
                match db.kind() {
                    ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation => BackendErrorKind::Constraint,
                    _ => BackendErrorKind::Other,
                }
            };

            (kind, message)
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => (BackendErrorKind::Connection, err.to_string()),
        _ => (BackendErrorKind::Other, err.to_string()),
    };

    BackendError::new(kind, message).with_source(err)
}
