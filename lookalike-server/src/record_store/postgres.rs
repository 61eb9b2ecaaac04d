//! PostgreSQL implementation of the record store.

use async_trait::async_trait;
use lookalike_core::store::WILDCARD;
use lookalike_core::{RecordStore, StoreError, DELIMITER};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// PostgreSQL-backed key-value store.
///
/// Every entry is one row of `kv_entries`. Pattern scans are translated into
/// an anchored POSIX regular expression evaluated by the database.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Connect to `database_url` and apply pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Query(format!("migration failed: {e}")))?;

        tracing::info!(max_connections, "Record store connected and migrations applied");

        Ok(Self { pool })
    }

    /// Create a record store from an existing pool (for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value: Option<Vec<u8>> = sqlx::query_scalar("SELECT value FROM kv_entries WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() == 1)
    }

    async fn scan_by_pattern(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        // COLLATE "C" keeps the byte-wise order the in-memory backend uses
        let keys: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT key FROM kv_entries
            WHERE key ~ $1
            ORDER BY key COLLATE "C"
            "#,
        )
        .bind(pattern_to_regex(pattern))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        tracing::debug!(pattern, matched = keys.len(), "Pattern scan");
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Translate a segment pattern into an anchored regular expression.
///
/// A segment that is exactly the wildcard becomes `[^:]*`; every other
/// segment is matched literally.
pub fn pattern_to_regex(pattern: &str) -> String {
    let segments: Vec<String> = pattern
        .split(DELIMITER)
        .map(|segment| {
            if segment == WILDCARD {
                format!("[^{DELIMITER}]*")
            } else {
                escape_regex(segment)
            }
        })
        .collect();
    format!("^{}$", segments.join(&DELIMITER.to_string()))
}

fn escape_regex(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}
