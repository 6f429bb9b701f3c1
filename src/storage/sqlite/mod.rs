
pub mod schema;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Pool, Row, Sqlite, TypeInfo, ValueRef};
use std::path::Path;
use std::sync::Once;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::storage::{BoundQuery, RawRow, SqlValue, StorageEngine};
use crate::{DocvecError, Result};

pub type DbPool = Pool<Sqlite>;

/// SQLite-backed storage engine with the sqlite-vec extension loaded, which
/// provides the `vec_distance_cosine` operator the similarity query relies on.
#[derive(Debug, Clone)]
pub struct SqliteEngine {
    pool: DbPool,
}

static REGISTER_VEC: Once = Once::new();

fn register_vec_extension() {
    REGISTER_VEC.call_once(|| {
        // SAFETY: sqlite3_vec_init has the entry-point signature that
        // sqlite3_auto_extension expects; the transmute only bridges the
        // equivalent types generated by the two crates' bindings. Once
        // registered, every connection opened by this process loads the
        // extension.
        unsafe {
            libsqlite3_sys::sqlite3_auto_extension(Some(std::mem::transmute(
                sqlite_vec::sqlite3_vec_init as *const (),
            )));
        }
    });
}

impl SqliteEngine {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        register_vec_extension();

        // Foreign keys stay unenforced: the lifecycle layer deletes points
        // and documents in one transaction, and the consistency validator
        // must be able to observe orphaned points left by outside writers.
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .map_err(|e| {
                DocvecError::Storage(format!("Failed to create database connection pool: {}", e))
            })?;

        info!("SQLite storage engine initialized");
        Ok(Self { pool })
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Create the documents and points relations named by the configuration
    /// if they do not exist yet.
    #[inline]
    pub async fn ensure_schema(&self, config: &StorageConfig) -> Result<()> {
        debug!(
            "Ensuring schema for tables {} and {}",
            config.documents_table, config.points_table
        );

        for statement in schema::schema_statements(config) {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DocvecError::Storage(format!("Failed to create schema: {}", e))
                })?;
        }

        Ok(())
    }
}

fn bind_params<'q>(
    query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    params.iter().fold(query, |q, param| match param {
        SqlValue::Null => q.bind(None::<String>),
        SqlValue::Integer(value) => q.bind(*value),
        SqlValue::Real(value) => q.bind(*value),
        SqlValue::Text(value) => q.bind(value.as_str()),
    })
}

fn decode_row(row: &SqliteRow) -> Result<RawRow> {
    let mut decoded = RawRow::with_capacity(row.columns().len());

    for column in row.columns() {
        let ordinal = column.ordinal();
        let raw = row.try_get_raw(ordinal).map_err(|e| {
            DocvecError::Storage(format!("Failed to read column {}: {}", column.name(), e))
        })?;

        let value = if raw.is_null() {
            serde_json::Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => {
                    let v: i64 = row.try_get(ordinal).map_err(|e| {
                        DocvecError::Storage(format!(
                            "Failed to decode column {}: {}",
                            column.name(),
                            e
                        ))
                    })?;
                    serde_json::Value::from(v)
                }
                "REAL" => {
                    let v: f64 = row.try_get(ordinal).map_err(|e| {
                        DocvecError::Storage(format!(
                            "Failed to decode column {}: {}",
                            column.name(),
                            e
                        ))
                    })?;
                    serde_json::Value::from(v)
                }
                "TEXT" | "DATETIME" | "DATE" => {
                    let v: String = row.try_get(ordinal).map_err(|e| {
                        DocvecError::Storage(format!(
                            "Failed to decode column {}: {}",
                            column.name(),
                            e
                        ))
                    })?;
                    serde_json::Value::String(v)
                }
                other => {
                    return Err(DocvecError::Storage(format!(
                        "Unsupported column type {} for column {}",
                        other,
                        column.name()
                    )));
                }
            }
        };

        decoded.insert(column.name().to_string(), value);
    }

    Ok(decoded)
}

#[async_trait]
impl StorageEngine for SqliteEngine {
    async fn fetch_all(&self, query: BoundQuery) -> Result<Vec<RawRow>> {
        let rows = bind_params(sqlx::query(&query.sql), &query.params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DocvecError::Storage(format!("Failed to execute query: {}", e)))?;

        debug!("Fetched {} rows", rows.len());
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, query: BoundQuery) -> Result<u64> {
        let result = bind_params(sqlx::query(&query.sql), &query.params)
            .execute(&self.pool)
            .await
            .map_err(|e| DocvecError::Storage(format!("Failed to execute statement: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn execute_transactional(&self, queries: Vec<BoundQuery>) -> Result<Vec<u64>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DocvecError::Storage(format!("Failed to begin transaction: {}", e)))?;

        let mut affected = Vec::with_capacity(queries.len());
        for query in &queries {
            let result = bind_params(sqlx::query(&query.sql), &query.params)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    DocvecError::Storage(format!("Failed to execute statement in transaction: {}", e))
                })?;
            affected.push(result.rows_affected());
        }

        tx.commit()
            .await
            .map_err(|e| DocvecError::Storage(format!("Failed to commit transaction: {}", e)))?;

        Ok(affected)
    }
}
