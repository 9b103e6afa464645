use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use jeansdb_core::AppConfig;
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections.max(1),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid table name {0:?}: expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidTableName(String),
    #[error("failed to prepare database directory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// `true` when the database rejected a write because of a constraint
    /// (primary key, unique, not-null, check, foreign key).
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(db)) => !matches!(db.kind(), ErrorKind::Other),
            _ => false,
        }
    }
}

/// A table name checked to be a plain SQL identifier, safe to splice into
/// statement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidTableName`] unless `name` matches
    /// `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn parse(name: &str) -> Result<Self, DbError> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(Self(name.to_owned()))
        } else {
            Err(DbError::InvalidTableName(name.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opens (creating if missing) the SQLite file at `path`.
///
/// The parent directory is created first when it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Io`] if the directory cannot be created, or
/// [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect_pool(path: &Path, config: PoolConfig) -> Result<SqlitePool, DbError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DbError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Opens a private in-memory database.
///
/// Limited to one connection that never expires: every SQLite connection to
/// `:memory:` sees its own database.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect_in_memory() -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Creates the products table if it does not exist. Safe to call on every run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn ensure_schema(pool: &SqlitePool, table: &TableName) -> Result<(), DbError> {
    let ddl = format!(
        "CREATE TABLE IF NOT EXISTS {table} ( \
             product_id      TEXT PRIMARY KEY NOT NULL, \
             name            TEXT NOT NULL, \
             price           REAL NOT NULL, \
             product_color   TEXT NOT NULL, \
             fit             TEXT NOT NULL, \
             size_number     TEXT, \
             size_model      TEXT, \
             cotton          REAL, \
             spandex         REAL, \
             scrapy_datetime TEXT NOT NULL \
         )"
    );
    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}


pub mod products;

pub use products::{
    count_products, get_product, insert_product, product_exists, product_exists_with_price,
    reconcile_product, update_product_price, ProductRow, UpsertOutcome,
};
