//! Reads, writes and reconciliation for the products table.
//!
//! A product row is written once, on first sight, and afterwards only its
//! `price` column ever changes. Nothing is deleted.

use chrono::NaiveDate;
use jeansdb_core::NormalizedRecord;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{DbError, TableName};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the products table. Columns mirror [`NormalizedRecord`].
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProductRow {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub product_color: String,
    pub fit: String,
    /// Three-digit centimeter measurement, kept as text.
    pub size_number: Option<String>,
    pub size_model: Option<String>,
    pub cotton: Option<f64>,
    pub spandex: Option<f64>,
    /// Date the row was first captured.
    pub scrapy_datetime: NaiveDate,
}

impl From<ProductRow> for NormalizedRecord {
    fn from(row: ProductRow) -> Self {
        Self {
            product_id: row.product_id,
            name: row.name,
            price: row.price,
            product_color: row.product_color,
            fit: row.fit,
            size_number: row.size_number,
            size_model: row.size_model,
            cotton: row.cotton,
            spandex: row.spandex,
            scrapy_datetime: row.scrapy_datetime,
        }
    }
}

/// Result of [`reconcile_product`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpsertOutcome {
    /// No row existed; the full record was inserted.
    Inserted,
    /// A row existed with a different price; only `price` was rewritten.
    PriceUpdated { previous_price: f64 },
    /// A row existed with the same price; nothing was written.
    Unchanged,
}

/// Prices are equal when they round to the same cent.
fn same_price(a: f64, b: f64) -> bool {
    ((a * 100.0).round() - (b * 100.0).round()).abs() < 0.5
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn product_exists(
    pool: &SqlitePool,
    table: &TableName,
    product_id: &str,
) -> Result<bool, DbError> {
    let mut conn = pool.acquire().await?;
    Ok(stored_price(&mut conn, table, product_id).await?.is_some())
}

/// `true` when a row for `product_id` exists and its price matches `price`
/// to the cent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn product_exists_with_price(
    pool: &SqlitePool,
    table: &TableName,
    product_id: &str,
    price: f64,
) -> Result<bool, DbError> {
    let mut conn = pool.acquire().await?;
    Ok(stored_price(&mut conn, table, product_id)
        .await?
        .is_some_and(|stored| same_price(stored, price)))
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails or a stored value cannot be
/// decoded.
pub async fn get_product(
    pool: &SqlitePool,
    table: &TableName,
    product_id: &str,
) -> Result<Option<ProductRow>, DbError> {
    let sql = format!(
        "SELECT product_id, name, price, product_color, fit, size_number, size_model, \
                cotton, spandex, scrapy_datetime \
         FROM {table} WHERE product_id = ?"
    );
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_products(pool: &SqlitePool, table: &TableName) -> Result<i64, DbError> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(pool).await?;
    Ok(count)
}

async fn stored_price(
    conn: &mut SqliteConnection,
    table: &TableName,
    product_id: &str,
) -> Result<Option<f64>, DbError> {
    let sql = format!("SELECT price FROM {table} WHERE product_id = ?");
    let price = sqlx::query_scalar::<_, f64>(&sql)
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(price)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a full row. Fails with a constraint violation (see
/// [`DbError::is_constraint_violation`]) if `product_id` already exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_product(
    pool: &SqlitePool,
    table: &TableName,
    record: &NormalizedRecord,
) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;
    insert_row(&mut conn, table, record).await
}

/// Rewrites the `price` column of an existing row, leaving every other column
/// as first captured. Returns `false` when no row matched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_product_price(
    pool: &SqlitePool,
    table: &TableName,
    product_id: &str,
    price: f64,
) -> Result<bool, DbError> {
    let mut conn = pool.acquire().await?;
    update_price(&mut conn, table, product_id, price).await
}

async fn insert_row(
    conn: &mut SqliteConnection,
    table: &TableName,
    record: &NormalizedRecord,
) -> Result<(), DbError> {
    let sql = format!(
        "INSERT INTO {table} \
             (product_id, name, price, product_color, fit, size_number, size_model, \
              cotton, spandex, scrapy_datetime) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    sqlx::query(&sql)
        .bind(&record.product_id)
        .bind(&record.name)
        .bind(record.price)
        .bind(&record.product_color)
        .bind(&record.fit)
        .bind(&record.size_number)
        .bind(&record.size_model)
        .bind(record.cotton)
        .bind(record.spandex)
        .bind(record.scrapy_datetime)
        .execute(conn)
        .await?;
    Ok(())
}

async fn update_price(
    conn: &mut SqliteConnection,
    table: &TableName,
    product_id: &str,
    price: f64,
) -> Result<bool, DbError> {
    let sql = format!("UPDATE {table} SET price = ? WHERE product_id = ?");
    let result = sqlx::query(&sql)
        .bind(price)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Brings the stored row for `record.product_id` in line with `record`.
///
/// - no row: insert the whole record;
/// - stored price differs at cent precision: update `price` only;
/// - otherwise: leave the row untouched.
///
/// The lookup and the write run in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement or the commit fails.
pub async fn reconcile_product(
    pool: &SqlitePool,
    table: &TableName,
    record: &NormalizedRecord,
) -> Result<UpsertOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let outcome = match stored_price(&mut *tx, table, &record.product_id).await? {
        None => {
            insert_row(&mut *tx, table, record).await?;
            UpsertOutcome::Inserted
        }
        Some(previous_price) if !same_price(previous_price, record.price) => {
            update_price(&mut *tx, table, &record.product_id, record.price).await?;
            UpsertOutcome::PriceUpdated { previous_price }
        }
        Some(_) => UpsertOutcome::Unchanged,
    };

    tx.commit().await?;
    Ok(outcome)
}
