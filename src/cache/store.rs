//! SQLite-backed keyed cache table.
//!
//! One table per domain: the canonical key is the primary key, `generated_at`
//! and `payload_json` hold the record, and any extra columns are denormalized
//! copies of payload fields kept for inspection. Every operation acquires its
//! own pooled connection and releases it when the guard drops.

use chrono::NaiveDateTime;
use sqlx::{SqliteConnection, SqlitePool};
use std::marker::PhantomData;
use tracing::{debug, warn};

use super::{CacheDomain, CacheKey, CacheRecord};

/// Static description of a domain's cache table.
#[derive(Debug)]
pub struct CacheTable {
    pub name: &'static str,
    pub key_column: &'static str,
    /// Denormalized columns, in the order [`CacheDomain::columns`] yields values.
    pub columns: &'static [Column],
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
}

/// A bindable value for a denormalized column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Real(f64),
    Text(String),
}

/// What a point lookup found under a key.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<P> {
    Absent,
    /// A row exists but its timestamp or payload cannot be decoded.
    Unreadable,
    Present(CacheRecord<P>),
}

impl<P> Entry<P> {
    pub fn into_record(self) -> Option<CacheRecord<P>> {
        match self {
            Self::Present(record) => Some(record),
            Self::Absent | Self::Unreadable => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Cache database error")]
    Database(#[from] sqlx::Error),
    #[error("Failed to encode cache payload")]
    Encode(#[from] serde_json::Error),
}

/// Point lookups and idempotent upserts against one domain's table.
pub struct CacheStore<D: CacheDomain> {
    pool: SqlitePool,
    schema_sql: String,
    select_sql: String,
    upsert_sql: String,
    overwrite_sql: String,
    _domain: PhantomData<fn() -> D>,
}

impl<D: CacheDomain> CacheStore<D> {
    pub fn new(pool: SqlitePool) -> Self {
        let table = &D::TABLE;
        Self {
            pool,
            schema_sql: schema_sql(table),
            select_sql: format!(
                "SELECT generated_at, payload_json FROM {} WHERE {} = ?",
                table.name, table.key_column
            ),
            upsert_sql: upsert_sql(table, true),
            overwrite_sql: upsert_sql(table, false),
            _domain: PhantomData,
        }
    }

    /// Create the table if it does not exist. Idempotent.
    pub async fn ensure_schema(&self, conn: &mut SqliteConnection) -> Result<(), StoreError> {
        sqlx::query(&self.schema_sql).execute(conn).await?;
        Ok(())
    }

    /// Look up the record for `key`, treating an unreadable row as a miss.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<CacheRecord<D::Payload>>, StoreError> {
        Ok(self.read(key).await?.into_record())
    }

    /// Look up the row for `key`, distinguishing a missing row from one whose
    /// timestamp or payload cannot be decoded.
    pub async fn read(&self, key: &CacheKey) -> Result<Entry<D::Payload>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        self.ensure_schema(&mut conn).await?;

        let row = sqlx::query_as::<_, (NaiveDateTime, String)>(&self.select_sql)
            .bind(key.as_str())
            .fetch_optional(&mut *conn)
            .await;

        let (generated_at, payload_json) = match row {
            Ok(Some(row)) => row,
            Ok(None) => return Ok(Entry::Absent),
            Err(sqlx::Error::ColumnDecode { index, source }) => {
                warn!(
                    table = D::TABLE.name,
                    key = %key,
                    column = index,
                    error = %source,
                    "Unreadable cached row, treating as miss"
                );
                return Ok(Entry::Unreadable);
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&payload_json) {
            Ok(payload) => Ok(Entry::Present(CacheRecord {
                key: key.clone(),
                generated_at: generated_at.and_utc(),
                payload,
            })),
            Err(e) => {
                warn!(
                    table = D::TABLE.name,
                    key = %key,
                    error = %e,
                    "Unreadable cached payload, treating as miss"
                );
                Ok(Entry::Unreadable)
            }
        }
    }

    /// Insert the record, or overwrite every field of the existing row for its key.
    ///
    /// An existing row with a newer `generated_at` is left untouched (a row
    /// with an unparseable timestamp is always overwritten); returns whether
    /// the row was written.
    pub async fn upsert(&self, record: &CacheRecord<D::Payload>) -> Result<bool, StoreError> {
        let written = self.write(&self.upsert_sql, record).await?;
        if !written {
            debug!(
                table = D::TABLE.name,
                key = %record.key,
                "Stored record is newer, upsert skipped"
            );
        }
        Ok(written)
    }

    /// Insert the record, or overwrite the existing row regardless of its timestamp.
    ///
    /// Used to replace rows [`read`](Self::read) reported as unreadable.
    pub async fn overwrite(&self, record: &CacheRecord<D::Payload>) -> Result<(), StoreError> {
        self.write(&self.overwrite_sql, record).await?;
        Ok(())
    }

    async fn write(&self, sql: &str, record: &CacheRecord<D::Payload>) -> Result<bool, StoreError> {
        let payload_json = serde_json::to_string(&record.payload)?;

        let mut query = sqlx::query(sql)
            .bind(record.key.as_str())
            .bind(record.generated_at.naive_utc())
            .bind(payload_json);
        for value in D::columns(&record.payload) {
            query = match value {
                ColumnValue::Real(v) => query.bind(v),
                ColumnValue::Text(v) => query.bind(v),
            };
        }

        let mut conn = self.pool.acquire().await?;
        self.ensure_schema(&mut conn).await?;
        Ok(query.execute(&mut *conn).await?.rows_affected() > 0)
    }
}

fn schema_sql(table: &CacheTable) -> String {
    let extra: String = table
        .columns
        .iter()
        .map(|c| format!(",\n    {} {}", c.name, c.sql_type))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {} TEXT PRIMARY KEY,\n    generated_at TEXT NOT NULL,\n    payload_json TEXT NOT NULL{extra}\n)",
        table.name, table.key_column
    )
}

/// The insert-or-update statement; `guarded` keeps a stored row with a newer
/// readable timestamp.
fn upsert_sql(table: &CacheTable, guarded: bool) -> String {
    let names: String = table.columns.iter().map(|c| format!(", {}", c.name)).collect();
    let placeholders = ", ?".repeat(table.columns.len());
    let updates: String = table
        .columns
        .iter()
        .map(|c| format!(",\n        {0} = excluded.{0}", c.name))
        .collect();
    let guard = if guarded {
        format!(
            "\n    WHERE excluded.generated_at >= {t}.generated_at\n        OR julianday({t}.generated_at) IS NULL",
            t = table.name
        )
    } else {
        String::new()
    };
    format!(
        "INSERT INTO {t} ({k}, generated_at, payload_json{names})
    VALUES (?, ?, ?{placeholders})
    ON CONFLICT ({k}) DO UPDATE SET
        generated_at = excluded.generated_at,
        payload_json = excluded.payload_json{updates}{guard}",
        t = table.name,
        k = table.key_column,
    )
}
