//! SQLite backend: connection management and column codecs.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] behind a mutex and
//! guarantees that migrations are run before any other operation. The
//! per-entity repository impls live in `users.rs`, `leads.rs` and friends.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Params, Row};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::migrations;
use crate::repository::Repository;

/// SQLite-backed [`Repository`].
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at an explicit path, creating parent
    /// directories as needed.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;
        // WAL is meaningless for in-memory databases, so only file-backed
        // connections ask for it.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database. Used by tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the underlying connection.
    ///
    /// Callers should prefer the typed repository methods, but direct access
    /// is occasionally needed for transactions or ad-hoc queries.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Result<Option<PathBuf>> {
        Ok(self
            .conn()?
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from))
    }
}

impl Repository for Database {
    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

/// Run `sql` and collect every row through `map`.
pub(crate) fn query_all<T, P>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>>
where
    P: Params,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, map)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(StoreError::Sqlite)
}

/// Run `sql` and return the first row, if any.
pub(crate) fn query_one<T, P>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Option<T>>
where
    P: Params,
{
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query_map(params, map)?;
    rows.next().transpose().map_err(StoreError::Sqlite)
}

/// Map constraint violations to [`StoreError::Conflict`]; everything else is
/// a plain SQLite error.
pub(crate) fn write_err(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(msg.unwrap_or_else(|| err.to_string()))
        }
        other => StoreError::Sqlite(other),
    }
}

// ---------------------------------------------------------------------------
// Column codecs
// ---------------------------------------------------------------------------

// Fixed-width microsecond timestamps sort correctly as text.
pub(crate) fn ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn opt_ts(value: &Option<DateTime<Utc>>) -> Option<String> {
    value.as_ref().map(ts)
}

pub(crate) fn json<T: Serialize>(value: &Option<T>) -> Result<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(StoreError::Json)
}

fn conversion_failure<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

pub(crate) fn get_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_failure(idx, e))
    })
    .transpose()
}

pub(crate) fn get_money(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| conversion_failure(idx, e))
}

pub(crate) fn get_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = refnet_shared::ValidationError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_failure(idx, e))
}

pub(crate) fn get_json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| serde_json::from_str(&s).map_err(|e| conversion_failure(idx, e)))
        .transpose()
}
