//! SQLite-backed persistent store for Pokémon records.
//!
//! The store is a best-effort cache: reads, deletes and counts log storage
//! failures and return a sentinel (`None`, `()`, `0`) instead of an error.
//! Only `open` and `put` report failures, through `CacheResult`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::is_valid_payload;
use crate::resolver::Query;

use super::cached::CachedData;
use super::error::{CacheError, CacheResult};
use super::record::Record;
use super::schema::{CREATE_SCHEMA_MIGRATIONS_SQL, LATEST_SCHEMA_VERSION, MIGRATIONS};

const SELECT_COLUMNS: &str =
    "id, name, type1, type2, weight, height, payload, species_payload, cached_at";

/// Columns as read from a row, before JSON decoding.
struct StoredRow {
    id: i64,
    name: String,
    type1: Option<String>,
    type2: Option<String>,
    weight: Option<f64>,
    height: Option<f64>,
    payload: String,
    species_payload: Option<String>,
    cached_at: Option<String>,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            type1: row.get(2)?,
            type2: row.get(3)?,
            weight: row.get(4)?,
            height: row.get(5)?,
            payload: row.get(6)?,
            species_payload: row.get(7)?,
            cached_at: row.get(8)?,
        })
    }

    fn into_cached(self) -> CacheResult<CachedData<Record>> {
        let payload: Value = serde_json::from_str(&self.payload)?;
        let species = self
            .species_payload
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose()?
            .filter(|v| !v.is_null());
        let cached_at = self
            .cached_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(CachedData {
            data: Record {
                id: self.id,
                name: self.name,
                primary_type: self.type1,
                secondary_type: self.type2,
                weight: self.weight,
                height: self.height,
                payload,
                species,
            },
            cached_at,
        })
    }
}

/// Persistent Pokémon cache.
///
/// Construct one per database with [`PokemonStore::open`] and share it behind
/// an `Arc`; the connection is closed when the last handle is dropped.
pub struct PokemonStore {
    conn: Mutex<Connection>,
}

impl PokemonStore {
    /// Open a database file (creates if doesn't exist) and upgrade its schema.
    ///
    /// Fails with `SchemaTooNew` if the file was last written by a newer
    /// schema version than this build supports; the file is left untouched.
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }
        }
        let conn = Connection::open(path)?;
        // Version check runs before any pragma so a newer file is left as found
        ensure_supported(recorded_schema_version(&conn)?)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::initialize(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> CacheResult<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(mut conn: Connection) -> CacheResult<Self> {
        migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    /// Schema version recorded in the database; `0` if it cannot be read.
    pub fn schema_version(&self) -> i64 {
        let result = self.lock().and_then(|conn| current_schema_version(&conn));
        recover("schema_version", result, 0)
    }

    // ===== Writes =====

    /// Insert or fully replace the record with the same id.
    ///
    /// Records whose payload lacks an `id` or `name` are rejected with
    /// `Validation` and nothing is written.
    pub fn put(&self, record: &Record) -> CacheResult<i64> {
        self.try_put(record)
            .inspect(|id| debug!(id, name = %record.name, "Saved record to store"))
            .inspect_err(|e| warn!(id = record.id, error = %e, "Failed to write record"))
    }

    fn try_put(&self, record: &Record) -> CacheResult<i64> {
        if !is_valid_payload(&record.payload) {
            return Err(CacheError::Validation(format!(
                "payload for id {} is missing id or name",
                record.id
            )));
        }

        let payload = serde_json::to_string(&record.payload)?;
        let species = record
            .species
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let cached_at = Utc::now().to_rfc3339();

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO pokemon
                (id, name, type1, type2, weight, height, payload, species_payload, cached_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.name,
                record.primary_type,
                record.secondary_type,
                record.weight,
                record.height,
                payload,
                species,
                cached_at,
            ],
        )?;
        Ok(record.id)
    }

    /// Remove a record. Missing ids are not an error.
    pub fn delete_by_id(&self, id: i64) {
        let result = self.lock().and_then(|conn| {
            conn.execute("DELETE FROM pokemon WHERE id = ?1", [id])
                .map_err(CacheError::from)
        });
        if let Some(removed) = recover("delete_by_id", result.map(Some), None) {
            debug!(id, removed, "Deleted record");
        }
    }

    /// Remove every record.
    pub fn clear(&self) {
        let result = self.lock().and_then(|conn| {
            conn.execute("DELETE FROM pokemon", [])
                .map_err(CacheError::from)
        });
        if let Some(removed) = recover("clear", result.map(Some), None) {
            info!(removed, "Cleared Pokémon store");
        }
    }

    // ===== Reads =====

    /// Exact primary-key lookup.
    pub fn get_by_id(&self, id: i64) -> Option<CachedData<Record>> {
        let result = self.query_one(
            &format!("SELECT {} FROM pokemon WHERE id = ?1", SELECT_COLUMNS),
            params![id],
        );
        recover("get_by_id", result, None)
    }

    /// Exact, case-sensitive lookup on the stored (sanitized) name.
    /// If several rows share a name, the one with the lowest id wins.
    pub fn get_by_name(&self, name: &str) -> Option<CachedData<Record>> {
        let result = self.query_one(
            &format!(
                "SELECT {} FROM pokemon WHERE name = ?1 ORDER BY id LIMIT 1",
                SELECT_COLUMNS
            ),
            params![name],
        );
        recover("get_by_name", result, None)
    }

    /// Store-only lookup of a parsed query. A record whose payload lacks
    /// `id` or `name` does not count as a hit.
    pub fn get_cached(&self, query: &Query) -> Option<CachedData<Record>> {
        let found = match query {
            Query::Id(id) => self.get_by_id(*id),
            Query::Name(_) => query
                .stored_name()
                .and_then(|name| self.get_by_name(&name)),
        }?;

        if !found.data.has_payload() {
            debug!(id = found.data.id, "Stored record has no payload, treating as miss");
            return None;
        }
        Some(found)
    }

    /// Number of stored records; `0` if the store cannot be read.
    pub fn count(&self) -> usize {
        let result = self.lock().and_then(|conn| {
            conn.query_row("SELECT COUNT(*) FROM pokemon", [], |row| row.get::<_, i64>(0))
                .map_err(CacheError::from)
        });
        recover("count", result, 0).max(0) as usize
    }

    fn query_one(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> CacheResult<Option<CachedData<Record>>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(sql, args, StoredRow::from_row)
            .optional()?;
        row.map(StoredRow::into_cached).transpose()
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) {
        let conn = self.lock().expect("store lock");
        conn.execute_batch(sql).expect("raw SQL should succeed");
    }
}

/// Log a storage failure and substitute the fallback value.
fn recover<T>(operation: &str, result: CacheResult<T>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(operation, error = %e, "Store operation failed");
            fallback
        }
    }
}

fn current_schema_version(conn: &Connection) -> CacheResult<i64> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(version)
}

/// Ledger version without creating anything; `0` for a fresh file.
fn recorded_schema_version(conn: &Connection) -> CacheResult<i64> {
    let has_ledger = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if has_ledger {
        current_schema_version(conn)
    } else {
        Ok(0)
    }
}

fn ensure_supported(version: i64) -> CacheResult<()> {
    if version > LATEST_SCHEMA_VERSION {
        return Err(CacheError::SchemaTooNew {
            found: version,
            supported: LATEST_SCHEMA_VERSION,
        });
    }
    Ok(())
}

/// Apply all forward migrations up to [`LATEST_SCHEMA_VERSION`].
fn migrate(conn: &mut Connection) -> CacheResult<()> {
    ensure_supported(recorded_schema_version(conn)?)?;
    conn.execute_batch(CREATE_SCHEMA_MIGRATIONS_SQL)?;

    let current = current_schema_version(conn)?;

    for (version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
            params![version, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        info!(version, "Applied store migration");
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
