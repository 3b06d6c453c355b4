// Decora Design Engine — Memory Store
// Stores preferences, conversations, rooms, and design versions in SQLite
// via rusqlite, behind a single connection guarded by a Mutex.
//
// Module layout:
//   preferences    — preference upsert, tuple lookup, threshold listing
//   conversations  — immutable message rows + embedding BLOBs + cosine scan
//   rooms          — room and design-version CRUD, select/reject flags
//   schema         — idempotent migrations, run once at open
//   vector         — bytes_to_f32_vec, f32_vec_to_bytes, cosine_similarity

use crate::atoms::error::EngineResult;
use chrono::{DateTime, Utc};
use log::info;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

mod conversations;
mod preferences;
mod rooms;
mod schema;
pub(crate) mod vector;

pub use vector::{bytes_to_f32_vec, f32_vec_to_bytes};

/// Thread-safe database wrapper.
pub struct MemoryStore {
    /// The SQLite connection, protected by a Mutex.
    pub(crate) conn: Mutex<Connection>,
}

impl MemoryStore {
    /// Open (or create) the engine database at `path` and initialize tables.
    pub fn open(path: &Path) -> EngineResult<Self> {
        info!("[store] Opening memory store at {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        conn.execute_batch("PRAGMA foreign_keys=ON;").ok();
        schema::run_migrations(&conn)?;
        Ok(MemoryStore { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database with the full schema. Used by tests.
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::run_migrations(&conn)?;
        Ok(MemoryStore { conn: Mutex::new(conn) })
    }
}

/// Parse an RFC 3339 TEXT column back into a UTC timestamp.
/// Rows written by older builds may carry `datetime('now')` strings; those
/// fail the RFC 3339 parse and fall back to the epoch rather than erroring.
pub(crate) fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::from_timestamp(0, 0).unwrap_or_default())
}
