// Database schema and migrations for the Decora memory store.
// Called once at startup by MemoryStore::open() after WAL is enabled.
// Adding a new table or column: append an idempotent CREATE TABLE IF NOT
// EXISTS or ALTER TABLE … ADD COLUMN at the end of run_migrations() — never
// modify existing SQL, to keep upgrade paths clean.

use crate::atoms::error::EngineResult;
use rusqlite::Connection;

pub(crate) fn run_migrations(conn: &Connection) -> EngineResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS preferences (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            ptype TEXT NOT NULL,
            value TEXT NOT NULL,
            confidence REAL NOT NULL DEFAULT 0.3,
            source_room_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_preferences_tuple
            ON preferences(user_id, ptype, value);

        CREATE INDEX IF NOT EXISTS idx_preferences_user
            ON preferences(user_id, confidence);

        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            session_id TEXT NOT NULL,
            room_id TEXT,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            embedding BLOB,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_user
            ON conversations(user_id, created_at);

        CREATE TABLE IF NOT EXISTS rooms (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            room_type TEXT NOT NULL DEFAULT 'other',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_rooms_user
            ON rooms(user_id, created_at);

        CREATE TABLE IF NOT EXISTS design_versions (
            id TEXT PRIMARY KEY,
            room_id TEXT NOT NULL,
            version_number INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            selected INTEGER NOT NULL DEFAULT 0,
            rejected INTEGER NOT NULL DEFAULT 0,
            parent_version_id TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (room_id) REFERENCES rooms(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_design_versions_room
            ON design_versions(room_id, version_number);
        ",
    )?;

    Ok(())
}
