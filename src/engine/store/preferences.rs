use rusqlite::{params, OptionalExtension};

use super::{parse_ts, MemoryStore};
use crate::atoms::error::EngineResult;
use crate::atoms::types::{PreferenceRecord, PreferenceType};

impl PreferenceRecord {
    /// Map a row with columns (id, user_id, ptype, value, confidence,
    /// source_room_id, created_at, updated_at) → PreferenceRecord.
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let ptype: String = row.get(2)?;
        let source_room_id: Option<String> = row.get(5)?;
        let created_at: String = row.get(6)?;
        let updated_at: String = row.get(7)?;
        Ok(PreferenceRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            ptype: PreferenceType::parse(&ptype),
            value: row.get(3)?,
            confidence: row.get(4)?,
            source_room_id,
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    }
}

const PREFERENCE_COLUMNS: &str =
    "id, user_id, ptype, value, confidence, source_room_id, created_at, updated_at";

impl MemoryStore {
    // ── Preference CRUD ────────────────────────────────────────────────

    /// Insert or update a preference row. Conflicts on the
    /// (user_id, ptype, value) tuple update the existing row in place, so
    /// the one-row-per-tuple invariant holds even under racing writers.
    pub fn save_preference(&self, pref: &PreferenceRecord) -> EngineResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO preferences
                (id, user_id, ptype, value, confidence, source_room_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id, ptype, value) DO UPDATE SET
                confidence = excluded.confidence,
                source_room_id = COALESCE(excluded.source_room_id, source_room_id),
                updated_at = excluded.updated_at",
            params![
                pref.id,
                pref.user_id,
                pref.ptype.as_str(),
                pref.value,
                pref.confidence,
                pref.source_room_id,
                pref.created_at.to_rfc3339(),
                pref.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Exact lookup by the (user_id, ptype, value) tuple.
    pub fn find_preference(
        &self,
        user_id: &str,
        ptype: PreferenceType,
        value: &str,
    ) -> EngineResult<Option<PreferenceRecord>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {PREFERENCE_COLUMNS} FROM preferences
             WHERE user_id = ?1 AND ptype = ?2 AND value = ?3"
        );
        let pref = conn
            .query_row(&sql, params![user_id, ptype.as_str(), value], PreferenceRecord::from_row)
            .optional()?;
        Ok(pref)
    }

    /// All of a user's preferences at or above `confidence_threshold`,
    /// strongest first. Pass 0.0 to list everything (the decay pass does).
    pub fn list_preferences(
        &self,
        user_id: &str,
        confidence_threshold: f64,
    ) -> EngineResult<Vec<PreferenceRecord>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {PREFERENCE_COLUMNS} FROM preferences
             WHERE user_id = ?1 AND confidence >= ?2
             ORDER BY confidence DESC, value ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let prefs = stmt
            .query_map(params![user_id, confidence_threshold], PreferenceRecord::from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(prefs)
    }
}
