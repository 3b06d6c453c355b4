use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::{parse_ts, MemoryStore};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{DesignVersion, Room, RoomType};

impl Room {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let room_type: String = row.get(3)?;
        let created_at: String = row.get(4)?;
        let updated_at: String = row.get(5)?;
        Ok(Room {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            room_type: RoomType::parse(&room_type),
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    }
}

impl DesignVersion {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let selected: i64 = row.get(4)?;
        let rejected: i64 = row.get(5)?;
        let created_at: String = row.get(7)?;
        Ok(DesignVersion {
            id: row.get(0)?,
            room_id: row.get(1)?,
            version_number: row.get(2)?,
            description: row.get(3)?,
            selected: selected != 0,
            rejected: rejected != 0,
            parent_version_id: row.get(6)?,
            created_at: parse_ts(&created_at),
        })
    }
}

impl MemoryStore {
    // ── Rooms ──────────────────────────────────────────────────────────

    pub fn create_room(&self, user_id: &str, name: &str, room_type: RoomType) -> EngineResult<Room> {
        let now = Utc::now();
        let room = Room {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            room_type,
            created_at: now,
            updated_at: now,
        };
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO rooms (id, user_id, name, room_type, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                room.id,
                room.user_id,
                room.name,
                room.room_type.as_str(),
                room.created_at.to_rfc3339(),
                room.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(room)
    }

    pub fn get_room(&self, room_id: &str) -> EngineResult<Option<Room>> {
        let conn = self.conn.lock();
        let room = conn
            .query_row(
                "SELECT id, user_id, name, room_type, created_at, updated_at
                 FROM rooms WHERE id = ?1",
                params![room_id],
                Room::from_row,
            )
            .optional()?;
        Ok(room)
    }

    /// A user's rooms, most recently created first.
    pub fn list_rooms(&self, user_id: &str) -> EngineResult<Vec<Room>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, room_type, created_at, updated_at
             FROM rooms WHERE user_id = ?1 ORDER BY created_at DESC",
        )?;
        let rooms = stmt
            .query_map(params![user_id], Room::from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rooms)
    }

    // ── Design versions ────────────────────────────────────────────────

    /// Append the next design version for a room. Version numbers are
    /// assigned here (max + 1) so callers cannot create gaps or duplicates.
    pub fn create_design_version(
        &self,
        room_id: &str,
        description: &str,
        parent_version_id: Option<&str>,
    ) -> EngineResult<DesignVersion> {
        let conn = self.conn.lock();
        let next: i64 = conn.query_row(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM design_versions WHERE room_id = ?1",
            params![room_id],
            |r| r.get(0),
        )?;

        let version = DesignVersion {
            id: uuid::Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            version_number: next,
            description: description.to_string(),
            selected: false,
            rejected: false,
            parent_version_id: parent_version_id.map(str::to_string),
            created_at: Utc::now(),
        };
        conn.execute(
            "INSERT INTO design_versions
                (id, room_id, version_number, description, selected, rejected, parent_version_id, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, 0, ?5, ?6)",
            params![
                version.id,
                version.room_id,
                version.version_number,
                version.description,
                version.parent_version_id,
                version.created_at.to_rfc3339(),
            ],
        )?;
        Ok(version)
    }

    pub fn get_design_version(&self, version_id: &str) -> EngineResult<Option<DesignVersion>> {
        let conn = self.conn.lock();
        let version = conn
            .query_row(
                "SELECT id, room_id, version_number, description, selected, rejected,
                        parent_version_id, created_at
                 FROM design_versions WHERE id = ?1",
                params![version_id],
                DesignVersion::from_row,
            )
            .optional()?;
        Ok(version)
    }

    /// The highest-numbered design version of a room, if any.
    pub fn latest_design_version(&self, room_id: &str) -> EngineResult<Option<DesignVersion>> {
        let conn = self.conn.lock();
        let version = conn
            .query_row(
                "SELECT id, room_id, version_number, description, selected, rejected,
                        parent_version_id, created_at
                 FROM design_versions WHERE room_id = ?1
                 ORDER BY version_number DESC LIMIT 1",
                params![room_id],
                DesignVersion::from_row,
            )
            .optional()?;
        Ok(version)
    }

    /// Flag a version as selected and return it for downstream learning.
    /// Errors if the version does not exist: losing a selection silently
    /// would corrupt user-visible state.
    pub fn mark_design_selected(&self, version_id: &str) -> EngineResult<DesignVersion> {
        self.set_design_flag(version_id, "selected")
    }

    /// Flag a version as rejected and return it for downstream learning.
    pub fn mark_design_rejected(&self, version_id: &str) -> EngineResult<DesignVersion> {
        self.set_design_flag(version_id, "rejected")
    }

    fn set_design_flag(&self, version_id: &str, column: &str) -> EngineResult<DesignVersion> {
        {
            let conn = self.conn.lock();
            // `column` is a compile-time literal from the two callers above,
            // never user input.
            let changed = conn.execute(
                &format!("UPDATE design_versions SET {column} = 1 WHERE id = ?1"),
                params![version_id],
            )?;
            if changed == 0 {
                return Err(EngineError::NotFound(format!("design version {version_id}")));
            }
        }
        self.get_design_version(version_id)?
            .ok_or_else(|| EngineError::NotFound(format!("design version {version_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_numbers_are_sequential_per_room() {
        let store = MemoryStore::in_memory().unwrap();
        let room = store.create_room("u1", "Study", RoomType::Office).unwrap();
        let v1 = store.create_design_version(&room.id, "first pass", None).unwrap();
        let v2 = store.create_design_version(&room.id, "second pass", Some(&v1.id)).unwrap();
        assert_eq!(v1.version_number, 1);
        assert_eq!(v2.version_number, 2);

        let latest = store.latest_design_version(&room.id).unwrap().unwrap();
        assert_eq!(latest.id, v2.id);
    }

    #[test]
    fn select_flags_and_returns_version() {
        let store = MemoryStore::in_memory().unwrap();
        let room = store.create_room("u1", "Bedroom", RoomType::Bedroom).unwrap();
        let v = store.create_design_version(&room.id, "a modern bedroom", None).unwrap();

        let selected = store.mark_design_selected(&v.id).unwrap();
        assert!(selected.selected);
        assert!(!selected.rejected);
        assert_eq!(selected.description, "a modern bedroom");
    }

    #[test]
    fn select_missing_version_errors() {
        let store = MemoryStore::in_memory().unwrap();
        assert!(store.mark_design_selected("nope").is_err());
    }
}
