use rusqlite::{params, OptionalExtension};

use super::vector::{bytes_to_f32_vec, cosine_similarity};
use super::{parse_ts, MemoryStore};
use crate::atoms::error::EngineResult;
use crate::atoms::types::{ConversationRecord, MessageRole};

impl ConversationRecord {
    /// Map a row with columns (id, user_id, session_id, room_id, role,
    /// content, created_at) → ConversationRecord.
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let room_id: Option<String> = row.get(3)?;
        let role: String = row.get(4)?;
        let created_at: String = row.get(6)?;
        Ok(ConversationRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            session_id: row.get(2)?,
            room_id,
            role: MessageRole::parse(&role),
            text: row.get(5)?,
            created_at: parse_ts(&created_at),
        })
    }
}

impl MemoryStore {
    // ── Conversation rows ──────────────────────────────────────────────

    /// Insert an immutable conversation row, optionally with its embedding.
    pub fn insert_conversation(
        &self,
        record: &ConversationRecord,
        embedding: Option<&[u8]>,
    ) -> EngineResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO conversations
                (id, user_id, session_id, room_id, role, content, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                record.user_id,
                record.session_id,
                record.room_id,
                record.role.as_str(),
                record.text,
                embedding,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Attach (or rebuild) the embedding BLOB on an existing row.
    /// The vector projection is derived data, so overwriting is safe.
    pub fn set_conversation_embedding(&self, id: &str, embedding: &[u8]) -> EngineResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE conversations SET embedding = ?2 WHERE id = ?1",
            params![id, embedding],
        )?;
        Ok(())
    }

    pub fn get_conversation(&self, id: &str) -> EngineResult<Option<ConversationRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT id, user_id, session_id, room_id, role, content, created_at
                 FROM conversations WHERE id = ?1",
                params![id],
                ConversationRecord::from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Search a user's embedded conversations by cosine similarity against a
    /// query embedding, optionally restricted to one room. Rows without an
    /// embedding are invisible to this scan (they were stored while the
    /// embedding backend was down).
    pub fn search_conversations_by_embedding(
        &self,
        query_embedding: &[f32],
        limit: usize,
        user_id: &str,
        room_id: Option<&str>,
    ) -> EngineResult<Vec<(ConversationRecord, f64)>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, user_id, session_id, room_id, role, content, created_at, embedding
             FROM conversations
             WHERE user_id = ?1 AND embedding IS NOT NULL
               AND (?2 IS NULL OR room_id = ?2)",
        )?;

        let mut scored: Vec<(ConversationRecord, f64)> = stmt
            .query_map(params![user_id, room_id], |row| {
                let record = ConversationRecord::from_row(row)?;
                let blob: Vec<u8> = row.get(7)?;
                Ok((record, blob))
            })?
            .filter_map(|r| r.ok())
            .map(|(record, blob)| {
                let stored = bytes_to_f32_vec(&blob);
                // Negative cosine would push the combined score out of
                // [0, 1]; clamp at zero.
                let score = cosine_similarity(query_embedding, &stored).max(0.0);
                (record, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::f32_vec_to_bytes;

    fn conv(user: &str, room: Option<&str>, text: &str) -> ConversationRecord {
        ConversationRecord::new(user, "s1", room, MessageRole::User, text)
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let store = MemoryStore::in_memory().unwrap();
        let record = conv("u1", Some("r1"), "I want a cozy reading nook");
        store.insert_conversation(&record, None).unwrap();

        let loaded = store.get_conversation(&record.id).unwrap().unwrap();
        assert_eq!(loaded.text, record.text);
        assert_eq!(loaded.room_id.as_deref(), Some("r1"));
        assert_eq!(loaded.role, MessageRole::User);
    }

    #[test]
    fn embedding_scan_filters_by_user_and_room() {
        let store = MemoryStore::in_memory().unwrap();
        let vec_a = f32_vec_to_bytes(&[1.0, 0.0]);
        let vec_b = f32_vec_to_bytes(&[0.0, 1.0]);

        let mine = conv("u1", Some("r1"), "mine");
        let other_room = conv("u1", Some("r2"), "other room");
        let other_user = conv("u2", Some("r1"), "other user");
        store.insert_conversation(&mine, Some(&vec_a)).unwrap();
        store.insert_conversation(&other_room, Some(&vec_a)).unwrap();
        store.insert_conversation(&other_user, Some(&vec_b)).unwrap();

        let hits = store
            .search_conversations_by_embedding(&[1.0, 0.0], 10, "u1", Some("r1"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.text, "mine");
        assert!((hits[0].1 - 1.0).abs() < 1e-6);

        // Without a room filter both of u1's rows come back.
        let hits = store
            .search_conversations_by_embedding(&[1.0, 0.0], 10, "u1", None)
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn rows_without_embeddings_are_skipped() {
        let store = MemoryStore::in_memory().unwrap();
        store.insert_conversation(&conv("u1", None, "no vector"), None).unwrap();
        let hits = store
            .search_conversations_by_embedding(&[1.0, 0.0], 10, "u1", None)
            .unwrap();
        assert!(hits.is_empty());
    }
}
