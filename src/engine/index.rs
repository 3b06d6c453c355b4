// ── Decora Engine: Semantic Index ──────────────────────────────────────────
//
// The pluggable vector-search seam. The engine only needs two operations
// from whatever vector store sits behind it: insert text with metadata, and
// query with exact-match metadata filtering. Similarity must be cosine-like
// in [0, 1].
//
// The default backend keeps vectors as BLOBs on the conversation rows in
// SQLite and answers queries with a filtered cosine scan — no separate
// vector database to run or rebuild. Swapping in a dedicated store means
// implementing this trait, nothing else.

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;

use crate::atoms::error::EngineResult;
use crate::atoms::types::MessageRole;
use crate::engine::embedding::EmbeddingClient;
use crate::engine::store::{f32_vec_to_bytes, MemoryStore};

/// Metadata attached to every indexed snippet, used for filtering and for
/// the retriever's recency scoring.
#[derive(Debug, Clone)]
pub struct IndexMetadata {
    pub user_id: String,
    pub room_id: Option<String>,
    pub role: MessageRole,
    /// RFC 3339. None when the source record predates timestamping.
    pub timestamp: Option<String>,
}

/// Exact-match restriction applied inside the index.
#[derive(Debug, Clone)]
pub struct IndexFilter {
    pub user_id: String,
    pub room_id: Option<String>,
}

/// One similarity-ranked result.
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub id: String,
    pub text: String,
    pub metadata: IndexMetadata,
    /// Cosine-like similarity in [0, 1].
    pub similarity: f64,
}

#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Index `text` under `id` with `metadata` attached.
    async fn insert(&self, id: &str, text: &str, metadata: &IndexMetadata) -> EngineResult<()>;

    /// Top `top_k` snippets by similarity to `text`, restricted by `filter`.
    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: &IndexFilter,
    ) -> EngineResult<Vec<IndexHit>>;
}

// ── SQLite-backed implementation ───────────────────────────────────────────

/// Embeds via `EmbeddingClient` and stores vectors on the conversation rows.
/// The vector column is a derived, rebuildable projection: losing it
/// degrades recall quality but loses no conversation or preference state.
pub struct SqliteIndex {
    store: Arc<MemoryStore>,
    embeddings: EmbeddingClient,
}

impl SqliteIndex {
    pub fn new(store: Arc<MemoryStore>, embeddings: EmbeddingClient) -> Self {
        SqliteIndex { store, embeddings }
    }
}

#[async_trait]
impl SemanticIndex for SqliteIndex {
    /// Attach an embedding to the conversation row with this id.
    /// The row itself is written by the manager before indexing; an id with
    /// no backing row is a no-op.
    async fn insert(&self, id: &str, text: &str, _metadata: &IndexMetadata) -> EngineResult<()> {
        let vec = self.embeddings.embed(text).await?;
        self.store.set_conversation_embedding(id, &f32_vec_to_bytes(&vec))?;
        Ok(())
    }

    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: &IndexFilter,
    ) -> EngineResult<Vec<IndexHit>> {
        let query_vec = self.embeddings.embed(text).await?;
        let scored = self.store.search_conversations_by_embedding(
            &query_vec,
            top_k,
            &filter.user_id,
            filter.room_id.as_deref(),
        )?;

        if scored.is_empty() {
            warn!("[index] No embedded conversations matched for user {}", filter.user_id);
        }

        Ok(scored
            .into_iter()
            .map(|(record, similarity)| IndexHit {
                id: record.id.clone(),
                text: record.text,
                metadata: IndexMetadata {
                    user_id: record.user_id,
                    room_id: record.room_id,
                    role: record.role,
                    timestamp: Some(record.created_at.to_rfc3339()),
                },
                similarity,
            })
            .collect())
    }
}
