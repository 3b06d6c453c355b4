// ── Decora Engine: Memory Manager ──────────────────────────────────────────
//
// Facade orchestrating the memory subsystem for the design agent:
//   on_message          — store chat, index it, learn implicitly (+0.1)
//   select_design       — flag the version, learn in the background (+0.3)
//   reject_design       — flag the version, learn negatively (−0.2)
//   on_feedback         — explicit feedback learning (±0.2)
//   build_context       — hybrid recall + preference summary + room state
//   summary / decay     — introspection and the periodic decay pass
//
// Error policy (per signal strength):
//   • Implicit learning and index writes are best-effort: a chat message is
//     never lost because extraction or embedding failed.
//   • Explicit signals (selection flag, feedback) propagate persistence
//     errors — losing them silently would corrupt user-visible state.
//   • Selection *learning* runs detached on the runtime; failures are
//     logged, never surfaced, never retried.

use std::sync::Arc;

use log::{error, warn};
use tokio::task::JoinHandle;

use crate::atoms::error::EngineResult;
use crate::atoms::types::{
    ConversationRecord, MemoryConfig, MessageRole, PreferenceSummary,
};
use crate::engine::context::{format_context, RoomContext};
use crate::engine::embedding::EmbeddingClient;
use crate::engine::index::{IndexMetadata, SemanticIndex, SqliteIndex};
use crate::engine::learner::PreferenceLearner;
use crate::engine::retriever::HybridRetriever;
use crate::engine::store::MemoryStore;

pub struct MemoryManager {
    store: Arc<MemoryStore>,
    index: Arc<dyn SemanticIndex>,
    learner: PreferenceLearner,
    retriever: HybridRetriever,
}

impl MemoryManager {
    /// Wire the manager onto an existing store with a custom index backend.
    pub fn new(
        store: Arc<MemoryStore>,
        index: Arc<dyn SemanticIndex>,
        config: MemoryConfig,
    ) -> Self {
        let learner = PreferenceLearner::new(Arc::clone(&store), config.clone());
        let retriever = HybridRetriever::new(Arc::clone(&index), config);
        MemoryManager { store, index, learner, retriever }
    }

    /// Default wiring: vectors live in the same SQLite store, embedded via
    /// the configured Ollama / OpenAI-compatible endpoint.
    pub fn with_sqlite_index(store: Arc<MemoryStore>, config: MemoryConfig) -> Self {
        let embeddings = EmbeddingClient::new(&config);
        let index: Arc<dyn SemanticIndex> =
            Arc::new(SqliteIndex::new(Arc::clone(&store), embeddings));
        Self::new(store, index, config)
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    // ── Learning hooks ─────────────────────────────────────────────────

    /// Persist one conversation message, index it, and — for user messages —
    /// learn implicit preferences. The row write propagates errors; indexing
    /// and learning are wrapped so storage succeeds even when they fail.
    pub async fn on_message(
        &self,
        text: &str,
        user_id: &str,
        session_id: &str,
        room_id: Option<&str>,
        role: MessageRole,
    ) -> EngineResult<ConversationRecord> {
        let record = ConversationRecord::new(user_id, session_id, room_id, role, text);
        self.store.insert_conversation(&record, None)?;

        let metadata = IndexMetadata {
            user_id: user_id.to_string(),
            room_id: room_id.map(str::to_string),
            role,
            timestamp: Some(record.created_at.to_rfc3339()),
        };
        if let Err(e) = self.index.insert(&record.id, text, &metadata).await {
            warn!("[manager] Failed to index message {} — stored without vector: {e}", record.id);
        }

        if role == MessageRole::User {
            if let Err(e) = self.learner.learn_from_message(user_id, text, room_id) {
                warn!("[manager] Implicit preference learning failed — message kept: {e}");
            }
        }

        Ok(record)
    }

    /// Mark a design version selected and learn from its description in the
    /// background. The flag write is synchronous and propagates; learning is
    /// dispatched fire-and-forget so the user-visible action returns
    /// immediately. The returned handle may be dropped — the task is
    /// detached either way.
    pub fn select_design(&self, version_id: &str, user_id: &str) -> EngineResult<JoinHandle<()>> {
        let version = self.store.mark_design_selected(version_id)?;
        Ok(self.learn_selection_detached(&version.description, user_id, Some(&version.room_id)))
    }

    /// Learn from a selection described as free text (no stored version).
    pub fn on_design_selected(
        &self,
        description: &str,
        user_id: &str,
        room_id: Option<&str>,
    ) -> JoinHandle<()> {
        self.learn_selection_detached(description, user_id, room_id)
    }

    fn learn_selection_detached(
        &self,
        description: &str,
        user_id: &str,
        room_id: Option<&str>,
    ) -> JoinHandle<()> {
        let learner = self.learner.clone();
        let description = description.to_string();
        let user_id = user_id.to_string();
        let room_id = room_id.map(str::to_string);
        tokio::spawn(async move {
            if let Err(e) = learner.learn_from_selection(&user_id, &description, room_id.as_deref())
            {
                error!("[manager] Selection learning failed (not retried): {e}");
            }
        })
    }

    /// Mark a design version rejected and learn negatively from its
    /// description plus the user's stated reason. Explicit signal: errors
    /// propagate.
    pub fn reject_design(
        &self,
        version_id: &str,
        user_id: &str,
        feedback: &str,
    ) -> EngineResult<()> {
        let version = self.store.mark_design_rejected(version_id)?;
        let text = format!("{} {}", version.description, feedback);
        self.learner.learn_from_feedback(user_id, &text, false, Some(&version.room_id))?;
        Ok(())
    }

    /// Explicit feedback learning. Errors propagate.
    pub fn on_feedback(
        &self,
        text: &str,
        is_positive: bool,
        user_id: &str,
        room_id: Option<&str>,
    ) -> EngineResult<()> {
        self.learner.learn_from_feedback(user_id, text, is_positive, room_id)?;
        Ok(())
    }

    // ── Context hook ───────────────────────────────────────────────────

    /// Assemble prompt-ready context for a generation request: room state,
    /// high-confidence preferences, and hybrid-recalled conversation.
    /// Recall is best-effort; store reads propagate.
    pub async fn build_context(
        &self,
        query: &str,
        user_id: &str,
        room_id: Option<&str>,
    ) -> EngineResult<String> {
        let snippets = self.retriever.retrieve(query, user_id, room_id, None).await;
        let summary = self.learner.preference_summary(user_id)?;

        let room = match room_id {
            Some(id) => self.store.get_room(id)?,
            None => None,
        };
        let latest = match &room {
            Some(r) => self.store.latest_design_version(&r.id)?,
            None => None,
        };

        Ok(format_context(
            room.as_ref().map(|r| RoomContext { room: r, latest_design: latest.as_ref() }),
            &summary,
            &snippets,
        ))
    }

    // ── Introspection & maintenance ────────────────────────────────────

    /// High-confidence preferences by dimension, for UI and diagnostics.
    pub fn summary(&self, user_id: &str) -> EngineResult<PreferenceSummary> {
        self.learner.preference_summary(user_id)
    }

    /// Run the weekly-rate decay pass over a user's preferences.
    /// Scheduling is the caller's concern.
    pub fn decay(&self, user_id: &str) -> EngineResult<()> {
        self.learner.apply_time_decay(user_id)
    }
}
