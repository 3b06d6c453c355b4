// Decora Design Engine — preference memory.
//
// The memory subsystem of the Decora interior-design agent: it watches
// conversation and design-selection events for taste signals, keeps a
// confidence-scored preference record per (user, dimension, value), decays
// stale preferences over time, and assembles grounded prompt context by
// blending semantic recall with a recency boost.
//
// The surrounding chat/API layer calls five hooks:
//   on_message / select_design / reject_design / on_feedback  (learning)
//   build_context                                             (generation)
//
// Text completion and image generation stay outside this crate; the only
// external capability consumed here is an embedding endpoint, and even that
// is behind the SemanticIndex seam.

pub mod atoms;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::types::{
    ConversationRecord, DesignVersion, MemoryConfig, MessageRole, PreferenceCandidate,
    PreferenceRecord, PreferenceSummary, PreferenceType, RetrievedContext, Room, RoomType,
};
pub use engine::index::{IndexFilter, IndexHit, IndexMetadata, SemanticIndex};
pub use engine::learner::{extract_candidates, PreferenceLearner};
pub use engine::manager::MemoryManager;
pub use engine::retriever::HybridRetriever;
pub use engine::store::MemoryStore;
