// ── Decora Atoms: Core Types ───────────────────────────────────────────────
// Pure data types for the preference memory engine (no logic, no DB access,
// no I/O). Follows the project pattern: structs in atoms/, impls in engine/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::atoms::constants;

// ═══════════════════════════════════════════════════════════════════════════
// Enums
// ═══════════════════════════════════════════════════════════════════════════

/// The fixed dimensions along which user taste is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceType {
    Style,
    Color,
    Warmth,
    Complexity,
    Lighting,
    Furniture,
    Material,
    Other,
}

impl PreferenceType {
    /// Stable string form used in SQLite and prompt context.
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceType::Style => "style",
            PreferenceType::Color => "color",
            PreferenceType::Warmth => "warmth",
            PreferenceType::Complexity => "complexity",
            PreferenceType::Lighting => "lighting",
            PreferenceType::Furniture => "furniture",
            PreferenceType::Material => "material",
            PreferenceType::Other => "other",
        }
    }

    /// Parse the stable string form; unknown strings map to `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "style" => PreferenceType::Style,
            "color" => PreferenceType::Color,
            "warmth" => PreferenceType::Warmth,
            "complexity" => PreferenceType::Complexity,
            "lighting" => PreferenceType::Lighting,
            "furniture" => PreferenceType::Furniture,
            "material" => PreferenceType::Material,
            _ => PreferenceType::Other,
        }
    }
}

/// Who produced a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Agent,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Agent => "agent",
            MessageRole::System => "system",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "user" => MessageRole::User,
            "agent" => MessageRole::Agent,
            _ => MessageRole::System,
        }
    }
}

/// Room categories, mirroring the product's room picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Bedroom,
    LivingRoom,
    Kitchen,
    Bathroom,
    Office,
    DiningRoom,
    Other,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Bedroom => "bedroom",
            RoomType::LivingRoom => "living_room",
            RoomType::Kitchen => "kitchen",
            RoomType::Bathroom => "bathroom",
            RoomType::Office => "office",
            RoomType::DiningRoom => "dining_room",
            RoomType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "bedroom" => RoomType::Bedroom,
            "living_room" => RoomType::LivingRoom,
            "kitchen" => RoomType::Kitchen,
            "bathroom" => RoomType::Bathroom,
            "office" => RoomType::Office,
            "dining_room" => RoomType::DiningRoom,
            _ => RoomType::Other,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════════════════════

/// A learned taste signal. At most one row exists per
/// (user_id, ptype, value) — upserts enforce the tuple invariant.
/// Rows are never hard-deleted; confidence decaying under the floor makes
/// them invisible to threshold filters instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub id: String,
    pub user_id: String,
    pub ptype: PreferenceType,
    pub value: String,
    /// Accumulated evidence strength, always clamped to [0, 1].
    pub confidence: f64,
    /// Room where the signal was last observed, if any.
    pub source_room_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PreferenceRecord {
    pub fn new(
        user_id: &str,
        ptype: PreferenceType,
        value: &str,
        confidence: f64,
        source_room_id: Option<&str>,
    ) -> Self {
        let now = Utc::now();
        PreferenceRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            ptype,
            value: value.to_string(),
            confidence: confidence.clamp(0.0, 1.0),
            source_room_id: source_room_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One stored chat message. Immutable once written; the embedding BLOB kept
/// alongside it in SQLite is a derived, rebuildable projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    pub room_id: Option<String>,
    pub role: MessageRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationRecord {
    pub fn new(
        user_id: &str,
        session_id: &str,
        room_id: Option<&str>,
        role: MessageRole,
        text: &str,
    ) -> Self {
        ConversationRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            room_id: room_id.map(str::to_string),
            role,
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// A room being designed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub room_type: RoomType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One iteration of a room's design. `selected` / `rejected` drive the
/// strong-signal learning paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignVersion {
    pub id: String,
    pub room_id: String,
    pub version_number: i64,
    pub description: String,
    pub selected: bool,
    pub rejected: bool,
    pub parent_version_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Ephemeral values
// ═══════════════════════════════════════════════════════════════════════════

/// Extractor output: one (dimension, value) hit with its base weight.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceCandidate {
    pub ptype: PreferenceType,
    pub value: &'static str,
    /// Fixed low base weight — 0.1, or 0.15 for the warm/cozy emphasis case.
    pub weight: f64,
}

/// One re-ranked retrieval result. Produced per retrieval call, rendered into
/// prompt context, and discarded — never persisted.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    pub text: String,
    pub role: MessageRole,
    pub timestamp: Option<DateTime<Utc>>,
    /// Raw index similarity in [0, 1].
    pub similarity: f64,
    /// Exponential recency boost in (0, 1].
    pub recency: f64,
    /// similarity_weight·similarity + recency_weight·recency.
    pub score: f64,
}

/// Preference introspection: dimension → "value (0.62)" strings,
/// confidence-descending. BTreeMap so rendering order is deterministic.
pub type PreferenceSummary = BTreeMap<PreferenceType, Vec<String>>;

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Tunables for the whole memory engine. Defaults reproduce the reference
/// scoring policy; see atoms/constants.rs for the rationale behind each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Base URL for the embedding API (Ollama: http://localhost:11434).
    pub embedding_base_url: String,
    /// Embedding model name (e.g. "nomic-embed-text", "all-minilm").
    pub embedding_model: String,

    /// Confidence delta for an implicit mention in chat.
    pub delta_implicit: f64,
    /// Confidence delta when a design is selected.
    pub delta_selection: f64,
    /// Confidence delta for explicit positive feedback.
    pub delta_positive: f64,
    /// Confidence delta for explicit negative feedback / rejection.
    pub delta_negative: f64,

    /// Weekly multiplier applied by the decay pass.
    pub decay_weekly_rate: f64,

    /// Weight of index similarity in the combined retrieval score.
    pub similarity_weight: f64,
    /// Weight of the recency boost in the combined retrieval score.
    pub recency_weight: f64,
    /// Results returned per retrieval.
    pub similarity_top_k: usize,

    /// Minimum confidence for a preference to appear in prompt context.
    pub confidence_threshold: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            embedding_base_url: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            delta_implicit: constants::DELTA_IMPLICIT_MENTION,
            delta_selection: constants::DELTA_DESIGN_SELECTED,
            delta_positive: constants::DELTA_POSITIVE_FEEDBACK,
            delta_negative: constants::DELTA_NEGATIVE_FEEDBACK,
            decay_weekly_rate: constants::DECAY_WEEKLY_RATE,
            similarity_weight: constants::SIMILARITY_WEIGHT,
            recency_weight: constants::RECENCY_WEIGHT,
            similarity_top_k: constants::SIMILARITY_TOP_K,
            confidence_threshold: constants::PREFERENCE_CONFIDENCE_THRESHOLD,
        }
    }
}
