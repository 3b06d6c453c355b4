// ── Decora Atoms: Constants ────────────────────────────────────────────────
// All named policy constants for the crate live here.
// Rationale: collecting constants in one place eliminates magic numbers,
// makes auditing easier, and keeps the scoring pipeline self-documenting.
// Every value below is also a `MemoryConfig` field default — callers tune
// the struct, never these.

// ── Confidence deltas by signal strength ───────────────────────────────────
// A design selection is the strongest signal we get; an offhand mention in
// chat is the weakest. Rejection deliberately pulls less than selection
// pushes so one bad render does not erase an established preference.
pub const DELTA_IMPLICIT_MENTION: f64 = 0.1;
pub const DELTA_DESIGN_SELECTED: f64 = 0.3;
pub const DELTA_POSITIVE_FEEDBACK: f64 = 0.2;
pub const DELTA_NEGATIVE_FEEDBACK: f64 = -0.2;

// ── New-record baseline ────────────────────────────────────────────────────
// Fresh preferences start at 0.3 + delta rather than 0 + delta, so a single
// implicit mention lands at 0.4 instead of being washed out immediately.
pub const NEW_PREFERENCE_BASELINE: f64 = 0.3;

// ── Extractor candidate weights ────────────────────────────────────────────
// Low base weight: the keyword pass is recall-biased and precision-agnostic;
// false positives are tempered by the confidence mechanism downstream.
pub const CANDIDATE_BASE_WEIGHT: f64 = 0.1;
// Warmth gets a small emphasis when the text literally says "warm"/"cozy".
pub const CANDIDATE_WARMTH_EMPHASIS: f64 = 0.15;

// ── Time decay ─────────────────────────────────────────────────────────────
// 5% confidence loss per week of silence. Records decaying under the floor
// snap to 0.0 and become invisible to threshold filters (rows are kept).
pub const DECAY_WEEKLY_RATE: f64 = 0.95;
pub const DECAY_FLOOR: f64 = 0.05;
pub const SECS_PER_WEEK: f64 = 7.0 * 24.0 * 3600.0;

// ── Hybrid retrieval scoring ───────────────────────────────────────────────
// Pure similarity over-weights old, topically-similar messages; the recency
// term keeps context aligned with the user's current taste trajectory.
pub const SIMILARITY_WEIGHT: f64 = 0.7;
pub const RECENCY_WEIGHT: f64 = 0.3;
// Half-life of the recency score: 1.0 today, 0.5 at seven days.
pub const RECENCY_HALF_LIFE_DAYS: f64 = 7.0;
// Candidates with missing or unparseable timestamps score neutral.
pub const RECENCY_DEFAULT: f64 = 0.5;
// Fetch 2× top_k from the index so re-ranking has room to reorder.
pub const RETRIEVAL_OVERSAMPLE: usize = 2;
pub const SIMILARITY_TOP_K: usize = 5;

// ── Context formatting ─────────────────────────────────────────────────────
// Preferences below this confidence are omitted from prompt context.
pub const PREFERENCE_CONFIDENCE_THRESHOLD: f64 = 0.5;
// Per-snippet character budget in the conversation block.
pub const SNIPPET_MAX_CHARS: usize = 200;
