// ── Decora Atoms: Error Types ──────────────────────────────────────────────
// Single canonical error enum for the engine, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, DB, Embedding, Config…).
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • No variant carries secret material (API keys) in its message.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// SQLite / rusqlite database failure.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Embedding provider HTTP or API-level failure.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Engine configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A record lookup came back empty where one was required.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    /// Prefer adding a specific variant over using this in new code.
    #[error("{0}")]
    Other(String),
}

// ── String bridges ─────────────────────────────────────────────────────────
// Allow `?` on helpers still returning `Result<T, String>` inside functions
// that return `EngineResult<T>`.

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Other(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All engine operations should return this type.
pub type EngineResult<T> = Result<T, EngineError>;
