// Decora Design Engine — engine layer.
// Everything that touches the database, the network, or the clock.
//
// Module layout:
//   store      — SQLite persistence (preferences, conversations, rooms)
//   keywords   — static dimension → value → trigger lexicon
//   learner    — extraction, confidence updates, weekly decay
//   embedding  — Ollama / OpenAI-compatible embedding client
//   index      — SemanticIndex trait + SQLite cosine-scan backend
//   retriever  — hybrid similarity + recency re-ranking
//   context    — deterministic prompt-block assembly
//   manager    — facade wiring the hooks together

pub mod context;
pub mod embedding;
pub mod index;
pub(crate) mod keywords;
pub mod learner;
pub mod manager;
pub mod retriever;
pub mod store;
