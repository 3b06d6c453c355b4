// ── Decora Engine: Hybrid Context Retriever ────────────────────────────────
//
// Two-stage retrieval over past conversation:
//   1. Oversampled similarity search in the semantic index, restricted to
//      the user (and room, when given) by exact metadata filters.
//   2. Recency re-ranking: score = 0.7·similarity + 0.3·recency, where
//      recency halves every seven days.
//
// Pure similarity over-weights old, topically-similar messages; the recency
// boost keeps context aligned with the user's current taste trajectory
// without discarding relevant history entirely.
//
// Retrieval is best-effort: an unreachable index degrades to an empty
// context window and never blocks the response path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::atoms::constants::{RECENCY_DEFAULT, RECENCY_HALF_LIFE_DAYS, RETRIEVAL_OVERSAMPLE};
use crate::atoms::types::{MemoryConfig, RetrievedContext};
use crate::engine::index::{IndexFilter, IndexHit, SemanticIndex};

#[derive(Clone)]
pub struct HybridRetriever {
    index: Arc<dyn SemanticIndex>,
    config: MemoryConfig,
}

// ── Scoring ────────────────────────────────────────────────────────────────

/// Exponential recency boost: 1.0 at age 0, 0.5 at seven days, → 0 with age.
/// Missing or unparseable timestamps score neutral (0.5). Clock skew that
/// yields a future timestamp caps at 1.0.
fn recency_score(timestamp: Option<&str>, now: DateTime<Utc>) -> f64 {
    let Some(raw) = timestamp else {
        return RECENCY_DEFAULT;
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => {
            let age_days = (now - ts.with_timezone(&Utc)).num_seconds() as f64 / 86_400.0;
            (2.0f64).powf(-age_days / RECENCY_HALF_LIFE_DAYS).min(1.0)
        }
        Err(_) => RECENCY_DEFAULT,
    }
}

impl HybridRetriever {
    pub fn new(index: Arc<dyn SemanticIndex>, config: MemoryConfig) -> Self {
        HybridRetriever { index, config }
    }

    /// Retrieve the `top_k` most useful snippets for `query`, combined-score
    /// descending. Returns an empty list on any index failure.
    pub async fn retrieve(
        &self,
        query: &str,
        user_id: &str,
        room_id: Option<&str>,
        top_k: Option<usize>,
    ) -> Vec<RetrievedContext> {
        let top_k = top_k.unwrap_or(self.config.similarity_top_k);
        let filter = IndexFilter {
            user_id: user_id.to_string(),
            room_id: room_id.map(str::to_string),
        };

        // Oversample so re-ranking has room to reorder.
        let hits = match self.index.query(query, top_k * RETRIEVAL_OVERSAMPLE, &filter).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("[retriever] Index query failed — returning empty context: {e}");
                return Vec::new();
            }
        };

        let mut rescored = self.rescore(hits, Utc::now());
        rescored.truncate(top_k);
        info!(
            "[retriever] {} snippet(s) for user {} (top score: {:.3})",
            rescored.len(),
            user_id,
            rescored.first().map(|r| r.score).unwrap_or(0.0)
        );
        rescored
    }

    /// Blend similarity with recency and sort descending.
    fn rescore(&self, hits: Vec<IndexHit>, now: DateTime<Utc>) -> Vec<RetrievedContext> {
        let mut rescored: Vec<RetrievedContext> = hits
            .into_iter()
            .map(|hit| {
                let recency = recency_score(hit.metadata.timestamp.as_deref(), now);
                let score = self.config.similarity_weight * hit.similarity
                    + self.config.recency_weight * recency;
                RetrievedContext {
                    text: hit.text,
                    role: hit.metadata.role,
                    timestamp: hit
                        .metadata
                        .timestamp
                        .as_deref()
                        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                        .map(|t| t.with_timezone(&Utc)),
                    similarity: hit.similarity,
                    recency,
                    score,
                }
            })
            .collect();

        rescored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        rescored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::error::{EngineError, EngineResult};
    use crate::atoms::types::MessageRole;
    use crate::engine::index::IndexMetadata;
    use async_trait::async_trait;
    use chrono::Duration;

    /// Canned index: returns a fixed hit list, or errors when `fail` is set.
    struct FakeIndex {
        hits: Vec<IndexHit>,
        fail: bool,
    }

    #[async_trait]
    impl SemanticIndex for FakeIndex {
        async fn insert(&self, _: &str, _: &str, _: &IndexMetadata) -> EngineResult<()> {
            Ok(())
        }

        async fn query(&self, _: &str, _: usize, _: &IndexFilter) -> EngineResult<Vec<IndexHit>> {
            if self.fail {
                return Err(EngineError::Other("index down".into()));
            }
            Ok(self.hits.clone())
        }
    }

    fn hit(id: &str, similarity: f64, age_days: i64) -> IndexHit {
        IndexHit {
            id: id.to_string(),
            text: format!("snippet {id}"),
            metadata: IndexMetadata {
                user_id: "u1".to_string(),
                room_id: None,
                role: MessageRole::User,
                timestamp: Some((Utc::now() - Duration::days(age_days)).to_rfc3339()),
            },
            similarity,
        }
    }

    fn retriever(hits: Vec<IndexHit>, fail: bool) -> HybridRetriever {
        HybridRetriever::new(Arc::new(FakeIndex { hits, fail }), MemoryConfig::default())
    }

    #[test]
    fn recency_is_one_today_and_half_at_seven_days() {
        let now = Utc::now();
        let today = recency_score(Some(&now.to_rfc3339()), now);
        assert!((today - 1.0).abs() < 1e-6);

        let week_old = (now - Duration::days(7)).to_rfc3339();
        assert!((recency_score(Some(&week_old), now) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn missing_or_garbage_timestamps_score_neutral() {
        let now = Utc::now();
        assert_eq!(recency_score(None, now), 0.5);
        assert_eq!(recency_score(Some("last tuesday"), now), 0.5);
    }

    #[test]
    fn future_timestamps_cap_at_one() {
        let now = Utc::now();
        let future = (now + Duration::days(3)).to_rfc3339();
        assert_eq!(recency_score(Some(&future), now), 1.0);
    }

    #[tokio::test]
    async fn younger_wins_at_equal_similarity() {
        let r = retriever(vec![hit("old", 0.8, 30), hit("young", 0.8, 0)], false);
        let results = r.retrieve("query", "u1", None, None).await;
        assert_eq!(results[0].text, "snippet young");
        assert_eq!(results[1].text, "snippet old");
    }

    #[tokio::test]
    async fn similarity_wins_at_equal_age() {
        let r = retriever(vec![hit("weak", 0.5, 2), hit("strong", 0.9, 2)], false);
        let results = r.retrieve("query", "u1", None, None).await;
        assert_eq!(results[0].text, "snippet strong");
    }

    #[tokio::test]
    async fn fresh_beats_stale_despite_lower_similarity() {
        // 0.7·0.9 + 0.3·2^(-30/7) ≈ 0.656 vs 0.7·0.8 + 0.3·1 = 0.86.
        let r = retriever(vec![hit("stale", 0.9, 30), hit("fresh", 0.8, 0)], false);
        let results = r.retrieve("query", "u1", None, None).await;
        assert_eq!(results[0].text, "snippet fresh");
        assert!((results[0].score - 0.86).abs() < 0.01);
        assert!((results[1].score - 0.656).abs() < 0.01);
    }

    #[tokio::test]
    async fn truncates_to_top_k() {
        let hits = (0..10).map(|i| hit(&format!("h{i}"), 0.5, 1)).collect();
        let r = retriever(hits, false);
        let results = r.retrieve("query", "u1", None, Some(3)).await;
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn index_failure_degrades_to_empty() {
        let r = retriever(vec![], true);
        let results = r.retrieve("query", "u1", None, None).await;
        assert!(results.is_empty());
    }
}
