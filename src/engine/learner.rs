// ── Decora Engine: Preference Learner ──────────────────────────────────────
//
// Extracts (dimension, value) candidates from free text via the static
// keyword lexicon, converts signals into confidence deltas, and applies the
// weekly decay pass.
//
// Signal strengths (defaults, see MemoryConfig):
//   design selected      +0.3
//   positive feedback    +0.2
//   implicit mention     +0.1
//   negative feedback    −0.2
//   time decay           ×0.95 per week, applied separately

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::atoms::constants::{
    CANDIDATE_BASE_WEIGHT, CANDIDATE_WARMTH_EMPHASIS, DECAY_FLOOR, NEW_PREFERENCE_BASELINE,
    SECS_PER_WEEK,
};
use crate::atoms::error::EngineResult;
use crate::atoms::types::{
    MemoryConfig, PreferenceCandidate, PreferenceRecord, PreferenceSummary, PreferenceType,
};
use crate::engine::keywords::DIMENSIONS;
use crate::engine::store::MemoryStore;

/// Learns and maintains a user's preference records.
#[derive(Clone)]
pub struct PreferenceLearner {
    store: Arc<MemoryStore>,
    config: MemoryConfig,
}

// ── Extraction ─────────────────────────────────────────────────────────────

/// Scan `text` against every dimension's trigger lists. Recall-biased: a
/// single input may hit multiple dimensions and multiple values within one
/// dimension ("modern but cozy" yields a style and a warmth candidate).
/// Never fails — text with no triggers yields an empty list.
pub fn extract_candidates(text: &str) -> Vec<PreferenceCandidate> {
    let text_lower = text.to_lowercase();
    // "warm"/"cozy" mentioned literally reads as a deliberate warmth cue.
    let warmth_emphasis = text_lower.contains("warm") || text_lower.contains("cozy");

    let mut candidates = Vec::new();
    for &(ptype, values) in DIMENSIONS {
        for &(value, triggers) in values {
            if triggers.iter().any(|t| text_lower.contains(t)) {
                let weight = if ptype == PreferenceType::Warmth && warmth_emphasis {
                    CANDIDATE_WARMTH_EMPHASIS
                } else {
                    CANDIDATE_BASE_WEIGHT
                };
                candidates.push(PreferenceCandidate { ptype, value, weight });
            }
        }
    }
    candidates
}

// ── Decay math ─────────────────────────────────────────────────────────────

/// Confidence after `now - updated_at` of silence at `weekly_rate`.
/// Fractional weeks count; results under the floor snap to 0.0.
fn decayed_confidence(
    confidence: f64,
    updated_at: DateTime<Utc>,
    now: DateTime<Utc>,
    weekly_rate: f64,
) -> f64 {
    let weeks = (now - updated_at).num_seconds() as f64 / SECS_PER_WEEK;
    if weeks <= 0.0 {
        return confidence;
    }
    let decayed = confidence * weekly_rate.powf(weeks);
    if decayed < DECAY_FLOOR {
        0.0
    } else {
        decayed
    }
}

impl PreferenceLearner {
    pub fn new(store: Arc<MemoryStore>, config: MemoryConfig) -> Self {
        PreferenceLearner { store, config }
    }

    // ── Confidence updates ─────────────────────────────────────────────

    /// Apply one signal to one (user, type, value) tuple.
    ///
    /// Existing records move by `delta` and clamp to [0, 1]; new records
    /// start from the 0.3 baseline plus `delta`, so a single implicit
    /// mention is not immediately washed out. Persists on every call.
    pub fn update_confidence(
        &self,
        user_id: &str,
        ptype: PreferenceType,
        value: &str,
        delta: f64,
        source_room_id: Option<&str>,
    ) -> EngineResult<PreferenceRecord> {
        let record = match self.store.find_preference(user_id, ptype, value)? {
            Some(mut existing) => {
                existing.confidence = (existing.confidence + delta).clamp(0.0, 1.0);
                existing.updated_at = Utc::now();
                if source_room_id.is_some() {
                    existing.source_room_id = source_room_id.map(str::to_string);
                }
                existing
            }
            None => PreferenceRecord::new(
                user_id,
                ptype,
                value,
                (NEW_PREFERENCE_BASELINE + delta).clamp(0.0, 1.0),
                source_room_id,
            ),
        };
        self.store.save_preference(&record)?;
        Ok(record)
    }

    /// Extract candidates from `text` and apply `delta` to each.
    fn learn(
        &self,
        user_id: &str,
        text: &str,
        delta: f64,
        room_id: Option<&str>,
    ) -> EngineResult<Vec<PreferenceRecord>> {
        let candidates = extract_candidates(text);
        let mut updated = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            updated.push(self.update_confidence(
                user_id,
                candidate.ptype,
                candidate.value,
                delta,
                room_id,
            )?);
        }
        if !updated.is_empty() {
            info!(
                "[learner] Applied Δ{:+.2} to {} preference(s) for user {}",
                delta,
                updated.len(),
                user_id
            );
        }
        Ok(updated)
    }

    /// Implicit signal: an ordinary chat message mentioned something.
    pub fn learn_from_message(
        &self,
        user_id: &str,
        text: &str,
        room_id: Option<&str>,
    ) -> EngineResult<Vec<PreferenceRecord>> {
        self.learn(user_id, text, self.config.delta_implicit, room_id)
    }

    /// Strong explicit signal: the user picked this design.
    pub fn learn_from_selection(
        &self,
        user_id: &str,
        selected_description: &str,
        room_id: Option<&str>,
    ) -> EngineResult<Vec<PreferenceRecord>> {
        self.learn(user_id, selected_description, self.config.delta_selection, room_id)
    }

    /// Explicit feedback, positive or negative.
    pub fn learn_from_feedback(
        &self,
        user_id: &str,
        feedback_text: &str,
        is_positive: bool,
        room_id: Option<&str>,
    ) -> EngineResult<Vec<PreferenceRecord>> {
        let delta = if is_positive {
            self.config.delta_positive
        } else {
            self.config.delta_negative
        };
        self.learn(user_id, feedback_text, delta, room_id)
    }

    // ── Decay ──────────────────────────────────────────────────────────

    /// Decay every preference of `user_id` by elapsed time since its last
    /// update. A failure on one record logs and continues with the rest.
    pub fn apply_time_decay(&self, user_id: &str) -> EngineResult<()> {
        self.apply_time_decay_at(user_id, self.config.decay_weekly_rate, Utc::now())
    }

    /// Decay with an explicit clock and rate. `updated_at` advances to `now`
    /// on each decayed record so periodic passes compose: two passes decay
    /// exactly as much as one pass over the combined interval.
    pub(crate) fn apply_time_decay_at(
        &self,
        user_id: &str,
        weekly_rate: f64,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let records = self.store.list_preferences(user_id, 0.0)?;
        let mut decayed_count = 0usize;

        for mut record in records {
            let next = decayed_confidence(record.confidence, record.updated_at, now, weekly_rate);
            if (next - record.confidence).abs() < f64::EPSILON {
                continue;
            }
            record.confidence = next;
            record.updated_at = now;
            if let Err(e) = self.store.save_preference(&record) {
                warn!(
                    "[learner] Decay write failed for {}/{} — continuing: {}",
                    record.ptype.as_str(),
                    record.value,
                    e
                );
                continue;
            }
            decayed_count += 1;
        }

        if decayed_count > 0 {
            info!("[learner] Decayed {decayed_count} preference(s) for user {user_id}");
        }
        Ok(())
    }

    // ── Introspection ──────────────────────────────────────────────────

    /// High-confidence preferences grouped by dimension, strongest first,
    /// each rendered as "value (0.62)".
    pub fn preference_summary(&self, user_id: &str) -> EngineResult<PreferenceSummary> {
        let records = self.store.list_preferences(user_id, self.config.confidence_threshold)?;
        let mut summary = PreferenceSummary::new();
        for record in records {
            summary
                .entry(record.ptype)
                .or_default()
                .push(format!("{} ({:.2})", record.value, record.confidence));
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn learner() -> PreferenceLearner {
        let store = Arc::new(MemoryStore::in_memory().unwrap());
        PreferenceLearner::new(store, MemoryConfig::default())
    }

    fn has(cands: &[PreferenceCandidate], ptype: PreferenceType, value: &str) -> bool {
        cands.iter().any(|c| c.ptype == ptype && c.value == value)
    }

    // ── Extraction ─────────────────────────────────────────────────────

    #[test]
    fn extracts_across_dimensions() {
        let cands = extract_candidates("I love warm, cozy, modern spaces");
        assert!(has(&cands, PreferenceType::Style, "modern"));
        assert!(has(&cands, PreferenceType::Warmth, "warm"));
    }

    #[test]
    fn no_triggers_means_no_candidates() {
        assert!(extract_candidates("let's discuss the budget").is_empty());
        assert!(extract_candidates("").is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let cands = extract_candidates("SCANDINAVIAN with a VELVET sofa");
        assert!(has(&cands, PreferenceType::Style, "scandinavian"));
        assert!(has(&cands, PreferenceType::Material, "velvet"));
    }

    #[test]
    fn warmth_gets_emphasis_weight_on_literal_mention() {
        let cands = extract_candidates("something cozy please");
        let warm = cands
            .iter()
            .find(|c| c.ptype == PreferenceType::Warmth && c.value == "warm")
            .unwrap();
        assert!((warm.weight - CANDIDATE_WARMTH_EMPHASIS).abs() < 1e-9);

        // "airy" hits warmth=cool without the warm/cozy emphasis.
        let cands = extract_candidates("light and airy");
        let cool = cands
            .iter()
            .find(|c| c.ptype == PreferenceType::Warmth && c.value == "cool")
            .unwrap();
        assert!((cool.weight - CANDIDATE_BASE_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn one_dimension_can_yield_multiple_values() {
        let cands = extract_candidates("blue walls with green accents");
        assert!(has(&cands, PreferenceType::Color, "blue"));
        assert!(has(&cands, PreferenceType::Color, "green"));
    }

    // ── Confidence updates ─────────────────────────────────────────────

    #[test]
    fn new_record_starts_from_baseline_plus_delta() {
        let l = learner();
        let rec = l
            .update_confidence("u1", PreferenceType::Style, "modern", 0.1, None)
            .unwrap();
        assert!((rec.confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn end_to_end_signal_sequence() {
        // Implicit mention → 0.4, selection → 0.7, rejection → 0.5.
        let l = learner();
        l.learn_from_message("u1", "I love warm, cozy, modern spaces", None).unwrap();
        let rec = l
            .store
            .find_preference("u1", PreferenceType::Style, "modern")
            .unwrap()
            .unwrap();
        assert!((rec.confidence - 0.4).abs() < 1e-9);

        l.learn_from_selection("u1", "a modern living room", Some("room-1")).unwrap();
        let rec = l
            .store
            .find_preference("u1", PreferenceType::Style, "modern")
            .unwrap()
            .unwrap();
        assert!((rec.confidence - 0.7).abs() < 1e-9);
        assert_eq!(rec.source_room_id.as_deref(), Some("room-1"));

        l.learn_from_feedback("u1", "too modern for me", false, None).unwrap();
        let rec = l
            .store
            .find_preference("u1", PreferenceType::Style, "modern")
            .unwrap()
            .unwrap();
        assert!((rec.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn confidence_clamps_at_both_ends() {
        let l = learner();
        for _ in 0..10 {
            l.update_confidence("u1", PreferenceType::Color, "blue", 0.3, None).unwrap();
        }
        let rec = l.store.find_preference("u1", PreferenceType::Color, "blue").unwrap().unwrap();
        assert!((rec.confidence - 1.0).abs() < 1e-9);

        for _ in 0..10 {
            l.update_confidence("u1", PreferenceType::Color, "blue", -0.4, None).unwrap();
        }
        let rec = l.store.find_preference("u1", PreferenceType::Color, "blue").unwrap().unwrap();
        assert!(rec.confidence.abs() < 1e-9);
    }

    #[test]
    fn repeated_updates_keep_one_record_per_tuple() {
        let l = learner();
        for _ in 0..5 {
            l.update_confidence("u1", PreferenceType::Material, "wood", 0.1, None).unwrap();
        }
        let all = l.store.list_preferences("u1", 0.0).unwrap();
        assert_eq!(all.len(), 1);
    }

    // ── Decay ──────────────────────────────────────────────────────────

    #[test]
    fn decay_is_noop_at_zero_elapsed_time() {
        let now = Utc::now();
        assert_eq!(decayed_confidence(0.8, now, now, 0.95), 0.8);
    }

    #[test]
    fn decay_applies_weekly_rate() {
        let now = Utc::now();
        let then = now - Duration::weeks(1);
        let one_week = decayed_confidence(0.8, then, now, 0.95);
        assert!((one_week - 0.8 * 0.95).abs() < 1e-3);
    }

    #[test]
    fn decay_is_monotone_in_elapsed_time() {
        let now = Utc::now();
        let mut last = 1.0;
        for weeks in 1..20 {
            let c = decayed_confidence(1.0, now - Duration::weeks(weeks), now, 0.95);
            assert!(c < last, "confidence must strictly decrease with age");
            last = c;
        }
    }

    #[test]
    fn decay_snaps_to_zero_below_floor() {
        let now = Utc::now();
        let c = decayed_confidence(0.06, now - Duration::weeks(52), now, 0.95);
        assert_eq!(c, 0.0);
    }

    #[test]
    fn decay_pass_updates_store_and_composes() {
        let l = learner();
        let mut rec = PreferenceRecord::new("u1", PreferenceType::Style, "rustic", 0.8, None);
        let start = Utc::now() - Duration::weeks(2);
        rec.updated_at = start;
        l.store.save_preference(&rec).unwrap();

        let mid = start + Duration::weeks(1);
        let end = start + Duration::weeks(2);

        // Two one-week passes must equal one two-week pass.
        l.apply_time_decay_at("u1", 0.95, mid).unwrap();
        l.apply_time_decay_at("u1", 0.95, end).unwrap();
        let two_pass = l
            .store
            .find_preference("u1", PreferenceType::Style, "rustic")
            .unwrap()
            .unwrap()
            .confidence;
        assert!((two_pass - 0.8 * 0.95f64.powf(2.0)).abs() < 1e-6);

        // Re-running at the same instant changes nothing.
        l.apply_time_decay_at("u1", 0.95, end).unwrap();
        let again = l
            .store
            .find_preference("u1", PreferenceType::Style, "rustic")
            .unwrap()
            .unwrap()
            .confidence;
        assert!((again - two_pass).abs() < 1e-9);
    }

    // ── Summary ────────────────────────────────────────────────────────

    #[test]
    fn summary_groups_by_dimension_and_filters_by_threshold() {
        let l = learner();
        l.store
            .save_preference(&PreferenceRecord::new("u1", PreferenceType::Style, "modern", 0.9, None))
            .unwrap();
        l.store
            .save_preference(&PreferenceRecord::new("u1", PreferenceType::Style, "rustic", 0.6, None))
            .unwrap();
        l.store
            .save_preference(&PreferenceRecord::new("u1", PreferenceType::Color, "blue", 0.2, None))
            .unwrap();

        let summary = l.preference_summary("u1").unwrap();
        let styles = summary.get(&PreferenceType::Style).unwrap();
        assert_eq!(styles, &vec!["modern (0.90)".to_string(), "rustic (0.60)".to_string()]);
        assert!(!summary.contains_key(&PreferenceType::Color), "below threshold");
    }
}
