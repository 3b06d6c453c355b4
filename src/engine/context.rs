// ── Decora Engine: Context Formatter ───────────────────────────────────────
//
// Deterministic assembly of prompt-ready context, in fixed block order:
//   1. Room context (name, type, latest design) when a room resolves
//   2. Preference summary, one line per dimension, strongest first
//   3. Relevant past conversations, numbered, snippet-truncated
// Any empty block is omitted entirely — no empty headers.

use crate::atoms::constants::SNIPPET_MAX_CHARS;
use crate::atoms::types::{DesignVersion, PreferenceSummary, RetrievedContext, Room};

/// Room state as rendered into the room block.
pub struct RoomContext<'a> {
    pub room: &'a Room,
    pub latest_design: Option<&'a DesignVersion>,
}

/// Render the three context blocks. All inputs are pre-fetched; this
/// function does no I/O and is fully deterministic.
pub fn format_context(
    room: Option<RoomContext<'_>>,
    summary: &PreferenceSummary,
    snippets: &[RetrievedContext],
) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if let Some(ctx) = room {
        let mut block = format!(
            "## Room Context\nCurrent Room: {} ({})",
            ctx.room.name,
            ctx.room.room_type.as_str()
        );
        if let Some(design) = ctx.latest_design {
            block.push_str(&format!(
                "\nLatest Design: Version {} - {}",
                design.version_number, design.description
            ));
        }
        blocks.push(block);
    }

    if !summary.is_empty() {
        let mut block = String::from("## User Preferences");
        for (ptype, values) in summary {
            block.push_str(&format!("\n- {}: {}", title_case(ptype.as_str()), values.join(", ")));
        }
        blocks.push(block);
    }

    if !snippets.is_empty() {
        let mut block = String::from("## Relevant Past Conversations");
        for (i, item) in snippets.iter().enumerate() {
            block.push_str(&format!(
                "\n{}. [{}] (relevance: {:.2}): {}",
                i + 1,
                item.role.as_str(),
                item.score,
                snippet(&item.text),
            ));
        }
        blocks.push(block);
    }

    blocks.join("\n\n")
}

/// Truncate to the per-item character budget, on a char boundary.
fn snippet(text: &str) -> String {
    if text.chars().count() <= SNIPPET_MAX_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(SNIPPET_MAX_CHARS).collect();
        format!("{cut}...")
    }
}

/// "living_room" → "Living Room".
fn title_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::{MessageRole, PreferenceType, RoomType};
    use chrono::Utc;

    fn room() -> Room {
        Room {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            name: "Master Bedroom".to_string(),
            room_type: RoomType::Bedroom,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn design(n: i64, desc: &str) -> DesignVersion {
        DesignVersion {
            id: format!("v{n}"),
            room_id: "r1".to_string(),
            version_number: n,
            description: desc.to_string(),
            selected: false,
            rejected: false,
            parent_version_id: None,
            created_at: Utc::now(),
        }
    }

    fn snippet_item(text: &str, score: f64) -> RetrievedContext {
        RetrievedContext {
            text: text.to_string(),
            role: MessageRole::User,
            timestamp: None,
            similarity: score,
            recency: 1.0,
            score,
        }
    }

    #[test]
    fn all_blocks_in_fixed_order() {
        let r = room();
        let d = design(3, "warm scandinavian bedroom");
        let mut summary = PreferenceSummary::new();
        summary
            .entry(PreferenceType::Style)
            .or_default()
            .push("scandinavian (0.80)".to_string());
        let snippets = vec![snippet_item("I want lots of natural light", 0.86)];

        let out = format_context(
            Some(RoomContext { room: &r, latest_design: Some(&d) }),
            &summary,
            &snippets,
        );

        let room_pos = out.find("## Room Context").unwrap();
        let pref_pos = out.find("## User Preferences").unwrap();
        let conv_pos = out.find("## Relevant Past Conversations").unwrap();
        assert!(room_pos < pref_pos && pref_pos < conv_pos);

        assert!(out.contains("Current Room: Master Bedroom (bedroom)"));
        assert!(out.contains("Latest Design: Version 3 - warm scandinavian bedroom"));
        assert!(out.contains("- Style: scandinavian (0.80)"));
        assert!(out.contains("1. [user] (relevance: 0.86): I want lots of natural light"));
    }

    #[test]
    fn empty_blocks_are_omitted() {
        let summary = PreferenceSummary::new();
        let out = format_context(None, &summary, &[]);
        assert!(out.is_empty());

        let mut summary = PreferenceSummary::new();
        summary
            .entry(PreferenceType::Color)
            .or_default()
            .push("blue (0.70)".to_string());
        let out = format_context(None, &summary, &[]);
        assert!(out.contains("## User Preferences"));
        assert!(!out.contains("## Room Context"));
        assert!(!out.contains("## Relevant Past Conversations"));
    }

    #[test]
    fn room_block_without_designs_has_no_latest_line() {
        let r = room();
        let out = format_context(
            Some(RoomContext { room: &r, latest_design: None }),
            &PreferenceSummary::new(),
            &[],
        );
        assert!(out.contains("Current Room:"));
        assert!(!out.contains("Latest Design:"));
    }

    #[test]
    fn long_snippets_are_truncated() {
        let long = "x".repeat(500);
        let out = format_context(None, &PreferenceSummary::new(), &[snippet_item(&long, 0.5)]);
        assert!(out.contains(&format!("{}...", "x".repeat(200))));
        assert!(!out.contains(&"x".repeat(201)));
    }

    #[test]
    fn numbering_and_title_case() {
        let mut summary = PreferenceSummary::new();
        summary
            .entry(PreferenceType::Material)
            .or_default()
            .push("wood (0.60)".to_string());
        let items = vec![snippet_item("first", 0.9), snippet_item("second", 0.8)];
        let out = format_context(None, &summary, &items);
        assert!(out.contains("- Material: wood (0.60)"));
        assert!(out.contains("1. [user]"));
        assert!(out.contains("2. [user]"));
    }
}
