// ── Decora Engine: Preference Keyword Lexicon ──────────────────────────────
//
// Static mapping of preference dimension → canonical value → trigger phrases.
// The extractor does a case-insensitive substring match of each trigger
// against the lowercased input; one hit anywhere in a value's list yields a
// candidate for that value.
//
// This table is deliberately recall-biased: "clean" triggers both
// style=modern and complexity=simple, and that is fine — false positives are
// tempered by the confidence mechanism, not here.

use crate::atoms::types::PreferenceType;

/// A canonical value plus the phrases that imply it.
pub(crate) type ValueTriggers = (&'static str, &'static [&'static str]);

pub(crate) const STYLE_TRIGGERS: &[ValueTriggers] = &[
    ("modern", &["modern", "contemporary", "minimalist", "clean"]),
    ("traditional", &["traditional", "classic", "vintage", "antique"]),
    ("rustic", &["rustic", "farmhouse", "country", "natural"]),
    ("industrial", &["industrial", "urban", "loft", "metal"]),
    ("bohemian", &["bohemian", "boho", "eclectic", "colorful"]),
    ("scandinavian", &["scandinavian", "nordic", "simple", "functional"]),
];

pub(crate) const WARMTH_TRIGGERS: &[ValueTriggers] = &[
    ("warm", &["warm", "cozy", "inviting", "comfortable"]),
    ("cool", &["cool", "crisp", "fresh", "airy"]),
    ("neutral", &["neutral", "balanced", "moderate"]),
];

pub(crate) const COMPLEXITY_TRIGGERS: &[ValueTriggers] = &[
    ("simple", &["simple", "minimal", "clean", "uncluttered"]),
    ("moderate", &["moderate", "balanced"]),
    ("complex", &["detailed", "ornate", "elaborate", "rich"]),
];

pub(crate) const COLOR_TRIGGERS: &[ValueTriggers] = &[
    ("blue", &["blue", "navy", "azure", "cobalt"]),
    ("green", &["green", "sage", "olive", "emerald"]),
    ("gray", &["gray", "grey", "charcoal", "slate"]),
    ("white", &["white", "ivory", "cream", "off-white"]),
    ("black", &["black", "ebony", "onyx"]),
    ("brown", &["brown", "tan", "beige", "taupe", "caramel"]),
    ("red", &["red", "burgundy", "crimson", "maroon"]),
    ("yellow", &["yellow", "gold", "mustard"]),
    ("orange", &["orange", "coral", "terracotta"]),
    ("pink", &["pink", "rose", "blush"]),
    ("purple", &["purple", "lavender", "plum", "violet"]),
];

pub(crate) const MATERIAL_TRIGGERS: &[ValueTriggers] = &[
    ("wood", &["wood", "wooden", "oak", "walnut", "pine", "teak"]),
    ("metal", &["metal", "steel", "brass", "copper", "iron"]),
    ("glass", &["glass"]),
    ("fabric", &["fabric", "textile", "upholstered"]),
    ("leather", &["leather"]),
    ("stone", &["stone", "granite", "marble"]),
    ("concrete", &["concrete"]),
    ("ceramic", &["ceramic", "tile", "porcelain"]),
    ("carpet", &["carpet", "rug"]),
    ("velvet", &["velvet"]),
    ("linen", &["linen"]),
    ("rattan", &["rattan", "wicker"]),
];

/// The extraction dimensions, in scan order.
pub(crate) const DIMENSIONS: &[(PreferenceType, &[ValueTriggers])] = &[
    (PreferenceType::Style, STYLE_TRIGGERS),
    (PreferenceType::Warmth, WARMTH_TRIGGERS),
    (PreferenceType::Complexity, COMPLEXITY_TRIGGERS),
    (PreferenceType::Color, COLOR_TRIGGERS),
    (PreferenceType::Material, MATERIAL_TRIGGERS),
];
