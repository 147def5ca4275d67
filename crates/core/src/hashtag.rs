// ABOUTME: Case-insensitive hashtag matching against free-text video descriptions.
// ABOUTME: Plain substring containment, so longer tags sharing a prefix also match.

/// Returns true if `description` contains `#hashtag`, ignoring case.
///
/// There is no word-boundary check: "#quantumfocused" matches "quantumfocus".
/// `hashtag` is taken as already normalized (see [`normalize_hashtag`]); only
/// its case is folded here, so any "#" it still carries is part of the tag.
pub fn matches(description: &str, hashtag: &str) -> bool {
    let needle = format!("#{}", hashtag.to_lowercase());
    description.to_lowercase().contains(&needle)
}

/// Strips whitespace and a single leading "#", then lower-cases.
pub fn normalize_hashtag(hashtag: &str) -> String {
    let trimmed = hashtag.trim();
    trimmed
        .strip_prefix('#')
        .unwrap_or(trimmed)
        .trim()
        .to_lowercase()
}
