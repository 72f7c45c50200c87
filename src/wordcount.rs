use std::collections::BTreeMap;

/// Number of whitespace-separated tokens in `text`.
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Token count minus the configured offset.
///
/// Not clamped: an offset larger than the manuscript gives a negative count.
pub fn count(text: &str, offset: i64) -> i64 {
    token_count(text) as i64 - offset
}

/// Token count of every chapter text, without any offset.
pub fn count_by_chapter(chapters: &BTreeMap<String, String>) -> BTreeMap<String, usize> {
    chapters
        .iter()
        .map(|(name, text)| (name.clone(), token_count(text)))
        .collect()
}

/// Renders per-chapter counts as right-aligned `name: count` lines.
pub fn format_chapter_counts(counts: &BTreeMap<String, usize>) -> String {
    let width = counts.keys().map(|k| k.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for (name, words) in counts {
        out.push_str(&format!("{name:>width$}: {words}\n"));
    }
    out
}
