//! Per-fragment text normalisation.
//!
//! Every fragment goes through the same literal substring pipeline before it
//! is joined into the manuscript:
//!
//! 1. configured replacements, in the order they appear in `config.yml`
//! 2. surrounding whitespace trimmed
//! 3. `----` / `---` horizontal rules removed together with the newline that
//!    bounds them
//! 4. one pass collapsing `\n\n\n` into `\n\n`
//!
//! Step 4 is a single find-and-replace, not a loop: four newlines become
//! three. Output produced by earlier releases depends on this.

use crate::config::Replacements;

/// Rule markers paired with the newline that is removed along with them.
/// Order matters: the four-dash forms must go before the three-dash ones.
const RULE_MARKERS: [&str; 4] = ["----\n", "\n----", "---\n", "\n---"];

/// Normalises one fragment of manuscript text.
pub fn normalize(text: &str, replacements: &Replacements) -> String {
    let replaced = apply_replacements(text, replacements);

    let mut out = replaced.trim().to_string();
    for marker in RULE_MARKERS {
        out = out.replace(marker, "");
    }

    out.replace("\n\n\n", "\n\n")
}

/// Applies literal replacements in insertion order. Empty keys are skipped.
pub fn apply_replacements(text: &str, replacements: &Replacements) -> String {
    let mut out = text.to_string();
    for (from, to) in replacements {
        if from.is_empty() {
            continue;
        }
        out = out.replace(from.as_str(), to);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none() -> Replacements {
        Replacements::new()
    }

    #[test]
    fn test_plain_text_is_untouched() {
        let text = "It was a dark and stormy night.\n\nThe end.";
        assert_eq!(normalize(text, &none()), text);
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(normalize("  \n\nHello\n\n  ", &none()), "Hello");
    }

    #[test]
    fn test_removes_rule_lines() {
        assert_eq!(normalize("one\n----\ntwo", &none()), "one\ntwo");
        assert_eq!(normalize("one\n---\ntwo", &none()), "one\ntwo");
    }

    #[test]
    fn test_removes_rule_at_edges() {
        assert_eq!(normalize("----\nbody", &none()), "body");
        assert_eq!(normalize("body\n---", &none()), "body");
    }

    #[test]
    fn test_collapses_triple_newlines_once() {
        assert_eq!(normalize("a\n\n\nb", &none()), "a\n\nb");
        // single pass: four newlines only lose one
        assert_eq!(normalize("a\n\n\n\nb", &none()), "a\n\n\nb");
    }

    #[test]
    fn test_not_idempotent_on_long_runs() {
        let once = normalize("a\n\n\n\nb", &none());
        let twice = normalize(&once, &none());
        assert_ne!(once, twice);
        assert_eq!(twice, "a\n\nb");
    }

    #[test]
    fn test_rule_removal_can_leave_blank_run() {
        // the rule takes its trailing newline, the collapse handles the rest
        assert_eq!(normalize("a\n\n----\n\nb", &none()), "a\n\nb");
    }

    #[test]
    fn test_replacements_apply_in_insertion_order() {
        let mut replacements = Replacements::new();
        replacements.insert("--".to_string(), "—".to_string());
        replacements.insert("—".to_string(), "-".to_string());
        assert_eq!(normalize("a--b", &replacements), "a-b");

        let mut reversed = Replacements::new();
        reversed.insert("—".to_string(), "-".to_string());
        reversed.insert("--".to_string(), "—".to_string());
        assert_eq!(normalize("a--b", &reversed), "a—b");
    }

    #[test]
    fn test_replacements_run_before_trim() {
        let mut replacements = Replacements::new();
        replacements.insert("TODO".to_string(), "".to_string());
        assert_eq!(normalize("Words TODO", &replacements), "Words");
    }

    #[test]
    fn test_empty_replacement_key_is_ignored() {
        let mut replacements = Replacements::new();
        replacements.insert(String::new(), "x".to_string());
        assert_eq!(normalize("abc", &replacements), "abc");
    }
}
