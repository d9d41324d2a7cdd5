//! Cleanup of user-supplied names before they reach the speech engine.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NOT_LATIN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{Script=Latin}\p{Number}\p{Punctuation}\s]").expect("static regex")
});

static NOT_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{Letter}\p{Number}\p{Punctuation}\s]").expect("static regex")
});

static UNDERSCORE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_{2,}").expect("static regex"));

/// NFKC-normalize `raw`, drop everything that is not a letter (Latin only
/// when `latin_only`), digit, punctuation or whitespace, squash underscore
/// runs and trim.
pub fn sanitize(raw: &str, latin_only: bool) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let normalized: String = raw.nfkc().collect();
    let filter = if latin_only { &NOT_LATIN_TEXT } else { &NOT_TEXT };
    let kept = filter.replace_all(&normalized, "");
    let squashed = UNDERSCORE_RUN.replace_all(&kept, "_");

    squashed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stays_empty() {
        assert_eq!(sanitize("", true), "");
        assert_eq!(sanitize("", false), "");
    }

    #[test]
    fn compatibility_forms_are_folded() {
        // Fullwidth letters and the "fi" ligature fold to plain ASCII.
        assert_eq!(sanitize("ＡＢＣ", true), "ABC");
        assert_eq!(sanitize("\u{FB01}sh", true), "fish");
    }

    #[test]
    fn symbols_and_emoji_are_dropped() {
        assert_eq!(sanitize("🎧 dj_night ✨", false), "dj_night");
        assert_eq!(sanitize("★彡", true), "");
    }

    #[test]
    fn latin_only_drops_other_scripts() {
        assert_eq!(sanitize("Юля Anna", true), "Anna");
        assert_eq!(sanitize("Юля Anna", false), "Юля Anna");
        assert_eq!(sanitize("さくら", false), "さくら");
        assert_eq!(sanitize("さくら", true), "");
    }

    #[test]
    fn underscore_runs_collapse() {
        assert_eq!(sanitize("__x____y__", false), "_x_y_");
    }

    #[test]
    fn punctuation_and_digits_survive() {
        assert_eq!(sanitize("  Mr. Smith-2!  ", true), "Mr. Smith-2!");
    }
}
