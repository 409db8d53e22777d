//! Display-name normalization shared by the classifier and the identity
//! resolver, so a sender label and a typed nickname compare equal.

use unicode_normalization::UnicodeNormalization;

const ZERO_WIDTH_SPACE: char = '\u{200b}';

/// NFKC-canonicalize, then drop zero-width spaces and all whitespace.
pub fn normalize_name(raw: &str) -> String {
    raw.nfkc()
        .filter(|c| *c != ZERO_WIDTH_SPACE && !c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace_everywhere() {
        assert_eq!(normalize_name("  Al ice \n"), "Alice");
    }

    #[test]
    fn strips_zero_width_space() {
        assert_eq!(normalize_name("Bo\u{200b}b"), "Bob");
    }

    #[test]
    fn folds_compatibility_forms() {
        // Fullwidth Latin letters fold to ASCII under NFKC.
        assert_eq!(normalize_name("\u{ff22}\u{ff4f}\u{ff42}"), "Bob");
        // Ideographic space is whitespace after folding.
        assert_eq!(normalize_name("김\u{3000}철수"), "김철수");
    }

    #[test]
    fn composes_hangul_jamo() {
        // Conjoining jamo compose into the precomposed syllable.
        assert_eq!(normalize_name("\u{1100}\u{1161}"), "가");
    }

    #[test]
    fn empty_and_blank_normalize_to_empty() {
        assert!(normalize_name("").is_empty());
        assert!(normalize_name(" \t\u{200b} ").is_empty());
    }
}
