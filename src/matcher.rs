//! Fuzzy title matching for guesses.
//!
//! A guess is correct when its similarity to the target title reaches
//! [`THRESHOLD`] on a 0 to 100 scale. Similarity is the normalized
//! insert/delete edit ratio over the whole string,
//! `100 * 2 * lcs(a, b) / (len(a) + len(b))`, after lowercasing both sides.
//! Whitespace counts like any other character. There is no substring
//! shortcut: "Love" against "Love Story" scores 57 and fails.

use rapidfuzz::fuzz;

/// Minimum similarity for a guess to count as correct.
///
/// Tolerates a typo or two in a medium-length title while rejecting
/// different titles.
pub const THRESHOLD: u8 = 90;

/// Returns `true` when `guess` is close enough to `target`.
#[must_use]
pub fn matches(guess: &str, target: &str) -> bool {
    ratio(guess, target) >= THRESHOLD
}

/// Scores the similarity of two strings from 0 (nothing in common) to 100
/// (identical, ignoring case).
///
/// When exactly one side is empty the score is 0.
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn ratio(left: &str, right: &str) -> u8 {
    let left = left.to_lowercase();
    let right = right.to_lowercase();
    if left == right {
        return 100;
    }
    if left.is_empty() || right.is_empty() {
        return 0;
    }

    // Normalized to [0.0, 1.0].
    let similarity = fuzz::ratio(left.chars(), right.chars());
    (similarity * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_titles_match() {
        assert_eq!(ratio("Yesterday", "Yesterday"), 100);
        assert!(matches("Yesterday", "Yesterday"));
    }

    #[test]
    fn case_is_ignored() {
        assert!(matches("hello world", "Hello World"));
        assert!(matches("YESTERDAY", "Yesterday"));
    }

    #[test]
    fn small_typos_are_tolerated() {
        assert!(matches("Yesterdy", "Yesterday"));
        assert!(matches("Bohemian Rapsody", "Bohemian Rhapsody"));
        assert!(matches("Stairway to Heaven", "Stariway to Heaven"));
    }

    #[test]
    fn different_titles_are_rejected() {
        assert!(!matches("Bohemian Rhapsody", "Stairway to Heaven"));
        assert!(!matches("Help", "Yesterday"));
        assert!(!matches("Let It Be", "Yesterday"));
    }

    #[test]
    fn substrings_are_not_enough() {
        assert_eq!(ratio("Love", "Love Story"), 57);
        assert!(!matches("Love", "Love Story"));
    }

    #[test]
    fn surrounding_whitespace_counts() {
        assert_eq!(ratio("  yesterday ", "Yesterday"), 86);
        assert!(matches("yesterday ", "Yesterday"));
    }

    #[test]
    fn empty_strings() {
        assert_eq!(ratio("", "Yesterday"), 0);
        assert_eq!(ratio("Yesterday", ""), 0);
        assert_eq!(ratio("", ""), 100);
    }
}
