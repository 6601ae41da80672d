//! Grapheme cluster boundaries for character-wise cursor motion
//!
//! Left/right motion and single-character deletes step over whole grapheme
//! clusters so that a combining mark or a ZWJ emoji sequence is never split
//! in two by the prompt.

use unicode_segmentation::UnicodeSegmentation;

/// Byte offset where the grapheme cluster before `pos` starts.
#[inline]
pub fn prev_grapheme_boundary(s: &str, pos: usize) -> usize {
    if pos == 0 || s.is_empty() {
        return 0;
    }

    let pos = pos.min(s.len());
    let mut last_boundary = 0;
    for (idx, _) in s.grapheme_indices(true) {
        if idx >= pos {
            break;
        }
        last_boundary = idx;
    }

    last_boundary
}

/// Byte offset where the grapheme cluster at or containing `pos` ends.
#[inline]
pub fn next_grapheme_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }

    for (idx, grapheme) in s.grapheme_indices(true) {
        let end = idx + grapheme.len();
        if end > pos {
            return end;
        }
    }

    s.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_navigation() {
        let s = "hello";
        assert_eq!(prev_grapheme_boundary(s, 0), 0);
        assert_eq!(prev_grapheme_boundary(s, 3), 2);
        assert_eq!(next_grapheme_boundary(s, 0), 1);
        assert_eq!(next_grapheme_boundary(s, 5), 5);
    }

    #[test]
    fn test_newline_is_its_own_cluster() {
        let s = "a\nb";
        assert_eq!(next_grapheme_boundary(s, 1), 2);
        assert_eq!(prev_grapheme_boundary(s, 2), 1);
    }

    #[test]
    fn test_combining_diacritics() {
        let s = "e\u{0301}x";
        assert_eq!(next_grapheme_boundary(s, 0), 3);
        assert_eq!(prev_grapheme_boundary(s, 3), 0);
    }

    #[test]
    fn test_emoji_zwj_sequence() {
        let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}";
        let s = format!("{family}!");
        assert_eq!(next_grapheme_boundary(&s, 0), family.len());
        assert_eq!(prev_grapheme_boundary(&s, family.len()), 0);
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(prev_grapheme_boundary("", 0), 0);
        assert_eq!(next_grapheme_boundary("", 0), 0);
    }
}
