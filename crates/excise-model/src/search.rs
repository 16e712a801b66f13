//! Whole-word text occurrence matching.

use text_size::{TextRange, TextSize};

/// Returns true for characters that continue an identifier.
fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Finds whole-word occurrences of `needle` in `haystack`.
///
/// An occurrence matches when the characters directly before and after it
/// are not identifier characters. The needle itself may contain separators
/// (qualified names like `acme.Counter`).
#[must_use]
pub fn word_occurrences(haystack: &str, needle: &str) -> Vec<TextRange> {
    let mut ranges = Vec::new();
    if needle.is_empty() {
        return ranges;
    }
    let mut from = 0;
    while let Some(found) = haystack[from..].find(needle) {
        let start = from + found;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|ch| !is_word_char(ch));
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|ch| !is_word_char(ch));
        if before_ok && after_ok {
            ranges.push(TextRange::new(
                TextSize::from(start as u32),
                TextSize::from(end as u32),
            ));
        }
        // Advance by one character so overlapping candidates are still seen.
        let step = haystack[start..].chars().next().map_or(1, char::len_utf8);
        from = start + step;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(haystack: &str, needle: &str) -> Vec<(u32, u32)> {
        word_occurrences(haystack, needle)
            .into_iter()
            .map(|range| (range.start().into(), range.end().into()))
            .collect()
    }

    #[test]
    fn matches_whole_words_only() {
        assert_eq!(spans("count counter recount count", "count"), vec![(0, 5), (22, 27)]);
    }

    #[test]
    fn matches_qualified_needles() {
        assert_eq!(spans("see acme.Counter here", "acme.Counter"), vec![(4, 16)]);
    }

    #[test]
    fn handles_non_ascii_neighbours() {
        assert_eq!(spans("é count ü", "count"), vec![(3, 8)]);
        assert!(spans("écount", "count").is_empty());
    }

    #[test]
    fn empty_needle_matches_nothing() {
        assert!(word_occurrences("anything", "").is_empty());
    }
}
