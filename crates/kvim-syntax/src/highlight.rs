//! Whole-text lexical keyword scanning.
//!
//! Matching is literal and case-sensitive. The only boundary check is whatever
//! the keyword literal carries itself, so `"for "` does not match `for(`.

use crate::registry::LanguageDescriptor;
use memchr::memmem::Finder;
use std::ops::Range;

/// A highlighted byte range in a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeywordSpan {
    pub start: usize,
    pub len: usize,
}

impl KeywordSpan {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Visual style applied to spans. Every keyword gets the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HighlightStyle {
    #[default]
    Keyword,
}

/// Scan `text` with the descriptor's keyword list.
pub fn scan(text: &str, descriptor: &LanguageDescriptor) -> Vec<KeywordSpan> {
    if !descriptor.has_keywords() {
        return Vec::new();
    }
    scan_keywords(text, descriptor.keywords)
}

/// Find every non-overlapping occurrence of each keyword, in keyword order,
/// then merge into a single list sorted by offset.
///
/// When occurrences of different keywords overlap, the one starting first is
/// kept (the longer one on a tie) and the rest are dropped.
pub fn scan_keywords(text: &str, keywords: &[&str]) -> Vec<KeywordSpan> {
    let haystack = text.as_bytes();
    let mut spans = Vec::new();

    for keyword in keywords.iter().filter(|keyword| !keyword.is_empty()) {
        let finder = Finder::new(keyword.as_bytes());
        let mut from = 0;
        while let Some(pos) = finder.find(&haystack[from..]) {
            let start = from + pos;
            spans.push(KeywordSpan::new(start, keyword.len()));
            from = start + keyword.len();
        }
    }

    spans.sort_unstable_by(|a, b| a.start.cmp(&b.start).then(b.len.cmp(&a.len)));

    let mut merged = Vec::with_capacity(spans.len());
    let mut covered_to = 0;
    for span in spans {
        if span.start < covered_to {
            continue;
        }
        covered_to = span.end();
        merged.push(span);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{LanguageRegistry, PLAIN_TEXT};

    fn assert_ordered_and_disjoint(spans: &[KeywordSpan]) {
        for pair in spans.windows(2) {
            assert!(pair[0].end() <= pair[1].start, "{:?} overlaps", pair);
        }
    }

    #[test]
    fn plain_text_produces_no_spans() {
        for text in ["", "for while if ", "fn main() { let x = 1; }"] {
            assert!(scan(text, &PLAIN_TEXT).is_empty());
        }
    }

    #[test]
    fn trailing_boundary_prevents_mid_token_matches() {
        let spans = scan_keywords("for for formula for", &["for "]);
        assert_eq!(spans, vec![KeywordSpan::new(0, 4), KeywordSpan::new(4, 4)]);

        let spans = scan_keywords("for for formula for ", &["for "]);
        assert_eq!(
            spans,
            vec![
                KeywordSpan::new(0, 4),
                KeywordSpan::new(4, 4),
                KeywordSpan::new(16, 4),
            ]
        );
        assert_ordered_and_disjoint(&spans);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(scan_keywords("For FOR", &["for "]).is_empty());
    }

    #[test]
    fn missing_boundary_is_a_known_false_negative() {
        assert!(scan_keywords("for(int i)", &["for "]).is_empty());
    }

    #[test]
    fn spans_from_several_keywords_are_sorted() {
        let registry = LanguageRegistry::builtin();
        let rust = registry.resolve("rs");
        let text = "pub fn main() {\n    let mut x = 1;\n}\n";
        let spans = scan(text, rust);
        let matched: Vec<&str> = spans.iter().map(|span| &text[span.range()]).collect();
        assert_eq!(matched, vec!["pub ", "fn ", "let ", "mut "]);
        assert_ordered_and_disjoint(&spans);
    }

    #[test]
    fn overlapping_keywords_keep_the_earliest_span() {
        // "in " sits at the tail of "begin ".
        let spans = scan_keywords("begin x", &["in ", "begin "]);
        assert_eq!(spans, vec![KeywordSpan::new(0, 6)]);
    }

    #[test]
    fn offsets_are_byte_offsets_on_char_boundaries() {
        let text = "é fn x";
        let spans = scan_keywords(text, &["fn "]);
        assert_eq!(spans, vec![KeywordSpan::new(3, 3)]);
        assert!(text.is_char_boundary(spans[0].start));
    }
}
