//! Splits text into word units while keeping special tokens intact.
//!
//! Plain text is split on runs of whitespace and every surviving fragment is
//! prefixed with [`WORD_MARKER`]. Special tokens are located with a literal
//! scanner: at each position the specials are tried in list order and the
//! first one that matches wins.

/// Sentinel symbol marking the start of a whitespace-delimited word.
pub const WORD_MARKER: char = '\u{2581}';

/// A span of input text produced by [`split_on_specials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A special token literal, verbatim.
    Special(&'a str),
    /// Text between special tokens.
    Text(&'a str),
}

/// A unit handed to the merge stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordUnit {
    Special(String),
    /// A plain fragment already carrying its leading [`WORD_MARKER`].
    Word(String),
}

/// Segments text into alternating normal and special-token spans.
///
/// Empty spans are never emitted, so text that starts with a special token or
/// contains two consecutive specials produces no blank [`Segment::Text`].
/// Empty special literals are ignored.
pub fn split_on_specials<'a, S: AsRef<str>>(text: &'a str, specials: &[S]) -> Vec<Segment<'a>> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut segment_start = 0;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let matched = specials
            .iter()
            .map(AsRef::as_ref)
            .find(|s| !s.is_empty() && rest.starts_with(*s));

        match matched {
            Some(special) => {
                if pos > segment_start {
                    segments.push(Segment::Text(&text[segment_start..pos]));
                }
                let end = pos + special.len();
                segments.push(Segment::Special(&text[pos..end]));
                pos = end;
                segment_start = end;
            }
            None => {
                // advance by one full character to stay on a char boundary
                pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if segment_start < text.len() {
        segments.push(Segment::Text(&text[segment_start..]));
    }

    segments
}

/// Splits plain text on whitespace runs and marks each word.
///
/// `\r` counts as whitespace, so CRLF and lone CR line endings split exactly
/// like `\n`.
pub fn marked_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            let mut word = String::with_capacity(w.len() + WORD_MARKER.len_utf8());
            word.push(WORD_MARKER);
            word.push_str(w);
            word
        })
        .collect()
}

/// Produces the ordered word units for `text`.
pub fn segment<S: AsRef<str>>(text: &str, specials: &[S]) -> Vec<WordUnit> {
    let mut units = Vec::new();
    for seg in split_on_specials(text, specials) {
        match seg {
            Segment::Special(s) => units.push(WordUnit::Special(s.to_string())),
            Segment::Text(t) => units.extend(marked_words(t).into_iter().map(WordUnit::Word)),
        }
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_SPECIALS: &[&str] = &[];

    #[test]
    fn test_marked_words_basic() {
        assert_eq!(marked_words("hello  world"), vec!["▁hello", "▁world"]);
    }

    #[test]
    fn test_marked_words_line_endings() {
        assert_eq!(marked_words("a\r\nb\rc\n"), vec!["▁a", "▁b", "▁c"]);
    }

    #[test]
    fn test_marked_words_only_whitespace() {
        assert!(marked_words(" \t\n ").is_empty());
        assert!(marked_words("").is_empty());
    }

    #[test]
    fn test_split_without_specials() {
        assert_eq!(
            split_on_specials("a b", NO_SPECIALS),
            vec![Segment::Text("a b")]
        );
    }

    #[test]
    fn test_split_preserves_order() {
        let segs = split_on_specials("My name is <NAME> from <CITY>.", &["<NAME>", "<CITY>"]);
        assert_eq!(
            segs,
            vec![
                Segment::Text("My name is "),
                Segment::Special("<NAME>"),
                Segment::Text(" from "),
                Segment::Special("<CITY>"),
                Segment::Text("."),
            ]
        );
    }

    #[test]
    fn test_split_adjacent_specials() {
        let segs = split_on_specials("<A><B>", &["<A>", "<B>"]);
        assert_eq!(segs, vec![Segment::Special("<A>"), Segment::Special("<B>")]);
    }

    #[test]
    fn test_first_listed_special_wins() {
        // both literals match at position 0; list order decides
        let segs = split_on_specials("<AB>", &["<A", "<AB>"]);
        assert_eq!(segs, vec![Segment::Special("<A"), Segment::Text("B>")]);

        let segs = split_on_specials("<AB>", &["<AB>", "<A"]);
        assert_eq!(segs, vec![Segment::Special("<AB>")]);
    }

    #[test]
    fn test_special_next_to_punctuation_not_resplit() {
        let segs = split_on_specials("x,<T>!", &["<T>"]);
        assert_eq!(
            segs,
            vec![Segment::Text("x,"), Segment::Special("<T>"), Segment::Text("!")]
        );
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let segs = split_on_specials("a.*b", &[".*"]);
        assert_eq!(
            segs,
            vec![Segment::Text("a"), Segment::Special(".*"), Segment::Text("b")]
        );
    }

    #[test]
    fn test_multibyte_text_around_specials() {
        let segs = split_on_specials("héllo<T>wörld", &["<T>"]);
        assert_eq!(
            segs,
            vec![
                Segment::Text("héllo"),
                Segment::Special("<T>"),
                Segment::Text("wörld"),
            ]
        );
    }

    #[test]
    fn test_empty_special_is_ignored() {
        assert_eq!(split_on_specials("ab", &[""]), vec![Segment::Text("ab")]);
    }

    #[test]
    fn test_segment_units() {
        let units = segment("hi <S> there", &["<S>"]);
        assert_eq!(
            units,
            vec![
                WordUnit::Word("▁hi".into()),
                WordUnit::Special("<S>".into()),
                WordUnit::Word("▁there".into()),
            ]
        );
    }
}
