use regex::Regex;
use std::sync::OnceLock;

fn boundary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[.!?]\s+").expect("valid sentence boundary pattern"))
}

/// Splits after `.`, `!` or `?` when followed by whitespace. Pieces are trimmed
/// and empty pieces dropped; the terminal punctuation stays with its sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in boundary_pattern().find_iter(text) {
        // the punctuation marks are all one byte wide
        let end = m.start() + 1;
        push_trimmed(&mut sentences, &text[start..end]);
        start = m.end();
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_terminal_punctuation() {
        let sentences = split_sentences("I felt awful today. But I called my sister! Will it help?");
        assert_eq!(
            sentences,
            vec![
                "I felt awful today.",
                "But I called my sister!",
                "Will it help?"
            ]
        );
    }

    #[test]
    fn test_keeps_punctuation_without_following_whitespace() {
        let sentences = split_sentences("Version 2.0 is out...and fine.");
        assert_eq!(sentences, vec!["Version 2.0 is out...and fine."]);
    }

    #[test]
    fn test_ellipsis_followed_by_space_splits_once() {
        let sentences = split_sentences("I don't know... Maybe tomorrow.");
        assert_eq!(sentences, vec!["I don't know...", "Maybe tomorrow."]);
    }

    #[test]
    fn test_blank_input_yields_nothing() {
        assert!(split_sentences("   \n\t ").is_empty());
        assert!(split_sentences("").is_empty());
    }

    #[test]
    fn test_newlines_count_as_whitespace() {
        let sentences = split_sentences("First line.\n\nSecond line");
        assert_eq!(sentences, vec!["First line.", "Second line"]);
    }
}
