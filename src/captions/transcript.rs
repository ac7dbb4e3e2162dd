//! Flattened prose transcript from finalized utterances.
//!
//! Sentence ends become paragraph breaks. A period only counts as a
//! sentence end when it is followed by whitespace (or ends the text) and
//! is not part of an initialism, a standalone number, or a known
//! abbreviation.

use crate::transcribe::words::RecognitionResult;
use regex::Regex;
use std::sync::LazyLock;

// Single uppercase letter right before the period, itself at a word
// boundary: initialisms like "U.S." or "J."
static INITIAL_GUARD: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: hardcoded pattern, always valid
    #[allow(clippy::expect_used)]
    Regex::new(r"(?:^|[^A-Za-z0-9])[A-Z]$").expect("hardcoded initialism pattern")
});

// Titles, latinisms and time-of-day markers that end in a period without
// ending the sentence.
static ABBREV_GUARD: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: hardcoded pattern, always valid
    #[allow(clippy::expect_used)]
    Regex::new(r"(?:^|[^A-Za-z0-9])(?:Inc|Ltd|Jr|Dr|Ms|Mr|St|Ave|etc|e\.g|i\.e|a\.k|p\.m|a\.m)$")
        .expect("hardcoded abbreviation pattern")
});

/// Builds the prose transcript from the utterance sequence.
///
/// Every utterance is sentence-split and concatenated, then leading
/// whitespace is stripped from each line.
pub fn build_transcript(results: &[RecognitionResult]) -> String {
    let mut transcript = String::new();
    for result in results {
        transcript.push_str(&split_sentences(&result.text));
    }

    transcript
        .split('\n')
        .map(|line| line.trim_start())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replaces each sentence-ending period with a period plus a paragraph
/// break.
fn split_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        out.push(c);
        if c == '.' && is_sentence_end(text, i) {
            out.push_str("\n\n");
        }
    }
    out
}

fn is_sentence_end(text: &str, period_at: usize) -> bool {
    // Only a period followed by whitespace or end-of-text can end a
    // sentence.
    match text[period_at + 1..].chars().next() {
        Some(next) if !next.is_whitespace() => return false,
        _ => {}
    }

    let prefix = &text[..period_at];
    if INITIAL_GUARD.is_match(prefix) || ABBREV_GUARD.is_match(prefix) {
        return false;
    }
    !ends_with_numeric_token(prefix)
}

/// True when the characters before the period form a standalone number
/// ("3.5", "12"), which reads as a decimal or enumeration rather than a
/// sentence end. A digit attached to a word ("Q1") does not count.
fn ends_with_numeric_token(prefix: &str) -> bool {
    let mut digits = 0;
    let mut rest = prefix;
    while let Some(c) = rest.chars().next_back() {
        match c {
            '0'..='9' => digits += 1,
            '.' => {}
            _ => break,
        }
        rest = &rest[..rest.len() - c.len_utf8()];
    }
    if digits == 0 {
        return false;
    }
    // A letter right before the numeric run makes it part of a word.
    !rest.chars().next_back().is_some_and(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str) -> RecognitionResult {
        RecognitionResult {
            text: text.to_string(),
            words: Vec::new(),
        }
    }

    #[test]
    fn splits_after_plain_sentence_ends() {
        let transcript = build_transcript(&[result(
            "The U.S. economy grew 3.5% in Q1. Mr. Smith agreed.",
        )]);
        assert_eq!(
            transcript,
            "The U.S. economy grew 3.5% in Q1.\n\nMr. Smith agreed.\n\n"
        );
    }

    #[test]
    fn initialisms_do_not_split() {
        let transcript = build_transcript(&[result("He moved to the U.S. last year.")]);
        assert_eq!(transcript, "He moved to the U.S. last year.\n\n");
    }

    #[test]
    fn abbreviations_do_not_split() {
        let transcript = build_transcript(&[result("Dr. Jones met Mr. Lee at 4 p.m. sharp.")]);
        assert!(!transcript.contains("Dr.\n"));
        assert!(!transcript.contains("Mr.\n"));
        assert!(!transcript.contains("p.m.\n"));
    }

    #[test]
    fn standalone_decimals_do_not_split() {
        let transcript = build_transcript(&[result("The reading was 3.5. Then it fell.")]);
        // "3.5." keeps the enumeration-style period attached.
        assert_eq!(transcript, "The reading was 3.5. Then it fell.\n\n");
    }

    #[test]
    fn trailing_digit_on_a_word_still_splits() {
        let transcript = build_transcript(&[result("Revenue rose in Q1. Costs fell.")]);
        assert_eq!(transcript, "Revenue rose in Q1.\n\nCosts fell.\n\n");
    }

    #[test]
    fn every_utterance_is_split() {
        let transcript = build_transcript(&[
            result("First thought ended here. And continued."),
            result("Second utterance too. Done."),
        ]);
        assert_eq!(
            transcript,
            "First thought ended here.\n\nAnd continued.\n\nSecond utterance too.\n\nDone.\n\n"
        );
    }

    #[test]
    fn leading_whitespace_is_stripped_from_lines() {
        let transcript = build_transcript(&[result("One done.   Two follows.")]);
        assert_eq!(transcript, "One done.\n\nTwo follows.\n\n");
    }

    #[test]
    fn empty_results_give_empty_transcript() {
        assert_eq!(build_transcript(&[]), "");
    }
}
