//! Word-timestamp types and recognizer payload parsing.

use crate::defaults;
use crate::error::{PipelineError, Result};
use serde::Deserialize;

/// One recognized word with its position on the session timeline.
///
/// Offsets and durations are in ticks (100 ns). Within an utterance the
/// best-candidate word list is already ordered; utterances arrive in
/// session order, so appending keeps the flat sequence non-decreasing by
/// offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordTimestamp {
    pub text: String,
    pub offset_ticks: i64,
    pub duration_ticks: i64,
}

impl WordTimestamp {
    /// Tick position where this word ends.
    pub fn end_ticks(&self) -> i64 {
        self.offset_ticks + self.duration_ticks
    }

    /// Word duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration_ticks as f64 / defaults::TICKS_PER_SECOND as f64
    }
}

/// One finalized utterance: display text plus its word timeline.
///
/// Appended to the session's result sequence and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub text: String,
    pub words: Vec<WordTimestamp>,
}

// Detailed-output payload shape delivered with a finalized utterance.
#[derive(Debug, Deserialize)]
struct DetailedPayload {
    #[serde(rename = "NBest", default)]
    n_best: Vec<NBestEntry>,
}

#[derive(Debug, Deserialize)]
struct NBestEntry {
    #[serde(rename = "Words", default)]
    words: Vec<RawWord>,
}

#[derive(Debug, Deserialize)]
struct RawWord {
    #[serde(rename = "Word")]
    word: String,
    #[serde(rename = "Offset")]
    offset: i64,
    #[serde(rename = "Duration")]
    duration: i64,
}

/// Extracts the best candidate's word list from a detailed recognition
/// payload.
///
/// A payload without an NBest entry (possible for empty utterances) yields
/// an empty list rather than an error.
pub fn parse_best_words(payload: &str) -> Result<Vec<WordTimestamp>> {
    let parsed: DetailedPayload =
        serde_json::from_str(payload).map_err(|e| PipelineError::Transcription {
            message: format!("unparseable recognition payload: {e}"),
        })?;

    let Some(best) = parsed.n_best.into_iter().next() else {
        return Ok(Vec::new());
    };

    Ok(best
        .words
        .into_iter()
        .map(|w| WordTimestamp {
            text: w.word,
            offset_ticks: w.offset,
            duration_ticks: w.duration,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_best_candidate_words() {
        let payload = r#"{
            "RecognitionStatus": "Success",
            "NBest": [
                {
                    "Confidence": 0.97,
                    "Display": "see spot run",
                    "Words": [
                        {"Word": "see", "Offset": 0, "Duration": 30000000},
                        {"Word": "spot", "Offset": 30000000, "Duration": 20000000},
                        {"Word": "run", "Offset": 50000000, "Duration": 60000000}
                    ]
                },
                {
                    "Confidence": 0.41,
                    "Words": [{"Word": "sea", "Offset": 0, "Duration": 30000000}]
                }
            ]
        }"#;

        let words = parse_best_words(payload).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].text, "see");
        assert_eq!(words[2].offset_ticks, 50_000_000);
        assert_eq!(words[2].end_ticks(), 110_000_000);
    }

    #[test]
    fn missing_nbest_yields_no_words() {
        let words = parse_best_words(r#"{"RecognitionStatus":"NoMatch"}"#).unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn malformed_payload_is_a_transcription_error() {
        let result = parse_best_words("not json at all");
        assert!(matches!(
            result,
            Err(PipelineError::Transcription { .. })
        ));
    }

    #[test]
    fn duration_seconds_uses_tick_scale() {
        let word = WordTimestamp {
            text: "run".to_string(),
            offset_ticks: 50_000_000,
            duration_ticks: 60_000_000,
        };
        assert!((word.duration_seconds() - 6.0).abs() < f64::EPSILON);
    }
}
