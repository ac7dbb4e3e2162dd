//! Caption cue segmentation.
//!
//! Words accumulate into the current cue until adding the next word would
//! push the cue's summed word duration past the cap; the cue is then
//! flushed and a fresh one started. The cap bounds summed word durations,
//! not wall-clock span, so a cue can cover more than five seconds when the
//! words have gaps between them.

use crate::defaults;
use crate::transcribe::words::WordTimestamp;

/// One caption entry.
///
/// `index` is zero-based; the rendered document numbers cues from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionCue {
    pub index: usize,
    pub start_ticks: i64,
    pub end_ticks: i64,
    pub words: Vec<String>,
}

impl CaptionCue {
    /// Joined display text of the cue.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// Splits an ordered word sequence into capped cues.
///
/// The duration check runs before a word is added, so a single word longer
/// than the cap still becomes its own one-word cue, and no cue is ever
/// empty.
pub fn segment_cues(words: &[WordTimestamp]) -> Vec<CaptionCue> {
    let mut cues: Vec<CaptionCue> = Vec::new();
    let mut current: Vec<&WordTimestamp> = Vec::new();
    let mut current_duration = 0.0;

    for word in words {
        let word_duration = word.duration_seconds();
        if !current.is_empty() && current_duration + word_duration > defaults::MAX_CUE_SECONDS {
            cues.push(flush(&current, cues.len()));
            current.clear();
            current_duration = 0.0;
        }
        current.push(word);
        current_duration += word_duration;
    }

    if !current.is_empty() {
        cues.push(flush(&current, cues.len()));
    }

    cues
}

fn flush(words: &[&WordTimestamp], index: usize) -> CaptionCue {
    // Callers never flush an empty cue, so first/last always exist.
    let start_ticks = words.first().map(|w| w.offset_ticks).unwrap_or(0);
    let end_ticks = words.last().map(|w| w.end_ticks()).unwrap_or(0);
    CaptionCue {
        index,
        start_ticks,
        end_ticks,
        words: words.iter().map(|w| w.text.clone()).collect(),
    }
}

/// Renders the full caption document for a word sequence.
pub fn build_captions(words: &[WordTimestamp]) -> String {
    let mut document = format!("{}\n\n", defaults::CAPTION_HEADER);
    for cue in segment_cues(words) {
        document.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index + 1,
            format_timestamp(cue.start_ticks),
            format_timestamp(cue.end_ticks),
            cue.text()
        ));
    }
    document
}

/// Formats a tick position as `HH:MM:SS,mmm`.
fn format_timestamp(ticks: i64) -> String {
    let total_millis = ticks.max(0) / defaults::TICKS_PER_MILLISECOND;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let seconds = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}
