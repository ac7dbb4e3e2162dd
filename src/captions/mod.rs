//! Caption and transcript rendering from word timestamps.

pub mod cues;
pub mod transcript;

pub use cues::{CaptionCue, build_captions, segment_cues};
pub use transcript::build_transcript;
