//! Audio derivation from source video.

pub mod extractor;
pub mod wav;

pub use extractor::{AudioExtractor, ExtractedAudio, ExtractionHandle};
