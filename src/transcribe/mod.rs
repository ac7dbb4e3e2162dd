//! Streaming speech recognition.
//!
//! The recognizer is consumed through the [`backend::SpeechBackend`]
//! capability: one push-audio feed plus an event subscription per session.
//! [`session::StreamingTranscriber`] runs the session state machine and
//! accumulates finalized utterances into ordered word timestamps.

pub mod backend;
pub mod rest;
pub mod session;
pub mod words;

pub use backend::{MockSpeechBackend, RecognitionEvent, ResultReason, SpeechBackend, SpeechSession};
pub use session::{StreamingTranscriber, TranscriptionOutput};
pub use words::{RecognitionResult, WordTimestamp};
