//! Speech-recognition capability interface.
//!
//! A backend opens push-audio sessions: the caller writes raw audio bytes
//! into the session's feed and consumes recognition events from its event
//! channel. Events are delivered by the backend's own task, concurrently
//! with the audio feed; no ordering between feeding and the first event is
//! guaranteed.

use crate::defaults;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Why a finalized result was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultReason {
    /// Finalized speech with usable text.
    RecognizedSpeech,
    /// The recognizer finalized a span without recognizable speech.
    NoMatch,
}

/// One event from a recognition session.
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// Interim hypothesis; superseded by a later `Recognized`.
    Recognizing { text: String },
    /// Finalized utterance. `payload` is the detailed JSON document whose
    /// `NBest[0].Words` array carries word-level timestamps.
    Recognized {
        reason: ResultReason,
        text: String,
        payload: String,
    },
    /// The recognizer reached the end of the audio feed.
    SessionStopped,
    /// The session was torn down. With `error_details` this is a failure;
    /// without, it is a clean upstream close.
    Canceled { error_details: Option<String> },
}

/// One live recognition session.
///
/// Dropping `audio` closes the push feed; the backend then finalizes any
/// pending speech and emits `SessionStopped` (or `Canceled`).
pub struct SpeechSession {
    pub audio: mpsc::Sender<Bytes>,
    pub events: mpsc::Receiver<RecognitionEvent>,
}

/// Capability interface over a streaming speech-recognition service.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Opens a new push-audio session.
    async fn start_session(&self) -> Result<SpeechSession>;
}

/// Scripted backend for tests.
///
/// Emits its configured events while concurrently draining (and counting)
/// whatever audio is pushed, so feed/event interleaving is exercised the
/// way a real recognizer would.
#[derive(Debug, Clone, Default)]
pub struct MockSpeechBackend {
    events: Vec<RecognitionEvent>,
    bytes_received: Arc<AtomicUsize>,
}

impl MockSpeechBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the session script.
    pub fn with_event(mut self, event: RecognitionEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Convenience: a finalized utterance whose payload carries the given
    /// `(word, offset_ticks, duration_ticks)` triples.
    pub fn with_utterance(self, text: &str, words: &[(&str, i64, i64)]) -> Self {
        let rendered: Vec<String> = words
            .iter()
            .map(|(w, offset, duration)| {
                format!(r#"{{"Word":"{w}","Offset":{offset},"Duration":{duration}}}"#)
            })
            .collect();
        let payload = format!(
            r#"{{"RecognitionStatus":"Success","NBest":[{{"Display":"{text}","Words":[{}]}}]}}"#,
            rendered.join(",")
        );
        self.with_event(RecognitionEvent::Recognized {
            reason: ResultReason::RecognizedSpeech,
            text: text.to_string(),
            payload,
        })
    }

    /// Total audio bytes pushed across all sessions.
    pub fn bytes_received(&self) -> usize {
        self.bytes_received.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechBackend for MockSpeechBackend {
    async fn start_session(&self) -> Result<SpeechSession> {
        let (audio_tx, mut audio_rx) = mpsc::channel::<Bytes>(defaults::STREAM_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(defaults::EVENT_CHANNEL_CAPACITY);

        let received = self.bytes_received.clone();
        tokio::spawn(async move {
            while let Some(chunk) = audio_rx.recv().await {
                received.fetch_add(chunk.len(), Ordering::SeqCst);
            }
        });

        let events = self.events.clone();
        tokio::spawn(async move {
            for event in events {
                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(SpeechSession {
            audio: audio_tx,
            events: event_rx,
        })
    }
}
