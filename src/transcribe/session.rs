//! Streaming transcription session state machine.
//!
//! One session runs two concurrent activities: a feed task pushing audio
//! chunks into the recognizer, and the event loop consuming recognition
//! callbacks. The event loop is the only writer of the accumulated
//! results, so appends stay ordered without extra locking, and the session
//! resolves exactly once.

use crate::error::{PipelineError, Result};
use crate::stream::ByteStream;
use crate::transcribe::backend::{RecognitionEvent, ResultReason, SpeechBackend, SpeechSession};
use crate::transcribe::words::{self, RecognitionResult, WordTimestamp};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of one recognition session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recognizing,
    Stopping,
    Done,
    Canceled,
}

/// Everything a finished session produced.
#[derive(Debug, Clone, Default)]
pub struct TranscriptionOutput {
    /// Finalized utterances in session order.
    pub results: Vec<RecognitionResult>,
    /// Flat word sequence, non-decreasing by offset.
    pub words: Vec<WordTimestamp>,
}

/// Runs recognition sessions against a [`SpeechBackend`].
pub struct StreamingTranscriber {
    backend: Arc<dyn SpeechBackend>,
}

impl StreamingTranscriber {
    pub fn new(backend: Arc<dyn SpeechBackend>) -> Self {
        Self { backend }
    }

    /// Feeds `audio` through one recognition session and accumulates the
    /// finalized utterances.
    ///
    /// A `canceled` event with error details fails the session; a clean
    /// cancel resolves normally with whatever was accumulated so far.
    pub async fn transcribe(&self, mut audio: ByteStream) -> Result<TranscriptionOutput> {
        let mut state = SessionState::Idle;
        let SpeechSession { audio: feed, mut events } = self.backend.start_session().await?;

        // Feed and event handling are independent concurrent activities;
        // the recognizer may deliver events before the feed is done.
        let feeder = tokio::spawn(async move {
            let mut fed: u64 = 0;
            while let Some(chunk) = audio.recv().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!(error = %e, "audio stream broke mid-session");
                        break;
                    }
                };
                fed += chunk.len() as u64;
                if feed.send(chunk).await.is_err() {
                    // Session ended first; not an error from the feed side.
                    break;
                }
                debug!(bytes = fed, "audio pushed to recognizer");
            }
            // Dropping the sender closes the push feed.
            fed
        });

        advance(&mut state, SessionState::Recognizing);
        let mut output = TranscriptionOutput::default();

        let outcome = loop {
            match events.recv().await {
                // Interim hypotheses are discarded; only finalized
                // utterances are retained.
                Some(RecognitionEvent::Recognizing { .. }) => {}
                Some(RecognitionEvent::Recognized { reason, text, payload }) => {
                    if reason == ResultReason::RecognizedSpeech {
                        match words::parse_best_words(&payload) {
                            Ok(parsed) => {
                                debug!(utterance = %text, words = parsed.len(), "finalized utterance");
                                output.words.extend(parsed.iter().cloned());
                                output.results.push(RecognitionResult { text, words: parsed });
                            }
                            Err(e) => break Err(e),
                        }
                    }
                }
                Some(RecognitionEvent::SessionStopped) => {
                    advance(&mut state, SessionState::Stopping);
                    break Ok(());
                }
                Some(RecognitionEvent::Canceled { error_details }) => match error_details {
                    Some(details) => {
                        break Err(PipelineError::Transcription { message: details });
                    }
                    None => {
                        // Clean upstream close: treated as normal completion.
                        debug!("session canceled without error details");
                        advance(&mut state, SessionState::Stopping);
                        break Ok(());
                    }
                },
                // Backend dropped its event channel; same as a clean stop.
                None => {
                    advance(&mut state, SessionState::Stopping);
                    break Ok(());
                }
            }
        };

        match outcome {
            Ok(()) => {
                let fed = feeder.await.unwrap_or_default();
                advance(&mut state, SessionState::Done);
                info!(
                    utterances = output.results.len(),
                    words = output.words.len(),
                    bytes = fed,
                    "recognition session complete"
                );
                Ok(output)
            }
            Err(e) => {
                feeder.abort();
                advance(&mut state, SessionState::Canceled);
                Err(e)
            }
        }
    }
}

fn advance(state: &mut SessionState, next: SessionState) {
    debug!(from = ?state, to = ?next, "session state");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::from_buffer;
    use crate::transcribe::backend::MockSpeechBackend;

    fn transcriber(backend: MockSpeechBackend) -> StreamingTranscriber {
        StreamingTranscriber::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn accumulates_utterances_in_session_order() {
        let backend = MockSpeechBackend::new()
            .with_utterance("see spot", &[("see", 0, 30_000_000), ("spot", 30_000_000, 20_000_000)])
            .with_utterance("run", &[("run", 50_000_000, 60_000_000)])
            .with_event(RecognitionEvent::SessionStopped);

        let output = transcriber(backend)
            .transcribe(from_buffer(vec![0u8; 4096]))
            .await
            .unwrap();

        assert_eq!(output.results.len(), 2);
        assert_eq!(output.results[0].text, "see spot");
        assert_eq!(output.results[1].text, "run");

        let offsets: Vec<i64> = output.words.iter().map(|w| w.offset_ticks).collect();
        assert_eq!(offsets, vec![0, 30_000_000, 50_000_000]);
        assert!(offsets.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn interim_events_are_ignored() {
        let backend = MockSpeechBackend::new()
            .with_event(RecognitionEvent::Recognizing { text: "se".to_string() })
            .with_event(RecognitionEvent::Recognizing { text: "see sp".to_string() })
            .with_utterance("see spot", &[("see", 0, 1), ("spot", 1, 1)])
            .with_event(RecognitionEvent::SessionStopped);

        let output = transcriber(backend)
            .transcribe(from_buffer(vec![0u8; 16]))
            .await
            .unwrap();

        assert_eq!(output.results.len(), 1);
        assert_eq!(output.words.len(), 2);
    }

    #[tokio::test]
    async fn no_match_results_are_dropped() {
        let backend = MockSpeechBackend::new()
            .with_event(RecognitionEvent::Recognized {
                reason: ResultReason::NoMatch,
                text: String::new(),
                payload: r#"{"RecognitionStatus":"NoMatch"}"#.to_string(),
            })
            .with_event(RecognitionEvent::SessionStopped);

        let output = transcriber(backend)
            .transcribe(from_buffer(vec![0u8; 16]))
            .await
            .unwrap();

        assert!(output.results.is_empty());
        assert!(output.words.is_empty());
    }

    #[tokio::test]
    async fn cancel_with_details_is_an_error() {
        let backend = MockSpeechBackend::new().with_event(RecognitionEvent::Canceled {
            error_details: Some("WebSocket upgrade failed".to_string()),
        });

        let result = transcriber(backend)
            .transcribe(from_buffer(vec![0u8; 16]))
            .await;

        match result {
            Err(PipelineError::Transcription { message }) => {
                assert_eq!(message, "WebSocket upgrade failed");
            }
            other => panic!("expected Transcription error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn clean_cancel_resolves_with_accumulated_state() {
        // A cancel without details after zero utterances is a normal,
        // empty completion, not a rejection.
        let backend = MockSpeechBackend::new()
            .with_event(RecognitionEvent::Canceled { error_details: None });

        let output = transcriber(backend)
            .transcribe(from_buffer(vec![0u8; 16]))
            .await
            .unwrap();

        assert!(output.results.is_empty());
        assert!(output.words.is_empty());
    }

    #[tokio::test]
    async fn clean_cancel_keeps_earlier_utterances() {
        let backend = MockSpeechBackend::new()
            .with_utterance("partial", &[("partial", 0, 2_000_000)])
            .with_event(RecognitionEvent::Canceled { error_details: None });

        let output = transcriber(backend)
            .transcribe(from_buffer(vec![0u8; 16]))
            .await
            .unwrap();

        assert_eq!(output.results.len(), 1);
        assert_eq!(output.words.len(), 1);
    }

    #[tokio::test]
    async fn events_before_feed_completion_are_handled() {
        // The mock emits its whole script immediately, while the feed task
        // is still pushing; the session must resolve without requiring the
        // feed to finish first.
        let backend = MockSpeechBackend::new()
            .with_utterance("quick", &[("quick", 0, 1_000_000)])
            .with_event(RecognitionEvent::SessionStopped);

        let big_input = vec![0u8; 1_000_000];
        let output = transcriber(backend)
            .transcribe(from_buffer(big_input))
            .await
            .unwrap();

        assert_eq!(output.results.len(), 1);
    }
}
