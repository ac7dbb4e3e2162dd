//! REST adapter for the hosted speech-recognition service.
//!
//! Bridges the push-audio session contract onto the service's short-audio
//! REST endpoint: the session's audio feed becomes a streamed request
//! body, and the single detailed JSON response is replayed as a
//! `Recognized` event followed by `SessionStopped`. Service failures
//! surface as `Canceled` events with error details, which the session
//! state machine maps onto the error taxonomy.

use crate::defaults;
use crate::error::Result;
use crate::transcribe::backend::{RecognitionEvent, ResultReason, SpeechBackend, SpeechSession};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

/// Speech backend speaking the service's REST protocol.
pub struct RestSpeechBackend {
    client: reqwest::Client,
    key: String,
    region: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct RestResponse {
    #[serde(rename = "RecognitionStatus", default)]
    status: String,
    #[serde(rename = "DisplayText", default)]
    display_text: String,
}

impl RestSpeechBackend {
    pub fn new(key: impl Into<String>, region: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            key: key.into(),
            region: region.into(),
            language: language.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1",
            self.region
        )
    }
}

#[async_trait]
impl SpeechBackend for RestSpeechBackend {
    async fn start_session(&self) -> Result<SpeechSession> {
        let (audio_tx, audio_rx) = mpsc::channel::<Bytes>(defaults::STREAM_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(defaults::EVENT_CHANNEL_CAPACITY);

        let request = self
            .client
            .post(self.endpoint())
            .query(&[
                ("language", self.language.as_str()),
                ("format", "detailed"),
                ("wordLevelTimestamps", "true"),
            ])
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header(
                "Content-Type",
                format!(
                    "audio/wav; codecs=audio/pcm; samplerate={}",
                    defaults::SAMPLE_RATE
                ),
            )
            .header("Accept", "application/json");

        tokio::spawn(async move {
            // The audio feed becomes the request body; the request is held
            // open until the caller drops its sender.
            let body_stream = futures_util::stream::unfold(audio_rx, |mut rx| async move {
                rx.recv().await.map(|chunk| (Ok::<Bytes, std::io::Error>(chunk), rx))
            });
            let response = request
                .body(reqwest::Body::wrap_stream(body_stream))
                .send()
                .await;

            let event = match response {
                Ok(response) if response.status().is_success() => match response.text().await {
                    Ok(payload) => {
                        let parsed: RestResponse =
                            serde_json::from_str(&payload).unwrap_or(RestResponse {
                                status: String::new(),
                                display_text: String::new(),
                            });
                        debug!(status = %parsed.status, "recognition response");
                        let reason = if parsed.status == "Success" {
                            ResultReason::RecognizedSpeech
                        } else {
                            ResultReason::NoMatch
                        };
                        RecognitionEvent::Recognized {
                            reason,
                            text: parsed.display_text,
                            payload,
                        }
                    }
                    Err(e) => RecognitionEvent::Canceled {
                        error_details: Some(format!("failed to read recognition response: {e}")),
                    },
                },
                Ok(response) => RecognitionEvent::Canceled {
                    error_details: Some(format!(
                        "recognition request returned status {}",
                        response.status()
                    )),
                },
                Err(e) => RecognitionEvent::Canceled {
                    error_details: Some(format!("recognition request failed: {e}")),
                },
            };

            let is_recognized = matches!(event, RecognitionEvent::Recognized { .. });
            if event_tx.send(event).await.is_ok() && is_recognized {
                let _ = event_tx.send(RecognitionEvent::SessionStopped).await;
            }
        });

        Ok(SpeechSession {
            audio: audio_tx,
            events: event_rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_derived_from_region() {
        let backend = RestSpeechBackend::new("key", "westus2", "en-US");
        assert_eq!(
            backend.endpoint(),
            "https://westus2.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1"
        );
    }
}
