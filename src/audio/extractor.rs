//! Audio extraction via an external encoder subprocess.
//!
//! Streams arbitrary container bytes into one `ffmpeg` process and streams
//! normalized audio (16-bit PCM, 16 kHz, mono, WAV) back out. Neither side
//! is fully buffered: downstream consumption can begin before the input
//! stream has finished.

use crate::defaults;
use crate::error::{PipelineError, Result};
use crate::stream::{self, ByteStream};
use bytes::Bytes;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Extracts a normalized mono 16 kHz PCM/WAV stream from a video stream.
pub struct AudioExtractor {
    binary: String,
}

/// A running extraction: the output stream plus a completion handle.
///
/// Extraction failure travels both ways: an `Err` chunk closes `stream`,
/// and the same failure is returned by [`ExtractionHandle::finish`]. The
/// caller must await `finish` after draining the stream; an early stream
/// close alone is not the failure signal.
pub struct ExtractedAudio {
    pub stream: ByteStream,
    pub completion: ExtractionHandle,
}

/// Completion side of one extraction subprocess.
pub struct ExtractionHandle(JoinHandle<Result<()>>);

impl ExtractionHandle {
    /// Waits for the subprocess to exit and reports its outcome.
    pub async fn finish(self) -> Result<()> {
        self.0.await.map_err(|e| PipelineError::Encoding {
            message: format!("extraction task panicked: {e}"),
        })?
    }
}

impl AudioExtractor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Arguments for one normalization invocation, reading from stdin and
    /// writing WAV to stdout.
    fn wav_args() -> Vec<String> {
        let rate = defaults::SAMPLE_RATE.to_string();
        let channels = defaults::AUDIO_CHANNELS.to_string();
        let args: [&str; 15] = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
            "pipe:0",
            "-vn",
            "-acodec",
            "pcm_s16le",
            "-ar",
            &rate,
            "-ac",
            &channels,
            "-f",
            "wav",
            "pipe:1",
        ];
        args.iter().map(|s| s.to_string()).collect()
    }

    /// Starts extraction over `input`.
    ///
    /// Returns as soon as the subprocess is spawned; bytes flow through the
    /// returned stream while the input is still arriving.
    pub fn extract(&self, mut input: ByteStream) -> Result<ExtractedAudio> {
        let mut child = Command::new(&self.binary)
            .args(Self::wav_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PipelineError::Encoding {
                        message: format!("{} not found; install ffmpeg", self.binary),
                    }
                } else {
                    PipelineError::Encoding {
                        message: format!("failed to spawn {}: {}", self.binary, e),
                    }
                }
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| PipelineError::Encoding {
            message: "encoder stdin was not piped".to_string(),
        })?;
        let mut stdout = child.stdout.take().ok_or_else(|| PipelineError::Encoding {
            message: "encoder stdout was not piped".to_string(),
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| PipelineError::Encoding {
            message: "encoder stderr was not piped".to_string(),
        })?;

        let (tx, rx) = stream::channel();
        let binary = self.binary.clone();

        let handle = tokio::spawn(async move {
            let feed = async move {
                let mut fed: u64 = 0;
                while let Some(chunk) = input.recv().await {
                    let chunk = match chunk {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            // Upstream died; close stdin so the encoder
                            // flushes what it already has, then report.
                            drop(stdin);
                            return Err(e);
                        }
                    };
                    fed += chunk.len() as u64;
                    if let Err(e) = stdin.write_all(&chunk).await {
                        warn!(error = %e, "encoder closed its input before the stream ended");
                        break;
                    }
                }
                debug!(bytes = fed, "input feed complete");
                drop(stdin);
                Ok(())
            };

            let pump = async {
                let mut buf = vec![0u8; defaults::IO_CHUNK_BYTES];
                loop {
                    match stdout.read(&mut buf).await {
                        Ok(0) => break Ok(()),
                        Ok(n) => {
                            if tx.send(Ok(Bytes::copy_from_slice(&buf[..n]))).await.is_err() {
                                // Consumer went away; stop reading so the
                                // child sees a closed pipe and exits.
                                break Ok(());
                            }
                        }
                        Err(e) => {
                            break Err(PipelineError::Stream {
                                message: format!("failed to read extracted audio: {e}"),
                            });
                        }
                    }
                }
            };

            // Drain stderr alongside the pipes; a full stderr buffer
            // would wedge the encoder against our stdin writes.
            let drain = async {
                let mut detail = String::new();
                let _ = stderr.read_to_string(&mut detail).await;
                detail
            };

            let (fed, pumped, detail) = tokio::join!(feed, pump, drain);

            let status = child.wait().await.map_err(|e| PipelineError::Encoding {
                message: format!("failed to reap {binary}: {e}"),
            })?;

            let outcome = if !status.success() {
                Err(PipelineError::Encoding {
                    message: format!(
                        "{binary} exited with {status}: {}",
                        detail.trim().lines().last().unwrap_or("no detail")
                    ),
                })
            } else {
                fed.and(pumped)
            };

            if let Err(e) = outcome {
                // Surface the failure to whoever is draining the stream too.
                let _ = tx
                    .send(Err(PipelineError::Stream {
                        message: format!("extraction failed: {e}"),
                    }))
                    .await;
                return Err(e);
            }
            Ok(())
        });

        Ok(ExtractedAudio {
            stream: rx,
            completion: ExtractionHandle(handle),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{collect, from_buffer};

    #[test]
    fn wav_args_select_pcm_16k_mono() {
        let args = AudioExtractor::wav_args();
        let joined = args.join(" ");
        assert!(joined.contains("-acodec pcm_s16le"));
        assert!(joined.contains("-ar 16000"));
        assert!(joined.contains("-ac 1"));
        assert!(joined.contains("-f wav"));
        assert!(joined.contains("-i pipe:0"));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[tokio::test]
    async fn missing_binary_is_an_encoding_error() {
        let extractor = AudioExtractor::new("definitely-not-a-real-encoder");
        let result = extractor.extract(from_buffer(vec![0u8; 16]));
        match result {
            Err(PipelineError::Encoding { message }) => {
                assert!(message.contains("not found"), "message: {message}");
            }
            other => panic!("expected Encoding error, got {:?}", other.map(|_| ())),
        }
    }

    // `cat` stands in for the encoder: it copies stdin to stdout, which is
    // exactly the piping contract extract() manages.
    #[tokio::test]
    async fn extraction_pipes_bytes_and_finishes_clean() {
        let extractor = AudioExtractor::new("cat");
        let payload: Vec<u8> = (0..100_000).map(|i| (i % 199) as u8).collect();

        let ExtractedAudio { stream, completion } =
            extractor.extract(from_buffer(payload.clone())).unwrap();

        let out = collect(stream).await.unwrap();
        assert_eq!(out, payload);
        completion.finish().await.unwrap();
    }

    #[tokio::test]
    async fn nonzero_exit_fails_stream_and_completion() {
        let extractor = AudioExtractor::new("false");
        let ExtractedAudio { stream, completion } =
            extractor.extract(from_buffer(vec![1u8; 64])).unwrap();

        // The stream carries the in-band failure...
        assert!(collect(stream).await.is_err());
        // ...and the completion handle reports the same outcome.
        match completion.finish().await {
            Err(PipelineError::Encoding { .. }) => {}
            other => panic!("expected Encoding error, got {:?}", other),
        }
    }
}
