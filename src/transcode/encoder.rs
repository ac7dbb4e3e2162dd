//! External encoder invocation with testable execution.
//!
//! The `Encoder` trait is the seam between rendition orchestration and the
//! actual subprocess, so transcode logic can be exercised without ffmpeg
//! installed.

use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::warn;

/// Runs one encoder invocation with `input` piped to its stdin.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn run(&self, args: &[String], input: &[u8]) -> Result<()>;
}

/// Production encoder spawning an ffmpeg subprocess.
pub struct FfmpegEncoder {
    binary: String,
}

impl FfmpegEncoder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn run(&self, args: &[String], input: &[u8]) -> Result<()> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
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
        let mut stderr = child.stderr.take().ok_or_else(|| PipelineError::Encoding {
            message: "encoder stderr was not piped".to_string(),
        })?;

        // Feed stdin and drain stderr concurrently; a full stderr pipe
        // would otherwise deadlock a failing encoder against our write.
        let feed = async {
            let outcome = stdin.write_all(input).await;
            drop(stdin);
            outcome
        };
        let drain = async {
            let mut detail = String::new();
            let _ = stderr.read_to_string(&mut detail).await;
            detail
        };
        let (write_outcome, detail) = tokio::join!(feed, drain);

        let status = child.wait().await.map_err(|e| PipelineError::Encoding {
            message: format!("failed to reap {}: {}", self.binary, e),
        })?;

        if !status.success() {
            return Err(PipelineError::Encoding {
                message: format!(
                    "{} exited with {status}: {}",
                    self.binary,
                    detail.trim().lines().last().unwrap_or("no detail")
                ),
            });
        }
        if let Err(e) = write_outcome {
            // Encoder succeeded without consuming all input; unusual
            // enough to note, but its exit code is the verdict.
            warn!(error = %e, "encoder exited before consuming its full input");
        }
        Ok(())
    }
}

/// Scripted encoder for tests.
///
/// Records every invocation's arguments and optionally fails the nth call.
/// On success it creates the invocation's playlist file (the final
/// argument) so output trees look real to callers.
#[derive(Debug, Clone, Default)]
pub struct MockEncoder {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    fail_on_call: Option<usize>,
}

impl MockEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the zero-based nth invocation.
    pub fn with_failure_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Arguments of every invocation so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.lock_calls().clone()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<Vec<String>>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Encoder for MockEncoder {
    async fn run(&self, args: &[String], _input: &[u8]) -> Result<()> {
        let call_index = {
            let mut calls = self.lock_calls();
            calls.push(args.to_vec());
            calls.len() - 1
        };

        if self.fail_on_call == Some(call_index) {
            return Err(PipelineError::Encoding {
                message: format!("scripted failure on call {call_index}"),
            });
        }

        if let Some(playlist) = args.last() {
            tokio::fs::write(playlist, "#EXTM3U\n").await?;
        }
        Ok(())
    }
}
