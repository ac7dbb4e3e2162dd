//! vodpipe - Media processing pipeline
//!
//! Ingests uploaded video: extracts audio, produces time-aligned captions
//! via a streaming speech-recognition capability, packages adaptive-bitrate
//! HLS renditions, and persists everything to a chunked object store.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod captions;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod storage;
pub mod stream;
pub mod transcode;
pub mod transcribe;

// Capability interfaces (store and recognizer are injected, never global)
pub use storage::store::{MemoryObjectStore, ObjectStore};
pub use transcribe::backend::{MockSpeechBackend, SpeechBackend};

// Pipeline
pub use pipeline::{CaptionArtifacts, MediaPipeline};

// Error handling
pub use error::{PipelineError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.2+abc1234"` when git hash is available, `"0.1.2"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
