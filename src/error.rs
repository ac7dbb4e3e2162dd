//! Error types for vodpipe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    // Broken input or output byte stream
    #[error("Stream error: {message}")]
    Stream { message: String },

    // Recognizer reported a non-empty error detail
    #[error("Transcription error: {message}")]
    Transcription { message: String },

    // External encoder failed to spawn or exited non-zero
    #[error("Encoding failed: {message}")]
    Encoding { message: String },

    // Object store rejected a stage or commit call
    #[error("Upload failed: {message}")]
    Upload { message: String },

    // Missing credential/region/key before a session starts
    #[error("Invalid configuration value for {key}: {message}")]
    Configuration { key: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_stream_display() {
        let error = PipelineError::Stream {
            message: "socket closed mid-transfer".to_string(),
        };
        assert_eq!(error.to_string(), "Stream error: socket closed mid-transfer");
    }

    #[test]
    fn test_transcription_display() {
        let error = PipelineError::Transcription {
            message: "connection reset by recognizer".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Transcription error: connection reset by recognizer"
        );
    }

    #[test]
    fn test_encoding_display() {
        let error = PipelineError::Encoding {
            message: "ffmpeg exited with code 1".to_string(),
        };
        assert_eq!(error.to_string(), "Encoding failed: ffmpeg exited with code 1");
    }

    #[test]
    fn test_upload_display() {
        let error = PipelineError::Upload {
            message: "commit rejected".to_string(),
        };
        assert_eq!(error.to_string(), "Upload failed: commit rejected");
    }

    #[test]
    fn test_configuration_display() {
        let error = PipelineError::Configuration {
            key: "speech.key".to_string(),
            message: "must be set before transcription".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for speech.key: must be set before transcription"
        );
    }

    #[test]
    fn test_other_display() {
        let error = PipelineError::Other("unexpected error".to_string());
        assert_eq!(error.to_string(), "unexpected error");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: PipelineError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: PipelineError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);

        fn returns_error() -> Result<i32> {
            Err(PipelineError::Other("test error".to_string()))
        }
        assert!(returns_error().is_err());
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: PipelineError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<PipelineError>();
        assert_sync::<PipelineError>();
    }

    #[test]
    fn test_error_debug_format() {
        let error = PipelineError::Configuration {
            key: "storage.account".to_string(),
            message: "missing".to_string(),
        };
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("Configuration"));
        assert!(debug_str.contains("storage.account"));
    }
}
