use crate::defaults;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub speech: SpeechConfig,
    pub encoder: EncoderConfig,
}

/// Object-store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage account name; the account host is derived from it.
    pub account: String,
    /// Pre-signed SAS token query string (without the leading '?').
    pub sas_token: String,
    pub audio_container: String,
    pub caption_container: String,
    pub hls_container: String,
}

/// Speech-recognition service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub key: String,
    pub region: String,
    pub language: String,
}

/// External encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EncoderConfig {
    /// Encoder binary to spawn (a PATH name or an absolute path).
    pub binary: String,
    /// Directory that receives per-rendition output trees.
    pub output_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            sas_token: String::new(),
            audio_container: defaults::AUDIO_CONTAINER.to_string(),
            caption_container: defaults::CAPTION_CONTAINER.to_string(),
            hls_container: defaults::HLS_CONTAINER.to_string(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            region: String::new(),
            language: "en-US".to_string(),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            binary: defaults::FFMPEG_BINARY.to_string(),
            output_root: PathBuf::from("hls-output"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if the file is missing
    ///
    /// Only falls back to defaults when the file does not exist; invalid TOML
    /// is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(PipelineError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Default configuration file location (`~/.config/vodpipe/config.toml`).
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("vodpipe")
            .join("config.toml")
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VODPIPE_ACCOUNT → storage.account
    /// - VODPIPE_SAS_TOKEN → storage.sas_token
    /// - VODPIPE_SPEECH_KEY → speech.key
    /// - VODPIPE_SPEECH_REGION → speech.region
    /// - VODPIPE_FFMPEG → encoder.binary
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(account) = std::env::var("VODPIPE_ACCOUNT")
            && !account.is_empty()
        {
            self.storage.account = account;
        }
        if let Ok(token) = std::env::var("VODPIPE_SAS_TOKEN")
            && !token.is_empty()
        {
            self.storage.sas_token = token;
        }
        if let Ok(key) = std::env::var("VODPIPE_SPEECH_KEY")
            && !key.is_empty()
        {
            self.speech.key = key;
        }
        if let Ok(region) = std::env::var("VODPIPE_SPEECH_REGION")
            && !region.is_empty()
        {
            self.speech.region = region;
        }
        if let Ok(binary) = std::env::var("VODPIPE_FFMPEG")
            && !binary.is_empty()
        {
            self.encoder.binary = binary;
        }
        // A SAS token pasted from the portal often keeps its leading '?'
        self.storage.sas_token = self
            .storage
            .sas_token
            .trim_start_matches('?')
            .to_string();
        self
    }

    /// Validates the fields the object store needs before any upload starts.
    pub fn validate_storage(&self) -> Result<()> {
        if self.storage.account.is_empty() {
            return Err(PipelineError::Configuration {
                key: "storage.account".to_string(),
                message: "storage account must be set before uploading".to_string(),
            });
        }
        Ok(())
    }

    /// Validates the fields the recognizer needs before a session starts.
    pub fn validate_speech(&self) -> Result<()> {
        if self.speech.key.is_empty() {
            return Err(PipelineError::Configuration {
                key: "speech.key".to_string(),
                message: "speech service key must be set before transcription".to_string(),
            });
        }
        if self.speech.region.is_empty() {
            return Err(PipelineError::Configuration {
                key: "speech.region".to_string(),
                message: "speech service region must be set before transcription".to_string(),
            });
        }
        Ok(())
    }
}
