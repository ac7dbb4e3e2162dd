//! Media pipeline orchestration.
//!
//! Composes the pipeline stages into the two end-to-end flows:
//! video URL → extracted audio → uploaded audio blob, audio blob →
//! transcript + captions → uploaded caption artifacts, and video URL →
//! multi-rendition HLS tree → uploaded folder. Capabilities are
//! constructed once at process start and passed in; nothing here holds
//! hidden global state.

use crate::audio::extractor::{AudioExtractor, ExtractedAudio};
use crate::audio::wav;
use crate::captions;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::storage::store::ObjectStore;
use crate::storage::uploader::ChunkedUploader;
use crate::stream;
use crate::transcode::encoder::FfmpegEncoder;
use crate::transcode::hls::RenditionTranscoder;
use crate::transcode::profile::RenditionSpec;
use crate::transcribe::backend::SpeechBackend;
use crate::transcribe::session::StreamingTranscriber;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// URLs of the artifacts produced by the caption flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionArtifacts {
    pub caption_url: String,
    pub transcript_url: String,
}

/// Orchestrates the media processing flows over injected capabilities.
pub struct MediaPipeline {
    store: Arc<dyn ObjectStore>,
    speech: Arc<dyn SpeechBackend>,
    http: reqwest::Client,
    config: Config,
}

impl MediaPipeline {
    pub fn new(store: Arc<dyn ObjectStore>, speech: Arc<dyn SpeechBackend>, config: Config) -> Self {
        Self {
            store,
            speech,
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Flow (a), ingest half: fetches the source video, extracts its
    /// audio track and uploads it. Returns the audio blob name.
    pub async fn ingest_audio(&self, video_url: &str) -> Result<String> {
        let blob = audio_blob_name(video_url)?;
        info!(url = %video_url, blob = %blob, "ingesting source video");

        let input = stream::fetch(&self.http, video_url).await?;
        let extractor = AudioExtractor::new(&self.config.encoder.binary);
        let ExtractedAudio { stream: audio, completion } = extractor.extract(input)?;

        let uploader = ChunkedUploader::new(self.store.clone());
        let upload_outcome = uploader
            .upload(&self.config.storage.audio_container, &blob, audio)
            .await;

        // The extractor's verdict is the root cause when both fail.
        completion.finish().await?;
        let url = upload_outcome?;

        info!(%url, "audio uploaded");
        Ok(blob)
    }

    /// Flow (a), caption half: downloads an audio blob, transcribes it
    /// and uploads the caption track plus the flattened transcript.
    pub async fn build_captions(&self, audio_blob: &str) -> Result<CaptionArtifacts> {
        info!(blob = %audio_blob, "building captions");
        let audio = self
            .store
            .download(&self.config.storage.audio_container, audio_blob)
            .await?;
        let audio = wav::probe_and_log(audio);

        let transcriber = StreamingTranscriber::new(self.speech.clone());
        let output = transcriber.transcribe(audio).await?;

        let captions = captions::build_captions(&output.words);
        let transcript = captions::build_transcript(&output.results);

        let stem = audio_blob.strip_suffix(".wav").unwrap_or(audio_blob);
        let uploader = ChunkedUploader::new(self.store.clone());
        let container = &self.config.storage.caption_container;

        let caption_url = uploader
            .upload(
                container,
                &format!("{stem}.vtt"),
                stream::from_buffer(captions.into_bytes()),
            )
            .await?;
        let transcript_url = uploader
            .upload(
                container,
                &format!("{stem}.txt"),
                stream::from_buffer(transcript.into_bytes()),
            )
            .await?;

        info!(%caption_url, %transcript_url, "caption artifacts uploaded");
        Ok(CaptionArtifacts {
            caption_url,
            transcript_url,
        })
    }

    /// Flow (b): fetches the source video, transcodes the rendition
    /// ladder and uploads the output tree. Returns the master manifest's
    /// blob URL.
    pub async fn package_hls(&self, video_url: &str) -> Result<String> {
        let prefix = source_stem(video_url)?;
        let output_root = self.config.encoder.output_root.join(&prefix);
        info!(url = %video_url, root = %output_root.display(), "packaging renditions");

        let video = stream::collect(stream::fetch(&self.http, video_url).await?).await?;

        let transcoder = RenditionTranscoder::new(FfmpegEncoder::new(&self.config.encoder.binary));
        let specs = RenditionSpec::default_ladder();
        transcoder.transcode(&video, &specs, &output_root).await?;

        self.upload_tree(&output_root, &self.config.storage.hls_container, &prefix)
            .await?;

        Ok(self.store.url(
            &self.config.storage.hls_container,
            &format!("{prefix}/{}", crate::defaults::MASTER_PLAYLIST),
        ))
    }

    /// Uploads every file under `root`, preserving relative paths below
    /// the `prefix` folder.
    async fn upload_tree(&self, root: &Path, container: &str, prefix: &str) -> Result<()> {
        let uploader = ChunkedUploader::new(self.store.clone());
        let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let relative = path
                    .strip_prefix(root)
                    .map_err(|e| PipelineError::Other(format!("path escapes output root: {e}")))?;
                let blob = format!("{prefix}/{}", to_blob_path(relative));
                uploader
                    .upload(container, &blob, stream::from_file(&path))
                    .await?;
            }
        }
        info!(container, prefix, "output tree uploaded");
        Ok(())
    }
}

/// Joins path components with `/` regardless of platform separator.
fn to_blob_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Derives the audio blob name from the source video URL.
fn audio_blob_name(video_url: &str) -> Result<String> {
    Ok(format!("{}.wav", source_stem(video_url)?))
}

/// File stem of the URL's final path segment.
fn source_stem(video_url: &str) -> Result<String> {
    let parsed = reqwest::Url::parse(video_url).map_err(|e| PipelineError::Other(format!(
        "invalid source URL {video_url}: {e}"
    )))?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PipelineError::Other(format!("source URL {video_url} has no file name")))?;
    let stem = Path::new(segment)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PipelineError::Other(format!("source URL {video_url} has no file stem")))?;
    Ok(stem)
}
