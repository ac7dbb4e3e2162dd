//! Default configuration constants for vodpipe.
//!
//! This module provides shared constants used across different pipeline
//! stages to ensure consistency and eliminate duplication.

/// Audio sample rate in Hz for extracted audio.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and recognition accuracy for spoken content.
pub const SAMPLE_RATE: u32 = 16000;

/// Channel count for extracted audio (mono).
pub const AUDIO_CHANNELS: u32 = 1;

/// Recognition-backend time unit: ticks per second, one tick = 100 ns.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks per millisecond, used when formatting cue timestamps.
pub const TICKS_PER_MILLISECOND: i64 = 10_000;

/// Soft cap on a caption cue's summed word duration in seconds.
///
/// Checked before a word is added to the cue, so a single word longer than
/// the cap still forms its own one-word cue.
pub const MAX_CUE_SECONDS: f64 = 5.0;

/// Header line of the generated caption document.
pub const CAPTION_HEADER: &str = "WEBVTT";

/// Upload block size in bytes (4 MiB).
///
/// The block-blob store accepts staged blocks far larger than this; 4 MiB
/// keeps per-block memory bounded while staging incrementally.
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Zero-padding width of the decimal sequence inside a block ID.
pub const BLOCK_ID_PAD: usize = 5;

/// Read size for pumping bytes between streams and subprocess pipes.
pub const IO_CHUNK_BYTES: usize = 64 * 1024;

/// Capacity of the channels that carry byte chunks between stages.
pub const STREAM_CHANNEL_CAPACITY: usize = 32;

/// Capacity of the recognition event channel for one session.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// HLS segment duration in seconds.
pub const SEGMENT_SECONDS: u32 = 4;

/// HLS playlist size passed to the encoder.
pub const PLAYLIST_SIZE: u32 = 10;

/// Name of the master manifest written after all renditions succeed.
pub const MASTER_PLAYLIST: &str = "master.m3u8";

/// Default external encoder binary.
pub const FFMPEG_BINARY: &str = "ffmpeg";

/// Default container for extracted audio blobs.
pub const AUDIO_CONTAINER: &str = "audio";

/// Default container for caption and transcript artifacts.
pub const CAPTION_CONTAINER: &str = "captions";

/// Default container for packaged HLS output.
pub const HLS_CONTAINER: &str = "hlsstreaming";
