//! Multi-rendition transcoding to segmented HLS output.

pub mod encoder;
pub mod hls;
pub mod profile;

pub use encoder::{Encoder, FfmpegEncoder, MockEncoder};
pub use hls::RenditionTranscoder;
pub use profile::RenditionSpec;
