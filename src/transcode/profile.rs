//! Rendition profiles for adaptive-bitrate output.

use serde::{Deserialize, Serialize};

/// One encoded output variant of the source video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionSpec {
    /// Output resolution as `WxH`.
    pub resolution: String,
    /// Video bitrate in kbit/s.
    pub video_bitrate_kbps: u32,
    /// Audio bitrate in kbit/s.
    pub audio_bitrate_kbps: u32,
    /// Per-rendition output subdirectory (and playlist stem).
    pub dir: String,
}

impl RenditionSpec {
    pub fn new(
        resolution: impl Into<String>,
        video_bitrate_kbps: u32,
        audio_bitrate_kbps: u32,
        dir: impl Into<String>,
    ) -> Self {
        Self {
            resolution: resolution.into(),
            video_bitrate_kbps,
            audio_bitrate_kbps,
            dir: dir.into(),
        }
    }

    /// Bandwidth advertised in the master manifest, in bit/s.
    pub fn bandwidth(&self) -> u64 {
        self.video_bitrate_kbps as u64 * 1000
    }

    /// Name of this rendition's playlist file.
    pub fn playlist_name(&self) -> String {
        format!("{}.m3u8", self.dir)
    }

    /// The fixed high/medium/low ladder driving a transcode job, in
    /// descending quality order.
    pub fn default_ladder() -> Vec<RenditionSpec> {
        vec![
            RenditionSpec::new("1280x720", 2500, 192, "output_720"),
            RenditionSpec::new("854x480", 1000, 128, "output_480"),
            RenditionSpec::new("320x180", 500, 64, "output_180"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_is_ordered_high_to_low() {
        let ladder = RenditionSpec::default_ladder();
        assert_eq!(ladder.len(), 3);
        assert!(
            ladder
                .windows(2)
                .all(|pair| pair[0].video_bitrate_kbps > pair[1].video_bitrate_kbps)
        );
        assert_eq!(ladder[0].dir, "output_720");
    }

    #[test]
    fn bandwidth_scales_kbps_by_1000() {
        let spec = RenditionSpec::new("1280x720", 2500, 192, "output_720");
        assert_eq!(spec.bandwidth(), 2_500_000);
        assert_eq!(spec.playlist_name(), "output_720.m3u8");
    }
}
