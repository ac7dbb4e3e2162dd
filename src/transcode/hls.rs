//! Rendition transcoding and master manifest assembly.
//!
//! Renditions run strictly sequentially: encoder invocations contend for
//! the same cores, and segment numbering must stay deterministic. The
//! first failing rendition aborts the job, and the master manifest is only
//! written once every rendition has fully succeeded, so a partial tree
//! never looks complete.

use crate::defaults;
use crate::error::Result;
use crate::transcode::encoder::Encoder;
use crate::transcode::profile::RenditionSpec;
use std::path::Path;
use tracing::info;

/// Drives one encoder invocation per rendition spec.
pub struct RenditionTranscoder<E: Encoder> {
    encoder: E,
}

impl<E: Encoder> RenditionTranscoder<E> {
    pub fn new(encoder: E) -> Self {
        Self { encoder }
    }

    /// Transcodes `video` into every spec under `output_root`.
    pub async fn transcode(
        &self,
        video: &[u8],
        specs: &[RenditionSpec],
        output_root: &Path,
    ) -> Result<()> {
        tokio::fs::create_dir_all(output_root).await?;

        for (index, spec) in specs.iter().enumerate() {
            tokio::fs::create_dir_all(output_root.join(&spec.dir)).await?;
            info!(
                rendition = %spec.dir,
                resolution = %spec.resolution,
                bitrate_kbps = spec.video_bitrate_kbps,
                "encoding rendition"
            );
            let args = hls_args(spec, index, output_root);
            self.encoder.run(&args, video).await?;
        }

        write_master_playlist(specs, output_root).await?;
        info!(renditions = specs.len(), root = %output_root.display(), "transcode complete");
        Ok(())
    }
}

/// Encoder arguments for one segmented rendition.
fn hls_args(spec: &RenditionSpec, index: usize, output_root: &Path) -> Vec<String> {
    let segment_pattern = output_root
        .join(&spec.dir)
        .join(format!("RES{index}{}-segment_%03d.ts", spec.dir));
    let playlist = output_root.join(&spec.dir).join(spec.playlist_name());

    vec![
        "-i".to_string(),
        "pipe:0".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-b:v".to_string(),
        format!("{}k", spec.video_bitrate_kbps),
        "-s".to_string(),
        spec.resolution.clone(),
        "-profile:v".to_string(),
        "baseline".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        format!("{}k", spec.audio_bitrate_kbps),
        "-ac".to_string(),
        "2".to_string(),
        "-f".to_string(),
        "hls".to_string(),
        "-hls_time".to_string(),
        defaults::SEGMENT_SECONDS.to_string(),
        "-hls_list_size".to_string(),
        defaults::PLAYLIST_SIZE.to_string(),
        "-hls_flags".to_string(),
        "independent_segments".to_string(),
        "-hls_segment_type".to_string(),
        "mpegts".to_string(),
        "-hls_playlist_type".to_string(),
        "vod".to_string(),
        "-hls_segment_filename".to_string(),
        segment_pattern.to_string_lossy().into_owned(),
        playlist.to_string_lossy().into_owned(),
    ]
}

/// Writes the master manifest referencing every rendition playlist.
async fn write_master_playlist(specs: &[RenditionSpec], output_root: &Path) -> Result<()> {
    let content = specs
        .iter()
        .map(|spec| {
            format!(
                "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}\n{}/{}",
                spec.bandwidth(),
                spec.resolution,
                spec.dir,
                spec.playlist_name()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let path = output_root.join(defaults::MASTER_PLAYLIST);
    tokio::fs::write(&path, content).await?;
    info!(path = %path.display(), "master playlist written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::transcode::encoder::MockEncoder;

    #[tokio::test]
    async fn all_renditions_then_master() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = MockEncoder::new();
        let specs = RenditionSpec::default_ladder();

        RenditionTranscoder::new(encoder.clone())
            .transcode(b"videobytes", &specs, dir.path())
            .await
            .unwrap();

        assert_eq!(encoder.calls().len(), 3);
        for spec in &specs {
            assert!(dir.path().join(&spec.dir).join(spec.playlist_name()).exists());
        }

        let master = std::fs::read_to_string(dir.path().join("master.m3u8")).unwrap();
        let expected = "#EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=1280x720\n\
                        output_720/output_720.m3u8\n\
                        #EXT-X-STREAM-INF:BANDWIDTH=1000000,RESOLUTION=854x480\n\
                        output_480/output_480.m3u8\n\
                        #EXT-X-STREAM-INF:BANDWIDTH=500000,RESOLUTION=320x180\n\
                        output_180/output_180.m3u8";
        assert_eq!(master, expected);
    }

    #[tokio::test]
    async fn second_rendition_failure_leaves_no_master() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = MockEncoder::new().with_failure_on_call(1);
        let specs = RenditionSpec::default_ladder();

        let result = RenditionTranscoder::new(encoder.clone())
            .transcode(b"videobytes", &specs, dir.path())
            .await;

        assert!(matches!(result, Err(PipelineError::Encoding { .. })));
        assert!(!dir.path().join("master.m3u8").exists());
        // Fail-fast: the third rendition is never attempted.
        assert_eq!(encoder.calls().len(), 2);
    }

    #[tokio::test]
    async fn renditions_run_sequentially_in_spec_order() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = MockEncoder::new();
        let specs = RenditionSpec::default_ladder();

        RenditionTranscoder::new(encoder.clone())
            .transcode(b"v", &specs, dir.path())
            .await
            .unwrap();

        let calls = encoder.calls();
        for (call, spec) in calls.iter().zip(&specs) {
            let playlist = call.last().unwrap();
            assert!(playlist.ends_with(&spec.playlist_name()), "{playlist}");
        }
    }

    #[test]
    fn segment_filenames_carry_rendition_index_and_dir() {
        let spec = RenditionSpec::new("854x480", 1000, 128, "output_480");
        let args = hls_args(&spec, 1, Path::new("/tmp/job"));
        let joined = args.join(" ");
        assert!(joined.contains("/tmp/job/output_480/RES1output_480-segment_%03d.ts"));
        assert!(joined.ends_with("/tmp/job/output_480/output_480.m3u8"));
        assert!(joined.contains("-hls_time 4"));
        assert!(joined.contains("-hls_list_size 10"));
        assert!(joined.contains("-hls_playlist_type vod"));
    }
}
