//! WAV header inspection for downloaded audio blobs.

use crate::stream::{self, ByteStream};
use std::io::Cursor;
use tracing::{debug, info};

/// Parsed facts from a WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

/// Parses the WAV header at the front of `data`, if one is present.
///
/// Only the header is needed; the sample data may be truncated.
pub fn probe_header(data: &[u8]) -> Option<WavFormat> {
    let reader = hound::WavReader::new(Cursor::new(data)).ok()?;
    let spec = reader.spec();
    Some(WavFormat {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
    })
}

/// Logs the audio format found at the head of `input` and passes the
/// stream through untouched.
///
/// An unparseable header is logged and otherwise ignored; the recognizer
/// is the authority on whether it can consume the bytes.
pub fn probe_and_log(mut input: ByteStream) -> ByteStream {
    let (tx, rx) = stream::channel();
    tokio::spawn(async move {
        let mut first = true;
        while let Some(chunk) = input.recv().await {
            if first {
                first = false;
                if let Ok(chunk) = &chunk {
                    match probe_header(chunk) {
                        Some(format) => info!(
                            sample_rate = format.sample_rate,
                            channels = format.channels,
                            bits = format.bits_per_sample,
                            "audio blob format"
                        ),
                        None => debug!("audio blob does not start with a parseable WAV header"),
                    }
                }
            }
            if tx.send(chunk).await.is_err() {
                break;
            }
        }
    });
    rx
}
