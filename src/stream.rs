//! Byte-stream plumbing between pipeline stages.
//!
//! Stages hand bytes to each other through bounded channels of
//! `Result<Bytes>` chunks. A producer that hits an error sends one `Err`
//! item and closes the channel, so failures travel in-band and every
//! consumer decides whether a truncated stream is fatal for it.

use crate::defaults;
use crate::error::{PipelineError, Result};
use bytes::Bytes;
use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

/// Receiving end of a chunked byte stream.
pub type ByteStream = mpsc::Receiver<Result<Bytes>>;

/// Sending end of a chunked byte stream.
pub type ByteSink = mpsc::Sender<Result<Bytes>>;

/// Creates a connected sink/stream pair with the default capacity.
pub fn channel() -> (ByteSink, ByteStream) {
    mpsc::channel(defaults::STREAM_CHANNEL_CAPACITY)
}

/// Turns an in-memory buffer into a stream of fixed-size chunks.
pub fn from_buffer(data: Vec<u8>) -> ByteStream {
    let data = Bytes::from(data);
    let (tx, rx) = channel();
    tokio::spawn(async move {
        let mut offset = 0;
        while offset < data.len() {
            let end = usize::min(offset + defaults::IO_CHUNK_BYTES, data.len());
            if tx.send(Ok(data.slice(offset..end))).await.is_err() {
                break;
            }
            offset = end;
        }
    });
    rx
}

/// Streams a file from disk.
pub fn from_file(path: &Path) -> ByteStream {
    let path = path.to_path_buf();
    let (tx, rx) = channel();
    tokio::spawn(async move {
        let mut file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                let _ = tx
                    .send(Err(PipelineError::Stream {
                        message: format!("failed to open {}: {}", path.display(), e),
                    }))
                    .await;
                return;
            }
        };
        let mut buf = vec![0u8; defaults::IO_CHUNK_BYTES];
        loop {
            match file.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(Ok(Bytes::copy_from_slice(&buf[..n]))).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx
                        .send(Err(PipelineError::Stream {
                            message: format!("failed to read {}: {}", path.display(), e),
                        }))
                        .await;
                    break;
                }
            }
        }
    });
    rx
}

/// Fetches a URL and exposes the response body as a byte stream.
///
/// The request is issued before this returns, so a bad URL or non-success
/// status fails immediately rather than mid-stream.
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<ByteStream> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| PipelineError::Stream {
            message: format!("failed to fetch {url}: {e}"),
        })?;

    if !response.status().is_success() {
        return Err(PipelineError::Stream {
            message: format!("fetch of {url} returned status {}", response.status()),
        });
    }

    let (tx, rx) = channel();
    tokio::spawn(async move {
        let mut body = response.bytes_stream();
        while let Some(item) = body.next().await {
            let item = item.map_err(|e| PipelineError::Stream {
                message: format!("body stream failed: {e}"),
            });
            let failed = item.is_err();
            if tx.send(item).await.is_err() || failed {
                break;
            }
        }
    });
    Ok(rx)
}

/// Drains a stream into one contiguous buffer.
///
/// Bounded-memory staging is preferred where possible; this exists for the
/// transcode flow, whose encoder consumes the whole source from stdin.
pub async fn collect(mut stream: ByteStream) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.recv().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn buffer_roundtrip() {
        let data: Vec<u8> = (0..200_000).map(|i| (i % 251) as u8).collect();
        let collected = collect(from_buffer(data.clone())).await.unwrap();
        assert_eq!(collected, data);
    }

    #[tokio::test]
    async fn buffer_stream_is_chunked() {
        let data = vec![7u8; defaults::IO_CHUNK_BYTES * 2 + 1];
        let mut stream = from_buffer(data);
        let mut sizes = Vec::new();
        while let Some(chunk) = stream.recv().await {
            sizes.push(chunk.unwrap().len());
        }
        assert_eq!(
            sizes,
            vec![defaults::IO_CHUNK_BYTES, defaults::IO_CHUNK_BYTES, 1]
        );
    }

    #[tokio::test]
    async fn empty_buffer_yields_empty_stream() {
        let collected = collect(from_buffer(Vec::new())).await.unwrap();
        assert!(collected.is_empty());
    }

    #[tokio::test]
    async fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        let data = vec![42u8; 100_000];
        std::fs::write(&path, &data).unwrap();

        let collected = collect(from_file(&path)).await.unwrap();
        assert_eq!(collected, data);
    }

    #[tokio::test]
    async fn missing_file_surfaces_stream_error() {
        let result = collect(from_file(Path::new("/no/such/file.bin"))).await;
        assert!(matches!(result, Err(PipelineError::Stream { .. })));
    }

    #[tokio::test]
    async fn collect_stops_at_error_item() {
        let (tx, rx) = channel();
        tx.send(Ok(Bytes::from_static(b"abc"))).await.unwrap();
        tx.send(Err(PipelineError::Stream {
            message: "mid-stream failure".to_string(),
        }))
        .await
        .unwrap();
        drop(tx);

        let result = collect(rx).await;
        assert!(matches!(result, Err(PipelineError::Stream { .. })));
    }
}
