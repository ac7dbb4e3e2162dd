//! Chunked blob upload.
//!
//! Blocks are staged incrementally as the input stream arrives, so memory
//! stays bounded by the block size regardless of blob size. The commit
//! step is order-sensitive: IDs are generated and committed in ascending
//! sequence order, and the manifest list (not staging completion order) is
//! the source of truth for reassembly.

use crate::defaults;
use crate::error::{PipelineError, Result};
use crate::storage::block_id;
use crate::storage::store::ObjectStore;
use crate::stream::ByteStream;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ephemeral state for one upload call.
///
/// Exclusively owned by the in-flight upload; destroyed when the commit
/// succeeds or fails, never reused across retries.
struct UploadSession {
    container: String,
    blob: String,
    block_ids: Vec<String>,
    pending: Vec<u8>,
    sequence: u32,
    bytes_staged: u64,
}

/// Uploads byte streams as block blobs.
pub struct ChunkedUploader {
    store: Arc<dyn ObjectStore>,
    block_size: usize,
}

impl ChunkedUploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            block_size: defaults::BLOCK_SIZE,
        }
    }

    /// Overrides the block size (tests use small blocks).
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Streams `input` into `container/blob` and returns the blob's
    /// deterministic URL.
    ///
    /// Any stream or store failure aborts the whole upload. Already-staged
    /// blocks cannot be deleted through the capability surface; they are
    /// left to the store's uncommitted-block expiry.
    pub async fn upload(
        &self,
        container: &str,
        blob: &str,
        mut input: ByteStream,
    ) -> Result<String> {
        let mut session = UploadSession {
            container: container.to_string(),
            blob: blob.to_string(),
            block_ids: Vec::new(),
            pending: Vec::new(),
            sequence: 0,
            bytes_staged: 0,
        };

        while let Some(chunk) = input.recv().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return Err(self.abandon(session, e)),
            };
            session.pending.extend_from_slice(&chunk);

            while session.pending.len() >= self.block_size {
                let block: Vec<u8> = session.pending.drain(..self.block_size).collect();
                if let Err(e) = self.stage(&mut session, Bytes::from(block)).await {
                    return Err(self.abandon(session, e));
                }
            }
        }

        if !session.pending.is_empty() {
            let tail = Bytes::from(std::mem::take(&mut session.pending));
            if let Err(e) = self.stage(&mut session, tail).await {
                return Err(self.abandon(session, e));
            }
        }

        self.store
            .commit_block_list(&session.container, &session.blob, &session.block_ids)
            .await
            .map_err(|e| self.abandon_commit(&session, e))?;

        info!(
            container = %session.container,
            blob = %session.blob,
            blocks = session.block_ids.len(),
            bytes = session.bytes_staged,
            "blob committed"
        );
        Ok(self.store.url(container, blob))
    }

    async fn stage(&self, session: &mut UploadSession, block: Bytes) -> Result<()> {
        let id = block_id::encode(session.sequence);
        let len = block.len();
        self.store
            .stage_block(&session.container, &session.blob, &id, block)
            .await?;
        session.bytes_staged += len as u64;
        debug!(
            blob = %session.blob,
            sequence = session.sequence,
            bytes = session.bytes_staged,
            "block staged"
        );
        session.block_ids.push(id);
        session.sequence += 1;
        Ok(())
    }

    fn abandon(&self, session: UploadSession, cause: PipelineError) -> PipelineError {
        if !session.block_ids.is_empty() {
            warn!(
                container = %session.container,
                blob = %session.blob,
                staged = session.block_ids.len(),
                "upload abandoned; staged blocks await store-side expiry"
            );
        }
        cause
    }

    fn abandon_commit(&self, session: &UploadSession, cause: PipelineError) -> PipelineError {
        warn!(
            container = %session.container,
            blob = %session.blob,
            staged = session.block_ids.len(),
            "commit failed; staged blocks await store-side expiry"
        );
        cause
    }
}
