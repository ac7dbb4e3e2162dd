//! Object-store capability interface.

use crate::error::{PipelineError, Result};
use crate::stream::{self, ByteStream};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Capability interface over a block-blob object store.
///
/// Blocks are staged individually and become a blob only when the ordered
/// block list is committed. The commit step is order-sensitive: the blob's
/// contents are the staged blocks concatenated in list order.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stages one block against the target blob.
    async fn stage_block(
        &self,
        container: &str,
        blob: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<()>;

    /// Commits the ordered block list, finalizing the blob.
    async fn commit_block_list(&self, container: &str, blob: &str, block_ids: &[String])
    -> Result<()>;

    /// Opens a download stream over a committed blob.
    async fn download(&self, container: &str, blob: &str) -> Result<ByteStream>;

    /// Deterministic URL of a blob, derived from account, container and
    /// blob name rather than any store response.
    fn url(&self, container: &str, blob: &str) -> String;
}

#[derive(Debug, Default)]
struct BlobState {
    staged: HashMap<String, Bytes>,
    committed: Option<Vec<u8>>,
    commit_order: Vec<String>,
}

/// In-memory store for tests and local development.
///
/// Mirrors the commit semantics of the real store, including failure
/// injection for the stage path.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    blobs: Arc<Mutex<HashMap<(String, String), BlobState>>>,
    fail_stage_after: Arc<Mutex<Option<usize>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `stage_block` call after the first `n` fail.
    pub fn with_stage_failure_after(self, n: usize) -> Self {
        *self.lock_failures() = Some(n);
        self
    }

    /// Pre-populates a committed blob, as if uploaded earlier.
    pub fn insert_committed(&self, container: &str, blob: &str, data: Vec<u8>) {
        let mut blobs = self.lock_blobs();
        blobs
            .entry((container.to_string(), blob.to_string()))
            .or_default()
            .committed = Some(data);
    }

    /// Committed contents of a blob, if any.
    pub fn committed(&self, container: &str, blob: &str) -> Option<Vec<u8>> {
        self.lock_blobs()
            .get(&(container.to_string(), blob.to_string()))
            .and_then(|b| b.committed.clone())
    }

    /// Block IDs in the order they were committed.
    pub fn commit_order(&self, container: &str, blob: &str) -> Vec<String> {
        self.lock_blobs()
            .get(&(container.to_string(), blob.to_string()))
            .map(|b| b.commit_order.clone())
            .unwrap_or_default()
    }

    /// Number of staged (possibly uncommitted) blocks for a blob.
    pub fn staged_count(&self, container: &str, blob: &str) -> usize {
        self.lock_blobs()
            .get(&(container.to_string(), blob.to_string()))
            .map(|b| b.staged.len())
            .unwrap_or(0)
    }

    fn lock_blobs(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), BlobState>> {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, Option<usize>> {
        self.fail_stage_after.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn stage_block(
        &self,
        container: &str,
        blob: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<()> {
        if let Some(remaining) = self.lock_failures().as_mut() {
            if *remaining == 0 {
                return Err(PipelineError::Upload {
                    message: "injected stage failure".to_string(),
                });
            }
            *remaining -= 1;
        }

        let mut blobs = self.lock_blobs();
        blobs
            .entry((container.to_string(), blob.to_string()))
            .or_default()
            .staged
            .insert(block_id.to_string(), data);
        Ok(())
    }

    async fn commit_block_list(
        &self,
        container: &str,
        blob: &str,
        block_ids: &[String],
    ) -> Result<()> {
        let mut blobs = self.lock_blobs();
        let state = blobs
            .entry((container.to_string(), blob.to_string()))
            .or_default();

        let mut assembled = Vec::new();
        for id in block_ids {
            let block = state.staged.get(id).ok_or_else(|| PipelineError::Upload {
                message: format!("commit references unstaged block {id}"),
            })?;
            assembled.extend_from_slice(block);
        }
        state.committed = Some(assembled);
        state.commit_order = block_ids.to_vec();
        Ok(())
    }

    async fn download(&self, container: &str, blob: &str) -> Result<ByteStream> {
        let data = self
            .committed(container, blob)
            .ok_or_else(|| PipelineError::Upload {
                message: format!("blob {container}/{blob} does not exist"),
            })?;
        Ok(stream::from_buffer(data))
    }

    fn url(&self, container: &str, blob: &str) -> String {
        format!("https://memory/{container}/{blob}")
    }
}
