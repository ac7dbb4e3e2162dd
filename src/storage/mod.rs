//! Chunked object storage.
//!
//! The store is consumed through the [`store::ObjectStore`] capability:
//! stage blocks, commit the ordered block list, download a blob stream.
//! [`uploader::ChunkedUploader`] drives the block protocol over any store.

pub mod azure;
pub mod block_id;
pub mod store;
pub mod uploader;

pub use azure::AzureBlobStore;
pub use store::{MemoryObjectStore, ObjectStore};
pub use uploader::ChunkedUploader;
