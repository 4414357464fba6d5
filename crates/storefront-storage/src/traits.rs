//! Asset store abstraction trait
//!
//! This module defines the AssetStore trait that all backends must implement.

use crate::{AssetStoreBackend, MediaKind, MediaRef};
use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed reader consumed by streaming uploads.
pub type AssetReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Remote asset store
///
/// Backends hold no bookkeeping between calls: everything needed to delete an
/// asset later is in the returned `MediaRef`. Failures are always reported to
/// the caller, which decides whether they are fatal.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload a file into `folder` and return a fresh reference to it.
    ///
    /// The media kind is inferred from `content_type` (`video/*` is a video).
    async fn upload(&self, folder: &str, content_type: &str, data: Bytes)
        -> StorageResult<MediaRef>;

    /// Upload from a reader without buffering the whole payload first.
    ///
    /// The reader is consumed until EOF. `content_length` is a hint only.
    async fn upload_stream(
        &self,
        folder: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: AssetReader,
    ) -> StorageResult<MediaRef>;

    /// Delete an asset. Deleting an id that no longer exists succeeds.
    async fn delete(&self, remote_id: &str, kind: MediaKind) -> StorageResult<()>;

    /// Check whether an asset exists
    async fn exists(&self, remote_id: &str, kind: MediaKind) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> AssetStoreBackend;
}
