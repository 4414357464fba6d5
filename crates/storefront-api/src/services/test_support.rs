//! In-memory asset store with failure injection for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use storefront_core::models::{MediaKind, MediaRef};
use storefront_core::AssetStoreBackend;
use storefront_storage::{AssetReader, AssetStore, StorageError, StorageResult};
use tokio::io::AsyncReadExt;
use tokio::sync::Barrier;
use uuid::Uuid;

use super::UploadFile;

pub(crate) fn file(name: &str, content_type: &str) -> UploadFile {
    UploadFile::from_bytes(name, content_type, Bytes::from(format!("bytes of {}", name)))
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    objects: Mutex<HashMap<String, MediaKind>>,
    payloads: Mutex<HashMap<String, Bytes>>,
    stream_uploads: AtomicUsize,
    log: Mutex<Vec<String>>,
    uploads: AtomicUsize,
    fail_upload_number: AtomicUsize,
    fail_deletes: AtomicBool,
    barrier: Option<Arc<Barrier>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every upload waits on `barrier` before completing.
    pub(crate) fn with_upload_barrier(barrier: Arc<Barrier>) -> Self {
        Self {
            barrier: Some(barrier),
            ..Self::default()
        }
    }

    /// Makes the n-th upload (1-based, counted over the store's lifetime) fail.
    pub(crate) fn fail_upload_number(&self, n: usize) {
        self.fail_upload_number.store(n, Ordering::SeqCst);
    }

    pub(crate) fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub(crate) fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub(crate) fn contains(&self, remote_id: &str) -> bool {
        self.objects.lock().unwrap().contains_key(remote_id)
    }

    /// Uploads that came in through `upload_stream`.
    pub(crate) fn stream_upload_count(&self) -> usize {
        self.stream_uploads.load(Ordering::SeqCst)
    }

    pub(crate) fn payload(&self, remote_id: &str) -> Option<Bytes> {
        self.payloads.lock().unwrap().get(remote_id).cloned()
    }

    /// Remote ids of successful uploads, oldest first.
    pub(crate) fn upload_log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn upload(&self, folder: &str, content_type: &str, data: Bytes) -> StorageResult<MediaRef> {
        let number = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if number == self.fail_upload_number.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("injected failure".to_string()));
        }

        let remote_id = format!("{}/{}", folder, Uuid::new_v4());
        let kind = MediaKind::from_mime(content_type);
        self.objects.lock().unwrap().insert(remote_id.clone(), kind);
        self.payloads.lock().unwrap().insert(remote_id.clone(), data);
        self.log.lock().unwrap().push(remote_id.clone());
        Ok(MediaRef::new(format!("memory://{}", remote_id), remote_id, kind))
    }

    async fn upload_stream(
        &self,
        folder: &str,
        content_type: &str,
        _content_length: Option<u64>,
        mut reader: AssetReader,
    ) -> StorageResult<MediaRef> {
        self.stream_uploads.fetch_add(1, Ordering::SeqCst);
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await?;
        self.upload(folder, content_type, Bytes::from(buffer)).await
    }

    async fn delete(&self, remote_id: &str, _kind: MediaKind) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("injected failure".to_string()));
        }
        self.objects.lock().unwrap().remove(remote_id);
        Ok(())
    }

    async fn exists(&self, remote_id: &str, _kind: MediaKind) -> StorageResult<bool> {
        Ok(self.contains(remote_id))
    }

    fn backend_type(&self) -> AssetStoreBackend {
        AssetStoreBackend::Local
    }
}
