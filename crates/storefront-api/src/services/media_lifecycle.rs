//! Media lifecycle orchestration for catalog entities.
//!
//! Sequences asset store uploads and deletes around repository writes so that
//! every persisted `MediaRef` points at a stored object:
//!
//! - uploads happen before the document is touched; a failed upload deletes
//!   everything the request already uploaded and persists nothing
//! - a failed write (conflict, database error) deletes the request's uploads
//! - replaced or removed refs are deleted remotely only after the write
//!   succeeded; those deletes are best-effort and come back as [`DeleteError`]s
//!
//! Kind-specific rules (folders, featured slot, required media) come from
//! [`CatalogKind`], so one service covers every catalog collection.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use storefront_core::models::{CatalogEntity, CatalogFields, CatalogKind, MediaKind, MediaRef};
use storefront_core::AppError;
use storefront_db::CatalogRepository;
use storefront_storage::{AssetReader, AssetStore, StorageError};
use tempfile::TempPath;
use thiserror::Error;
use uuid::Uuid;

/// A file taken from a request, already size and type checked.
///
/// Request files are spooled to a temp file while the multipart body is read
/// and streamed to the asset store from there. The spool file is removed when
/// the `UploadFile` is dropped.
#[derive(Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    body: UploadBody,
}

#[derive(Debug)]
enum UploadBody {
    Memory(Bytes),
    Spooled(TempPath),
}

impl UploadFile {
    pub fn from_bytes(file_name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size_bytes: data.len() as u64,
            body: UploadBody::Memory(data),
        }
    }

    pub fn spooled(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        size_bytes: u64,
        path: TempPath,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size_bytes,
            body: UploadBody::Spooled(path),
        }
    }

    pub fn is_spooled(&self) -> bool {
        matches!(self.body, UploadBody::Spooled(_))
    }

    /// Opens a fresh reader over the payload.
    pub async fn reader(&self) -> std::io::Result<AssetReader> {
        match &self.body {
            UploadBody::Memory(data) => Ok(Box::pin(std::io::Cursor::new(data.clone()))),
            UploadBody::Spooled(path) => {
                let file = tokio::fs::File::open(path).await?;
                Ok(Box::pin(file))
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Upload of '{file_name}' failed: {source}")]
    Upload {
        file_name: String,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Upload { file_name, source } => AppError::UploadFailed {
                file_name,
                reason: source.to_string(),
            },
            MediaError::App(err) => err,
        }
    }
}

/// A remote delete that failed after the local reference was already dropped.
///
/// The object is left behind in the asset store.
#[derive(Debug, Clone, Error, Serialize)]
#[error("Failed to delete remote asset {remote_id}: {reason}")]
pub struct DeleteError {
    pub remote_id: String,
    pub kind: MediaKind,
    pub reason: String,
}

/// Result of a persisted mutation plus the remote deletes that failed after it.
#[derive(Debug)]
pub struct MediaOutcome<T> {
    pub value: T,
    pub delete_failures: Vec<DeleteError>,
}

impl<T> MediaOutcome<T> {
    /// Logs every leaked asset and returns the value.
    pub fn log_failures(self, operation: &'static str) -> T {
        for failure in &self.delete_failures {
            tracing::warn!(
                operation,
                remote_id = %failure.remote_id,
                kind = %failure.kind,
                reason = %failure.reason,
                "Remote asset left behind after failed delete"
            );
        }
        self.value
    }
}

pub(crate) async fn delete_remote(store: &dyn AssetStore, media: &MediaRef) -> Result<(), DeleteError> {
    store
        .delete(&media.remote_id, media.kind)
        .await
        .map_err(|e| DeleteError {
            remote_id: media.remote_id.clone(),
            kind: media.kind,
            reason: e.to_string(),
        })
}

/// Deletes every ref, collecting failures instead of stopping at the first.
pub(crate) async fn delete_all(store: &dyn AssetStore, refs: &[MediaRef]) -> Vec<DeleteError> {
    let mut failures = Vec::new();
    for media in refs {
        if let Err(failure) = delete_remote(store, media).await {
            failures.push(failure);
        }
    }
    failures
}

pub(crate) async fn delete_replaced(
    store: &dyn AssetStore,
    previous: Option<MediaRef>,
) -> Vec<DeleteError> {
    match previous {
        Some(media) => delete_remote(store, &media).await.err().into_iter().collect(),
        None => Vec::new(),
    }
}

/// Objects uploaded by the current request, deleted again if the request fails.
pub(crate) struct StagedUploads<'a> {
    store: &'a dyn AssetStore,
    uploaded: Vec<MediaRef>,
}

impl<'a> StagedUploads<'a> {
    pub(crate) fn new(store: &'a dyn AssetStore) -> Self {
        Self {
            store,
            uploaded: Vec::new(),
        }
    }

    pub(crate) async fn upload(
        &mut self,
        folder: &str,
        file: UploadFile,
    ) -> Result<MediaRef, MediaError> {
        let size_bytes = file.size_bytes;
        let result = match file.reader().await {
            Ok(reader) => {
                self.store
                    .upload_stream(folder, &file.content_type, Some(size_bytes), reader)
                    .await
            }
            Err(e) => Err(StorageError::IoError(e)),
        };
        match result {
            Ok(media) => {
                tracing::debug!(
                    file_name = %file.file_name,
                    remote_id = %media.remote_id,
                    kind = %media.kind,
                    size_bytes,
                    "Asset uploaded"
                );
                self.uploaded.push(media.clone());
                Ok(media)
            }
            Err(source) => {
                tracing::warn!(
                    file_name = %file.file_name,
                    error = %source,
                    staged = self.uploaded.len(),
                    "Upload failed, discarding this request's uploads"
                );
                self.rollback().await;
                Err(MediaError::Upload {
                    file_name: file.file_name,
                    source,
                })
            }
        }
    }

    /// Uploads in submission order; the returned refs keep that order.
    pub(crate) async fn upload_all(
        &mut self,
        folder: &str,
        files: Vec<UploadFile>,
    ) -> Result<Vec<MediaRef>, MediaError> {
        let mut refs = Vec::with_capacity(files.len());
        for file in files {
            refs.push(self.upload(folder, file).await?);
        }
        Ok(refs)
    }

    async fn rollback(&mut self) {
        let uploaded = std::mem::take(&mut self.uploaded);
        for failure in delete_all(self.store, &uploaded).await {
            tracing::warn!(
                remote_id = %failure.remote_id,
                reason = %failure.reason,
                "Rollback delete failed, asset left behind"
            );
        }
    }

    /// Awaits the write; when it fails, the staged uploads are deleted.
    pub(crate) async fn commit<T, F>(mut self, write: F) -> Result<T, MediaError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match write.await {
            Ok(value) => Ok(value),
            Err(err) => {
                self.rollback().await;
                Err(err.into())
            }
        }
    }
}

/// Catalog media orchestrator, generic over [`CatalogKind`].
#[derive(Clone)]
pub struct MediaLifecycleService {
    store: Arc<dyn AssetStore>,
    catalog: Arc<dyn CatalogRepository>,
    max_gallery_files: usize,
}

impl MediaLifecycleService {
    pub fn new(
        store: Arc<dyn AssetStore>,
        catalog: Arc<dyn CatalogRepository>,
        max_gallery_files: usize,
    ) -> Self {
        Self {
            store,
            catalog,
            max_gallery_files,
        }
    }

    fn check_files(
        &self,
        kind: CatalogKind,
        has_featured: bool,
        gallery_count: usize,
    ) -> Result<(), AppError> {
        if has_featured && !kind.has_featured_slot() {
            return Err(AppError::InvalidInput(format!(
                "{} entries have no featured image",
                kind.label()
            )));
        }
        if gallery_count > self.max_gallery_files {
            return Err(AppError::PayloadTooLarge(format!(
                "At most {} {} files per request",
                self.max_gallery_files,
                kind.gallery_field()
            )));
        }
        Ok(())
    }

    /// Uploads the featured file and the gallery, then inserts the entity once.
    #[tracing::instrument(
        skip(self, fields, featured, gallery),
        fields(kind = %kind, has_featured = featured.is_some(), gallery_files = gallery.len())
    )]
    pub async fn create_with_media(
        &self,
        kind: CatalogKind,
        fields: CatalogFields,
        featured: Option<UploadFile>,
        gallery: Vec<UploadFile>,
    ) -> Result<CatalogEntity, MediaError> {
        fields.validate_for_create(kind)?;
        self.check_files(kind, featured.is_some(), gallery.len())?;
        if kind.requires_media_on_create() && gallery.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "At least one {} file is required",
                kind.gallery_field()
            ))
            .into());
        }

        let mut entity = CatalogEntity::new(kind, fields);
        let mut staged = StagedUploads::new(self.store.as_ref());
        if let Some(file) = featured {
            entity.featured_image = Some(staged.upload(kind.folder(), file).await?);
        }
        entity.gallery = staged.upload_all(kind.gallery_folder(), gallery).await?;

        let created = staged.commit(self.catalog.create(entity)).await?;
        tracing::info!(
            entity_id = %created.id,
            gallery_len = created.gallery.len(),
            "Catalog entry created"
        );
        Ok(created)
    }

    /// Applies field changes, swaps the featured image when one was sent and
    /// appends gallery files, all in one versioned write.
    #[tracing::instrument(
        skip(self, fields, featured, gallery),
        fields(kind = %kind, entity_id = %id, has_featured = featured.is_some(), gallery_files = gallery.len())
    )]
    pub async fn update_with_media(
        &self,
        kind: CatalogKind,
        id: Uuid,
        fields: CatalogFields,
        featured: Option<UploadFile>,
        gallery: Vec<UploadFile>,
    ) -> Result<MediaOutcome<CatalogEntity>, MediaError> {
        fields.validate_for_update(kind)?;
        self.check_files(kind, featured.is_some(), gallery.len())?;

        let mut entity = self.catalog.get(kind, id).await?;
        let mut staged = StagedUploads::new(self.store.as_ref());
        let new_featured = match featured {
            Some(file) => Some(staged.upload(kind.folder(), file).await?),
            None => None,
        };
        let appended = staged.upload_all(kind.gallery_folder(), gallery).await?;

        entity.apply(fields);
        let previous = new_featured.and_then(|media| entity.featured_image.replace(media));
        entity.gallery.extend(appended);

        let saved = staged.commit(self.catalog.save(entity)).await?;
        let delete_failures = delete_replaced(self.store.as_ref(), previous).await;
        tracing::info!(version = saved.version, "Catalog entry updated");

        Ok(MediaOutcome {
            value: saved,
            delete_failures,
        })
    }

    /// Upload, swap and persist, then delete the old featured object.
    #[tracing::instrument(skip(self, file), fields(kind = %kind, entity_id = %id, file_name = %file.file_name))]
    pub async fn replace_featured(
        &self,
        kind: CatalogKind,
        id: Uuid,
        file: UploadFile,
    ) -> Result<MediaOutcome<CatalogEntity>, MediaError> {
        self.check_files(kind, true, 0)?;

        let mut entity = self.catalog.get(kind, id).await?;
        let mut staged = StagedUploads::new(self.store.as_ref());
        let media = staged.upload(kind.folder(), file).await?;
        let previous = entity.featured_image.replace(media);

        let saved = staged.commit(self.catalog.save(entity)).await?;
        let delete_failures = delete_replaced(self.store.as_ref(), previous).await;

        Ok(MediaOutcome {
            value: saved,
            delete_failures,
        })
    }

    /// Uploads every file, then appends them in submission order with one write.
    #[tracing::instrument(skip(self, files), fields(kind = %kind, entity_id = %id, files = files.len()))]
    pub async fn append_gallery(
        &self,
        kind: CatalogKind,
        id: Uuid,
        files: Vec<UploadFile>,
    ) -> Result<CatalogEntity, MediaError> {
        if files.is_empty() {
            return Err(AppError::InvalidInput("No files provided".to_string()).into());
        }
        self.check_files(kind, false, files.len())?;

        let mut entity = self.catalog.get(kind, id).await?;
        let mut staged = StagedUploads::new(self.store.as_ref());
        let appended = staged.upload_all(kind.gallery_folder(), files).await?;
        entity.gallery.extend(appended);

        let saved = staged.commit(self.catalog.save(entity)).await?;
        tracing::info!(gallery_len = saved.gallery.len(), "Gallery extended");
        Ok(saved)
    }

    /// Drops one gallery ref, persists, then deletes the object remotely.
    #[tracing::instrument(skip(self), fields(kind = %kind, entity_id = %id, item_id = %item_id))]
    pub async fn remove_gallery_item(
        &self,
        kind: CatalogKind,
        id: Uuid,
        item_id: Uuid,
    ) -> Result<MediaOutcome<CatalogEntity>, MediaError> {
        let mut entity = self.catalog.get(kind, id).await?;
        let removed = entity
            .remove_gallery_item(item_id)
            .ok_or_else(|| AppError::NotFound("Gallery item not found".to_string()))?;

        let saved = self.catalog.save(entity).await?;
        let delete_failures = delete_replaced(self.store.as_ref(), Some(removed)).await;

        Ok(MediaOutcome {
            value: saved,
            delete_failures,
        })
    }

    /// Removes the document, then every object it referenced.
    ///
    /// The document is gone even when some remote deletes fail.
    #[tracing::instrument(skip(self), fields(kind = %kind, entity_id = %id))]
    pub async fn delete_entity(
        &self,
        kind: CatalogKind,
        id: Uuid,
    ) -> Result<MediaOutcome<CatalogEntity>, MediaError> {
        let removed = self.catalog.delete(kind, id).await?;
        let refs = removed.media_refs();
        let delete_failures = delete_all(self.store.as_ref(), &refs).await;

        tracing::info!(
            assets = refs.len(),
            failed_deletes = delete_failures.len(),
            "Catalog entry deleted"
        );
        Ok(MediaOutcome {
            value: removed,
            delete_failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{file, MemoryStore};
    use storefront_db::InMemoryCatalogRepository;
    use tokio::sync::Barrier;

    fn product_fields(title: &str) -> CatalogFields {
        CatalogFields {
            title: Some(title.to_string()),
            category: Some("Fruits".to_string()),
            short_description: Some("Fresh".to_string()),
            full_description: Some("Picked this week".to_string()),
            ..Default::default()
        }
    }

    fn service(store: &Arc<MemoryStore>) -> (MediaLifecycleService, Arc<InMemoryCatalogRepository>) {
        let repo = Arc::new(InMemoryCatalogRepository::new());
        let svc = MediaLifecycleService::new(store.clone(), repo.clone(), 10);
        (svc, repo)
    }

    async fn seeded(
        svc: &MediaLifecycleService,
        gallery: Vec<UploadFile>,
    ) -> CatalogEntity {
        svc.create_with_media(
            CatalogKind::Seasonal,
            product_fields("Mango"),
            Some(file("f0.jpg", "image/jpeg")),
            gallery,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn spooled_files_are_streamed_to_the_store() {
        use std::io::Write;

        let store = Arc::new(MemoryStore::new());
        let (svc, _repo) = service(&store);

        let mut spool = tempfile::NamedTempFile::new().unwrap();
        spool.write_all(b"gallery payload").unwrap();
        let path = spool.into_temp_path();
        let spool_location = path.to_path_buf();
        let upload = UploadFile::spooled("g.png", "image/png", 15, path);
        assert!(upload.is_spooled());

        let created = svc
            .create_with_media(CatalogKind::Seasonal, product_fields("Mango"), None, vec![upload])
            .await
            .unwrap();

        assert_eq!(store.stream_upload_count(), 1);
        let stored = store.payload(&created.gallery[0].remote_id).unwrap();
        assert_eq!(stored.as_ref(), b"gallery payload");
        assert!(!spool_location.exists());
    }

    #[tokio::test]
    async fn create_keeps_kinds_and_submission_order() {
        let store = Arc::new(MemoryStore::new());
        let (svc, repo) = service(&store);

        let created = svc
            .create_with_media(
                CatalogKind::Seasonal,
                product_fields("Mango"),
                Some(file("F1.jpg", "image/jpeg")),
                vec![file("G1.png", "image/png"), file("G2.mp4", "video/mp4")],
            )
            .await
            .unwrap();

        let stored = repo.get(CatalogKind::Seasonal, created.id).await.unwrap();
        assert_eq!(stored.featured_image.as_ref().unwrap().kind, MediaKind::Image);
        let kinds: Vec<MediaKind> = stored.gallery.iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MediaKind::Image, MediaKind::Video]);
        assert_eq!(store.object_count(), 3);
    }

    #[tokio::test]
    async fn create_with_n_gallery_files_persists_n_in_order() {
        let store = Arc::new(MemoryStore::new());
        let (svc, _repo) = service(&store);
        let files: Vec<UploadFile> = (0..6)
            .map(|i| file(&format!("g{}.png", i), "image/png"))
            .collect();

        let created = svc
            .create_with_media(CatalogKind::Organic, product_fields("Honey"), None, files)
            .await
            .unwrap();

        let remote_ids: Vec<String> = created.gallery.iter().map(|m| m.remote_id.clone()).collect();
        assert_eq!(remote_ids.len(), 6);
        assert_eq!(remote_ids, store.upload_log());
    }

    #[tokio::test]
    async fn failed_gallery_upload_rolls_back_the_whole_request() {
        let store = Arc::new(MemoryStore::new());
        store.fail_upload_number(3);
        let (svc, repo) = service(&store);

        let err = svc
            .create_with_media(
                CatalogKind::Seasonal,
                product_fields("Mango"),
                Some(file("F1.jpg", "image/jpeg")),
                vec![file("G1.png", "image/png"), file("G2.mp4", "video/mp4")],
            )
            .await
            .unwrap_err();

        match err {
            MediaError::Upload { file_name, .. } => assert_eq!(file_name, "G2.mp4"),
            other => panic!("Expected upload error, got {:?}", other),
        }
        assert_eq!(store.object_count(), 0);
        assert!(repo.list_by_kind(CatalogKind::Seasonal).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_append_leaves_entity_untouched() {
        let store = Arc::new(MemoryStore::new());
        let (svc, repo) = service(&store);
        let entity = seeded(&svc, vec![file("g0.png", "image/png")]).await;

        store.fail_upload_number(store.upload_count() + 2);
        let result = svc
            .append_gallery(
                CatalogKind::Seasonal,
                entity.id,
                vec![file("a.png", "image/png"), file("b.png", "image/png")],
            )
            .await;

        assert!(matches!(result, Err(MediaError::Upload { .. })));
        let stored = repo.get(CatalogKind::Seasonal, entity.id).await.unwrap();
        assert_eq!(stored.version, entity.version);
        assert_eq!(stored.gallery, entity.gallery);
        assert_eq!(store.object_count(), 2);
    }

    #[tokio::test]
    async fn replace_featured_uploads_then_deletes_old() {
        let store = Arc::new(MemoryStore::new());
        let (svc, _repo) = service(&store);
        let entity = seeded(&svc, Vec::new()).await;
        let old = entity.featured_image.clone().unwrap();

        let outcome = svc
            .replace_featured(CatalogKind::Seasonal, entity.id, file("new.jpg", "image/jpeg"))
            .await
            .unwrap();

        let new = outcome.value.featured_image.clone().unwrap();
        assert_ne!(new.remote_id, old.remote_id);
        assert!(outcome.delete_failures.is_empty());
        assert!(store.contains(&new.remote_id));
        assert!(!store.contains(&old.remote_id));
    }

    #[tokio::test]
    async fn failed_replacement_keeps_existing_featured() {
        let store = Arc::new(MemoryStore::new());
        let (svc, repo) = service(&store);
        let entity = seeded(&svc, Vec::new()).await;

        store.fail_upload_number(store.upload_count() + 1);
        let result = svc
            .replace_featured(CatalogKind::Seasonal, entity.id, file("new.jpg", "image/jpeg"))
            .await;

        assert!(matches!(result, Err(MediaError::Upload { .. })));
        let stored = repo.get(CatalogKind::Seasonal, entity.id).await.unwrap();
        assert_eq!(stored.featured_image, entity.featured_image);
        assert!(store.contains(&entity.featured_image.unwrap().remote_id));
    }

    #[tokio::test]
    async fn replace_reports_failed_delete_without_failing() {
        let store = Arc::new(MemoryStore::new());
        let (svc, _repo) = service(&store);
        let entity = seeded(&svc, Vec::new()).await;
        let old = entity.featured_image.clone().unwrap();

        store.fail_deletes(true);
        let outcome = svc
            .replace_featured(CatalogKind::Seasonal, entity.id, file("new.jpg", "image/jpeg"))
            .await
            .unwrap();

        assert_eq!(outcome.delete_failures.len(), 1);
        assert_eq!(outcome.delete_failures[0].remote_id, old.remote_id);
        assert_ne!(outcome.value.featured_image.unwrap().remote_id, old.remote_id);
    }

    #[tokio::test]
    async fn removing_unknown_gallery_item_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let (svc, repo) = service(&store);
        let entity = seeded(&svc, vec![file("g0.png", "image/png")]).await;

        let err = svc
            .remove_gallery_item(CatalogKind::Seasonal, entity.id, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::App(AppError::NotFound(_))));
        let stored = repo.get(CatalogKind::Seasonal, entity.id).await.unwrap();
        assert_eq!(stored.gallery, entity.gallery);
        assert_eq!(stored.version, entity.version);
    }

    #[tokio::test]
    async fn removing_gallery_item_deletes_remote_object() {
        let store = Arc::new(MemoryStore::new());
        let (svc, _repo) = service(&store);
        let entity = seeded(
            &svc,
            vec![file("g0.png", "image/png"), file("g1.png", "image/png")],
        )
        .await;
        let target = entity.gallery[0].clone();

        let outcome = svc
            .remove_gallery_item(CatalogKind::Seasonal, entity.id, target.id)
            .await
            .unwrap();

        assert_eq!(outcome.value.gallery, vec![entity.gallery[1].clone()]);
        assert!(!store.contains(&target.remote_id));
    }

    #[tokio::test]
    async fn delete_entity_survives_failing_store() {
        let store = Arc::new(MemoryStore::new());
        let (svc, repo) = service(&store);
        let entity = seeded(
            &svc,
            vec![file("g0.png", "image/png"), file("g1.mp4", "video/mp4")],
        )
        .await;

        store.fail_deletes(true);
        let outcome = svc
            .delete_entity(CatalogKind::Seasonal, entity.id)
            .await
            .unwrap();

        assert_eq!(outcome.delete_failures.len(), 3);
        assert!(matches!(
            repo.get(CatalogKind::Seasonal, entity.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.delete_entity(CatalogKind::Seasonal, entity.id).await,
            Err(MediaError::App(AppError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn concurrent_appends_one_wins_and_loser_is_cleaned_up() {
        let store = Arc::new(MemoryStore::with_upload_barrier(Arc::new(Barrier::new(2))));
        let (svc, repo) = service(&store);
        let entity = repo
            .create(CatalogEntity::new(CatalogKind::Tech, product_fields("Cloud setup")))
            .await
            .unwrap();

        let (first, second) = tokio::join!(
            svc.append_gallery(CatalogKind::Tech, entity.id, vec![file("a.png", "image/png")]),
            svc.append_gallery(CatalogKind::Tech, entity.id, vec![file("b.png", "image/png")]),
        );

        let results = [first, second];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(MediaError::App(AppError::Conflict(_)))))
            .count();
        assert_eq!((wins, conflicts), (1, 1));

        let stored = repo.get(CatalogKind::Tech, entity.id).await.unwrap();
        assert_eq!(stored.gallery.len(), 1);
        assert_eq!(store.object_count(), 1);
        assert!(store.contains(&stored.gallery[0].remote_id));
    }

    #[tokio::test]
    async fn write_conflict_on_create_discards_uploads() {
        let store = Arc::new(MemoryStore::new());
        let (svc, _repo) = service(&store);
        seeded(&svc, Vec::new()).await;

        let err = svc
            .create_with_media(
                CatalogKind::Seasonal,
                product_fields("Mango"),
                Some(file("dup.jpg", "image/jpeg")),
                vec![file("dup.png", "image/png")],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::App(AppError::Conflict(_))));
        assert_eq!(store.object_count(), 1);
    }

    #[tokio::test]
    async fn story_rules_are_enforced_before_upload() {
        let store = Arc::new(MemoryStore::new());
        let (svc, _repo) = service(&store);
        let fields = CatalogFields {
            title: Some("Harvest".to_string()),
            ..Default::default()
        };

        let no_media = svc
            .create_with_media(CatalogKind::Story, fields.clone(), None, Vec::new())
            .await;
        assert!(matches!(no_media, Err(MediaError::App(AppError::InvalidInput(_)))));

        let with_featured = svc
            .create_with_media(
                CatalogKind::Story,
                fields.clone(),
                Some(file("f.jpg", "image/jpeg")),
                vec![file("m.mp4", "video/mp4")],
            )
            .await;
        assert!(matches!(with_featured, Err(MediaError::App(AppError::InvalidInput(_)))));
        assert_eq!(store.upload_count(), 0);

        let story = svc
            .create_with_media(CatalogKind::Story, fields, None, vec![file("m.mp4", "video/mp4")])
            .await
            .unwrap();
        assert_eq!(story.gallery[0].kind, MediaKind::Video);
        assert!(story.slug.is_none());
    }

    #[tokio::test]
    async fn gallery_limit_is_checked_before_upload() {
        let store = Arc::new(MemoryStore::new());
        let repo = Arc::new(InMemoryCatalogRepository::new());
        let svc = MediaLifecycleService::new(store.clone(), repo, 2);

        let files = (0..3).map(|i| file(&format!("{}.png", i), "image/png")).collect();
        let err = svc
            .create_with_media(CatalogKind::Seasonal, product_fields("Mango"), None, files)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::App(AppError::PayloadTooLarge(_))));
        assert_eq!(store.upload_count(), 0);
    }

    #[tokio::test]
    async fn update_applies_fields_and_swaps_featured_in_one_write() {
        let store = Arc::new(MemoryStore::new());
        let (svc, _repo) = service(&store);
        let entity = seeded(&svc, vec![file("g0.png", "image/png")]).await;
        let old = entity.featured_image.clone().unwrap();

        let outcome = svc
            .update_with_media(
                CatalogKind::Seasonal,
                entity.id,
                CatalogFields {
                    title: Some("Mango Box".to_string()),
                    ..Default::default()
                },
                Some(file("f1.jpg", "image/jpeg")),
                vec![file("g1.mp4", "video/mp4")],
            )
            .await
            .unwrap();

        let updated = outcome.value;
        assert_eq!(updated.title, "Mango Box");
        assert_eq!(updated.slug.as_deref(), Some("mango"));
        assert_eq!(updated.version, entity.version + 1);
        assert_eq!(updated.gallery.len(), 2);
        assert_eq!(updated.gallery[0], entity.gallery[0]);
        assert!(!store.contains(&old.remote_id));
    }
}
