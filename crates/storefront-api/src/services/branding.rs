//! Website settings: branding media slots, team members and content.
//!
//! The logo, the about image and team portraits follow the catalog
//! sequencing: upload, swap and persist, then delete the replaced object.

use std::sync::Arc;

use storefront_core::models::{
    BrandingSlot, TeamMember, TeamMemberFields, UpdateSettingsRequest, WebsiteSettings,
    TEAM_MEMBER_FOLDER,
};
use storefront_core::AppError;
use storefront_db::SettingsRepository;
use storefront_storage::AssetStore;
use uuid::Uuid;

use super::media_lifecycle::{delete_replaced, StagedUploads};
use super::{MediaError, MediaOutcome, UploadFile};

#[derive(Clone)]
pub struct BrandingService {
    store: Arc<dyn AssetStore>,
    settings: Arc<dyn SettingsRepository>,
}

impl BrandingService {
    pub fn new(store: Arc<dyn AssetStore>, settings: Arc<dyn SettingsRepository>) -> Self {
        Self { store, settings }
    }

    pub async fn current(&self) -> Result<WebsiteSettings, AppError> {
        self.settings.get_or_create().await
    }

    #[tracing::instrument(skip(self, file), fields(slot = slot.label(), file_name = %file.file_name))]
    pub async fn replace_slot(
        &self,
        slot: BrandingSlot,
        file: UploadFile,
    ) -> Result<MediaOutcome<WebsiteSettings>, MediaError> {
        let mut settings = self.settings.get_or_create().await?;
        let mut staged = StagedUploads::new(self.store.as_ref());
        let media = staged.upload(slot.folder(), file).await?;
        let previous = settings.set_slot(slot, Some(media));

        let saved = staged.commit(self.settings.save(settings)).await?;
        let delete_failures = delete_replaced(self.store.as_ref(), previous).await;

        Ok(MediaOutcome {
            value: saved,
            delete_failures,
        })
    }

    #[tracing::instrument(skip(self), fields(slot = slot.label()))]
    pub async fn clear_slot(
        &self,
        slot: BrandingSlot,
    ) -> Result<MediaOutcome<WebsiteSettings>, MediaError> {
        let mut settings = self.settings.get_or_create().await?;
        let previous = settings
            .set_slot(slot, None)
            .ok_or_else(|| AppError::NotFound(format!("{} is not set", slot.label())))?;

        let saved = self.settings.save(settings).await?;
        let delete_failures = delete_replaced(self.store.as_ref(), Some(previous)).await;

        Ok(MediaOutcome {
            value: saved,
            delete_failures,
        })
    }

    /// Uploads the optional portrait, then appends the member in one write.
    #[tracing::instrument(skip(self, fields, image), fields(has_image = image.is_some()))]
    pub async fn add_team_member(
        &self,
        fields: TeamMemberFields,
        image: Option<UploadFile>,
    ) -> Result<TeamMember, MediaError> {
        fields.validate_for_create()?;

        let mut settings = self.settings.get_or_create().await?;
        let mut staged = StagedUploads::new(self.store.as_ref());
        let portrait = match image {
            Some(file) => Some(staged.upload(TEAM_MEMBER_FOLDER, file).await?),
            None => None,
        };
        let member = settings.add_team_member(fields);
        member.image = portrait;
        let member_id = member.id;

        let saved = staged.commit(self.settings.save(settings)).await?;
        tracing::info!(member_id = %member_id, "Team member added");
        find_member(saved, member_id)
    }

    /// Applies field changes and swaps the portrait when one was sent.
    #[tracing::instrument(skip(self, fields, image), fields(member_id = %id, has_image = image.is_some()))]
    pub async fn update_team_member(
        &self,
        id: Uuid,
        fields: TeamMemberFields,
        image: Option<UploadFile>,
    ) -> Result<MediaOutcome<TeamMember>, MediaError> {
        fields.validate_for_update()?;

        let mut settings = self.settings.get_or_create().await?;
        if settings.team_member_mut(id).is_none() {
            return Err(team_member_not_found().into());
        }

        let mut staged = StagedUploads::new(self.store.as_ref());
        let portrait = match image {
            Some(file) => Some(staged.upload(TEAM_MEMBER_FOLDER, file).await?),
            None => None,
        };
        let member = settings
            .team_member_mut(id)
            .ok_or_else(team_member_not_found)?;
        member.apply(fields);
        let previous = portrait.and_then(|media| member.image.replace(media));

        let saved = staged.commit(self.settings.save(settings)).await?;
        let delete_failures = delete_replaced(self.store.as_ref(), previous).await;

        Ok(MediaOutcome {
            value: find_member(saved, id)?,
            delete_failures,
        })
    }

    /// Drops the member from the document, then deletes the portrait.
    #[tracing::instrument(skip(self), fields(member_id = %id))]
    pub async fn delete_team_member(&self, id: Uuid) -> Result<MediaOutcome<TeamMember>, MediaError> {
        let mut settings = self.settings.get_or_create().await?;
        let removed = settings
            .remove_team_member(id)
            .ok_or_else(team_member_not_found)?;

        self.settings.save(settings).await?;
        let delete_failures = delete_replaced(self.store.as_ref(), removed.image.clone()).await;

        Ok(MediaOutcome {
            value: removed,
            delete_failures,
        })
    }

    pub async fn update_content(
        &self,
        request: UpdateSettingsRequest,
    ) -> Result<WebsiteSettings, AppError> {
        let mut settings = self.settings.get_or_create().await?;
        request.merge_into(&mut settings.content)?;
        self.settings.save(settings).await
    }
}

fn team_member_not_found() -> AppError {
    AppError::NotFound("Team member not found".to_string())
}

fn find_member(settings: WebsiteSettings, id: Uuid) -> Result<TeamMember, MediaError> {
    settings
        .team_members
        .into_iter()
        .find(|m| m.id == id)
        .ok_or_else(|| team_member_not_found().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{file, MemoryStore};
    use serde_json::json;
    use storefront_db::InMemorySettingsRepository;

    fn service(store: &Arc<MemoryStore>) -> BrandingService {
        BrandingService::new(store.clone(), Arc::new(InMemorySettingsRepository::new()))
    }

    #[tokio::test]
    async fn replacing_logo_deletes_previous_upload() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let first = svc
            .replace_slot(BrandingSlot::Logo, file("logo.png", "image/png"))
            .await
            .unwrap()
            .value;
        let first_logo = first.logo.unwrap();

        let second = svc
            .replace_slot(BrandingSlot::Logo, file("logo2.png", "image/png"))
            .await
            .unwrap();

        assert!(second.delete_failures.is_empty());
        assert!(!store.contains(&first_logo.remote_id));
        assert_eq!(store.object_count(), 1);
        assert!(second.value.about_image.is_none());
    }

    #[tokio::test]
    async fn failed_upload_leaves_slot_empty() {
        let store = Arc::new(MemoryStore::new());
        store.fail_upload_number(1);
        let svc = service(&store);

        let result = svc
            .replace_slot(BrandingSlot::AboutImage, file("about.jpg", "image/jpeg"))
            .await;

        assert!(matches!(result, Err(MediaError::Upload { .. })));
        assert!(svc.current().await.unwrap().about_image.is_none());
    }

    #[tokio::test]
    async fn clearing_empty_slot_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let result = svc.clear_slot(BrandingSlot::Logo).await;
        assert!(matches!(result, Err(MediaError::App(AppError::NotFound(_)))));

        svc.replace_slot(BrandingSlot::Logo, file("logo.png", "image/png"))
            .await
            .unwrap();
        let cleared = svc.clear_slot(BrandingSlot::Logo).await.unwrap();
        assert!(cleared.value.logo.is_none());
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn content_update_merges_sections() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let updated = svc
            .update_content(UpdateSettingsRequest {
                content: json!({"contact": {"phone": "+91 99999 00000"}}),
            })
            .await
            .unwrap();

        assert_eq!(updated.content["contact"]["phone"], "+91 99999 00000");
        assert!(updated.content["footer"].is_object());
        assert_eq!(updated.version, 2);
    }

    fn member_fields(name: &str) -> TeamMemberFields {
        TeamMemberFields {
            name: Some(name.to_string()),
            role: Some("Grower".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn team_member_portrait_swap_deletes_old_upload() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let added = svc
            .add_team_member(member_fields("Meera"), Some(file("meera.jpg", "image/jpeg")))
            .await
            .unwrap();
        let first_portrait = added.image.clone().unwrap();
        assert!(store.contains(&first_portrait.remote_id));
        assert!(first_portrait.remote_id.starts_with(TEAM_MEMBER_FOLDER));

        let updated = svc
            .update_team_member(
                added.id,
                TeamMemberFields {
                    bio: Some("Runs the orchard".to_string()),
                    ..Default::default()
                },
                Some(file("meera2.jpg", "image/jpeg")),
            )
            .await
            .unwrap();

        assert!(updated.delete_failures.is_empty());
        assert_eq!(updated.value.name, "Meera");
        assert_eq!(updated.value.bio, "Runs the orchard");
        assert!(!store.contains(&first_portrait.remote_id));
        assert_eq!(store.object_count(), 1);
    }

    #[tokio::test]
    async fn failed_portrait_upload_adds_nobody() {
        let store = Arc::new(MemoryStore::new());
        store.fail_upload_number(1);
        let svc = service(&store);

        let result = svc
            .add_team_member(member_fields("Kabir"), Some(file("kabir.jpg", "image/jpeg")))
            .await;

        assert!(matches!(result, Err(MediaError::Upload { .. })));
        assert!(svc.current().await.unwrap().team_members.is_empty());
    }

    #[tokio::test]
    async fn deleting_team_member_removes_entry_then_portrait() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let added = svc
            .add_team_member(member_fields("Meera"), Some(file("meera.jpg", "image/jpeg")))
            .await
            .unwrap();
        svc.add_team_member(member_fields("Kabir"), None).await.unwrap();

        store.fail_deletes(true);
        let outcome = svc.delete_team_member(added.id).await.unwrap();
        assert_eq!(outcome.delete_failures.len(), 1);

        let remaining = svc.current().await.unwrap().team_members;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Kabir");

        let again = svc.delete_team_member(added.id).await;
        assert!(matches!(again, Err(MediaError::App(AppError::NotFound(_)))));
    }

    #[tokio::test]
    async fn updating_unknown_member_uploads_nothing() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);

        let result = svc
            .update_team_member(
                Uuid::new_v4(),
                member_fields("Ghost"),
                Some(file("ghost.jpg", "image/jpeg")),
            )
            .await;

        assert!(matches!(result, Err(MediaError::App(AppError::NotFound(_)))));
        assert_eq!(store.upload_count(), 0);
    }
}
