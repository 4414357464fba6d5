//! In-memory repositories
//!
//! Same contracts as the Postgres repositories, including versioned saves and
//! slug uniqueness. Used by tests and by local runs without `DATABASE_URL`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use storefront_core::models::{
    CatalogCounts, CatalogEntity, CatalogKind, Inquiry, InquiryCounts, InquiryFilter,
    InquiryStatus, Visitor, WebsiteSettings,
};
use storefront_core::AppError;
use uuid::Uuid;

use super::catalog::{not_found, version_conflict, CatalogRepository};
use super::inquiry::{inquiry_not_found, InquiryRepository};
use super::settings::{settings_conflict, SettingsRepository};
use super::visitor::{visitor_not_found, VisitorRepository};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("In-memory repository lock poisoned".to_string()))
}

fn sort_for_listing(entities: &mut [CatalogEntity]) {
    entities.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[derive(Clone, Default)]
pub struct InMemoryCatalogRepository {
    entities: Arc<Mutex<HashMap<Uuid, CatalogEntity>>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn slug_taken(
        entities: &HashMap<Uuid, CatalogEntity>,
        kind: CatalogKind,
        slug: Option<&str>,
        except: Uuid,
    ) -> bool {
        let Some(slug) = slug else {
            return false;
        };
        entities
            .values()
            .any(|e| e.id != except && e.kind == kind && e.slug.as_deref() == Some(slug))
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn get(&self, kind: CatalogKind, id: Uuid) -> Result<CatalogEntity, AppError> {
        let entities = lock(&self.entities)?;
        entities
            .get(&id)
            .filter(|e| e.kind == kind)
            .cloned()
            .ok_or_else(|| not_found(kind))
    }

    async fn create(&self, entity: CatalogEntity) -> Result<CatalogEntity, AppError> {
        let mut entities = lock(&self.entities)?;
        if entities.contains_key(&entity.id) {
            return Err(AppError::Conflict(format!(
                "{} already exists",
                entity.kind.label()
            )));
        }
        if Self::slug_taken(&entities, entity.kind, entity.slug.as_deref(), entity.id) {
            return Err(AppError::Conflict(
                "An entry with this slug already exists".to_string(),
            ));
        }
        entities.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn save(&self, mut entity: CatalogEntity) -> Result<CatalogEntity, AppError> {
        let mut entities = lock(&self.entities)?;
        let stored_version = match entities.get(&entity.id) {
            Some(stored) if stored.kind == entity.kind => stored.version,
            _ => return Err(not_found(entity.kind)),
        };
        if stored_version != entity.version {
            return Err(version_conflict(entity.kind));
        }
        if Self::slug_taken(&entities, entity.kind, entity.slug.as_deref(), entity.id) {
            return Err(AppError::Conflict(
                "An entry with this slug already exists".to_string(),
            ));
        }
        entity.version += 1;
        entity.updated_at = Utc::now();
        entities.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, kind: CatalogKind, id: Uuid) -> Result<CatalogEntity, AppError> {
        let mut entities = lock(&self.entities)?;
        match entities.get(&id) {
            Some(e) if e.kind == kind => {}
            _ => return Err(not_found(kind)),
        }
        entities.remove(&id).ok_or_else(|| not_found(kind))
    }

    async fn list_by_kind(&self, kind: CatalogKind) -> Result<Vec<CatalogEntity>, AppError> {
        let entities = lock(&self.entities)?;
        let mut list: Vec<CatalogEntity> =
            entities.values().filter(|e| e.kind == kind).cloned().collect();
        sort_for_listing(&mut list);
        Ok(list)
    }

    async fn list_visible(
        &self,
        kind: CatalogKind,
        category: Option<&str>,
    ) -> Result<Vec<CatalogEntity>, AppError> {
        let entities = lock(&self.entities)?;
        let mut list: Vec<CatalogEntity> = entities
            .values()
            .filter(|e| e.kind == kind && e.is_visible)
            .filter(|e| category.is_none_or(|c| e.category.as_deref() == Some(c)))
            .cloned()
            .collect();
        sort_for_listing(&mut list);
        Ok(list)
    }

    async fn categories(&self, kind: CatalogKind) -> Result<Vec<String>, AppError> {
        let entities = lock(&self.entities)?;
        let mut categories: Vec<String> = entities
            .values()
            .filter(|e| e.kind == kind && e.is_visible)
            .filter_map(|e| e.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn get_by_slug(&self, kind: CatalogKind, slug: &str) -> Result<CatalogEntity, AppError> {
        let entities = lock(&self.entities)?;
        entities
            .values()
            .find(|e| e.kind == kind && e.is_visible && e.slug.as_deref() == Some(slug))
            .cloned()
            .ok_or_else(|| not_found(kind))
    }

    async fn toggle_visibility(
        &self,
        kind: CatalogKind,
        id: Uuid,
    ) -> Result<CatalogEntity, AppError> {
        let mut entities = lock(&self.entities)?;
        let entity = entities
            .get_mut(&id)
            .filter(|e| e.kind == kind)
            .ok_or_else(|| not_found(kind))?;
        entity.is_visible = !entity.is_visible;
        entity.version += 1;
        entity.updated_at = Utc::now();
        Ok(entity.clone())
    }

    async fn count_by_kind(&self) -> Result<CatalogCounts, AppError> {
        let entities = lock(&self.entities)?;
        let mut counts = CatalogCounts::default();
        for kind in CatalogKind::ALL {
            let count = entities.values().filter(|e| e.kind == kind).count();
            counts.set(kind, count as i64);
        }
        Ok(counts)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryInquiryRepository {
    inquiries: Arc<Mutex<HashMap<Uuid, Inquiry>>>,
}

impl InMemoryInquiryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InquiryRepository for InMemoryInquiryRepository {
    async fn create(&self, inquiry: Inquiry) -> Result<Inquiry, AppError> {
        lock(&self.inquiries)?.insert(inquiry.id, inquiry.clone());
        Ok(inquiry)
    }

    async fn get(&self, id: Uuid) -> Result<Inquiry, AppError> {
        lock(&self.inquiries)?
            .get(&id)
            .cloned()
            .ok_or_else(inquiry_not_found)
    }

    async fn list(&self, filter: &InquiryFilter) -> Result<Vec<Inquiry>, AppError> {
        let inquiries = lock(&self.inquiries)?;
        let mut list: Vec<Inquiry> = inquiries
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
        admin_notes: Option<String>,
    ) -> Result<Inquiry, AppError> {
        let mut inquiries = lock(&self.inquiries)?;
        let inquiry = inquiries.get_mut(&id).ok_or_else(inquiry_not_found)?;
        inquiry.status = status;
        if admin_notes.is_some() {
            inquiry.admin_notes = admin_notes;
        }
        inquiry.updated_at = Utc::now();
        Ok(inquiry.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        lock(&self.inquiries)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(inquiry_not_found)
    }

    async fn count_by_status(&self) -> Result<InquiryCounts, AppError> {
        let inquiries = lock(&self.inquiries)?;
        let mut counts = InquiryCounts::default();
        for inquiry in inquiries.values() {
            counts.add(inquiry.status, 1);
        }
        Ok(counts)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Inquiry>, AppError> {
        let mut list = self.list(&InquiryFilter::default()).await?;
        list.truncate(limit);
        Ok(list)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryVisitorRepository {
    visitors: Arc<Mutex<HashMap<Uuid, Visitor>>>,
}

impl InMemoryVisitorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VisitorRepository for InMemoryVisitorRepository {
    async fn create(&self, visitor: Visitor) -> Result<Visitor, AppError> {
        lock(&self.visitors)?.insert(visitor.id, visitor.clone());
        Ok(visitor)
    }

    async fn list(&self) -> Result<Vec<Visitor>, AppError> {
        let visitors = lock(&self.visitors)?;
        let mut list: Vec<Visitor> = visitors.values().cloned().collect();
        list.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));
        Ok(list)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        lock(&self.visitors)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(visitor_not_found)
    }
}

#[derive(Clone, Default)]
pub struct InMemorySettingsRepository {
    settings: Arc<Mutex<Option<WebsiteSettings>>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn get_or_create(&self) -> Result<WebsiteSettings, AppError> {
        let mut settings = lock(&self.settings)?;
        Ok(settings.get_or_insert_with(WebsiteSettings::default).clone())
    }

    async fn save(&self, mut settings: WebsiteSettings) -> Result<WebsiteSettings, AppError> {
        let mut stored = lock(&self.settings)?;
        let current = stored.get_or_insert_with(WebsiteSettings::default);
        if current.version != settings.version {
            return Err(settings_conflict());
        }
        settings.version += 1;
        settings.updated_at = Utc::now();
        *current = settings.clone();
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::models::{
        CatalogFields, CreateInquiryRequest, MediaKind, MediaRef, ProductType,
    };

    fn entity(kind: CatalogKind, title: &str) -> CatalogEntity {
        CatalogEntity::new(
            kind,
            CatalogFields {
                title: Some(title.to_string()),
                category: Some("Fruits".to_string()),
                short_description: Some("short".to_string()),
                full_description: Some("full".to_string()),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn save_bumps_version() {
        let repo = InMemoryCatalogRepository::new();
        let created = repo.create(entity(CatalogKind::Seasonal, "Mango")).await.unwrap();

        let mut loaded = repo.get(CatalogKind::Seasonal, created.id).await.unwrap();
        loaded
            .gallery
            .push(MediaRef::new("u", "r", MediaKind::Image));
        let saved = repo.save(loaded).await.unwrap();

        assert_eq!(saved.version, 2);
        assert_eq!(
            repo.get(CatalogKind::Seasonal, created.id)
                .await
                .unwrap()
                .gallery
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn stale_save_conflicts() {
        let repo = InMemoryCatalogRepository::new();
        let created = repo.create(entity(CatalogKind::Tech, "Cloud")).await.unwrap();

        let first = repo.get(CatalogKind::Tech, created.id).await.unwrap();
        let second = repo.get(CatalogKind::Tech, created.id).await.unwrap();

        repo.save(first).await.unwrap();
        let err = repo.save(second).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn kind_mismatch_is_not_found() {
        let repo = InMemoryCatalogRepository::new();
        let created = repo.create(entity(CatalogKind::Organic, "Honey")).await.unwrap();

        let err = repo.get(CatalogKind::Tech, created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = repo.delete(CatalogKind::Tech, created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(repo.get(CatalogKind::Organic, created.id).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts_within_kind_only() {
        let repo = InMemoryCatalogRepository::new();
        repo.create(entity(CatalogKind::Seasonal, "Mango")).await.unwrap();

        let err = repo
            .create(entity(CatalogKind::Seasonal, "Mango"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(repo.create(entity(CatalogKind::Organic, "Mango")).await.is_ok());
    }

    #[tokio::test]
    async fn delete_returns_removed_document() {
        let repo = InMemoryCatalogRepository::new();
        let created = repo.create(entity(CatalogKind::Seasonal, "Mango")).await.unwrap();

        let removed = repo.delete(CatalogKind::Seasonal, created.id).await.unwrap();
        assert_eq!(removed.id, created.id);
        let err = repo.delete(CatalogKind::Seasonal, created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn visible_listing_filters_and_orders() {
        let repo = InMemoryCatalogRepository::new();
        let mut late = entity(CatalogKind::Seasonal, "Late");
        late.display_order = 2;
        let mut early = entity(CatalogKind::Seasonal, "Early");
        early.display_order = 1;
        let mut hidden = entity(CatalogKind::Seasonal, "Hidden");
        hidden.is_visible = false;
        let mut other_category = entity(CatalogKind::Seasonal, "Veg");
        other_category.category = Some("Vegetables".to_string());
        for e in [late, early, hidden, other_category] {
            repo.create(e).await.unwrap();
        }

        let fruits = repo
            .list_visible(CatalogKind::Seasonal, Some("Fruits"))
            .await
            .unwrap();
        let titles: Vec<&str> = fruits.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Early", "Late"]);

        assert_eq!(repo.list_by_kind(CatalogKind::Seasonal).await.unwrap().len(), 4);
        assert_eq!(
            repo.categories(CatalogKind::Seasonal).await.unwrap(),
            vec!["Fruits".to_string(), "Vegetables".to_string()]
        );
        assert!(repo
            .get_by_slug(CatalogKind::Seasonal, "hidden")
            .await
            .is_err());
        assert!(repo.get_by_slug(CatalogKind::Seasonal, "late").await.is_ok());
    }

    #[tokio::test]
    async fn toggle_visibility_flips_flag() {
        let repo = InMemoryCatalogRepository::new();
        let created = repo.create(entity(CatalogKind::Story, "Harvest")).await.unwrap();
        let toggled = repo
            .toggle_visibility(CatalogKind::Story, created.id)
            .await
            .unwrap();
        assert!(!toggled.is_visible);
        assert_eq!(toggled.version, created.version + 1);
    }

    #[tokio::test]
    async fn settings_created_once_and_versioned() {
        let repo = InMemorySettingsRepository::new();
        let first = repo.get_or_create().await.unwrap();
        assert_eq!(first.version, 1);

        let saved = repo.save(first.clone()).await.unwrap();
        assert_eq!(saved.version, 2);
        assert!(matches!(
            repo.save(first).await.unwrap_err(),
            AppError::Conflict(_)
        ));
    }

    fn inquiry(name: &str) -> Inquiry {
        Inquiry::new(
            CreateInquiryRequest {
                name: name.to_string(),
                mobile: "9876543210".to_string(),
                email: "asha@example.com".to_string(),
                requirement: "Bulk".to_string(),
                product_type: ProductType::General,
                product_id: None,
            },
            None,
        )
    }

    #[tokio::test]
    async fn counts_cover_every_collection_and_status() {
        let catalog = InMemoryCatalogRepository::new();
        catalog.create(entity(CatalogKind::Seasonal, "Mango")).await.unwrap();
        catalog.create(entity(CatalogKind::Seasonal, "Guava")).await.unwrap();
        let mut hidden = entity(CatalogKind::Story, "Harvest");
        hidden.is_visible = false;
        catalog.create(hidden).await.unwrap();

        let counts = catalog.count_by_kind().await.unwrap();
        assert_eq!(counts.seasonal, 2);
        assert_eq!(counts.stories, 1);
        assert_eq!(counts.tech, 0);

        let inquiries = InMemoryInquiryRepository::new();
        let mut ids = Vec::new();
        for i in 0..7 {
            let mut item = inquiry(&format!("Customer {}", i));
            item.created_at = Utc::now() - chrono::Duration::minutes(10 - i);
            ids.push(inquiries.create(item).await.unwrap().id);
        }
        inquiries
            .update_status(ids[0], InquiryStatus::Closed, None)
            .await
            .unwrap();

        let counts = inquiries.count_by_status().await.unwrap();
        assert_eq!(counts.total, 7);
        assert_eq!(counts.new, 6);
        assert_eq!(counts.closed, 1);

        let recent = inquiries.recent(5).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].name, "Customer 6");
    }

    #[tokio::test]
    async fn inquiry_status_update_keeps_notes_when_absent() {
        let repo = InMemoryInquiryRepository::new();
        let inquiry = Inquiry::new(
            CreateInquiryRequest {
                name: "Asha".to_string(),
                mobile: "9876543210".to_string(),
                email: "asha@example.com".to_string(),
                requirement: "Bulk".to_string(),
                product_type: ProductType::General,
                product_id: None,
            },
            None,
        );
        let created = repo.create(inquiry).await.unwrap();

        repo.update_status(created.id, InquiryStatus::Contacted, Some("Called".to_string()))
            .await
            .unwrap();
        let updated = repo
            .update_status(created.id, InquiryStatus::Closed, None)
            .await
            .unwrap();
        assert_eq!(updated.status, InquiryStatus::Closed);
        assert_eq!(updated.admin_notes.as_deref(), Some("Called"));

        let filtered = repo
            .list(&InquiryFilter {
                status: Some(InquiryStatus::New),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(filtered.is_empty());

        repo.delete(created.id).await.unwrap();
        assert!(matches!(
            repo.delete(created.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
