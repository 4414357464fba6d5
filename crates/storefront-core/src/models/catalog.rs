use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::media::MediaRef;
use crate::constants::DEFAULT_CURRENCY;
use crate::error::AppError;

/// The four catalog collections managed by the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Seasonal,
    Tech,
    Organic,
    Story,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 4] = [
        CatalogKind::Seasonal,
        CatalogKind::Tech,
        CatalogKind::Organic,
        CatalogKind::Story,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Seasonal => "seasonal",
            CatalogKind::Tech => "tech",
            CatalogKind::Organic => "organic",
            CatalogKind::Story => "story",
        }
    }

    /// Human readable label used in notices and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            CatalogKind::Seasonal => "Seasonal product",
            CatalogKind::Tech => "Tech package",
            CatalogKind::Organic => "Organic product",
            CatalogKind::Story => "Story",
        }
    }

    /// Asset store folder for the featured slot.
    pub fn folder(&self) -> &'static str {
        match self {
            CatalogKind::Seasonal => "seasonal",
            CatalogKind::Tech => "tech",
            CatalogKind::Organic => "organic",
            CatalogKind::Story => "stories",
        }
    }

    /// Asset store folder for gallery items.
    pub fn gallery_folder(&self) -> &'static str {
        match self {
            CatalogKind::Seasonal => "seasonal/gallery",
            CatalogKind::Tech => "tech/gallery",
            CatalogKind::Organic => "organic/gallery",
            CatalogKind::Story => "stories",
        }
    }

    pub fn has_featured_slot(&self) -> bool {
        !matches!(self, CatalogKind::Story)
    }

    pub fn requires_media_on_create(&self) -> bool {
        matches!(self, CatalogKind::Story)
    }

    pub fn is_product(&self) -> bool {
        !matches!(self, CatalogKind::Story)
    }

    pub fn has_price(&self) -> bool {
        matches!(self, CatalogKind::Tech)
    }

    /// Multipart field carrying gallery files.
    pub fn gallery_field(&self) -> &'static str {
        match self {
            CatalogKind::Story => "media",
            _ => "gallery",
        }
    }
}

impl FromStr for CatalogKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "seasonal" => Ok(CatalogKind::Seasonal),
            "tech" => Ok(CatalogKind::Tech),
            "organic" => Ok(CatalogKind::Organic),
            "story" | "stories" => Ok(CatalogKind::Story),
            _ => Err(anyhow::anyhow!("Invalid catalog kind: {}", s)),
        }
    }
}

impl Display for CatalogKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: Decimal,
    pub currency: String,
    pub display_text: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl Price {
    pub fn new(amount: Decimal, note: Option<String>) -> Self {
        Self {
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            display_text: format!("₹{}", format_indian_grouping(amount)),
            note,
        }
    }
}

/// Formats an amount with Indian digit grouping (`12,34,567.5`).
pub fn format_indian_grouping(amount: Decimal) -> String {
    let normalized = amount.round_dp(3).normalize().to_string();
    let (negative, unsigned) = match normalized.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, normalized.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::new();
    if int_part.len() > 3 {
        let (head, tail) = int_part.split_at(int_part.len() - 3);
        let head_chars: Vec<char> = head.chars().collect();
        let offset = head_chars.len() % 2;
        for (i, c) in head_chars.iter().enumerate() {
            if i > 0 && (i + 2 - offset) % 2 == 0 {
                grouped.push(',');
            }
            grouped.push(*c);
        }
        grouped.push(',');
        grouped.push_str(tail);
    } else {
        grouped.push_str(int_part);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Lowercase, runs of anything outside `[a-z0-9]` become one `-`, edges trimmed.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Slug for `source`, or the entity id when nothing slug-worthy is left
/// (titles written entirely in non-Latin scripts, punctuation only).
fn slug_or_id(source: &str, id: Uuid) -> String {
    let slug = slugify(source);
    if slug.is_empty() {
        id.to_string()
    } else {
        slug
    }
}

/// One catalog document. Every kind shares this shape; unused fields stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntity {
    pub id: Uuid,
    pub kind: CatalogKind,
    pub title: String,
    pub slug: Option<String>,
    pub category: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub price: Option<Price>,
    pub is_visible: bool,
    pub is_available: bool,
    pub display_order: i32,
    pub featured_image: Option<MediaRef>,
    #[serde(default)]
    pub gallery: Vec<MediaRef>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable catalog fields as submitted by the back office.
///
/// `None` means "not submitted": ignored on update, defaulted on create.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CatalogFields {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Slug must be between 1 and 200 characters"))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Category must be between 1 and 100 characters"))]
    pub category: Option<String>,
    #[validate(length(max = 200, message = "Short description cannot exceed 200 characters"))]
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub price_amount: Option<Decimal>,
    pub price_note: Option<String>,
    pub is_visible: Option<bool>,
    pub is_available: Option<bool>,
    pub display_order: Option<i32>,
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl CatalogFields {
    /// Field validation plus the per-kind required fields for a new entity.
    pub fn validate_for_create(&self, kind: CatalogKind) -> Result<(), AppError> {
        self.validate()?;
        self.validate_price()?;

        if !non_blank(&self.title) {
            return Err(AppError::InvalidInput("Title is required".to_string()));
        }
        if kind.is_product() {
            if !non_blank(&self.category) {
                return Err(AppError::InvalidInput("Category is required".to_string()));
            }
            if !non_blank(&self.short_description) {
                return Err(AppError::InvalidInput(
                    "Short description is required".to_string(),
                ));
            }
            if !non_blank(&self.full_description) {
                return Err(AppError::InvalidInput(
                    "Full description is required".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Field validation for a partial update; submitted fields may not be blanked.
    pub fn validate_for_update(&self, kind: CatalogKind) -> Result<(), AppError> {
        self.validate()?;
        self.validate_price()?;

        if self.title.is_some() && !non_blank(&self.title) {
            return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
        }
        if kind.is_product() {
            for (value, name) in [
                (&self.category, "Category"),
                (&self.short_description, "Short description"),
                (&self.full_description, "Full description"),
            ] {
                if value.is_some() && !non_blank(value) {
                    return Err(AppError::InvalidInput(format!("{} cannot be empty", name)));
                }
            }
        }
        Ok(())
    }

    fn validate_price(&self) -> Result<(), AppError> {
        match self.price_amount {
            Some(amount) if amount.is_sign_negative() => Err(AppError::InvalidInput(
                "Price cannot be negative".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CatalogEntity {
    /// Builds a new, not yet persisted entity from validated fields.
    pub fn new(kind: CatalogKind, fields: CatalogFields) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let title = trimmed(fields.title).unwrap_or_default();
        let slug = if kind.is_product() {
            let source = trimmed(fields.slug).unwrap_or_else(|| title.clone());
            Some(slug_or_id(&source, id))
        } else {
            None
        };
        let price = if kind.has_price() {
            fields
                .price_amount
                .map(|amount| Price::new(amount, trimmed(fields.price_note)))
        } else {
            None
        };

        Self {
            id,
            kind,
            title,
            slug,
            category: trimmed(fields.category),
            short_description: trimmed(fields.short_description),
            full_description: trimmed(fields.full_description),
            description: trimmed(fields.description),
            features: fields
                .features
                .unwrap_or_default()
                .into_iter()
                .filter_map(|f| trimmed(Some(f)))
                .collect(),
            price,
            is_visible: fields.is_visible.unwrap_or(true),
            is_available: fields.is_available.unwrap_or(true),
            display_order: fields.display_order.unwrap_or(0),
            featured_image: None,
            gallery: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies submitted fields; the slug is kept unless one is submitted.
    pub fn apply(&mut self, fields: CatalogFields) {
        if let Some(title) = trimmed(fields.title) {
            self.title = title;
        }
        if self.kind.is_product() {
            if let Some(slug) = trimmed(fields.slug) {
                self.slug = Some(slug_or_id(&slug, self.id));
            } else if self.slug.is_none() {
                self.slug = Some(slug_or_id(&self.title, self.id));
            }
        }
        if let Some(category) = trimmed(fields.category) {
            self.category = Some(category);
        }
        if let Some(short) = trimmed(fields.short_description) {
            self.short_description = Some(short);
        }
        if let Some(full) = trimmed(fields.full_description) {
            self.full_description = Some(full);
        }
        if fields.description.is_some() {
            self.description = trimmed(fields.description);
        }
        if let Some(features) = fields.features {
            self.features = features
                .into_iter()
                .filter_map(|f| trimmed(Some(f)))
                .collect();
        }
        if self.kind.has_price() {
            if let Some(amount) = fields.price_amount {
                let note = trimmed(fields.price_note)
                    .or_else(|| self.price.as_ref().and_then(|p| p.note.clone()));
                self.price = Some(Price::new(amount, note));
            }
        }
        if let Some(visible) = fields.is_visible {
            self.is_visible = visible;
        }
        if let Some(available) = fields.is_available {
            self.is_available = available;
        }
        if let Some(order) = fields.display_order {
            self.display_order = order;
        }
    }

    pub fn find_gallery_item(&self, item_id: Uuid) -> Option<&MediaRef> {
        self.gallery.iter().find(|m| m.id == item_id)
    }

    /// Removes a gallery item, returning it when it was present.
    pub fn remove_gallery_item(&mut self, item_id: Uuid) -> Option<MediaRef> {
        let index = self.gallery.iter().position(|m| m.id == item_id)?;
        Some(self.gallery.remove(index))
    }

    /// Every ref the entity owns: featured first, then the gallery in order.
    pub fn media_refs(&self) -> Vec<MediaRef> {
        self.featured_image
            .iter()
            .chain(self.gallery.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;
    use std::str::FromStr;

    fn product_fields() -> CatalogFields {
        CatalogFields {
            title: Some("Mango Festival Box".to_string()),
            category: Some("Fruits".to_string()),
            short_description: Some("Seasonal mangoes".to_string()),
            full_description: Some("Alphonso and Kesar".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("Mango Festival Box"), "mango-festival-box");
        assert_eq!(slugify("  --Hello,   World!! "), "hello-world");
        assert_eq!(slugify("Tech & Cloud 2.0"), "tech-cloud-2-0");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn indian_grouping() {
        assert_eq!(format_indian_grouping(Decimal::from(999)), "999");
        assert_eq!(format_indian_grouping(Decimal::from(1000)), "1,000");
        assert_eq!(format_indian_grouping(Decimal::from(123456)), "1,23,456");
        assert_eq!(format_indian_grouping(Decimal::from(1234567)), "12,34,567");
        assert_eq!(
            format_indian_grouping(Decimal::from_str("2500.50").unwrap()),
            "2,500.5"
        );
    }

    #[test]
    fn kind_descriptor() {
        assert_eq!(CatalogKind::Story.folder(), "stories");
        assert!(!CatalogKind::Story.has_featured_slot());
        assert!(CatalogKind::Story.requires_media_on_create());
        assert_eq!(CatalogKind::Tech.gallery_folder(), "tech/gallery");
        assert_eq!(CatalogKind::from_str("stories").unwrap(), CatalogKind::Story);
        assert!(CatalogKind::from_str("widgets").is_err());
    }

    #[test]
    fn new_entity_derives_slug_and_defaults() {
        let entity = CatalogEntity::new(CatalogKind::Seasonal, product_fields());
        assert_eq!(entity.slug.as_deref(), Some("mango-festival-box"));
        assert!(entity.is_visible);
        assert_eq!(entity.version, 1);
        assert!(entity.price.is_none());
    }

    #[test]
    fn title_without_latin_characters_gets_id_slug() {
        let mut fields = product_fields();
        fields.title = Some("आम".to_string());
        let entity = CatalogEntity::new(CatalogKind::Seasonal, fields);
        assert_eq!(entity.slug, Some(entity.id.to_string()));

        let mut renamed = CatalogEntity::new(CatalogKind::Organic, product_fields());
        renamed.apply(CatalogFields {
            slug: Some("!!!".to_string()),
            ..Default::default()
        });
        assert_eq!(renamed.slug, Some(renamed.id.to_string()));
    }

    #[test]
    fn product_requires_descriptions() {
        let mut fields = product_fields();
        fields.full_description = None;
        assert!(fields.validate_for_create(CatalogKind::Organic).is_err());
        assert!(product_fields().validate_for_create(CatalogKind::Organic).is_ok());
    }

    #[test]
    fn story_needs_only_title() {
        let fields = CatalogFields {
            title: Some("Harvest day".to_string()),
            ..Default::default()
        };
        assert!(fields.validate_for_create(CatalogKind::Story).is_ok());
        let entity = CatalogEntity::new(CatalogKind::Story, fields);
        assert!(entity.slug.is_none());
    }

    #[test]
    fn short_description_length_enforced() {
        let mut fields = product_fields();
        fields.short_description = Some("x".repeat(201));
        assert!(fields.validate_for_create(CatalogKind::Seasonal).is_err());
    }

    #[test]
    fn tech_price_has_display_text() {
        let mut fields = product_fields();
        fields.price_amount = Some(Decimal::from(150000));
        let entity = CatalogEntity::new(CatalogKind::Tech, fields);
        let price = entity.price.unwrap();
        assert_eq!(price.currency, "INR");
        assert_eq!(price.display_text, "₹1,50,000");
    }

    #[test]
    fn apply_keeps_slug_and_unsubmitted_fields() {
        let mut entity = CatalogEntity::new(CatalogKind::Seasonal, product_fields());
        entity.apply(CatalogFields {
            title: Some("Renamed".to_string()),
            is_visible: Some(false),
            ..Default::default()
        });
        assert_eq!(entity.title, "Renamed");
        assert_eq!(entity.slug.as_deref(), Some("mango-festival-box"));
        assert_eq!(entity.category.as_deref(), Some("Fruits"));
        assert!(!entity.is_visible);
    }

    #[test]
    fn remove_gallery_item_by_id() {
        let mut entity = CatalogEntity::new(CatalogKind::Seasonal, product_fields());
        let first = MediaRef::new("u1", "r1", MediaKind::Image);
        let second = MediaRef::new("u2", "r2", MediaKind::Video);
        entity.gallery = vec![first.clone(), second.clone()];

        assert!(entity.remove_gallery_item(Uuid::new_v4()).is_none());
        assert_eq!(entity.gallery.len(), 2);

        let removed = entity.remove_gallery_item(first.id).unwrap();
        assert_eq!(removed.remote_id, "r1");
        assert_eq!(entity.gallery, vec![second]);
    }
}
