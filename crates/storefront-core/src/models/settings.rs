use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use super::media::MediaRef;
use crate::error::AppError;

/// Singleton branding and content document for the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteSettings {
    pub logo: Option<MediaRef>,
    pub about_image: Option<MediaRef>,
    /// Footer, contact, social links, about page text and stats.
    pub content: Value,
    /// About page team, kept in `order`.
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

/// The two single-ref media slots held by the settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrandingSlot {
    Logo,
    AboutImage,
}

impl BrandingSlot {
    pub fn folder(&self) -> &'static str {
        match self {
            BrandingSlot::Logo => "settings",
            BrandingSlot::AboutImage => "settings/about",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BrandingSlot::Logo => "Logo",
            BrandingSlot::AboutImage => "About image",
        }
    }
}

/// Asset store folder for team member portraits.
pub const TEAM_MEMBER_FOLDER: &str = "team-members";

const MAX_TEAM_NAME_LEN: usize = 100;
const MAX_TEAM_BIO_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub bio: String,
    pub image: Option<MediaRef>,
    pub is_active: bool,
    pub order: i32,
}

/// Submitted team member fields. On update, absent fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct TeamMemberFields {
    pub name: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub is_active: Option<bool>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn check_len(label: &str, value: Option<&str>, max: usize) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::InvalidInput(format!(
            "{} cannot exceed {} characters",
            label, max
        ))),
        _ => Ok(()),
    }
}

impl TeamMemberFields {
    pub fn validate_for_create(&self) -> Result<(), AppError> {
        if non_blank(&self.name).is_none() {
            return Err(AppError::InvalidInput("Name is required".to_string()));
        }
        if non_blank(&self.role).is_none() {
            return Err(AppError::InvalidInput("Role is required".to_string()));
        }
        self.validate_for_update()
    }

    pub fn validate_for_update(&self) -> Result<(), AppError> {
        check_len("Name", non_blank(&self.name), MAX_TEAM_NAME_LEN)?;
        check_len("Role", non_blank(&self.role), MAX_TEAM_NAME_LEN)?;
        check_len("Bio", self.bio.as_deref().map(str::trim), MAX_TEAM_BIO_LEN)
    }
}

impl TeamMember {
    /// New members are active and go to the end of the list.
    pub fn new(fields: TeamMemberFields, order: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: non_blank(&fields.name).unwrap_or_default().to_string(),
            role: non_blank(&fields.role).unwrap_or_default().to_string(),
            bio: fields.bio.as_deref().map(str::trim).unwrap_or_default().to_string(),
            image: None,
            is_active: fields.is_active.unwrap_or(true),
            order,
        }
    }

    pub fn apply(&mut self, fields: TeamMemberFields) {
        if let Some(name) = non_blank(&fields.name) {
            self.name = name.to_string();
        }
        if let Some(role) = non_blank(&fields.role) {
            self.role = role.to_string();
        }
        if let Some(bio) = fields.bio {
            self.bio = bio.trim().to_string();
        }
        if let Some(active) = fields.is_active {
            self.is_active = active;
        }
    }
}

impl WebsiteSettings {
    /// Appends a member after the current last one.
    pub fn add_team_member(&mut self, fields: TeamMemberFields) -> &mut TeamMember {
        let order = self
            .team_members
            .iter()
            .map(|m| m.order + 1)
            .max()
            .unwrap_or(0);
        self.team_members.push(TeamMember::new(fields, order));
        let last = self.team_members.len() - 1;
        &mut self.team_members[last]
    }

    pub fn team_member_mut(&mut self, id: Uuid) -> Option<&mut TeamMember> {
        self.team_members.iter_mut().find(|m| m.id == id)
    }

    pub fn remove_team_member(&mut self, id: Uuid) -> Option<TeamMember> {
        let index = self.team_members.iter().position(|m| m.id == id)?;
        Some(self.team_members.remove(index))
    }

    /// What the public site shows: active members in display order.
    pub fn for_public(mut self) -> Self {
        self.team_members.retain(|m| m.is_active);
        self.team_members.sort_by_key(|m| m.order);
        self
    }

    pub fn slot(&self, slot: BrandingSlot) -> Option<&MediaRef> {
        match slot {
            BrandingSlot::Logo => self.logo.as_ref(),
            BrandingSlot::AboutImage => self.about_image.as_ref(),
        }
    }

    /// Puts `media` into the slot and returns the previous occupant.
    pub fn set_slot(&mut self, slot: BrandingSlot, media: Option<MediaRef>) -> Option<MediaRef> {
        match slot {
            BrandingSlot::Logo => std::mem::replace(&mut self.logo, media),
            BrandingSlot::AboutImage => std::mem::replace(&mut self.about_image, media),
        }
    }
}

impl Default for WebsiteSettings {
    fn default() -> Self {
        Self {
            logo: None,
            about_image: None,
            content: default_content(),
            team_members: Vec::new(),
            version: 1,
            updated_at: Utc::now(),
        }
    }
}

/// Content used the first time settings are read.
pub fn default_content() -> Value {
    json!({
        "logo_display": {
            "width": 200,
            "height": 50,
            "horizontal_position": 0,
            "vertical_position": 0
        },
        "footer": {
            "phone": "+91-000-0000000",
            "email": "info@example.com",
            "address": "India",
            "description": "Your trusted partner for organic and seasonal products"
        },
        "contact": {
            "heading": "We'd love to hear from you. Get in touch with us today!",
            "subheading": "Get In Touch",
            "location": "India",
            "email": "info@example.com",
            "phone": "+91-000-0000000",
            "business_hours": {
                "days": "Monday - Saturday",
                "time": "9:00 AM - 6:00 PM IST"
            }
        },
        "whatsapp": {
            "number": "",
            "message": "Hello! I would like to know more about your products."
        },
        "social_media": {
            "facebook": "",
            "twitter": "",
            "instagram": "",
            "linkedin": "",
            "youtube": ""
        },
        "about": {
            "main_heading": "About Us",
            "header_description": "Your trusted partner for authentic products and professional solutions",
            "description": "We are committed to providing the best products and services.",
            "values_heading": "Our Values",
            "values_subheading": "What drives us forward",
            "values": [],
            "stats": {
                "customers": "500+",
                "customers_label": "Happy Customers",
                "products": "1000+",
                "products_label": "Products & Services",
                "experience": "10+",
                "experience_label": "Years Experience",
                "satisfaction": "100%",
                "satisfaction_label": "Satisfaction Guaranteed"
            },
            "cta_heading": "Ready to Experience Excellence?",
            "cta_description": "Join our community of satisfied customers."
        }
    })
}

/// Request DTO for the admin content update
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    pub content: Value,
}

impl UpdateSettingsRequest {
    /// Merges the submitted sections over the stored content, one level deep.
    pub fn merge_into(self, current: &mut Value) -> Result<(), AppError> {
        let Value::Object(updates) = self.content else {
            return Err(AppError::InvalidInput(
                "Settings content must be a JSON object".to_string(),
            ));
        };
        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
        if let Value::Object(target) = current {
            for (key, value) in updates {
                match (target.get_mut(&key), value) {
                    (Some(Value::Object(existing)), Value::Object(section)) => {
                        for (field, v) in section {
                            existing.insert(field, v);
                        }
                    }
                    (_, value) => {
                        target.insert(key, value);
                    }
                }
            }
        }
        Ok(())
    }
}
