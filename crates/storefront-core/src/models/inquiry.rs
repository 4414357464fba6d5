use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::catalog::CatalogKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    #[default]
    New,
    Contacted,
    Closed,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::New => "new",
            InquiryStatus::Contacted => "contacted",
            InquiryStatus::Closed => "closed",
        }
    }
}

impl FromStr for InquiryStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(InquiryStatus::New),
            "contacted" => Ok(InquiryStatus::Contacted),
            "closed" => Ok(InquiryStatus::Closed),
            _ => Err(anyhow::anyhow!("Invalid inquiry status: {}", s)),
        }
    }
}

impl Display for InquiryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Which catalog an inquiry is about; `General` has no product attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Seasonal,
    Tech,
    Organic,
    General,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Seasonal => "seasonal",
            ProductType::Tech => "tech",
            ProductType::Organic => "organic",
            ProductType::General => "general",
        }
    }

    pub fn catalog_kind(&self) -> Option<CatalogKind> {
        match self {
            ProductType::Seasonal => Some(CatalogKind::Seasonal),
            ProductType::Tech => Some(CatalogKind::Tech),
            ProductType::Organic => Some(CatalogKind::Organic),
            ProductType::General => None,
        }
    }
}

impl FromStr for ProductType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "seasonal" => Ok(ProductType::Seasonal),
            "tech" => Ok(ProductType::Tech),
            "organic" => Ok(ProductType::Organic),
            "general" => Ok(ProductType::General),
            _ => Err(anyhow::anyhow!("Invalid product type: {}", s)),
        }
    }
}

impl Display for ProductType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: Uuid,
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub requirement: String,
    pub product_type: ProductType,
    pub product_id: Option<Uuid>,
    pub product_title: Option<String>,
    pub status: InquiryStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for a public inquiry submission
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInquiryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 7, max = 20, message = "Mobile number must be between 7 and 20 characters"))]
    pub mobile: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, max = 2000, message = "Requirement must be between 1 and 2000 characters"))]
    pub requirement: String,
    pub product_type: ProductType,
    #[serde(default)]
    pub product_id: Option<Uuid>,
}

impl Inquiry {
    /// Builds a new inquiry; `product_title` is resolved by the caller.
    pub fn new(request: CreateInquiryRequest, product_title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            mobile: request.mobile.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            requirement: request.requirement,
            product_type: request.product_type,
            product_id: request.product_id,
            product_title,
            status: InquiryStatus::New,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request DTO for the admin status change
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateInquiryStatusRequest {
    pub status: InquiryStatus,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub admin_notes: Option<String>,
}

/// Admin list filters; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InquiryFilter {
    pub status: Option<InquiryStatus>,
    pub product_type: Option<ProductType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl InquiryFilter {
    pub fn matches(&self, inquiry: &Inquiry) -> bool {
        self.status.is_none_or(|s| inquiry.status == s)
            && self.product_type.is_none_or(|t| inquiry.product_type == t)
            && self.from.is_none_or(|from| inquiry.created_at >= from)
            && self.to.is_none_or(|to| inquiry.created_at <= to)
    }
}
