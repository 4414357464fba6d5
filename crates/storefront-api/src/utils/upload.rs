//! Multipart parsing and validation for media-carrying admin forms

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use rust_decimal::Decimal;
use storefront_core::models::{CatalogFields, TeamMemberFields};
use storefront_core::AppError;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use crate::services::UploadFile;
use crate::state::UploadLimits;

/// Multipart field holding the featured image (or a branding image).
pub const FEATURED_FIELD: &str = "featured_image";

/// Strip MIME parameters: "image/jpeg; charset=utf-8" -> "image/jpeg".
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

/// Validate content type against an allowlist, ignoring parameters.
pub fn validate_content_type(content_type: &str, allowed_types: &[String]) -> Result<String, AppError> {
    let normalized = normalize_mime_type(content_type);
    if !allowed_types.iter().any(|ct| ct.eq_ignore_ascii_case(&normalized)) {
        return Err(AppError::InvalidInput(format!(
            "Invalid content type '{}'. Allowed types: {}",
            normalized,
            allowed_types.join(", ")
        )));
    }
    Ok(normalized)
}

pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "Upload exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Keep only the final path component and a safe character set.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    const MAX_FILENAME_LENGTH: usize = 255;

    let filename_only = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if filename_only.contains("..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Ok("file".to_string());
    }
    Ok(sanitized)
}

/// Copies one file part into a temp file chunk by chunk.
///
/// `total_bytes` accumulates over the whole request and is checked after every
/// chunk, so an oversized upload stops before it is fully written.
async fn spool_field(
    field: &mut Field<'_>,
    total_bytes: &mut usize,
    max_upload_bytes: usize,
) -> Result<(TempPath, u64), AppError> {
    let (file, path) = tempfile::Builder::new()
        .prefix("storefront-upload-")
        .tempfile()?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);
    let mut written = 0u64;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?
    {
        *total_bytes += chunk.len();
        validate_file_size(*total_bytes, max_upload_bytes)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok((path, written))
}

/// Files and text fields of one admin form.
#[derive(Debug, Default)]
pub struct MediaForm {
    text: HashMap<String, Vec<String>>,
    pub featured: Option<UploadFile>,
    pub gallery: Vec<UploadFile>,
}

impl MediaForm {
    /// Reads every part. `gallery_field` names the multi-file slot ("gallery" or "media").
    ///
    /// The featured slot takes images only; the gallery slot takes images and videos.
    pub async fn read(
        mut multipart: Multipart,
        limits: &UploadLimits,
        gallery_field: &str,
    ) -> Result<Self, AppError> {
        let mut form = MediaForm::default();
        let mut total_bytes = 0usize;

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            let Some(raw_filename) = field.file_name().map(str::to_string) else {
                let value = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read field '{}': {}", name, e))
                })?;
                form.text.entry(name).or_default().push(value);
                continue;
            };

            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();

            let is_featured = name == FEATURED_FIELD;
            if !is_featured && name != gallery_field {
                return Err(AppError::InvalidInput(format!(
                    "Unexpected file field '{}'",
                    name
                )));
            }

            let (path, size_bytes) =
                spool_field(&mut field, &mut total_bytes, limits.max_upload_bytes).await?;

            // Browsers send an empty part for an untouched file input.
            if size_bytes == 0 && raw_filename.is_empty() {
                continue;
            }
            if size_bytes == 0 {
                return Err(AppError::InvalidInput(format!("File '{}' is empty", raw_filename)));
            }

            let file_name = sanitize_filename(&raw_filename)?;
            if is_featured {
                if form.featured.is_some() {
                    return Err(AppError::InvalidInput(
                        "Only one featured image may be sent".to_string(),
                    ));
                }
                let content_type =
                    validate_content_type(&content_type, &limits.allowed_image_content_types)?;
                form.featured = Some(UploadFile::spooled(file_name, content_type, size_bytes, path));
            } else {
                let content_type = validate_content_type(&content_type, &limits.allowed_media_types())?;
                form.gallery
                    .push(UploadFile::spooled(file_name, content_type, size_bytes, path));
            }
        }

        Ok(form)
    }

    fn last(&self, key: &str) -> Option<&str> {
        self.text.get(key).and_then(|values| values.last()).map(String::as_str)
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.last(key).map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::InvalidInput(format!("Invalid value for '{}'", key))),
            None => Ok(None),
        }
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, AppError> {
        self.last(key).map(parse_checkbox).transpose()
    }

    /// Features come as repeated fields or one newline-separated textarea.
    fn features(&self) -> Option<Vec<String>> {
        self.text.get("features").map(|values| {
            values
                .iter()
                .flat_map(|v| v.lines())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect()
        })
    }

    pub fn team_member_fields(&self) -> Result<TeamMemberFields, AppError> {
        let text = |key: &str| self.last(key).map(String::from);
        Ok(TeamMemberFields {
            name: text("name"),
            role: text("role"),
            bio: text("bio"),
            is_active: self.flag("is_active")?,
        })
    }

    /// Editable catalog fields; absent text fields stay `None`.
    pub fn catalog_fields(&self) -> Result<CatalogFields, AppError> {
        let text = |key: &str| self.last(key).map(String::from);
        Ok(CatalogFields {
            title: text("title"),
            slug: text("slug"),
            category: text("category"),
            short_description: text("short_description"),
            full_description: text("full_description"),
            description: text("description"),
            features: self.features(),
            price_amount: self.parsed::<Decimal>("price")?,
            price_note: text("price_note"),
            is_visible: self.flag("is_visible")?,
            is_available: self.flag("is_available")?,
            display_order: self.parsed::<i32>("display_order")?,
        })
    }
}

/// HTML checkbox semantics plus the usual boolean spellings.
pub fn parse_checkbox(value: &str) -> Result<bool, AppError> {
    match value.trim().to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" | "" => Ok(false),
        other => Err(AppError::InvalidInput(format!(
            "Invalid checkbox value '{}'",
            other
        ))),
    }
}
