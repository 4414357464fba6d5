//! Shared key generation for asset store backends.
//!
//! Key format: `{prefix}/{folder}/{uuid}.{ext}`.

use crate::traits::{StorageError, StorageResult};
use uuid::Uuid;

/// File extension for a MIME type; unknown types get `bin`.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type.trim().to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "video/x-msvideo" => "avi",
        _ => "bin",
    }
}

/// Reject folders that could escape the configured prefix.
pub fn validate_folder(folder: &str) -> StorageResult<()> {
    if folder.is_empty()
        || folder.contains("..")
        || folder.starts_with('/')
        || folder.contains('\\')
        || folder.split('/').any(|segment| segment.is_empty())
    {
        return Err(StorageError::InvalidKey(format!(
            "Invalid asset folder: {}",
            folder
        )));
    }
    Ok(())
}

/// Folder path with the deployment prefix applied.
pub fn prefixed_folder(prefix: &str, folder: &str) -> StorageResult<String> {
    validate_folder(folder)?;
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        Ok(folder.to_string())
    } else {
        Ok(format!("{}/{}", prefix, folder))
    }
}

/// Generate a new object key under `{prefix}/{folder}`.
pub fn generate_asset_key(prefix: &str, folder: &str, content_type: &str) -> StorageResult<String> {
    let folder = prefixed_folder(prefix, folder)?;
    Ok(format!(
        "{}/{}.{}",
        folder,
        Uuid::new_v4(),
        extension_for(content_type)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        let key = generate_asset_key("storefront", "seasonal/gallery", "video/mp4").unwrap();
        assert!(key.starts_with("storefront/seasonal/gallery/"));
        assert!(key.ends_with(".mp4"));
    }

    #[test]
    fn empty_prefix_is_allowed() {
        let key = generate_asset_key("", "stories", "image/png").unwrap();
        assert!(key.starts_with("stories/"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn traversal_folders_rejected() {
        assert!(generate_asset_key("storefront", "../etc", "image/png").is_err());
        assert!(generate_asset_key("storefront", "/abs", "image/png").is_err());
        assert!(generate_asset_key("storefront", "a//b", "image/png").is_err());
    }

    #[test]
    fn unknown_mime_gets_bin() {
        assert_eq!(extension_for("application/x-thing"), "bin");
        assert_eq!(extension_for("IMAGE/JPEG"), "jpg");
    }
}
