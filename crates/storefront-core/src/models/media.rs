use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a stored asset, inferred from its MIME type at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

impl MediaKind {
    /// `video/*` is a video, anything else is treated as an image.
    pub fn from_mime(content_type: &str) -> Self {
        if content_type.trim().to_lowercase().starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            _ => Err(anyhow::anyhow!("Invalid media kind: {}", s)),
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Handle to one remotely stored asset.
///
/// Created only by a successful upload and never edited in place; a slot is
/// updated by swapping in a new ref. `remote_id` is what the asset store needs
/// to delete the object, `id` addresses the ref inside its owning entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: Uuid,
    pub url: String,
    pub remote_id: String,
    pub kind: MediaKind,
}

impl MediaRef {
    pub fn new(url: impl Into<String>, remote_id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            remote_id: remote_id.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("Video/QuickTime"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("application/octet-stream"), MediaKind::Image);
    }

    #[test]
    fn media_ref_serializes_snake_case() {
        let media = MediaRef::new("https://cdn/x.jpg", "storefront/seasonal/x", MediaKind::Image);
        let json = serde_json::to_value(&media).unwrap();
        assert_eq!(json["remote_id"], "storefront/seasonal/x");
        assert_eq!(json["kind"], "image");
    }
}
