use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Asset store backend types
///
/// Defined in core because configuration selects the backend before the
/// storage crate builds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStoreBackend {
    Local,
    S3,
    Cloudinary,
}

impl FromStr for AssetStoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(AssetStoreBackend::Local),
            "s3" => Ok(AssetStoreBackend::S3),
            "cloudinary" => Ok(AssetStoreBackend::Cloudinary),
            _ => Err(anyhow::anyhow!("Invalid asset store backend: {}", s)),
        }
    }
}

impl Display for AssetStoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AssetStoreBackend::Local => write!(f, "local"),
            AssetStoreBackend::S3 => write!(f, "s3"),
            AssetStoreBackend::Cloudinary => write!(f, "cloudinary"),
        }
    }
}
