//! Storefront Storage Library
//!
//! This crate provides the asset store abstraction used by the media lifecycle
//! and its backends: local filesystem, S3-compatible object storage and Cloudinary.
//!
//! # Remote id format
//!
//! Every upload lands under `{prefix}/{folder}/{uuid}.{ext}`; the prefix is
//! configured per deployment (default `storefront`) and the folder names the
//! catalog slot (`seasonal`, `tech/gallery`, `stories`, ...). For the local and
//! S3 backends the remote id is that key. Cloudinary returns its own `public_id`,
//! built from the same folder and uuid without the extension.
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

#[cfg(feature = "storage-cloudinary")]
pub mod cloudinary;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-cloudinary")]
pub use cloudinary::CloudinaryStore;
pub use factory::create_asset_store;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use storefront_core::models::{MediaKind, MediaRef};
pub use storefront_core::AssetStoreBackend;
pub use traits::{AssetReader, AssetStore, StorageError, StorageResult};
