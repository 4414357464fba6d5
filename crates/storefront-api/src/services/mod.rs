pub mod branding;
pub mod media_lifecycle;

#[cfg(test)]
pub(crate) mod test_support;

pub use branding::BrandingService;
pub use media_lifecycle::{DeleteError, MediaError, MediaLifecycleService, MediaOutcome, UploadFile};
