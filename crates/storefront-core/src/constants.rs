//! Constants shared across crates.

/// Default top-level folder for every asset uploaded by this service.
pub const DEFAULT_ASSET_FOLDER_PREFIX: &str = "storefront";

/// Maximum number of gallery files accepted in a single request.
pub const MAX_GALLERY_FILES_PER_REQUEST: usize = 10;

/// Default currency for tech package prices.
pub const DEFAULT_CURRENCY: &str = "INR";
