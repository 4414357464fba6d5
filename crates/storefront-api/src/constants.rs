//! API constants

/// Versioned prefix for every JSON route.
pub const API_PREFIX: &str = "/api/v1";

/// Header carrying the admin key on back-office routes.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Route the local asset store's files are served from.
pub const LOCAL_MEDIA_ROUTE: &str = "/media";

/// Proxies in front of the service whose X-Forwarded-For entries are trusted.
pub const TRUSTED_PROXY_COUNT: usize = 1;

/// Room for multipart boundaries and text fields on top of the file bytes.
pub const MULTIPART_OVERHEAD_BYTES: usize = 256 * 1024;

/// Inquiries shown on the admin dashboard.
pub const RECENT_INQUIRY_LIMIT: usize = 5;
