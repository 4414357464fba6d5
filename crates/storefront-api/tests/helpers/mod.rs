//! Shared setup for the HTTP tests: the full router over in-memory
//! repositories and a local asset store rooted in a temp directory.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;

use axum_test::multipart::Part;
use axum_test::TestServer;
use serde_json::Value;
use storefront_api::constants::API_PREFIX;
use storefront_api::setup;
use storefront_core::config::StorefrontConfig;
use storefront_core::Config;
use tempfile::TempDir;

pub const ADMIN_KEY: &str = "test-admin-key-0123456789abcdef0123";

pub struct TestApp {
    pub server: TestServer,
    pub media_dir: TempDir,
}

impl TestApp {
    /// Where the local store keeps the object behind `remote_id`.
    pub fn stored_path(&self, remote_id: &str) -> PathBuf {
        self.media_dir.path().join(remote_id)
    }

    pub fn stored(&self, media: &Value) -> bool {
        let remote_id = media["remote_id"].as_str().expect("remote_id");
        self.stored_path(remote_id).exists()
    }
}

pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

pub async fn spawn_app() -> TestApp {
    let media_dir = tempfile::tempdir().expect("Failed to create media dir");
    let media_path = media_dir.path().to_string_lossy().to_string();

    let vars: HashMap<&str, String> = HashMap::from([
        ("ADMIN_API_KEY", ADMIN_KEY.to_string()),
        ("ENVIRONMENT", "test".to_string()),
        ("ASSET_STORE_BACKEND", "local".to_string()),
        ("LOCAL_STORAGE_PATH", media_path),
        (
            "LOCAL_STORAGE_BASE_URL",
            "http://localhost:3000/media".to_string(),
        ),
    ]);
    let config = StorefrontConfig::from_lookup(|key: &str| vars.get(key).cloned())
        .expect("Failed to build test config");

    let (_state, router) = setup::initialize_app(Config(Box::new(config)))
        .await
        .expect("Failed to initialize app");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp { server, media_dir }
}

pub fn jpeg(name: &str) -> Part {
    Part::bytes(b"\xFF\xD8\xFF\xE0fake-jpeg".to_vec())
        .file_name(name.to_string())
        .mime_type("image/jpeg")
}

pub fn png(name: &str) -> Part {
    Part::bytes(b"\x89PNGfake-png".to_vec())
        .file_name(name.to_string())
        .mime_type("image/png")
}

pub fn mp4(name: &str) -> Part {
    Part::bytes(b"\x00\x00\x00\x18ftypmp42".to_vec())
        .file_name(name.to_string())
        .mime_type("video/mp4")
}
