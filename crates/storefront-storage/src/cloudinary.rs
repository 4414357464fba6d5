//! Cloudinary asset store
//!
//! Signed uploads go to `{api_base}/v1_1/{cloud}/auto/upload` so Cloudinary
//! classifies images and videos itself; destroys must name the resource type
//! the asset was stored under. A `not found` destroy result is a success.

use crate::keys::prefixed_folder;
use crate::traits::{AssetReader, AssetStore, StorageError, StorageResult};
use crate::{AssetStoreBackend, MediaKind, MediaRef};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

const REQUEST_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    resource_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Cloudinary REST client
#[derive(Clone)]
pub struct CloudinaryStore {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder_prefix: String,
}

impl CloudinaryStore {
    /// Create a new CloudinaryStore
    ///
    /// `api_base` defaults to the public Cloudinary API when `None`.
    pub fn new(
        cloud_name: String,
        api_key: String,
        api_secret: String,
        folder_prefix: String,
        api_base: Option<String>,
    ) -> StorageResult<Self> {
        if cloud_name.is_empty() || api_key.is_empty() || api_secret.is_empty() {
            return Err(StorageError::ConfigError(
                "Cloudinary cloud name, API key and API secret are required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            cloud_name,
            api_key,
            api_secret,
            folder_prefix,
        })
    }

    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.api_base, self.cloud_name, resource_type, action
        )
    }

    /// SHA-256 request signature over the sorted `key=value` pairs plus the secret.
    fn sign(&self, params: &[(&str, String)]) -> String {
        sign_params(params, &self.api_secret)
    }

    fn signed_form(&self, params: Vec<(&'static str, String)>) -> Form {
        let signature = self.sign(&params);
        let mut form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }
        form
    }

    async fn send_upload(
        &self,
        folder: &str,
        content_type: &str,
        file: Part,
        size: Option<u64>,
    ) -> StorageResult<MediaRef> {
        let folder = prefixed_folder(&self.folder_prefix, folder)?;
        let public_id = Uuid::new_v4().to_string();
        let start = std::time::Instant::now();

        let form = self
            .signed_form(vec![
                ("folder", folder.clone()),
                ("public_id", public_id),
                ("timestamp", chrono::Utc::now().timestamp().to_string()),
            ])
            .part("file", file);

        let response = self
            .client
            .post(self.endpoint("auto", "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    folder = %folder,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Cloudinary upload request failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            tracing::error!(
                status = %status,
                error = %message,
                folder = %folder,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Cloudinary upload rejected"
            );
            return Err(StorageError::UploadFailed(format!(
                "Cloudinary returned {}: {}",
                status, message
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Invalid upload response: {}", e)))?;

        let kind = match body.resource_type.as_deref() {
            Some("video") => MediaKind::Video,
            Some("image") => MediaKind::Image,
            _ => MediaKind::from_mime(content_type),
        };

        tracing::info!(
            public_id = %body.public_id,
            folder = %folder,
            kind = %kind,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloudinary upload successful"
        );

        Ok(MediaRef::new(body.secure_url, body.public_id, kind))
    }
}

pub(crate) fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

async fn error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error.message)
        .unwrap_or(text)
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    async fn upload(
        &self,
        folder: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<MediaRef> {
        let size = data.len() as u64;
        let part = Part::stream_with_length(reqwest::Body::from(data), size)
            .file_name("upload")
            .mime_str(content_type)
            .map_err(|e| StorageError::UploadFailed(format!("Invalid content type: {}", e)))?;
        self.send_upload(folder, content_type, part, Some(size)).await
    }

    async fn upload_stream(
        &self,
        folder: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: AssetReader,
    ) -> StorageResult<MediaRef> {
        let body = reqwest::Body::wrap_stream(tokio_util::io::ReaderStream::new(reader));
        let part = match content_length {
            Some(len) => Part::stream_with_length(body, len),
            None => Part::stream(body),
        };
        let part = part
            .file_name("upload")
            .mime_str(content_type)
            .map_err(|e| StorageError::UploadFailed(format!("Invalid content type: {}", e)))?;
        self.send_upload(folder, content_type, part, content_length)
            .await
    }

    async fn delete(&self, remote_id: &str, kind: MediaKind) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let form = self.signed_form(vec![
            ("invalidate", "true".to_string()),
            ("public_id", remote_id.to_string()),
            ("timestamp", chrono::Utc::now().timestamp().to_string()),
        ]);

        let response = self
            .client
            .post(self.endpoint(kind.as_str(), "destroy"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            tracing::error!(
                status = %status,
                error = %message,
                public_id = %remote_id,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Cloudinary destroy rejected"
            );
            return Err(StorageError::DeleteFailed(format!(
                "Cloudinary returned {}: {}",
                status, message
            )));
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| StorageError::DeleteFailed(format!("Invalid destroy response: {}", e)))?;

        match body.result.as_str() {
            "ok" | "not found" => {
                tracing::info!(
                    public_id = %remote_id,
                    result = %body.result,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Cloudinary destroy successful"
                );
                Ok(())
            }
            other => Err(StorageError::DeleteFailed(format!(
                "Cloudinary destroy returned '{}'",
                other
            ))),
        }
    }

    async fn exists(&self, remote_id: &str, kind: MediaKind) -> StorageResult<bool> {
        let url = format!(
            "{}/v1_1/{}/resources/{}/upload/{}",
            self.api_base,
            self.cloud_name,
            kind.as_str(),
            remote_id
        );
        let response = self
            .client
            .get(url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(StorageError::BackendError(format!(
                "Cloudinary returned {}: {}",
                s,
                error_message(response).await
            ))),
        }
    }

    fn backend_type(&self) -> AssetStoreBackend {
        AssetStoreBackend::Cloudinary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Multipart, Path as AxumPath, State};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    const SECRET: &str = "test-secret";

    /// In-process stand-in for the Cloudinary upload/destroy endpoints.
    #[derive(Clone, Default)]
    struct MockCloud {
        stored: Arc<Mutex<HashSet<String>>>,
        fail_uploads: bool,
    }

    async fn read_fields(mut multipart: Multipart) -> (HashMap<String, String>, usize) {
        let mut fields = HashMap::new();
        let mut file_len = 0;
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                file_len = field.bytes().await.unwrap().len();
            } else {
                fields.insert(name, field.text().await.unwrap());
            }
        }
        (fields, file_len)
    }

    fn signature_matches(fields: &HashMap<String, String>, signed: &[&str]) -> bool {
        let params: Vec<(&str, String)> = signed
            .iter()
            .filter_map(|k| fields.get(*k).map(|v| (*k, v.clone())))
            .collect();
        fields.get("signature") == Some(&sign_params(&params, SECRET))
    }

    async fn upload(
        State(cloud): State<MockCloud>,
        AxumPath((_cloud_name, resource_type)): AxumPath<(String, String)>,
        multipart: Multipart,
    ) -> (axum::http::StatusCode, Json<Value>) {
        let (fields, file_len) = read_fields(multipart).await;
        if cloud.fail_uploads {
            return (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": {"message": "quota exceeded"}})),
            );
        }
        assert_eq!(resource_type, "auto");
        assert!(file_len > 0);
        if !signature_matches(&fields, &["folder", "public_id", "timestamp"]) {
            return (
                axum::http::StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"message": "Invalid Signature"}})),
            );
        }
        let public_id = format!("{}/{}", fields["folder"], fields["public_id"]);
        cloud.stored.lock().unwrap().insert(public_id.clone());
        (
            axum::http::StatusCode::OK,
            Json(json!({
                "public_id": public_id,
                "secure_url": format!("https://res.example.com/{}", public_id),
                "resource_type": "image"
            })),
        )
    }

    async fn destroy(State(cloud): State<MockCloud>, multipart: Multipart) -> Json<Value> {
        let (fields, _) = read_fields(multipart).await;
        assert!(signature_matches(&fields, &["invalidate", "public_id", "timestamp"]));
        let removed = cloud.stored.lock().unwrap().remove(&fields["public_id"]);
        Json(json!({"result": if removed { "ok" } else { "not found" }}))
    }

    async fn resource(
        State(cloud): State<MockCloud>,
        AxumPath((_cloud_name, _rt, public_id)): AxumPath<(String, String, String)>,
    ) -> axum::http::StatusCode {
        if cloud.stored.lock().unwrap().contains(&public_id) {
            axum::http::StatusCode::OK
        } else {
            axum::http::StatusCode::NOT_FOUND
        }
    }

    async fn spawn_mock(cloud: MockCloud) -> String {
        let app = Router::new()
            .route("/v1_1/{cloud}/{resource_type}/upload", post(upload))
            .route("/v1_1/{cloud}/{resource_type}/destroy", post(destroy))
            .route(
                "/v1_1/{cloud}/resources/{resource_type}/upload/{*public_id}",
                get(resource),
            )
            .with_state(cloud);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn store(api_base: String) -> CloudinaryStore {
        CloudinaryStore::new(
            "demo".to_string(),
            "key".to_string(),
            SECRET.to_string(),
            "storefront".to_string(),
            Some(api_base),
        )
        .unwrap()
    }

    #[test]
    fn signature_sorts_and_skips_empty() {
        let a = sign_params(
            &[("timestamp", "1".to_string()), ("folder", "x".to_string())],
            "s",
        );
        let b = sign_params(
            &[
                ("folder", "x".to_string()),
                ("public_id", String::new()),
                ("timestamp", "1".to_string()),
            ],
            "s",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn upload_then_delete_twice() {
        let cloud = MockCloud::default();
        let base = spawn_mock(cloud.clone()).await;
        let store = store(base);

        let media = store
            .upload("tech/gallery", "image/png", Bytes::from_static(b"png-bytes"))
            .await
            .unwrap();
        assert!(media.remote_id.starts_with("storefront/tech/gallery/"));
        assert!(media.url.starts_with("https://res.example.com/"));
        assert_eq!(media.kind, MediaKind::Image);
        assert!(store.exists(&media.remote_id, media.kind).await.unwrap());

        store.delete(&media.remote_id, media.kind).await.unwrap();
        store.delete(&media.remote_id, media.kind).await.unwrap();
        assert!(!store.exists(&media.remote_id, media.kind).await.unwrap());
    }

    #[tokio::test]
    async fn stream_upload_is_signed() {
        let cloud = MockCloud::default();
        let base = spawn_mock(cloud.clone()).await;
        let store = store(base);

        let reader: AssetReader = Box::pin(std::io::Cursor::new(b"streamed".to_vec()));
        let media = store
            .upload_stream("stories", "image/jpeg", Some(8), reader)
            .await
            .unwrap();
        assert!(cloud.stored.lock().unwrap().contains(&media.remote_id));
    }

    #[tokio::test]
    async fn upload_failure_is_reported() {
        let cloud = MockCloud {
            fail_uploads: true,
            ..Default::default()
        };
        let base = spawn_mock(cloud).await;
        let store = store(base);

        let err = store
            .upload("seasonal", "image/jpeg", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        match err {
            StorageError::UploadFailed(msg) => assert!(msg.contains("quota exceeded")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_credentials_rejected() {
        let result = CloudinaryStore::new(
            "demo".to_string(),
            String::new(),
            SECRET.to_string(),
            "storefront".to_string(),
            None,
        );
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
