//! Shared harness: a router over a throwaway SQLite database and local
//! file storage, plus multipart and auth helpers.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use clinic_api::{auth::generate_access_token, build_router, AppState};
use clinic_common::{
    config::{AppConfig, AuthConfig, DatabaseConfig, LimitsConfig, ServerConfig, StorageConfig},
    models::{Company, NewCompany, NewDoctor, DoctorStatus},
    ids,
};
use clinic_db::{
    repository::{companies, doctors, users},
    storage::{LocalStorage, ObjectStore},
    Database,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

pub const SECRET: &str = "test-secret-with-enough-entropy";
pub const FILES_BASE: &str = "http://localhost:8080/files";
pub const BOUNDARY: &str = "clinic-test-boundary";

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub storage: Arc<LocalStorage>,
    pub config: AppConfig,
    _dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 8080,
        },
        database: DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", dir.path().join("clinic.db").display()),
            max_connections: 1,
            min_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: SECRET.into(),
            access_token_ttl_secs: 300,
        },
        storage: StorageConfig {
            endpoint: String::new(),
            bucket: "clinic".into(),
            access_key: String::new(),
            secret_key: String::new(),
            region: "us-east-1".into(),
            public_url: Some(FILES_BASE.into()),
            data_dir: dir.path().join("uploads").display().to_string(),
            delete_attempts: 1,
        },
        limits: LimitsConfig {
            max_image_bytes: 2048 * 1024,
            max_body_bytes: 10 * 1024 * 1024,
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(&dir);
        let storage = Arc::new(
            LocalStorage::new(&config.storage.data_dir, FILES_BASE).expect("local storage"),
        );
        storage.ensure_bucket().await.expect("upload dir");
        Self::with_storage(dir, config, storage.clone(), storage).await
    }

    /// Same database and upload directory, but the API talks to `backend`.
    pub async fn spawn_with(backend: impl Fn(Arc<LocalStorage>) -> Arc<dyn ObjectStore>) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(&dir);
        let storage = Arc::new(
            LocalStorage::new(&config.storage.data_dir, FILES_BASE).expect("local storage"),
        );
        storage.ensure_bucket().await.expect("upload dir");
        let api_storage = backend(storage.clone());
        Self::with_storage(dir, config, storage, api_storage).await
    }

    async fn with_storage(
        dir: TempDir,
        config: AppConfig,
        storage: Arc<LocalStorage>,
        api_storage: Arc<dyn ObjectStore>,
    ) -> Self {
        let db = Database::connect(&config.database).await.expect("connect");
        db.migrate().await.expect("migrate");
        let router = build_router(AppState::new(db.clone(), api_storage, config.clone()));
        Self {
            router,
            db,
            storage,
            config,
            _dir: dir,
        }
    }

    // === Seeding ===

    pub async fn seed_company(&self, name: &str, image: Option<&str>) -> Company {
        let company = NewCompany {
            name: name.into(),
            phone: "555-0100".into(),
            address: "1 Main Street".into(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', "")),
        };
        companies::create_company(&self.db.pool, ids::generate_id(), &company, image)
            .await
            .expect("seed company")
    }

    pub async fn seed_user(&self, company_id: Uuid, name: &str) -> Uuid {
        users::create_user(
            &self.db.pool,
            ids::generate_id(),
            company_id,
            name,
            &format!("{}@example.com", name.to_lowercase()),
        )
        .await
        .expect("seed user")
        .id
    }

    pub async fn seed_doctor(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        email: &str,
        image: Option<&str>,
    ) -> Uuid {
        let doctor = NewDoctor {
            name: "Dr. Seed".into(),
            specialty: "Cardiology".into(),
            email: email.into(),
            status: DoctorStatus::Available,
        };
        let id = ids::generate_id();
        doctors::create_doctor(&self.db.pool, id, company_id, user_id, &doctor, image)
            .await
            .expect("seed doctor");
        id
    }

    /// Store an object directly and return its public URL.
    pub async fn seed_object(&self, key: &str) -> String {
        self.storage
            .put_object(key, PNG.to_vec(), "image/png")
            .await
            .expect("seed object");
        self.storage.public_url(key)
    }

    /// A company with one user, and a token for that user.
    pub async fn caller(&self, company: &str) -> (Uuid, Uuid, String) {
        let company = self.seed_company(company, None).await;
        let user_id = self.seed_user(company.id, "Alice").await;
        let token = token_for(user_id, company.id);
        (company.id, user_id, token)
    }

    // === Requests ===

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, path, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(request(Method::DELETE, path, Some(token)).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&self, path: &str, token: &str, form: Multipart) -> (StatusCode, Value) {
        let req = request(Method::POST, path, Some(token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(form.finish()))
            .unwrap();
        self.send(req).await
    }

    /// Status of `GET` on an image URL produced by the API.
    pub async fn fetch_image(&self, url: &str) -> StatusCode {
        let path = Url::parse(url).expect("image url").path().to_string();
        let response = self
            .router
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .expect("response");
        response.status()
    }

    /// Every file currently under the upload directory, as keys.
    pub fn stored_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for dir in ["companies", "doctors"] {
            let Ok(entries) = std::fs::read_dir(self.storage.root().join(dir)) else {
                continue;
            };
            for entry in entries.flatten() {
                keys.push(format!("{dir}/{}", entry.file_name().to_string_lossy()));
            }
        }
        keys.sort();
        keys
    }
}

pub fn token_for(user_id: Uuid, company_id: Uuid) -> String {
    generate_access_token(user_id, company_id, SECRET, 300).expect("token")
}

fn request(method: Method, path: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(path);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

/// Minimal multipart/form-data body builder.
#[derive(Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

/// Uploads and reads go to local storage; deletes always fail.
pub struct FailingDeletes(pub Arc<LocalStorage>);

#[async_trait]
impl ObjectStore for FailingDeletes {
    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
        self.0.put_object(key, data, content_type).await
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        anyhow::bail!("storage unavailable while deleting {key}")
    }

    async fn read_object(&self, key: &str) -> anyhow::Result<Option<(Vec<u8>, String)>> {
        self.0.read_object(key).await
    }

    fn public_base(&self) -> &Url {
        self.0.public_base()
    }
}

/// Every upload fails.
pub struct FailingUploads(pub Arc<LocalStorage>);

#[async_trait]
impl ObjectStore for FailingUploads {
    async fn put_object(&self, key: &str, _data: Vec<u8>, _content_type: &str) -> anyhow::Result<String> {
        anyhow::bail!("storage unavailable while uploading {key}")
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.0.delete_object(key).await
    }

    fn public_base(&self) -> &Url {
        self.0.public_base()
    }
}
