//! Object storage for profile images.
//!
//! [`ObjectStore`] is the contract the API relies on: upload by key, resolve a
//! public URL, map a URL back to its key, delete by key. Two backends:
//! - [`StorageClient`]: MinIO / S3-compatible, wraps `aws-sdk-s3`
//! - [`LocalStorage`]: plain files under a directory (lite mode)

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Builder as S3Builder, Credentials, Region},
    primitives::ByteStream,
    Client,
};
use clinic_common::config::StorageConfig;
use url::Url;

/// Storage backend contract.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes to the given key. Returns the key on success.
    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String>;

    /// Delete an object by key. Deleting a missing object succeeds.
    async fn delete_object(&self, key: &str) -> Result<()>;

    /// Fetch an object's bytes and content type, if the backend serves them itself.
    async fn read_object(&self, _key: &str) -> Result<Option<(Vec<u8>, String)>> {
        Ok(None)
    }

    /// Ensure the backing bucket or directory exists.
    async fn ensure_bucket(&self) -> Result<()> {
        Ok(())
    }

    /// Base URL that keys are appended to.
    fn public_base(&self) -> &Url;

    /// Permanent public URL for a key.
    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base().as_str().trim_end_matches('/'), key)
    }

    /// Recover the storage key from a URL produced by [`ObjectStore::public_url`].
    fn object_key(&self, url: &str) -> Option<String> {
        key_from_url(self.public_base(), url)
    }
}

/// Strip the scheme, host, and public base path from `url`, leaving the key.
///
/// URLs on another origin fall back to their bare path, so links written by
/// an earlier deployment with a different CDN host still resolve.
pub fn key_from_url(base: &Url, url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path();

    let rest = if parsed.origin() == base.origin() {
        let base_path = base.path().trim_end_matches('/');
        path.strip_prefix(base_path).unwrap_or(path)
    } else {
        path
    };

    let key = rest.trim_start_matches('/');
    (!key.is_empty()).then(|| key.to_string())
}

/// Build the backend selected by the config: S3 when an endpoint is set,
/// local files otherwise. `lite_base` is the public base for lite mode when
/// `storage.public_url` is not configured.
pub async fn from_config(cfg: &StorageConfig, lite_base: &str) -> Result<Arc<dyn ObjectStore>> {
    if cfg.is_lite() {
        let base = cfg.public_url.as_deref().unwrap_or(lite_base);
        tracing::info!(dir = %cfg.data_dir, base, "Using local file storage (lite mode)");
        Ok(Arc::new(LocalStorage::new(&cfg.data_dir, base)?))
    } else {
        tracing::info!(endpoint = %cfg.endpoint, bucket = %cfg.bucket, "Using S3 object storage");
        Ok(Arc::new(StorageClient::new(cfg).await?))
    }
}

// ============================================================
// S3 / MinIO
// ============================================================

/// S3/MinIO storage client: wraps the AWS SDK.
#[derive(Clone)]
pub struct StorageClient {
    inner: Client,
    bucket: String,
    public_base: Url,
}

impl StorageClient {
    /// Initialise client from config.
    ///
    /// Static credentials are used when `access_key` is set; otherwise the
    /// AWS default chain (env, profile, instance metadata) supplies them.
    pub async fn new(cfg: &StorageConfig) -> Result<Self> {
        let builder = if cfg.access_key.is_empty() {
            let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .load()
                .await;
            S3Builder::from(&shared)
        } else {
            let creds = Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None, // session token
                None, // expiry
                "clinic-storage",
            );
            S3Builder::new().credentials_provider(creds)
        };

        let s3_cfg = builder
            .endpoint_url(&cfg.endpoint)
            .region(Region::new(cfg.region.clone()))
            // Force path-style URLs (required for MinIO)
            .force_path_style(true)
            .build();

        let base = match &cfg.public_url {
            Some(url) => url.clone(),
            None => format!("{}/{}", cfg.endpoint.trim_end_matches('/'), cfg.bucket),
        };
        let public_base =
            Url::parse(&base).with_context(|| format!("Invalid storage public URL: {base}"))?;

        Ok(Self {
            inner: Client::from_conf(s3_cfg),
            bucket: cfg.bucket.clone(),
            public_base,
        })
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        let stream = ByteStream::from(data);

        self.inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(stream)
            .send()
            .await
            .with_context(|| format!("Failed to upload {key} to object storage"))?;

        Ok(key.to_string())
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to delete {key} from object storage"))?;

        Ok(())
    }

    async fn ensure_bucket(&self) -> Result<()> {
        match self.inner.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                tracing::debug!(bucket = %self.bucket, "Bucket already exists");
                Ok(())
            }
            Err(_) => {
                tracing::info!(bucket = %self.bucket, "Bucket does not exist, creating");
                self.inner
                    .create_bucket()
                    .bucket(&self.bucket)
                    .send()
                    .await
                    .context("Failed to create object storage bucket")?;
                Ok(())
            }
        }
    }

    fn public_base(&self) -> &Url {
        &self.public_base
    }
}

// ============================================================
// Local filesystem (lite mode)
// ============================================================

/// Stores objects as files under `root`, mirroring the key layout.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base: Url,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Result<Self> {
        let public_base = Url::parse(public_base)
            .with_context(|| format!("Invalid storage public URL: {public_base}"))?;
        Ok(Self {
            root: root.into(),
            public_base,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a path under `root`, refusing anything that could escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            bail!("Invalid object key: {key}");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStorage {
    async fn put_object(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory for {key}"))?;
        }
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write {key}"))?;
        Ok(key.to_string())
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {key}")),
        }
    }

    async fn read_object(&self, key: &str) -> Result<Option<(Vec<u8>, String)>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let content_type = mime_guess::from_path(&path)
                    .first_or_octet_stream()
                    .to_string();
                Ok(Some((bytes, content_type)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {key}")),
        }
    }

    async fn ensure_bucket(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create {}", self.root.display()))
    }

    fn public_base(&self) -> &Url {
        &self.public_base
    }
}
