//! Image attachments shared by the company and doctor routes.
//!
//! Create: validate the `image` part → upload under the resource directory →
//! store the public URL on the record, deleting the upload again if the
//! insert fails.
//!
//! Delete: map stored URLs back to keys → delete the objects (bounded
//! attempts) → only then remove the rows. A storage failure aborts the
//! delete with nothing removed from the database, so no object is orphaned
//! and the request can simply be retried.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::Multipart;
use clinic_common::{
    error::{ClinicError, ClinicResult},
    ids,
    validation::{non_blank, FieldErrors},
};
use clinic_db::storage::ObjectStore;

/// Pause between storage delete attempts.
const DELETE_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Extensions accepted for profile images, in the order they are reported.
const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "png", "jpg", "gif"];

/// Which resource an image belongs to; decides its key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Company,
    Doctor,
}

impl ResourceKind {
    /// Top-level directory in the bucket.
    pub fn directory(self) -> &'static str {
        match self {
            Self::Company => "companies",
            Self::Doctor => "doctors",
        }
    }

    /// File name prefix ahead of the uniqueness token.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Doctor => "doctor",
        }
    }

    /// Fresh object key: `{directory}/{prefix}_{token}.{ext}`.
    pub fn object_key(self, extension: &str) -> String {
        format!(
            "{}/{}_{}.{}",
            self.directory(),
            self.file_prefix(),
            ids::unique_token(),
            extension
        )
    }
}

// ============================================================
// Image sniffing
// ============================================================

/// Image encodings recognised from their magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
}

impl ImageFormat {
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else if data.starts_with(b"BM") {
            Some(Self::Bmp)
        } else {
            None
        }
    }

    /// Whether profile images may use this encoding.
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Gif)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
        }
    }
}

// ============================================================
// Upload validation
// ============================================================

/// An `image` part as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// An image that passed every rule and is ready to upload.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub extension: String,
}

impl ImageUpload {
    /// Browsers send an empty part when the file input was left blank.
    pub fn is_blank(&self) -> bool {
        self.data.is_empty() && self.file_name.as_deref().is_none_or(|n| n.trim().is_empty())
    }

    /// Lower-cased extension of the client's file name.
    pub fn client_extension(&self) -> Option<String> {
        let name = self.file_name.as_deref()?;
        let (stem, ext) = name.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }

    /// Check the image rules, recording every failure under `image`.
    pub fn validate(self, max_bytes: usize, errors: &mut FieldErrors) -> Option<ValidatedImage> {
        let mut ok = true;

        let format = ImageFormat::sniff(&self.data);
        match format {
            None => {
                errors.add("image", "The image field must be an image.");
                ok = false;
            }
            Some(f) if !f.is_allowed() => {
                errors.add(
                    "image",
                    format!(
                        "The image field must be a file of type: {}.",
                        ALLOWED_EXTENSIONS.join(", ")
                    ),
                );
                ok = false;
            }
            Some(_) => {}
        }

        if self.data.len() > max_bytes {
            errors.add(
                "image",
                format!(
                    "The image field must not be greater than {} kilobytes.",
                    max_bytes / 1024
                ),
            );
            ok = false;
        }

        let format = format.filter(|_| ok)?;
        let extension = self
            .client_extension()
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or_else(|| format.extension().to_string());

        Some(ValidatedImage {
            data: self.data,
            format,
            extension,
        })
    }
}

// ============================================================
// Multipart forms
// ============================================================

/// Text fields and the optional `image` part of a create form.
#[derive(Debug, Default)]
pub struct SubmittedForm {
    fields: HashMap<String, String>,
    pub image: Option<ImageUpload>,
}

impl SubmittedForm {
    /// Read every part of a multipart body. Unknown file parts are ignored.
    pub async fn read(mut multipart: Multipart) -> ClinicResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "image" {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(malformed)?.to_vec();
                let upload = ImageUpload { file_name, data };
                form.image = (!upload.is_blank()).then_some(upload);
            } else if field.file_name().is_none() {
                let value = field.text().await.map_err(malformed)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Take a trimmed, non-blank text field.
    pub fn take(&mut self, name: &str) -> Option<String> {
        non_blank(self.fields.remove(name))
    }

    #[cfg(test)]
    pub(crate) fn from_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            image: None,
        }
    }
}

fn malformed(e: axum::extract::multipart::MultipartError) -> ClinicError {
    ClinicError::Validation {
        errors: FieldErrors::single("request", format!("Malformed multipart body: {e}")),
    }
}

// ============================================================
// Storage side effects
// ============================================================

/// An uploaded object and the URL stored on the record.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

/// Upload a validated image under the resource's directory.
pub async fn store_image(
    storage: &dyn ObjectStore,
    kind: ResourceKind,
    image: ValidatedImage,
) -> ClinicResult<StoredImage> {
    let key = kind.object_key(&image.extension);
    let key = storage
        .put_object(&key, image.data, image.format.content_type())
        .await
        .map_err(ClinicError::Storage)?;
    let url = storage.public_url(&key);

    tracing::info!(key = %key, "Image uploaded");
    Ok(StoredImage { key, url })
}

/// Upload the image if there is one.
pub async fn store_optional(
    storage: &dyn ObjectStore,
    kind: ResourceKind,
    image: Option<ValidatedImage>,
) -> ClinicResult<Option<StoredImage>> {
    match image {
        Some(image) => store_image(storage, kind, image).await.map(Some),
        None => Ok(None),
    }
}

/// Pass `result` through, deleting the fresh upload if persisting failed.
pub async fn settle<T>(
    storage: &dyn ObjectStore,
    stored: Option<&StoredImage>,
    result: ClinicResult<T>,
) -> ClinicResult<T> {
    if result.is_err() {
        if let Some(stored) = stored {
            if let Err(e) = storage.delete_object(&stored.key).await {
                tracing::warn!(key = %stored.key, error = ?e, "Failed to remove upload after failed insert");
            }
        }
    }
    result
}

/// Storage key behind a stored image URL.
///
/// Keys outside the resource's directory are never deleted on its behalf.
pub fn image_key(storage: &dyn ObjectStore, kind: ResourceKind, url: &str) -> Option<String> {
    let key = storage.object_key(url);
    match key {
        Some(key) if key.starts_with(&format!("{}/", kind.directory())) => Some(key),
        _ => {
            tracing::warn!(url, kind = kind.directory(), "Image URL does not map to a stored object; skipping");
            None
        }
    }
}

/// Delete objects, trying each up to `attempts` times.
///
/// Returns the first key that could not be deleted as a storage error.
pub async fn remove_objects(
    storage: &dyn ObjectStore,
    keys: &[String],
    attempts: u32,
) -> ClinicResult<()> {
    let attempts = attempts.max(1);

    for key in keys {
        let mut attempt = 1;
        loop {
            match storage.delete_object(key).await {
                Ok(()) => {
                    tracing::info!(key = %key, "Image deleted");
                    break;
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(key = %key, attempt, error = ?e, "Image delete failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(DELETE_RETRY_DELAY).await;
                }
                Err(e) => {
                    tracing::error!(key = %key, attempts, error = ?e, "Image delete failed, giving up");
                    return Err(ClinicError::Storage(e));
                }
            }
        }
    }

    Ok(())
}
