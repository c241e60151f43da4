//! Image attachments for surveillance PVs.
//!
//! Files live under `<media-root>/images/` with uuid-generated names, so
//! concurrent uploads never collide and an existing file is never
//! overwritten. Records reference them as `/uploads/images/<name>`, the
//! path prefix the server serves statically.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pvdesk_core::PvDetails;
use pvdesk_storage::PvStorage;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::now_rfc3339;

/// Maximum number of files per upload request.
pub const MAX_IMAGES_PER_UPLOAD: usize = 10;

/// Maximum size of a single uploaded image: 5 MB. The client checks this
/// too, but the server re-validates regardless.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Public path prefix under which stored images are served back.
pub const IMAGE_URL_PREFIX: &str = "/uploads/images";

/// One uploaded file, as extracted from the multipart request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// File-backed store for attachment images under a media root directory.
pub struct ImageStore {
    images_dir: PathBuf,
}

impl ImageStore {
    /// Open (and create if needed) `<root>/images`.
    pub fn open(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let images_dir = root.as_ref().join("images");
        std::fs::create_dir_all(&images_dir)?;
        Ok(Self { images_dir })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Persist one image under a fresh uuid name, returning its public ref.
    async fn save(&self, image: UploadedImage) -> Result<String, ServiceError> {
        let name = format!("{}{}", Uuid::new_v4(), sanitize_extension(&image.file_name));
        let path = self.images_dir.join(&name);
        tokio::task::spawn_blocking(move || std::fs::write(&path, &image.bytes))
            .await
            .map_err(|e| ServiceError::Storage(format!("task join error: {e}")))?
            .map_err(|e| ServiceError::Storage(format!("image write failed: {e}")))?;
        Ok(format!("{IMAGE_URL_PREFIX}/{name}"))
    }

    /// Delete the file behind a public ref. A file that is already gone is
    /// not an error — the goal is that the ref no longer resolves.
    async fn remove(&self, image_ref: &str) -> Result<(), ServiceError> {
        let Some(name) = file_name_from_ref(image_ref) else {
            return Ok(());
        };
        let path = self.images_dir.join(name);
        let result =
            tokio::task::spawn_blocking(move || std::fs::remove_file(&path))
                .await
                .map_err(|e| ServiceError::Storage(format!("task join error: {e}")))?;
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::Storage(format!("image delete failed: {e}"))),
        }
    }
}

/// Attachment operations, restricted to surveillance PVs.
pub struct ImageService<S> {
    store: Arc<S>,
    images: Arc<ImageStore>,
}

impl<S> Clone for ImageService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            images: self.images.clone(),
        }
    }
}

impl<S: PvStorage> ImageService<S> {
    pub fn new(store: Arc<S>, images: Arc<ImageStore>) -> Self {
        Self { store, images }
    }

    /// Attach 1..=10 images to a surveillance PV.
    ///
    /// Every file is validated (content-type, size) before anything is
    /// written. New refs append to the end; existing refs are never
    /// reordered or overwritten. Returns the new refs. If the record
    /// persist fails, the files written for this call are removed again.
    pub async fn add_images(
        &self,
        pv_id: &str,
        files: Vec<UploadedImage>,
    ) -> Result<Vec<String>, ServiceError> {
        if files.is_empty() {
            return Err(ServiceError::InvalidUpload(
                "Aucune image n'a été téléchargée".to_string(),
            ));
        }
        if files.len() > MAX_IMAGES_PER_UPLOAD {
            return Err(ServiceError::InvalidUpload(format!(
                "Au maximum {MAX_IMAGES_PER_UPLOAD} images par envoi"
            )));
        }

        let mut record = self.store.get_pv(pv_id).await?;
        let PvDetails::Surveillance(details) = &mut record.details else {
            return Err(ServiceError::NotSurveillance);
        };

        for file in &files {
            if !file.content_type.starts_with("image/") {
                return Err(ServiceError::InvalidUpload(format!(
                    "'{}' n'est pas une image ({})",
                    file.file_name, file.content_type
                )));
            }
            if file.bytes.len() > MAX_IMAGE_BYTES {
                return Err(ServiceError::InvalidUpload(format!(
                    "'{}' dépasse la taille maximale de 5 Mo",
                    file.file_name
                )));
            }
        }

        let mut refs = Vec::with_capacity(files.len());
        for file in files {
            match self.images.save(file).await {
                Ok(image_ref) => refs.push(image_ref),
                Err(e) => {
                    self.discard(&refs).await;
                    return Err(e);
                }
            }
        }

        details.surveillance.images.extend(refs.iter().cloned());
        record.updated_at = now_rfc3339();
        if let Err(e) = self.store.update_pv(record).await {
            self.discard(&refs).await;
            return Err(e.into());
        }

        Ok(refs)
    }

    /// Remove files written during an attach that then failed, so the store
    /// and the media directory stay consistent.
    async fn discard(&self, refs: &[String]) {
        for image_ref in refs {
            if let Err(e) = self.images.remove(image_ref).await {
                eprintln!("warning: orphaned image {image_ref} not removed: {e}");
            }
        }
    }

    /// Detach one image ref from a surveillance PV and delete its file.
    /// The remaining refs keep their relative order.
    pub async fn remove_image(&self, pv_id: &str, image_ref: &str) -> Result<(), ServiceError> {
        let mut record = self.store.get_pv(pv_id).await?;
        let PvDetails::Surveillance(details) = &mut record.details else {
            return Err(ServiceError::NotSurveillance);
        };
        if !details.surveillance.images.iter().any(|r| r == image_ref) {
            return Err(ServiceError::ImageNotFound);
        }

        self.images.remove(image_ref).await?;

        details.surveillance.images.retain(|r| r != image_ref);
        record.updated_at = now_rfc3339();
        self.store.update_pv(record).await?;

        Ok(())
    }
}

/// Extension of the original filename, reduced to a safe `.ext` suffix.
/// Anything without a plain alphanumeric extension stores without one.
fn sanitize_extension(file_name: &str) -> String {
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext)
            if !ext.is_empty()
                && ext.len() <= 8
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

/// Final path component of a stored ref, rejecting anything that could
/// escape the images directory.
fn file_name_from_ref(image_ref: &str) -> Option<&str> {
    let name = image_ref.rsplit('/').next()?;
    if name.is_empty() || name.contains("..") || name.contains('\\') {
        return None;
    }
    Some(name)
}
