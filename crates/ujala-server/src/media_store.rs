use std::path::{Component, Path, PathBuf};

use rand::Rng;
use tokio::fs;
use tracing::{debug, info};

use crate::error::ServerError;

/// URL prefix under which uploads are served.
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// Resolve `relative` below `base`, refusing anything that would climb out.
fn ensure_within(base: &Path, relative: &Path) -> Result<PathBuf, ServerError> {
    let mut resolved = base.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(c) => resolved.push(c),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ServerError::BadRequest(
                    "Path traversal detected".to_string(),
                ));
            }
        }
    }
    if !resolved.starts_with(base) || resolved == base {
        return Err(ServerError::BadRequest("Invalid media path".to_string()));
    }
    Ok(resolved)
}

/// Keep a short alphanumeric extension from the client's filename.
fn extension_of(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Upload files on local disk, exposed publicly as `/uploads/<name>`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    base_path: PathBuf,
    max_size: usize,
}

impl MediaStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::Internal(format!(
                "Failed to create uploads directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Media store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write an upload and return its public path,
    /// `/uploads/<unix-millis>-<random>.<ext>`.
    pub async fn save_upload(&self, original_name: &str, data: &[u8]) -> Result<String, ServerError> {
        if data.is_empty() {
            return Err(ServerError::BadRequest("Empty file".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::PayloadTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        let name = match extension_of(original_name) {
            Some(ext) => format!("{millis}-{suffix}.{ext}"),
            None => format!("{millis}-{suffix}"),
        };
        let path = ensure_within(&self.base_path, Path::new(&name))?;

        fs::write(&path, data).await.map_err(|e| {
            ServerError::Internal(format!("Failed to write upload {}: {}", name, e))
        })?;

        debug!(file = %name, size = data.len(), "Stored upload");
        Ok(format!("{UPLOADS_PREFIX}{name}"))
    }

    /// Map a public `/uploads/...` path to the file on disk.
    pub fn resolve(&self, public_path: &str) -> Result<PathBuf, ServerError> {
        let relative = public_path
            .strip_prefix(UPLOADS_PREFIX)
            .ok_or_else(|| ServerError::BadRequest("Not an upload path".to_string()))?;
        ensure_within(&self.base_path, Path::new(relative))
    }

    /// Remove an upload. `Ok(false)` when the file was already gone.
    pub async fn delete(&self, public_path: &str) -> Result<bool, ServerError> {
        let path = self.resolve(public_path)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %public_path, "Deleted upload");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ServerError::Internal(format!(
                "Failed to delete upload {}: {}",
                public_path, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (MediaStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(dir.path().join("uploads"), 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let (store, _dir) = test_store().await;

        let path = store.save_upload("Photo.JPG", b"jpeg-bytes").await.unwrap();
        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".jpg"));

        let on_disk = store.resolve(&path).unwrap();
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"jpeg-bytes");

        assert!(store.delete(&path).await.unwrap());
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_an_error() {
        let (store, _dir) = test_store().await;
        assert!(!store.delete("/uploads/1700000000000-1.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.delete("/uploads/../ujala.db").await.is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("/uploads/").is_err());
    }

    #[tokio::test]
    async fn test_limits() {
        let (store, _dir) = test_store().await;
        assert!(store.save_upload("a.png", b"").await.is_err());

        let big = vec![0u8; 2048];
        assert!(matches!(
            store.save_upload("a.png", &big).await,
            Err(ServerError::PayloadTooLarge { size: 2048, max: 1024 })
        ));
    }

    #[test]
    fn test_extension_sanitised() {
        assert_eq!(extension_of("clip.MP4").as_deref(), Some("mp4"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("weird.p/hp"), None);
        assert_eq!(extension_of("x.verylongextension"), None);
    }
}
