//! Local Image Store
//!
//! Writes profile images into a directory on the local filesystem. Stored
//! names are `<uuid>_<original name>` so uploads never collide.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::domain::repository::ImageStore;
use crate::domain::value_object::image_path::ImagePath;
use crate::error::{AccountError, AccountResult};

#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths handed out by [`ImageStore::save`] resolve back into the root.
    /// Only the final component is used, so `..` cannot escape it, and only
    /// names this store generated resolve at all.
    fn resolve(&self, path: &ImagePath) -> Option<PathBuf> {
        path.file_name()
            .filter(|name| is_stored_name(name))
            .map(|name| self.root.join(name))
    }
}

/// `<uuid>_<sanitized name>`
fn is_stored_name(name: &str) -> bool {
    match name.split_once('_') {
        Some((prefix, rest)) => !rest.is_empty() && Uuid::try_parse(prefix).is_ok(),
        None => false,
    }
}

fn sanitize_file_name(original_name: &str) -> String {
    let base = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

fn storage_error(context: &str, err: std::io::Error) -> AccountError {
    AccountError::Storage(format!("{context}: {err}"))
}

impl ImageStore for LocalImageStore {
    async fn save(&self, original_name: &str, bytes: &[u8]) -> AccountResult<ImagePath> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| storage_error("Failed to create upload directory", e))?;

        let file_name = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(original_name));
        let file_path = self.root.join(&file_name);

        let mut file = tokio::fs::File::create(&file_path)
            .await
            .map_err(|e| storage_error("Failed to create image file", e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| storage_error("Failed to write image file", e))?;
        file.sync_all()
            .await
            .map_err(|e| storage_error("Failed to flush image file", e))?;

        tracing::debug!(path = %file_path.display(), size = bytes.len(), "Stored image");

        Ok(ImagePath::new(file_path.to_string_lossy().into_owned()))
    }

    async fn delete(&self, path: &ImagePath) -> AccountResult<()> {
        let Some(file_path) = self.resolve(path) else {
            tracing::debug!(path = %path, "Not a stored image, nothing to delete");
            return Ok(());
        };

        match tokio::fs::remove_file(&file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %file_path.display(), "Image already gone");
                Ok(())
            }
            Err(e) => Err(storage_error("Failed to delete image file", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("me.png"), "me.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my photo.jpg"), "my_photo.jpg");
        assert_eq!(sanitize_file_name(""), "image");
        assert_eq!(sanitize_file_name(".."), "image");
    }

    #[test]
    fn test_is_stored_name() {
        assert!(is_stored_name(&format!("{}_me.png", Uuid::new_v4())));
        assert!(!is_stored_name("default.png"));
        assert!(!is_stored_name("not-a-uuid_me.png"));
        assert!(!is_stored_name(&format!("{}_", Uuid::new_v4())));
    }

    #[tokio::test]
    async fn test_delete_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());
        let default = dir.path().join("default.png");
        tokio::fs::write(&default, b"default").await.unwrap();

        store.delete(&ImagePath::new("default.png")).await.unwrap();
        store
            .delete(&ImagePath::new(default.to_string_lossy().into_owned()))
            .await
            .unwrap();
        assert!(default.exists());
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path().join("uploads"));

        let path = store.save("me.png", b"\x89PNG").await.unwrap();
        let on_disk = store.resolve(&path).unwrap();
        assert!(on_disk.starts_with(store.root()));
        assert!(path.as_str().ends_with("_me.png"));
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"\x89PNG");

        store.delete(&path).await.unwrap();
        assert!(!on_disk.exists());

        // deleting twice is fine
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_same_name_does_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());

        let a = store.save("me.png", b"a").await.unwrap();
        let b = store.save("me.png", b"b").await.unwrap();
        assert_ne!(a, b);
    }
}
