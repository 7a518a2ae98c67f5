//! Image picker backed by files on disk.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chatlens_core::chat::{DEFAULT_IMAGE_MIME_TYPE, ImagePicker, PickedImage};
use chatlens_core::error::{ChatError, Result};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Picks the image file the front end queued with [`FileImagePicker::queue`].
///
/// Each queued path is consumed by one `pick_image` call. Nothing queued, or
/// an empty file, counts as a cancelled pick.
#[derive(Debug, Default)]
pub struct FileImagePicker {
    pending: Mutex<Option<PathBuf>>,
}

impl FileImagePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the file returned by the next pick.
    pub async fn queue(&self, path: impl Into<PathBuf>) {
        *self.pending.lock().await = Some(path.into());
    }

    /// Guesses the MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error for files that are recognizably not images.
    pub fn mime_type_for(path: &Path) -> Result<String> {
        match mime_guess::from_path(path).first() {
            Some(mime) if mime.type_() == mime_guess::mime::IMAGE => Ok(mime.essence_str().to_string()),
            Some(mime) => Err(ChatError::io(format!(
                "{} is not an image ({})",
                path.display(),
                mime.essence_str()
            ))),
            None => Ok(DEFAULT_IMAGE_MIME_TYPE.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl ImagePicker for FileImagePicker {
    async fn pick_image(&self) -> Result<Option<PickedImage>> {
        let Some(path) = self.pending.lock().await.take() else {
            return Ok(None);
        };

        let mime_type = Self::mime_type_for(&path)?;
        let bytes = tokio::fs::read(&path).await?;
        if bytes.is_empty() {
            tracing::debug!(path = %path.display(), "Picked image is empty");
            return Ok(None);
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), mime_type = %mime_type, "Picked image");
        Ok(Some(PickedImage::new(BASE64_STANDARD.encode(bytes), mime_type)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_nothing_queued_is_cancelled() {
        let picker = FileImagePicker::new();
        assert!(picker.pick_image().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_picks_queued_file_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cat.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let picker = FileImagePicker::new();
        picker.queue(&path).await;

        let picked = picker.pick_image().await.unwrap().unwrap();
        assert_eq!(picked.base64, "AQID");
        assert_eq!(picked.mime_type, "image/png");
        assert!(picker.pick_image().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_file_is_cancelled() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();

        let picker = FileImagePicker::new();
        picker.queue(&path).await;
        assert!(picker.pick_image().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let picker = FileImagePicker::new();
        picker.queue("/definitely/not/here.jpg").await;
        assert!(picker.pick_image().await.unwrap_err().is_io());
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(FileImagePicker::mime_type_for(Path::new("a.jpeg")).unwrap(), "image/jpeg");
        assert_eq!(FileImagePicker::mime_type_for(Path::new("a")).unwrap(), DEFAULT_IMAGE_MIME_TYPE);
        assert!(FileImagePicker::mime_type_for(Path::new("a.txt")).is_err());
    }
}
