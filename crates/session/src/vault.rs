//! Blob storage behind [`MediaRef`] handles.
//!
//! Generated media lands as files under `<data_dir>/media/`; scenes only
//! carry the relative path and mime type, which keeps the persisted
//! history a plain scene array.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use artie_core::scene::MediaRef;
use artie_pipeline::error::PipelineError;
use artie_pipeline::workflow::{MediaKind, MediaSink};

use crate::error::SessionError;

/// File extension for a stored blob's mime type.
pub fn ext_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "video/mp4" => "mp4",
        "audio/wav" | "audio/x-wav" => "wav",
        _ => "bin",
    }
}

/// File-backed blob store for generated media and uploaded logos.
pub struct MediaVault {
    root: PathBuf,
}

impl MediaVault {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join("media"),
        }
    }

    /// Absolute path a ref resolves to.
    pub fn resolve(&self, media: &MediaRef) -> PathBuf {
        self.root.join(&media.rel_path)
    }

    /// Write a blob and hand back its ref.
    pub async fn store_blob(
        &self,
        file_name: &str,
        bytes: &[u8],
        mime: &str,
    ) -> Result<MediaRef, SessionError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Blob stored");
        Ok(MediaRef {
            rel_path: file_name.to_string(),
            mime: mime.to_string(),
        })
    }

    /// Read a ref's bytes back.
    pub async fn read(&self, media: &MediaRef) -> Result<Vec<u8>, SessionError> {
        Ok(tokio::fs::read(self.resolve(media)).await?)
    }
}

#[async_trait]
impl MediaSink for MediaVault {
    async fn store_media(
        &self,
        scene_id: &str,
        kind: MediaKind,
        bytes: &[u8],
        mime: &str,
    ) -> Result<MediaRef, PipelineError> {
        let file_name = format!("{scene_id}_{}.{}", kind.name(), ext_for_mime(mime));
        self.store_blob(&file_name, bytes, mime)
            .await
            .map_err(|e| PipelineError::Media(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_extensions() {
        assert_eq!(ext_for_mime("image/jpeg"), "jpg");
        assert_eq!(ext_for_mime("video/mp4"), "mp4");
        assert_eq!(ext_for_mime("audio/wav"), "wav");
        assert_eq!(ext_for_mime("application/octet-stream"), "bin");
    }

    #[tokio::test]
    async fn blob_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let vault = MediaVault::new(dir.path());

        let media = vault
            .store_blob("scene_x_visual.jpg", &[1, 2, 3], "image/jpeg")
            .await
            .unwrap();
        assert_eq!(media.rel_path, "scene_x_visual.jpg");
        assert_eq!(media.mime, "image/jpeg");
        assert_eq!(vault.read(&media).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn read_of_missing_blob_fails() {
        let dir = tempfile::tempdir().unwrap();
        let vault = MediaVault::new(dir.path());
        let media = MediaRef {
            rel_path: "gone.bin".to_string(),
            mime: "application/octet-stream".to_string(),
        };
        assert!(vault.read(&media).await.is_err());
    }

    #[tokio::test]
    async fn sink_names_blobs_by_scene_and_kind() {
        let dir = tempfile::tempdir().unwrap();
        let vault = MediaVault::new(dir.path());

        let media = vault
            .store_media("scene_x", MediaKind::Visual, &[9], "video/mp4")
            .await
            .unwrap();
        assert_eq!(media.rel_path, "scene_x_visual.mp4");

        let media = vault
            .store_media("scene_x", MediaKind::Audio, &[9], "audio/wav")
            .await
            .unwrap();
        assert_eq!(media.rel_path, "scene_x_audio.wav");
    }
}
