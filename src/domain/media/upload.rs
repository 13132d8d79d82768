//! Upload staging: media kind detection, size limits and storage paths.

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::domain::foundation::{TourId, ValidationError};

const MIB: u64 = 1024 * 1024;

/// Accepted image content types.
const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Accepted video content types.
const VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "video/quicktime"];

/// Broad category of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies an accepted content type; `None` for anything else.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let normalized = content_type.trim().to_ascii_lowercase();
        if IMAGE_TYPES.contains(&normalized.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_TYPES.contains(&normalized.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    fn folder(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }
}

/// Maximum upload sizes per media kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
}

impl UploadLimits {
    pub fn max_bytes(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Image => self.max_image_bytes,
            MediaKind::Video => self.max_video_bytes,
        }
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_image_bytes: 5 * MIB,
            max_video_bytes: 50 * MIB,
        }
    }
}

/// A file staged for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl FileUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, inferring its content type from the extension.
    ///
    /// Unknown extensions get `application/octet-stream`, which `validate`
    /// then rejects.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        let content_type = content_type_for(path).to_string();
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Checks MIME type and size, returning the media kind on success.
    pub fn validate(&self, limits: &UploadLimits) -> Result<MediaKind, ValidationError> {
        let kind = MediaKind::from_content_type(&self.content_type).ok_or_else(|| {
            ValidationError::invalid_format(
                "file",
                format!(
                    "{} has an unsupported file type ({})",
                    self.file_name, self.content_type
                ),
            )
        })?;

        let max = limits.max_bytes(kind);
        if self.size() > max {
            return Err(ValidationError::invalid_format(
                "file",
                format!(
                    "{} is too large: {} files must be at most {} MB",
                    self.file_name,
                    kind.as_str(),
                    max / MIB
                ),
            ));
        }
        Ok(kind)
    }

    /// Storage path under the tour's folder, unique per upload.
    pub fn storage_path(&self, tour_id: &TourId, kind: MediaKind) -> String {
        format!(
            "tours/{}/{}/{}-{}",
            tour_id,
            kind.folder(),
            Uuid::new_v4().simple(),
            sanitize(&self.file_name)
        )
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}

fn sanitize(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.trim_matches('-').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn kind_follows_content_type() {
        assert_eq!(MediaKind::from_content_type("image/png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_content_type("VIDEO/MP4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_content_type("application/pdf"), None);
    }

    #[test]
    fn images_over_five_mib_are_rejected() {
        let limits = UploadLimits::default();
        let ok = FileUpload::new("a.jpg", "image/jpeg", vec![0; (5 * MIB) as usize]);
        assert_eq!(ok.validate(&limits), Ok(MediaKind::Image));

        let big = FileUpload::new("b.jpg", "image/jpeg", vec![0; (5 * MIB + 1) as usize]);
        let err = big.validate(&limits).unwrap_err();
        assert!(err.user_message().contains("at most 5 MB"));
    }

    #[test]
    fn videos_use_their_own_limit() {
        let limits = UploadLimits {
            max_image_bytes: 10,
            max_video_bytes: 100,
        };
        let clip = FileUpload::new("c.mp4", "video/mp4", vec![0; 50]);
        assert_eq!(clip.validate(&limits), Ok(MediaKind::Video));
    }

    #[test]
    fn unsupported_type_is_rejected_before_size() {
        let doc = FileUpload::new("notes.pdf", "application/pdf", vec![]);
        let err = doc.validate(&UploadLimits::default()).unwrap_err();
        assert!(err.user_message().contains("unsupported file type"));
    }

    #[test]
    fn storage_path_is_scoped_and_sanitized() {
        let tour_id = TourId::new();
        let file = FileUpload::new("My Photo!.JPG", "image/jpeg", vec![1]);
        let path = file.storage_path(&tour_id, MediaKind::Image);
        assert!(path.starts_with(&format!("tours/{}/images/", tour_id)));
        assert!(path.ends_with("-my-photo-.jpg"));
    }

    #[tokio::test]
    async fn from_path_reads_bytes_and_infers_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[137, 80, 78, 71]).unwrap();

        let upload = FileUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.file_name, "cover.png");
        assert_eq!(upload.content_type, "image/png");
        assert_eq!(upload.size(), 4);
    }

    #[tokio::test]
    async fn from_path_marks_unknown_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let upload = FileUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.content_type, "application/octet-stream");
        assert!(upload.validate(&UploadLimits::default()).is_err());
    }
}
