//! Media items attached to archived events.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EventId, MediaId, UserId};

/// Kind of uploaded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image.
    Image,
    /// Video clip.
    Video,
}

/// A photo or video contributed to an archived event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMedia {
    /// Media identifier.
    pub media_id: MediaId,
    /// Event the media belongs to.
    pub event_id: EventId,
    /// Contributor, if known.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Image or video.
    pub media_type: MediaType,
    /// Relative URL served from the backend's upload directory.
    pub media_url: String,
    /// Optional caption.
    #[serde(default)]
    pub caption: Option<String>,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

/// A file about to be uploaded as event media.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaUpload {
    /// File name sent in the multipart part.
    pub file_name: String,
    /// MIME type of the payload.
    pub content_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for MediaUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl MediaUpload {
    /// Wraps file contents, guessing the content type from the file name.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// The media kind implied by the content type.
    #[must_use]
    pub fn media_type(&self) -> MediaType {
        if self.content_type.starts_with("video/") {
            MediaType::Video
        } else {
            MediaType::Image
        }
    }
}

/// Maps a file extension to a MIME type. Unknown extensions are sent as
/// JPEG, which the backend accepts for any still image.
#[must_use]
pub fn guess_content_type(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp4" | "m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_video_and_image_types() {
        assert_eq!(guess_content_type("clip.MP4"), "video/mp4");
        assert_eq!(guess_content_type("clip.mov"), "video/quicktime");
        assert_eq!(guess_content_type("pic.png"), "image/png");
        assert_eq!(guess_content_type("noext"), "image/jpeg");
    }

    #[test]
    fn upload_media_type_follows_content_type() {
        assert_eq!(MediaUpload::new("a.webm", vec![1]).media_type(), MediaType::Video);
        assert_eq!(MediaUpload::new("a.jpg", vec![1]).media_type(), MediaType::Image);
    }

    #[test]
    fn debug_omits_payload_bytes() {
        let upload = MediaUpload::new("a.jpg", vec![0; 1024]);
        let dbg = format!("{upload:?}");
        assert!(dbg.contains("len: 1024"));
        assert!(!dbg.contains("0, 0"));
    }
}
