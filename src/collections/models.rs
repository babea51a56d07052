//! Collection data models

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

use super::CollectionError;

/// An item that can live in a [`super::CollectionStore`].
pub trait CollectionItem: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The key used for membership, dedup and removal.
    fn item_id(&self) -> &str;

    /// When the item happened, for collections kept newest first. Items
    /// without a time keep their insertion order.
    fn recency(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Checks the item before it is inserted or after it is loaded.
    fn validate(&self) -> Result<(), CollectionError> {
        if self.item_id().trim().is_empty() {
            return Err(CollectionError::InvalidItem("empty id".to_string()));
        }
        Ok(())
    }
}

/// Snapshot of a video taken when it is added to a collection, so the
/// collection renders without going back to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    pub id: String,
    pub title: String,
    pub channel_name: String,
    #[serde(default)]
    pub thumbnail: String,
}

impl CollectionItem for VideoRef {
    fn item_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub video: VideoRef,
    pub watched_at: DateTime<Utc>,
}

impl CollectionItem for HistoryEntry {
    fn item_id(&self) -> &str {
        &self.video.id
    }

    fn recency(&self) -> Option<DateTime<Utc>> {
        Some(self.watched_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        ChannelId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl CollectionItem for ChannelId {
    fn item_id(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Image attached to a post, kept inline as a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InlineImage(String);

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

impl InlineImage {
    /// Encodes raw image bytes, sniffing the MIME type from the content.
    pub fn from_bytes(bytes: &[u8], max_bytes: usize) -> Result<Self, CollectionError> {
        if bytes.len() > max_bytes {
            return Err(CollectionError::ImageTooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }
        let kind = infer::get(bytes).ok_or_else(|| {
            CollectionError::ImageRejected("unrecognized content".to_string())
        })?;
        if !matches!(kind.matcher_type(), infer::MatcherType::Image) {
            return Err(CollectionError::ImageRejected(format!(
                "{} is not an image",
                kind.mime_type()
            )));
        }
        Ok(InlineImage(format!(
            "{}{}{}{}",
            DATA_URL_PREFIX,
            kind.mime_type(),
            BASE64_MARKER,
            BASE64.encode(bytes)
        )))
    }

    pub fn as_data_url(&self) -> &str {
        &self.0
    }

    /// Returns the declared MIME type, if the data URL is well formed.
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix(DATA_URL_PREFIX)?;
        let (mime, _) = rest.split_once(BASE64_MARKER)?;
        Some(mime)
    }

    pub fn decode(&self) -> Result<Vec<u8>, CollectionError> {
        let (_, payload) = self
            .0
            .split_once(BASE64_MARKER)
            .ok_or_else(|| CollectionError::ImageRejected("not a base64 data url".to_string()))?;
        BASE64
            .decode(payload)
            .map_err(|err| CollectionError::ImageRejected(err.to_string()))
    }

    fn validate(&self) -> Result<(), CollectionError> {
        match self.mime_type() {
            Some(mime) if mime.starts_with("image/") => Ok(()),
            _ => Err(CollectionError::ImageRejected(
                "not an image data url".to_string(),
            )),
        }
    }
}

/// A post written by the logged in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoredPost {
    pub id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<InlineImage>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl CollectionItem for AuthoredPost {
    fn item_id(&self) -> &str {
        &self.id
    }

    fn recency(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn validate(&self) -> Result<(), CollectionError> {
        if self.id.trim().is_empty() {
            return Err(CollectionError::InvalidItem("empty id".to_string()));
        }
        if self.message.trim().is_empty() && self.image.is_none() {
            return Err(CollectionError::InvalidItem(
                "a post needs a message or an image".to_string(),
            ));
        }
        if let Some(image) = &self.image {
            image.validate()?;
        }
        Ok(())
    }
}

/// What the user typed before publishing.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub message: String,
    pub image: Option<InlineImage>,
    pub visibility: Visibility,
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest valid PNG header infer recognizes.
    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn video(id: &str) -> VideoRef {
        VideoRef {
            id: id.to_string(),
            title: "A".to_string(),
            channel_name: "C".to_string(),
            thumbnail: String::new(),
        }
    }

    #[test]
    fn empty_ids_are_invalid() {
        assert!(video("v1").validate().is_ok());
        assert!(matches!(
            video("  ").validate(),
            Err(CollectionError::InvalidItem(_))
        ));
        assert!(ChannelId::new("").validate().is_err());
    }

    #[test]
    fn video_ref_without_thumbnail_deserializes() {
        let parsed: VideoRef =
            serde_json::from_str(r#"{"id":"v1","title":"A","channel_name":"C"}"#).unwrap();
        assert_eq!(parsed, video("v1"));
    }

    #[test]
    fn channel_ids_serialize_as_plain_strings() {
        let ids = vec![ChannelId::new("c1"), ChannelId::new("c2")];
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"["c1","c2"]"#);
    }

    #[test]
    fn inline_image_from_png_bytes() {
        let image = InlineImage::from_bytes(PNG_BYTES, 1024).unwrap();
        assert_eq!(image.mime_type(), Some("image/png"));
        assert!(image.as_data_url().starts_with("data:image/png;base64,"));
        assert_eq!(image.decode().unwrap(), PNG_BYTES);
    }

    #[test]
    fn inline_image_rejects_non_images() {
        let zip = [0x50, 0x4B, 0x03, 0x04, 0, 0, 0, 0];
        assert!(matches!(
            InlineImage::from_bytes(&zip, 1024),
            Err(CollectionError::ImageRejected(_))
        ));
        assert!(matches!(
            InlineImage::from_bytes(b"hello", 1024),
            Err(CollectionError::ImageRejected(_))
        ));
    }

    #[test]
    fn inline_image_rejects_oversized_payloads() {
        assert!(matches!(
            InlineImage::from_bytes(PNG_BYTES, 4),
            Err(CollectionError::ImageTooLarge { size: 12, max: 4 })
        ));
    }

    #[test]
    fn post_needs_message_or_image() {
        let mut post = AuthoredPost {
            id: "p1".to_string(),
            message: " ".to_string(),
            image: None,
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
            visibility: Visibility::Public,
        };
        assert!(post.validate().is_err());

        post.image = Some(InlineImage::from_bytes(PNG_BYTES, 1024).unwrap());
        assert!(post.validate().is_ok());

        post.image = Some(InlineImage("data:text/plain;base64,aGk=".to_string()));
        assert!(post.validate().is_err());
    }
}
