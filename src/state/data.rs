/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the catalog layer, the share codec and the UI layer.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::settings::LayoutConfig;

/// How an item is rendered
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    /// Third-party player (YouTube, Vimeo)
    Embed,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Embed => "embed",
        }
    }
}

/// Represents a single gallery entry
///
/// `kind` and the derived URLs are a pure function of `original_url`
/// (see `media::classify`). `aspect_ratio`, `title` and `description`
/// are annotations layered on top and may change after creation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Opaque identifier, stable for the item's lifetime
    pub id: String,
    /// The user-supplied source string (dedup key)
    pub original_url: String,
    pub kind: MediaKind,
    /// Used for cards in the scene
    pub preview_url: String,
    /// Used in the lightbox
    pub full_url: String,
    /// Shown when the full-resolution asset fails to load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_preview: Option<String>,
    /// Width / height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MediaItem {
    /// URL to show when the primary asset could not be loaded
    pub fn fallback_url(&self) -> &str {
        self.fallback_preview.as_deref().unwrap_or(&self.preview_url)
    }

    /// Aspect ratio used to size cards before the asset has loaded
    pub fn display_aspect(&self) -> f32 {
        match self.aspect_ratio {
            Some(ratio) if ratio.is_finite() && ratio > 0.0 => ratio,
            _ => 1.0,
        }
    }

    /// Short label for lists: the title if set, otherwise the URL tail
    pub fn label(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            return title.to_string();
        }
        let trimmed = self.original_url.trim_end_matches('/');
        let tail = trimmed.rsplit('/').next().unwrap_or(trimmed);
        let tail = tail.split('?').next().unwrap_or(tail);
        if tail.is_empty() {
            self.original_url.clone()
        } else {
            tail.to_string()
        }
    }
}

/// Owner-facing details shown with a gallery and carried in share links
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryMeta {
    pub display_name: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
}

/// Serializable snapshot of everything needed to rebuild a gallery
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GallerySnapshot {
    pub items: Vec<MediaItem>,
    pub layout: LayoutConfig,
    pub meta: GalleryMeta,
}

/// A gallery as known to the catalog
///
/// `id` and `slug` are `None` until the first save.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryRecord {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub owner_id: String,
    pub items: Vec<MediaItem>,
    pub layout: LayoutConfig,
    pub meta: GalleryMeta,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl GalleryRecord {
    /// A fresh, never-saved record built from a snapshot
    pub fn from_snapshot(owner_id: &str, snapshot: GallerySnapshot) -> Self {
        Self {
            id: None,
            slug: None,
            owner_id: owner_id.to_string(),
            items: snapshot.items,
            layout: snapshot.layout,
            meta: snapshot.meta,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Summary row for the "my galleries" list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GallerySummary {
    pub id: String,
    pub slug: String,
    pub display_name: Option<String>,
    pub item_count: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str) -> MediaItem {
        MediaItem {
            id: "1".into(),
            original_url: url.into(),
            kind: MediaKind::Image,
            preview_url: url.into(),
            full_url: url.into(),
            fallback_preview: None,
            aspect_ratio: None,
            title: None,
            description: None,
        }
    }

    #[test]
    fn test_label_prefers_title() {
        let mut it = item("https://example.com/photos/beach.jpg?w=400");
        assert_eq!(it.label(), "beach.jpg");

        it.title = Some("Beach".into());
        assert_eq!(it.label(), "Beach");

        it.title = Some("   ".into());
        assert_eq!(it.label(), "beach.jpg");
    }

    #[test]
    fn test_display_aspect_defaults_to_square() {
        let mut it = item("a.png");
        assert_eq!(it.display_aspect(), 1.0);
        it.aspect_ratio = Some(f32::NAN);
        assert_eq!(it.display_aspect(), 1.0);
        it.aspect_ratio = Some(1.5);
        assert_eq!(it.display_aspect(), 1.5);
    }

    #[test]
    fn test_item_json_uses_camel_case() {
        let json = serde_json::to_string(&item("a.png")).unwrap();
        assert!(json.contains("\"originalUrl\""));
        assert!(json.contains("\"kind\":\"image\""));
        assert!(!json.contains("aspectRatio"));
    }
}
