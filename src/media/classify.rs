/// URL classification
///
/// Turns an arbitrary user-supplied URL into a `MediaItem`. Patterns are
/// tried in order and the first match wins:
/// 1. YouTube (watch, shorts, embed, youtu.be) -> embed
/// 2. Vimeo numeric URL -> embed
/// 3. Google Drive share link -> image via the thumbnail endpoint
/// 4. Video file extension -> video
/// 5. Anything else -> direct image link
///
/// Classification never fails; unknown URLs are treated as images.
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::state::data::{MediaItem, MediaKind};

const EMBED_ASPECT: f32 = 16.0 / 9.0;

static YOUTUBE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("valid youtube pattern")
});

static VIMEO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)vimeo\.com/(?:video/|channels/[^/]+/)?(\d+)").expect("valid vimeo pattern")
});

static DRIVE_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)drive\.google\.com/").expect("valid drive pattern"));

static DRIVE_PATH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/d/([^/?#]*)").expect("valid drive path pattern"));

static DRIVE_QUERY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]id=([^&#]*)").expect("valid drive query pattern"));

static VIDEO_EXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(mp4|mov|webm|ogg|m4v)(?:[?#].*)?$").expect("valid video pattern")
});

/// Everything derived from the URL alone
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub kind: MediaKind,
    pub preview_url: String,
    pub full_url: String,
    pub fallback_preview: Option<String>,
    pub aspect_ratio: Option<f32>,
}

/// Classify a URL into a new item with a fresh identifier
pub fn classify(url: &str) -> MediaItem {
    let derived = derive(url);
    MediaItem {
        id: Uuid::new_v4().to_string(),
        original_url: url.to_string(),
        kind: derived.kind,
        preview_url: derived.preview_url,
        full_url: derived.full_url,
        fallback_preview: derived.fallback_preview,
        aspect_ratio: derived.aspect_ratio,
        title: None,
        description: None,
    }
}

/// Split free-form builder input into URLs and classify each one
///
/// Entries are separated by newlines or other whitespace. Commas are legal
/// inside URLs, so they never split an entry.
pub fn classify_all(text: &str) -> Vec<MediaItem> {
    text.split_whitespace().map(classify).collect()
}

/// Derive kind and display URLs from a URL
pub fn derive(url: &str) -> Derived {
    if let Some(id) = youtube_id(url) {
        return Derived {
            kind: MediaKind::Embed,
            preview_url: format!("https://img.youtube.com/vi/{id}/hqdefault.jpg"),
            full_url: format!(
                "https://www.youtube.com/embed/{id}?autoplay=1&mute=1&loop=1&playlist={id}&controls=0&modestbranding=1&playsinline=1"
            ),
            fallback_preview: Some(format!("https://img.youtube.com/vi/{id}/hqdefault.jpg")),
            aspect_ratio: Some(EMBED_ASPECT),
        };
    }

    if let Some(id) = vimeo_id(url) {
        return Derived {
            kind: MediaKind::Embed,
            preview_url: format!("https://vumbnail.com/{id}.jpg"),
            full_url: format!(
                "https://player.vimeo.com/video/{id}?autoplay=1&muted=1&loop=1&background=1"
            ),
            fallback_preview: Some(format!("https://vumbnail.com/{id}.jpg")),
            aspect_ratio: Some(EMBED_ASPECT),
        };
    }

    if let Some(id) = drive_id(url) {
        let preview = format!("https://drive.google.com/thumbnail?id={id}&sz=w1000");
        return Derived {
            kind: MediaKind::Image,
            full_url: format!("https://drive.google.com/thumbnail?id={id}&sz=w2000"),
            fallback_preview: Some(preview.clone()),
            preview_url: preview,
            aspect_ratio: None,
        };
    }

    if VIDEO_EXT.is_match(url) {
        return Derived {
            kind: MediaKind::Video,
            preview_url: url.to_string(),
            full_url: url.to_string(),
            fallback_preview: None,
            aspect_ratio: None,
        };
    }

    Derived {
        kind: MediaKind::Image,
        preview_url: url.to_string(),
        full_url: url.to_string(),
        fallback_preview: Some(url.to_string()),
        aspect_ratio: None,
    }
}

/// Re-derive kind and URLs from `original_url`, keeping id and annotations
///
/// A discovered aspect ratio is kept unless the URL pins one (embeds).
pub fn reclassify(item: &MediaItem) -> MediaItem {
    let derived = derive(&item.original_url);
    MediaItem {
        id: item.id.clone(),
        original_url: item.original_url.clone(),
        kind: derived.kind,
        preview_url: derived.preview_url,
        full_url: derived.full_url,
        fallback_preview: derived.fallback_preview,
        aspect_ratio: derived.aspect_ratio.or(item.aspect_ratio),
        title: item.title.clone(),
        description: item.description.clone(),
    }
}

fn youtube_id(url: &str) -> Option<&str> {
    YOUTUBE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn vimeo_id(url: &str) -> Option<&str> {
    VIMEO
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Extract the file id from a Drive share link
///
/// An empty id (`/d/` with nothing after it) is "no match", not a valid link.
fn drive_id(url: &str) -> Option<&str> {
    if !DRIVE_HOST.is_match(url) {
        return None;
    }
    let from_path = DRIVE_PATH_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| !id.is_empty());
    from_path.or_else(|| {
        DRIVE_QUERY_ID
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|id| !id.is_empty())
    })
}
