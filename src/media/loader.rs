/// Asset loading for cards and the lightbox
///
/// Fetches bytes for a URL (local file or http(s)), caches remote bytes on
/// disk, decodes them off the UI thread and hands back an iced image handle
/// together with the real dimensions so the item's aspect ratio can be
/// refined once the media is known.
use iced::widget::image::Handle;
use image::GenericImageView;
use std::path::{Path, PathBuf};

use crate::error::{GalleryError, Result};

/// Longest edge for card textures
pub const PREVIEW_MAX_EDGE: u32 = 512;

/// Longest edge for the lightbox
pub const FULL_MAX_EDGE: u32 = 2048;

/// A decoded asset ready to draw
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub url: String,
    pub handle: Handle,
    /// Dimensions of the source image, before any downscaling
    pub width: u32,
    pub height: u32,
}

impl LoadedAsset {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Get the asset cache directory
/// Returns ~/.cache/media-sphere/assets on Linux
pub fn default_cache_dir() -> PathBuf {
    let mut path = dirs_next::cache_dir()
        .or_else(dirs_next::home_dir)
        .unwrap_or_else(std::env::temp_dir);

    path.push("media-sphere");
    path.push("assets");
    path
}

/// Cache file name for a remote URL
pub fn cache_key(url: &str) -> String {
    let crc = crc32fast::hash(url.as_bytes());
    format!("{:08x}-{}.bin", crc, url.len())
}

/// Fetch and decode an asset, downscaling so the longest edge is at most `max_edge`
pub async fn load_asset(url: String, cache_dir: PathBuf, max_edge: u32) -> Result<LoadedAsset> {
    let bytes = read_bytes(&url, &cache_dir).await?;

    // Decoding is CPU-bound
    let decode_url = url.clone();
    let decoded = tokio::task::spawn_blocking(move || decode(&decode_url, &bytes, max_edge))
        .await
        .map_err(|e| GalleryError::AssetDecode(format!("{url}: task join error: {e}")))??;

    log::debug!(
        "🖼️  Loaded {} ({}x{})",
        decoded.url,
        decoded.width,
        decoded.height
    );
    Ok(decoded)
}

/// Read raw bytes for a URL
///
/// `file://` URLs and bare paths are read from disk. http(s) URLs go through
/// the on-disk cache first; a cache write failure is logged and ignored.
pub async fn read_bytes(url: &str, cache_dir: &Path) -> Result<Vec<u8>> {
    if is_remote(url) {
        let cached = cache_dir.join(cache_key(url));
        if let Ok(bytes) = tokio::fs::read(&cached).await {
            return Ok(bytes);
        }

        let bytes = fetch_remote(url).await?;

        if let Err(e) = write_cache(&cached, &bytes).await {
            log::warn!("⚠️  Could not cache {}: {}", url, e);
        }
        return Ok(bytes);
    }

    let path = local_path(url);
    tokio::fs::read(&path)
        .await
        .map_err(|e| GalleryError::AssetFetch(format!("{}: {}", path.display(), e)))
}

async fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| GalleryError::AssetFetch(format!("{url}: {e}")))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| GalleryError::AssetFetch(format!("{url}: {e}")))?;

    Ok(bytes.to_vec())
}

async fn write_cache(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

/// Decode image bytes into a drawable handle
pub fn decode(url: &str, bytes: &[u8], max_edge: u32) -> Result<LoadedAsset> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| GalleryError::AssetDecode(format!("{url}: {e}")))?;

    let (width, height) = img.dimensions();
    let img = if width > max_edge || height > max_edge {
        img.thumbnail(max_edge, max_edge)
    } else {
        img
    };

    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();

    Ok(LoadedAsset {
        url: url.to_string(),
        handle: Handle::from_rgba(w, h, rgba.into_raw()),
        width,
        height,
    })
}

fn is_remote(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn local_path(url: &str) -> PathBuf {
    match url.strip_prefix("file://") {
        Some(rest) => PathBuf::from(
            urlencoding::decode(rest)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| rest.to_string()),
        ),
        None => PathBuf::from(url),
    }
}

/// `file://` URL for a local path, percent-encoding what needs it
pub fn file_url(path: &Path) -> String {
    let text = path.to_string_lossy();
    let encoded: Vec<String> = text
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("file://{}", encoded.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, height, Rgba([200, 10, 10, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_reports_source_dimensions() {
        let bytes = png_bytes(40, 20);
        let asset = decode("mem://a", &bytes, 10).unwrap();
        assert_eq!(asset.width, 40);
        assert_eq!(asset.height, 20);
        assert_eq!(asset.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode("mem://b", b"definitely not an image", 64).unwrap_err();
        assert!(matches!(err, GalleryError::AssetDecode(_)));
    }

    #[test]
    fn test_cache_key_is_stable() {
        let a = cache_key("https://example.com/a.jpg");
        assert_eq!(a, cache_key("https://example.com/a.jpg"));
        assert_ne!(a, cache_key("https://example.com/b.jpg"));
        assert!(a.ends_with(".bin"));
    }

    #[test]
    fn test_file_url_round_trip() {
        let path = Path::new("/tmp/my photos/a b.png");
        let url = file_url(path);
        assert_eq!(url, "file:///tmp/my%20photos/a%20b.png");
        assert_eq!(local_path(&url), path);
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let dir = std::env::temp_dir().join(format!("media-sphere-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("tile.png");
        std::fs::write(&file, png_bytes(30, 60)).unwrap();

        let asset = load_asset(file_url(&file), dir.clone(), PREVIEW_MAX_EDGE)
            .await
            .unwrap();
        assert_eq!(asset.aspect_ratio(), 0.5);

        let missing = load_asset(file_url(&dir.join("nope.png")), dir.clone(), 64).await;
        assert!(matches!(missing, Err(GalleryError::AssetFetch(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
