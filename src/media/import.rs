/// Local folder import
///
/// Walks a folder recursively and returns `file://` URLs for every image or
/// video file found, sorted by path. The URLs then go through the normal
/// classifier like anything typed into the builder.
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::loader::file_url;

/// Supported extensions (lowercase)
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];
const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mov", "webm", "ogg", "m4v"];

/// Result of a folder scan
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub urls: Vec<String>,
    /// Files seen but not recognized as media
    pub skipped_count: usize,
}

/// Async wrapper so the walk runs on the blocking pool
pub async fn import_folder_async(folder_path: PathBuf) -> ImportResult {
    let path_for_log = folder_path.clone();
    match tokio::task::spawn_blocking(move || import_folder(&folder_path)).await {
        Ok(result) => result,
        Err(e) => {
            log::warn!("⚠️  Import of {} aborted: {}", path_for_log.display(), e);
            ImportResult::default()
        }
    }
}

/// Scan a folder for media files
pub fn import_folder(folder_path: &Path) -> ImportResult {
    log::info!("🔍 Scanning folder: {}", folder_path.display());

    let mut paths = Vec::new();
    let mut skipped_count = 0;

    // Walk the directory tree recursively
    for entry in WalkDir::new(folder_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        // Only process files (not directories)
        if !path.is_file() {
            continue;
        }

        if is_media_file(path) {
            paths.push(path.to_path_buf());
        } else {
            skipped_count += 1;
        }
    }

    paths.sort();
    let urls: Vec<String> = paths.iter().map(|p| file_url(p)).collect();

    log::info!(
        "✅ Scan complete: {} media files, {} skipped",
        urls.len(),
        skipped_count
    );

    ImportResult {
        urls,
        skipped_count,
    }
}

fn is_media_file(path: &Path) -> bool {
    match path.extension() {
        Some(extension) => {
            let ext = extension.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}
