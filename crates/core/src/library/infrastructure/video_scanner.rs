use std::path::Path;

use walkdir::WalkDir;

use crate::shared::constants::VIDEO_EXTENSIONS;

pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Every video file under `directory`, recursively, sorted.
///
/// Paths are returned as `directory` joined with the relative path, which is
/// the key format of the ledger. Paths that are not valid UTF-8 cannot be
/// ledger keys and are skipped.
pub fn scan_videos(directory: &Path) -> Vec<String> {
    let mut videos: Vec<String> = WalkDir::new(directory)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable path under {}: {e}", directory.display());
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_video(e.path()))
        .filter_map(|e| match e.path().to_str() {
            Some(path) => Some(path.to_string()),
            None => {
                log::warn!("Skipping video with non-UTF-8 path: {}", e.path().display());
                None
            }
        })
        .collect();
    videos.sort();
    videos
}
