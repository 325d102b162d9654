//! Cookie material for the extractor.
//!
//! Optional authentication material reduces upstream blocking. It comes
//! from the environment in one of two forms: `COOKIES_FILE` naming a
//! Netscape-format cookie file on disk, or `YOUTUBE_COOKIES` carrying the
//! file content inline (the deployment-friendly form), which gets
//! materialized into a temp file yt-dlp can read. Absence is non-fatal; it
//! only narrows which persona attempts are likely to succeed.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Minimum size for a valid cookies file (bytes).
/// A real Netscape cookies file is at least ~50 bytes.
const MIN_COOKIES_FILE_SIZE: u64 = 50;

/// File the inline `YOUTUBE_COOKIES` content is materialized into.
const MATERIALIZED_COOKIES_NAME: &str = "grabtube-cookies.txt";

/// Validate that cookie content appears to be in Netscape format.
///
/// Netscape cookies files either start with "# Netscape HTTP Cookie File"
/// or contain tab-separated lines with domain entries.
fn is_valid_netscape_cookies(content: &str) -> bool {
    if content.starts_with("# Netscape HTTP Cookie File")
        || content.starts_with("# HTTP Cookie File")
    {
        return true;
    }

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() >= 6 {
            return true;
        }
    }

    false
}

/// Resolve the cookie file to pass to yt-dlp, if any.
///
/// Checks `COOKIES_FILE` first, then materializes `YOUTUBE_COOKIES`.
/// Invalid or missing material is skipped with a log, never an error.
pub async fn resolve_cookies_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("COOKIES_FILE") {
        if let Some(path) = validate_cookies_path(Path::new(&path)).await {
            info!(path = %path.display(), "Using cookies file for authentication");
            return Some(path);
        }
    }

    if let Ok(content) = std::env::var("YOUTUBE_COOKIES") {
        if content.len() < MIN_COOKIES_FILE_SIZE as usize {
            debug!("YOUTUBE_COOKIES content is too small, skipping");
            return None;
        }
        if !is_valid_netscape_cookies(&content) {
            warn!("YOUTUBE_COOKIES content is not in Netscape format, skipping");
            return None;
        }

        let path = std::env::temp_dir().join(MATERIALIZED_COOKIES_NAME);
        match tokio::fs::write(&path, &content).await {
            Ok(()) => {
                info!(path = %path.display(), "Materialized YOUTUBE_COOKIES for authentication");
                return Some(path);
            }
            Err(e) => {
                warn!("Failed to materialize YOUTUBE_COOKIES: {}", e);
                return None;
            }
        }
    }

    debug!("No cookie material configured");
    None
}

async fn validate_cookies_path(path: &Path) -> Option<PathBuf> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.len() >= MIN_COOKIES_FILE_SIZE => {}
        Ok(metadata) => {
            debug!(
                "Cookies file {} is too small ({} bytes), skipping",
                path.display(),
                metadata.len()
            );
            return None;
        }
        Err(e) => {
            warn!("Failed to read cookies file metadata: {}", e);
            return None;
        }
    }

    match tokio::fs::read_to_string(path).await {
        Ok(content) if is_valid_netscape_cookies(&content) => Some(path.to_path_buf()),
        Ok(_) => {
            warn!(
                "Cookies file {} is not in valid Netscape format, skipping",
                path.display()
            );
            None
        }
        Err(e) => {
            warn!("Failed to read cookies file: {}", e);
            None
        }
    }
}
