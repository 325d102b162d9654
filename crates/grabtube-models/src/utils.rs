//! YouTube URL parsing.
//!
//! URLs are untrusted input. Parsing is a recoverable classification: an
//! unrecognized or malformed URL yields `None`, never a panic or error.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::video::VideoId;

/// Extract a video ID from an arbitrary user-pasted URL.
///
/// Structured parsing runs first and branches on the host: `youtube.com`
/// hosts are matched against the known path shapes (`/watch`, `/embed/`,
/// `/v/`, `/shorts/`, `/live/`) and `youtu.be` takes the first path
/// segment. When structured parsing fails or yields nothing valid, a fixed
/// ordered list of patterns is applied to the raw string. First valid
/// 11-character token wins.
pub fn extract_video_id(raw: &str) -> Option<VideoId> {
    let raw = raw.trim();

    if let Some(id) = extract_structured(raw) {
        return Some(id);
    }

    extract_with_patterns(raw)
}

fn extract_structured(raw: &str) -> Option<VideoId> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();

    let candidate = if host == "youtu.be" {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string)
    } else if host.ends_with("youtube.com") {
        match parsed.path() {
            "/watch" => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            path => ["/embed/", "/v/", "/shorts/", "/live/"]
                .iter()
                .find_map(|prefix| path.strip_prefix(prefix))
                .and_then(|rest| rest.split('/').next())
                .map(str::to_string),
        }
    } else {
        None
    };

    candidate.and_then(|c| VideoId::parse(c).ok())
}

fn id_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"youtube\.com/shorts/([A-Za-z0-9_-]{11})",
            r"youtube\.com/watch\?v=([A-Za-z0-9_-]{11})",
            r"youtu\.be/([A-Za-z0-9_-]{11})",
            r"youtube\.com/embed/([A-Za-z0-9_-]{11})",
            r"youtube\.com/v/([A-Za-z0-9_-]{11})",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid pattern"))
        .collect()
    })
}

fn extract_with_patterns(raw: &str) -> Option<VideoId> {
    for pattern in id_patterns() {
        if let Some(captures) = pattern.captures(raw) {
            if let Ok(id) = VideoId::parse(&captures[1]) {
                return Some(id);
            }
        }
    }
    None
}
