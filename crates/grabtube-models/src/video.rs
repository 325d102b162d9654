//! Video identifiers and raw stream descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from [`VideoId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoIdError {
    #[error("video ID must be exactly 11 characters")]
    InvalidLength,

    #[error("video ID contains invalid characters")]
    InvalidCharacters,
}

/// A validated YouTube video identifier.
///
/// Video IDs are exactly 11 characters of alphanumerics, `-`, and `_`.
/// IDs are treated as untrusted input and validated before they are ever
/// placed into a URL or a subprocess argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Validate and wrap a candidate identifier.
    pub fn parse(s: impl Into<String>) -> Result<Self, VideoIdError> {
        let s = s.into();
        if s.len() != 11 {
            return Err(VideoIdError::InvalidLength);
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(VideoIdError::InvalidCharacters);
        }
        Ok(Self(s))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media container reported by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Webm,
    Other,
}

impl Container {
    /// Map a yt-dlp `ext` value onto a container.
    pub fn from_ext(ext: &str) -> Self {
        match ext {
            "mp4" => Container::Mp4,
            "webm" => Container::Webm,
            _ => Container::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
            Container::Other => "other",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One raw stream descriptor as reported by the extractor.
///
/// Read-only to everything downstream of the adapter. Several descriptors
/// may describe the same logical quality in different containers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFormat {
    /// Opaque stream key ("itag" / yt-dlp format_id)
    pub itag: String,

    /// Container the stream is muxed into
    pub container: Container,

    /// Whether the stream carries a video track
    pub has_video: bool,

    /// Whether the stream carries an audio track
    pub has_audio: bool,

    /// Video height in pixels, when reported
    pub height: Option<u32>,

    /// Audio bitrate in kbps, when reported
    pub audio_bitrate: Option<u32>,

    /// Total bitrate in kbps, when reported
    pub bitrate: Option<f64>,

    /// Upstream quality label (e.g. "1080p", "medium"), when reported
    pub quality_label: Option<String>,
}

impl RawFormat {
    /// The fallback strategy's acceptance predicate: a stream counts as
    /// high quality when it reports a bitrate and is either >= 720p or a
    /// video stream with no reported height.
    pub fn is_high_quality(&self) -> bool {
        if self.bitrate.is_none() {
            return false;
        }
        match self.height {
            Some(h) => h >= 720,
            None => self.has_video,
        }
    }
}

/// Metadata snapshot for a resolved video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoDetails {
    pub title: String,
    pub channel: String,
    pub thumbnail: Option<String>,
    pub view_count: u64,
    pub duration_seconds: u64,
}

/// One complete resolution: metadata plus the raw stream list.
///
/// Never cached across requests; every request re-resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedVideo {
    pub details: VideoDetails,
    pub formats: Vec<RawFormat>,
}

impl ResolvedVideo {
    /// Look up a raw stream by its key.
    pub fn find_format(&self, itag: &str) -> Option<&RawFormat> {
        self.formats.iter().find(|f| f.itag == itag)
    }

    /// Whether any stream satisfies the fallback acceptance predicate.
    pub fn has_high_quality(&self) -> bool {
        self.formats.iter().any(RawFormat::is_high_quality)
    }
}
