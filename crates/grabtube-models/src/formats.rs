//! Format classification and ranking.
//!
//! Turns the extractor's raw stream list into the deduplicated, ordered
//! menu of downloadable options shown to the client. Pure functions:
//! classifying the same input twice yields identical output.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::video::{Container, RawFormat};

/// One downloadable option offered to the client.
///
/// Field names serialize camelCase to match the wire format consumed by the
/// frontend. Unique by `(quality, format)` among video options and by
/// `quality` among audio options within one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatOption {
    pub quality: String,
    pub format: String,
    pub itag: String,
    pub file_size: String,
    pub has_video: bool,
    pub has_audio: bool,
}

/// Estimate a download size label for a given quality and output format.
///
/// A deliberately coarse heuristic, advisory only. Audio sizes derive from
/// the bucket's nominal bitrate; video sizes come from a per-resolution
/// lookup, scaled down slightly for WebM.
pub fn estimate_file_size(duration_seconds: u64, quality: &str, format: &str) -> String {
    let size_mb = if format == "mp3" {
        let bitrate_kbps = match quality {
            "320kbps" => 320.0,
            "256kbps" => 256.0,
            _ => 128.0,
        };
        bitrate_kbps * duration_seconds as f64 / (8.0 * 1024.0)
    } else {
        let base_mb: f64 = match quality {
            "2160p" => 500.0,
            "1080p" => 200.0,
            "720p" => 100.0,
            "480p" => 50.0,
            "360p" => 30.0,
            _ => 100.0,
        };
        let multiplier = if format == "webm" { 0.9 } else { 1.0 };
        base_mb * multiplier
    };

    format!("~{}MB", size_mb.round() as u64)
}

/// Classify and rank raw streams into the client-facing format menu.
///
/// Precedence, in order: muxed MP4, video-only (labelled "No Audio"),
/// muxed WebM at 720p and above, then audio-only bucketed by bitrate.
/// A muxed option claims its height, suppressing any video-only option at
/// that exact resolution; claimed label sets keep the dedupe invariant
/// auditable in a single pass.
pub fn classify_formats(formats: &[RawFormat], duration_seconds: u64) -> Vec<FormatOption> {
    let mut video_options: Vec<FormatOption> = Vec::new();
    let mut audio_options: Vec<FormatOption> = Vec::new();

    // Heights claimed by muxed MP4 options; suppresses video-only twins.
    let mut muxed_heights: HashSet<u32> = HashSet::new();
    // (quality, format) pairs already emitted among video options.
    let mut video_labels: HashSet<(String, String)> = HashSet::new();
    // Video-only heights already emitted, across containers.
    let mut video_only_heights: HashSet<u32> = HashSet::new();
    // Audio bucket labels already emitted.
    let mut audio_labels: HashSet<String> = HashSet::new();

    // 1. Muxed MP4, best resolution first.
    let mut muxed_mp4: Vec<&RawFormat> = formats
        .iter()
        .filter(|f| f.container == Container::Mp4 && f.has_video && f.has_audio)
        .collect();
    muxed_mp4.sort_by(|a, b| b.height.cmp(&a.height));

    for format in muxed_mp4 {
        let Some(height) = format.height.filter(|&h| h > 0) else {
            continue;
        };
        let quality = format!("{height}p");
        if !video_labels.insert((quality.clone(), "mp4".to_string())) {
            continue;
        }
        muxed_heights.insert(height);
        video_options.push(FormatOption {
            file_size: estimate_file_size(duration_seconds, &quality, "mp4"),
            quality,
            format: "mp4".to_string(),
            itag: format.itag.clone(),
            has_video: true,
            has_audio: true,
        });
    }

    // 2. Video-only (mp4 or webm). High qualities are often video-only;
    //    labelled so the frontend can show "No Audio". Suppressed when a
    //    muxed option already covers the height, and collapsed to one
    //    entry per height across containers (first seen wins).
    let mut video_only: Vec<&RawFormat> = formats
        .iter()
        .filter(|f| {
            matches!(f.container, Container::Mp4 | Container::Webm) && f.has_video && !f.has_audio
        })
        .collect();
    video_only.sort_by(|a, b| b.height.cmp(&a.height));

    for format in video_only {
        let Some(height) = format.height.filter(|&h| h > 0) else {
            continue;
        };
        if muxed_heights.contains(&height) || !video_only_heights.insert(height) {
            continue;
        }
        let quality = format!("{height}p (No Audio)");
        let container = format.container.as_str();
        if !video_labels.insert((quality.clone(), container.to_string())) {
            continue;
        }
        video_options.push(FormatOption {
            file_size: estimate_file_size(duration_seconds, &format!("{height}p"), container),
            quality,
            format: container.to_string(),
            itag: format.itag.clone(),
            has_video: true,
            has_audio: false,
        });
    }

    // 3. Muxed WebM, 720p and above only. Lower WebM muxed streams just
    //    duplicate the MP4 coverage.
    let mut muxed_webm: Vec<&RawFormat> = formats
        .iter()
        .filter(|f| f.container == Container::Webm && f.has_video && f.has_audio)
        .collect();
    muxed_webm.sort_by(|a, b| b.height.cmp(&a.height));

    for format in muxed_webm {
        let Some(height) = format.height.filter(|&h| h > 0) else {
            continue;
        };
        if height < 720 {
            continue;
        }
        let quality = format!("{height}p");
        if !video_labels.insert((quality.clone(), "webm".to_string())) {
            continue;
        }
        video_options.push(FormatOption {
            file_size: estimate_file_size(duration_seconds, &quality, "webm"),
            quality,
            format: "webm".to_string(),
            itag: format.itag.clone(),
            has_video: true,
            has_audio: true,
        });
    }

    // 4. Audio-only, bucketed by bitrate; highest bitrate stream claims
    //    each bucket.
    let mut audio_only: Vec<&RawFormat> = formats
        .iter()
        .filter(|f| f.has_audio && !f.has_video)
        .collect();
    audio_only.sort_by(|a, b| b.audio_bitrate.cmp(&a.audio_bitrate));

    for format in audio_only {
        let Some(bitrate) = format.audio_bitrate.filter(|&b| b > 0) else {
            continue;
        };
        let quality = if bitrate >= 320 {
            "320kbps"
        } else if bitrate >= 256 {
            "256kbps"
        } else {
            "128kbps"
        };
        if !audio_labels.insert(quality.to_string()) {
            continue;
        }
        audio_options.push(FormatOption {
            quality: quality.to_string(),
            format: "mp3".to_string(),
            itag: format.itag.clone(),
            file_size: estimate_file_size(duration_seconds, quality, "mp3"),
            has_video: false,
            has_audio: true,
        });
    }

    video_options.extend(audio_options);
    video_options
}
