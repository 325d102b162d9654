//! Video info handler: metadata plus the ranked format menu.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use grabtube_models::{
    classify_formats, extract_video_id, format_duration, format_views, FormatOption,
};
use grabtube_extractor::{resolve_with_fallback, ClientPersona};

use crate::error::{rewrite_upstream_error, ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct VideoInfoRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfoResponse {
    pub title: String,
    pub thumbnail: Option<String>,
    pub channel: String,
    pub views: String,
    pub duration: String,
    pub formats: Vec<FormatOption>,
    pub video_id: String,
    pub debug: DebugInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub used_client: String,
    pub total_formats_found: usize,
    pub has_high_quality: bool,
}

/// POST /api/video-info
///
/// Resolves the pasted URL through the persona fallback and returns the
/// classified format menu. Nothing is cached; a later download re-resolves.
pub async fn video_info(
    State(state): State<AppState>,
    Json(request): Json<VideoInfoRequest>,
) -> ApiResult<Json<VideoInfoResponse>> {
    let url = request
        .url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("URL is required"))?;

    let video_id =
        extract_video_id(url).ok_or_else(|| ApiError::bad_request("Invalid YouTube URL"))?;

    let resolution = resolve_with_fallback(
        state.resolver.as_ref(),
        &video_id,
        &ClientPersona::FALLBACK_ORDER,
    )
    .await
    .map_err(|e| {
        metrics::record_resolution_failure();
        ApiError::upstream(
            "Failed to fetch video information",
            rewrite_upstream_error(&e.to_string(), state.config.cookies_configured),
        )
    })?;

    metrics::record_resolution(resolution.persona.as_str());

    let video = resolution.video;
    let details = &video.details;
    let formats = classify_formats(&video.formats, details.duration_seconds);

    info!(
        video_id = %video_id,
        used_client = %resolution.persona,
        options = formats.len(),
        "Video info resolved"
    );

    let debug = DebugInfo {
        used_client: resolution.persona.as_str().to_string(),
        total_formats_found: video.formats.len(),
        // Looser than the fallback acceptance predicate: any stream with a
        // reported height of 720 or more.
        has_high_quality: video
            .formats
            .iter()
            .any(|f| f.height.is_some_and(|h| h >= 720)),
    };

    Ok(Json(VideoInfoResponse {
        title: details.title.clone(),
        thumbnail: details.thumbnail.clone(),
        channel: details.channel.clone(),
        views: format_views(details.view_count),
        duration: format_duration(details.duration_seconds),
        formats,
        video_id: video_id.to_string(),
        debug,
    }))
}
