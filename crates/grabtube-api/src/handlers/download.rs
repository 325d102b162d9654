//! Download relay handler: pipes a selected stream's bytes to the caller.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::Response;
use serde::Deserialize;
use tracing::info;

use grabtube_extractor::ClientPersona;
use grabtube_models::VideoId;

use crate::error::{rewrite_upstream_error, ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub itag: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

/// GET /api/download?videoId&itag&title&format
///
/// Re-resolves the video (a fresh, single resolution, independent of the
/// menu call) and streams the selected format as an attachment. A stream
/// key missing from the fresh list means the client holds a stale menu.
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let (Some(video_id), Some(itag)) = (
        query.video_id.filter(|v| !v.is_empty()),
        query.itag.filter(|v| !v.is_empty()),
    ) else {
        return Err(ApiError::bad_request("videoId and itag are required"));
    };

    let video_id =
        VideoId::parse(video_id).map_err(|_| ApiError::bad_request("Invalid YouTube URL"))?;

    let video = state
        .resolver
        .resolve(&video_id, ClientPersona::Web)
        .await
        .map_err(|e| {
            metrics::record_download_failure();
            ApiError::upstream(
                "Download failed",
                rewrite_upstream_error(&e.to_string(), state.config.cookies_configured),
            )
        })?;

    let Some(selected) = video.find_format(&itag) else {
        return Err(ApiError::bad_request("Invalid format selected"));
    };

    let format = query.format.as_deref().unwrap_or("mp4");
    let file_name = sanitize_filename(&format!(
        "{}.{}",
        query.title.as_deref().unwrap_or("video"),
        format
    ));

    info!(
        video_id = %video_id,
        itag = %itag,
        container = %selected.container,
        quality = ?selected.quality_label,
        "Starting download"
    );

    let stream = state
        .resolver
        .open_stream(&video_id, &itag)
        .await
        .map_err(|e| {
            metrics::record_download_failure();
            ApiError::upstream("Download failed", e.to_string())
        })?;

    metrics::record_download(format);

    // Once this response is handed back, any relay failure can only
    // terminate the body stream; the exit is logged by the extractor.
    Response::builder()
        .header(header::CONTENT_TYPE, content_type_for(format))
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {e}")))
}

/// Content type for the requested output format.
fn content_type_for(format: &str) -> &'static str {
    match format {
        "mp3" => "audio/mpeg",
        "webm" => "video/webm",
        _ => "video/mp4",
    }
}

/// Replace every character outside `[A-Za-z0-9.-]` so the name is safe in
/// a Content-Disposition header.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("mp3"), "audio/mpeg");
        assert_eq!(content_type_for("webm"), "video/webm");
        assert_eq!(content_type_for("mp4"), "video/mp4");
        assert_eq!(content_type_for("anything"), "video/mp4");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("My Video: Part 1!.mp4"),
            "My_Video__Part_1_.mp4"
        );
        assert_eq!(sanitize_filename("clean-name.webm"), "clean-name.webm");
        assert_eq!(sanitize_filename("ünïcödé.mp3"), "_n_c_d_.mp3");
    }
}
