//! API integration tests.
//!
//! The router is exercised end to end with a scripted resolver standing in
//! for the yt-dlp subprocess, so these run without network access or the
//! extractor binary installed.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use grabtube_api::{create_router, ApiConfig, AppState};
use grabtube_extractor::{ByteStream, ClientPersona, ExtractError, ExtractResult, VideoResolver};
use grabtube_models::{Container, RawFormat, ResolvedVideo, VideoDetails};

/// Resolver stub: either succeeds with the sample video or fails with a
/// fixed upstream message.
struct StubResolver {
    fail_with: Option<String>,
}

impl StubResolver {
    fn ok() -> Self {
        Self { fail_with: None }
    }

    fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl VideoResolver for StubResolver {
    async fn resolve(
        &self,
        _id: &grabtube_models::VideoId,
        _persona: ClientPersona,
    ) -> ExtractResult<ResolvedVideo> {
        match &self.fail_with {
            Some(message) => Err(ExtractError::extraction_failed(message.clone())),
            None => Ok(sample_video()),
        }
    }

    async fn open_stream(
        &self,
        _id: &grabtube_models::VideoId,
        _itag: &str,
    ) -> ExtractResult<ByteStream> {
        let chunks: Vec<std::io::Result<bytes::Bytes>> = vec![
            Ok(bytes::Bytes::from_static(b"fake media ")),
            Ok(bytes::Bytes::from_static(b"bytes")),
        ];
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }
}

fn sample_video() -> ResolvedVideo {
    let muxed_720 = RawFormat {
        itag: "22".to_string(),
        container: Container::Mp4,
        has_video: true,
        has_audio: true,
        height: Some(720),
        audio_bitrate: Some(192),
        bitrate: Some(1200.0),
        quality_label: Some("720p".to_string()),
    };
    let video_only_1080 = RawFormat {
        itag: "137".to_string(),
        container: Container::Mp4,
        has_video: true,
        has_audio: false,
        height: Some(1080),
        audio_bitrate: None,
        bitrate: Some(2500.0),
        quality_label: Some("1080p".to_string()),
    };
    let low_webm_muxed = RawFormat {
        itag: "43".to_string(),
        container: Container::Webm,
        has_video: true,
        has_audio: true,
        height: Some(360),
        audio_bitrate: Some(128),
        bitrate: Some(500.0),
        quality_label: Some("360p".to_string()),
    };
    let audio = RawFormat {
        itag: "140".to_string(),
        container: Container::Other,
        has_video: false,
        has_audio: true,
        height: None,
        audio_bitrate: Some(129),
        bitrate: Some(129.4),
        quality_label: Some("medium".to_string()),
    };

    ResolvedVideo {
        details: VideoDetails {
            title: "Test Video".to_string(),
            channel: "Test Channel".to_string(),
            thumbnail: Some("https://i.ytimg.com/vi/x/maxresdefault.jpg".to_string()),
            view_count: 1_500_000,
            duration_seconds: 212,
        },
        formats: vec![muxed_720, video_only_1080, low_webm_muxed, audio],
    }
}

fn test_router(resolver: StubResolver, config: ApiConfig) -> Router {
    let state = AppState::with_resolver(config, Arc::new(resolver));
    create_router(state, None)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_video_info(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/video-info")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_router(StubResolver::ok(), ApiConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "OK");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_video_info_success() {
    let app = test_router(StubResolver::ok(), ApiConfig::default());

    let response = app
        .oneshot(post_video_info(serde_json::json!({
            "url": "https://youtu.be/dQw4w9WgXcQ"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["title"], "Test Video");
    assert_eq!(json["channel"], "Test Channel");
    assert_eq!(json["views"], "1.5M");
    assert_eq!(json["duration"], "3:32");
    assert_eq!(json["videoId"], "dQw4w9WgXcQ");

    // Stub resolves on the first persona with high quality formats.
    assert_eq!(json["debug"]["usedClient"], "WEB");
    assert_eq!(json["debug"]["totalFormatsFound"], 4);
    assert_eq!(json["debug"]["hasHighQuality"], true);

    let qualities: Vec<&str> = json["formats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["quality"].as_str().unwrap())
        .collect();
    // Muxed 720p, then the 1080p video-only tier; the 360p muxed WebM is
    // excluded; one audio bucket.
    assert_eq!(qualities, vec!["720p", "1080p (No Audio)", "128kbps"]);

    let first = &json["formats"][0];
    assert_eq!(first["format"], "mp4");
    assert_eq!(first["itag"], "22");
    assert_eq!(first["fileSize"], "~100MB");
    assert_eq!(first["hasAudio"], true);
}

#[tokio::test]
async fn test_video_info_missing_url() {
    let app = test_router(StubResolver::ok(), ApiConfig::default());

    let response = app
        .oneshot(post_video_info(serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "URL is required");
}

#[tokio::test]
async fn test_video_info_invalid_url() {
    let app = test_router(StubResolver::ok(), ApiConfig::default());

    let response = app
        .oneshot(post_video_info(serde_json::json!({
            "url": "https://example.com/"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid YouTube URL");
}

#[tokio::test]
async fn test_video_info_upstream_failure_rewritten() {
    let app = test_router(
        StubResolver::failing("ERROR: Sign in to confirm you're not a bot"),
        ApiConfig::default(),
    );

    let response = app
        .oneshot(post_video_info(serde_json::json!({
            "url": "https://youtu.be/dQw4w9WgXcQ"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Failed to fetch video information");
    // No cookies configured in the test config, so guidance points at setup.
    assert!(json["details"]
        .as_str()
        .unwrap()
        .contains("requires sign-in"));
}

#[tokio::test]
async fn test_download_missing_params() {
    let app = test_router(StubResolver::ok(), ApiConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/download")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "videoId and itag are required");
}

#[tokio::test]
async fn test_download_stale_itag_rejected() {
    let app = test_router(StubResolver::ok(), ApiConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/download?videoId=dQw4w9WgXcQ&itag=999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid format selected");
}

#[tokio::test]
async fn test_download_streams_attachment() {
    let app = test_router(StubResolver::ok(), ApiConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/download?videoId=dQw4w9WgXcQ&itag=22&title=My%20Video&format=mp4")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "video/mp4"
    );
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"My_Video.mp4\""
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"fake media bytes");
}

#[tokio::test]
async fn test_download_mp3_content_type() {
    let app = test_router(StubResolver::ok(), ApiConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/download?videoId=dQw4w9WgXcQ&itag=140&format=mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "audio/mpeg"
    );
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"video.mp3\""
    );
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = test_router(StubResolver::ok(), ApiConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert!(headers.contains_key("X-Content-Type-Options"));
    assert!(headers.contains_key("X-Frame-Options"));
    assert!(headers.contains_key("X-Request-ID"));
}

#[tokio::test]
async fn test_rate_limiting_per_address() {
    let config = ApiConfig {
        rate_limit_max: 2,
        ..ApiConfig::default()
    };
    let app = test_router(StubResolver::ok(), config);

    for i in 0..3 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header("X-Forwarded-For", "192.0.2.50")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        if i < 2 {
            assert_eq!(response.status(), StatusCode::OK);
        } else {
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        }
    }

    // A different address still gets through.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("X-Forwarded-For", "192.0.2.51")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
