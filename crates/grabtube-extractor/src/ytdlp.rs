//! yt-dlp subprocess adapter.
//!
//! The extractor binary is the opaque collaborator that owns all byte-level
//! extraction. This module drives it two ways: a JSON resolve (`-J`) that
//! yields metadata plus the raw stream list, and a stdout relay (`-o -`)
//! that yields a selected stream's bytes as they arrive.

use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use grabtube_models::{Container, RawFormat, ResolvedVideo, VideoDetails, VideoId};

use crate::cookies::resolve_cookies_file;
use crate::error::{ExtractError, ExtractResult};
use crate::persona::ClientPersona;

/// Default timeout for a single resolve attempt.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A stream of media bytes from the extractor.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'static>>;

/// Seam over the external extractor, so the fallback strategy and the API
/// handlers can be exercised against scripted resolvers in tests.
#[async_trait]
pub trait VideoResolver: Send + Sync {
    /// Resolve metadata and the raw stream list under one persona.
    async fn resolve(&self, id: &VideoId, persona: ClientPersona) -> ExtractResult<ResolvedVideo>;

    /// Open the selected stream's bytes for relaying.
    async fn open_stream(&self, id: &VideoId, itag: &str) -> ExtractResult<ByteStream>;
}

/// Production resolver backed by the yt-dlp binary.
pub struct YtDlpResolver {
    ytdlp_path: PathBuf,
    cookies_file: Option<PathBuf>,
    timeout_seconds: u64,
}

impl YtDlpResolver {
    /// Locate yt-dlp and gather cookie material from the environment.
    pub async fn from_env() -> ExtractResult<Self> {
        let ytdlp_path = match std::env::var("YTDLP_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => which::which("yt-dlp").map_err(|_| ExtractError::YtDlpNotFound)?,
        };

        let cookies_file = resolve_cookies_file().await;
        if cookies_file.is_none() {
            warn!("No cookie material configured; some videos may be blocked upstream");
        }

        let timeout_seconds = std::env::var("EXTRACTOR_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        info!(ytdlp = %ytdlp_path.display(), "Extractor ready");

        Ok(Self {
            ytdlp_path,
            cookies_file,
            timeout_seconds,
        })
    }

    /// Arguments shared by every invocation under a persona.
    fn base_args(&self, persona: ClientPersona) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--force-ipv4".to_string(),
            "--socket-timeout".to_string(),
            self.timeout_seconds.to_string(),
            "--extractor-args".to_string(),
            format!("youtube:player_client={}", persona.player_client()),
        ];
        args.extend(persona.extra_args());
        if let Some(cookies) = &self.cookies_file {
            args.push("--cookies".to_string());
            args.push(cookies.display().to_string());
        }
        args
    }

    /// Parse `-J` output into a resolved video.
    fn parse_video(stdout: &[u8]) -> ExtractResult<ResolvedVideo> {
        let json: serde_json::Value = serde_json::from_slice(stdout)?;

        let formats = json["formats"]
            .as_array()
            .filter(|formats| !formats.is_empty())
            .ok_or(ExtractError::EmptyFormats)?
            .iter()
            .map(parse_format)
            .collect();

        let thumbnail = json["thumbnails"]
            .as_array()
            .and_then(|thumbs| thumbs.last())
            .and_then(|t| t["url"].as_str())
            .or_else(|| json["thumbnail"].as_str())
            .map(str::to_string);

        let channel = json["channel"]
            .as_str()
            .or_else(|| json["uploader"].as_str())
            .unwrap_or("Unknown")
            .to_string();

        Ok(ResolvedVideo {
            details: VideoDetails {
                title: json["title"].as_str().unwrap_or("Unknown").to_string(),
                channel,
                thumbnail,
                view_count: json["view_count"].as_u64().unwrap_or(0),
                duration_seconds: json["duration"].as_f64().unwrap_or(0.0) as u64,
            },
            formats,
        })
    }
}

fn parse_format(f: &serde_json::Value) -> RawFormat {
    let has_video = f["vcodec"].as_str().is_some_and(|v| v != "none");
    let has_audio = f["acodec"].as_str().is_some_and(|a| a != "none");

    RawFormat {
        itag: f["format_id"].as_str().unwrap_or("").to_string(),
        container: Container::from_ext(f["ext"].as_str().unwrap_or("")),
        has_video,
        has_audio,
        height: f["height"].as_u64().map(|h| h as u32),
        audio_bitrate: f["abr"].as_f64().map(|a| a.round() as u32),
        bitrate: f["tbr"].as_f64(),
        quality_label: f["format_note"].as_str().map(str::to_string),
    }
}

/// The most useful line of a failed invocation's stderr.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    text.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("Unknown error")
        .to_string()
}

#[async_trait]
impl VideoResolver for YtDlpResolver {
    async fn resolve(&self, id: &VideoId, persona: ClientPersona) -> ExtractResult<ResolvedVideo> {
        let mut args = self.base_args(persona);
        args.push("-J".to_string());
        args.push(id.watch_url());

        debug!(video_id = %id, persona = %persona, "Resolving video");

        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout_seconds),
            Command::new(&self.ytdlp_path)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output(),
        )
        .await
        .map_err(|_| ExtractError::Timeout(self.timeout_seconds))??;

        if !output.status.success() {
            return Err(ExtractError::extraction_failed(stderr_tail(&output.stderr)));
        }

        Self::parse_video(&output.stdout)
    }

    async fn open_stream(&self, id: &VideoId, itag: &str) -> ExtractResult<ByteStream> {
        let mut args = self.base_args(ClientPersona::Web);
        args.push("-f".to_string());
        args.push(itag.to_string());
        args.push("-o".to_string());
        args.push("-".to_string());
        args.push(id.watch_url());

        info!(video_id = %id, itag = %itag, "Opening media stream");

        let mut child = Command::new(&self.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractError::extraction_failed("Failed to capture stream output"))?;
        let mut stderr = child.stderr.take();

        // Reap the child off to the side. A failure after bytes have been
        // relayed cannot produce a second response; it only terminates the
        // stream, so the exit status is logged here instead.
        let video_id = id.clone();
        let stream_itag = itag.to_string();
        tokio::spawn(async move {
            let mut stderr_buf = Vec::new();
            if let Some(stderr) = stderr.as_mut() {
                let _ = stderr.read_to_end(&mut stderr_buf).await;
            }
            match child.wait().await {
                Ok(status) if status.success() => {
                    debug!(video_id = %video_id, itag = %stream_itag, "Stream relay finished");
                }
                Ok(status) => {
                    warn!(
                        video_id = %video_id,
                        itag = %stream_itag,
                        exit = ?status.code(),
                        error = %stderr_tail(&stderr_buf),
                        "Stream relay failed mid-download"
                    );
                }
                Err(e) => {
                    warn!(video_id = %video_id, itag = %stream_itag, "Failed to reap stream relay: {}", e);
                }
            }
        });

        Ok(Box::pin(ReaderStream::new(stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> YtDlpResolver {
        YtDlpResolver {
            ytdlp_path: PathBuf::from("yt-dlp"),
            cookies_file: None,
            timeout_seconds: 30,
        }
    }

    #[test]
    fn test_base_args_persona_switch() {
        let args = resolver().base_args(ClientPersona::Android);
        assert!(args.contains(&"youtube:player_client=android".to_string()));
        assert!(!args.contains(&"--user-agent".to_string()));

        let args = resolver().base_args(ClientPersona::Web);
        assert!(args.contains(&"youtube:player_client=web".to_string()));
        assert!(args.contains(&"--user-agent".to_string()));
    }

    #[test]
    fn test_base_args_cookies() {
        let mut with_cookies = resolver();
        with_cookies.cookies_file = Some(PathBuf::from("/tmp/cookies.txt"));
        let args = with_cookies.base_args(ClientPersona::Ios);
        assert!(args.contains(&"--cookies".to_string()));
        assert!(args.contains(&"/tmp/cookies.txt".to_string()));
    }

    #[test]
    fn test_parse_video() {
        let json = serde_json::json!({
            "id": "dQw4w9WgXcQ",
            "title": "Test Video",
            "channel": "Test Channel",
            "uploader": "Fallback Name",
            "view_count": 1_500_000,
            "duration": 212.0,
            "thumbnail": "https://i.ytimg.com/vi/x/default.jpg",
            "thumbnails": [
                {"url": "https://i.ytimg.com/vi/x/default.jpg"},
                {"url": "https://i.ytimg.com/vi/x/maxresdefault.jpg"}
            ],
            "formats": [
                {
                    "format_id": "22",
                    "ext": "mp4",
                    "vcodec": "avc1.64001F",
                    "acodec": "mp4a.40.2",
                    "height": 720,
                    "tbr": 1200.5,
                    "format_note": "720p"
                },
                {
                    "format_id": "140",
                    "ext": "m4a",
                    "vcodec": "none",
                    "acodec": "mp4a.40.2",
                    "abr": 129.4,
                    "tbr": 129.4
                }
            ]
        });
        let video = YtDlpResolver::parse_video(json.to_string().as_bytes()).unwrap();

        assert_eq!(video.details.title, "Test Video");
        assert_eq!(video.details.channel, "Test Channel");
        assert_eq!(
            video.details.thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/x/maxresdefault.jpg")
        );
        assert_eq!(video.details.view_count, 1_500_000);
        assert_eq!(video.details.duration_seconds, 212);

        assert_eq!(video.formats.len(), 2);
        let muxed = &video.formats[0];
        assert_eq!(muxed.itag, "22");
        assert_eq!(muxed.container, Container::Mp4);
        assert!(muxed.has_video && muxed.has_audio);
        assert_eq!(muxed.height, Some(720));

        let audio = &video.formats[1];
        assert!(!audio.has_video && audio.has_audio);
        assert_eq!(audio.container, Container::Other);
        assert_eq!(audio.audio_bitrate, Some(129));
    }

    #[test]
    fn test_parse_video_empty_formats() {
        let json = serde_json::json!({"title": "t", "formats": []});
        assert!(matches!(
            YtDlpResolver::parse_video(json.to_string().as_bytes()),
            Err(ExtractError::EmptyFormats)
        ));

        let json = serde_json::json!({"title": "t"});
        assert!(matches!(
            YtDlpResolver::parse_video(json.to_string().as_bytes()),
            Err(ExtractError::EmptyFormats)
        ));
    }

    #[test]
    fn test_parse_video_invalid_json() {
        assert!(matches!(
            YtDlpResolver::parse_video(b"not json"),
            Err(ExtractError::JsonParse(_))
        ));
    }

    #[test]
    fn test_stderr_tail() {
        assert_eq!(
            stderr_tail(b"WARNING: something\nERROR: Sign in to confirm\n\n"),
            "ERROR: Sign in to confirm"
        );
        assert_eq!(stderr_tail(b""), "Unknown error");
    }
}
