//! yt-dlp CLI wrapper for video resolution and stream relay.
//!
//! This crate provides:
//! - A `VideoResolver` trait over the external extractor
//! - Client personas for working around upstream blocking
//! - The sequential multi-persona fallback strategy
//! - Streaming access to a selected stream's bytes
//! - Optional cookie-based authentication material from the environment

pub mod cookies;
pub mod error;
pub mod fallback;
pub mod persona;
pub mod ytdlp;

pub use cookies::resolve_cookies_file;
pub use error::{ExtractError, ExtractResult};
pub use fallback::{resolve_with_fallback, Resolution};
pub use persona::ClientPersona;
pub use ytdlp::{ByteStream, VideoResolver, YtDlpResolver};
