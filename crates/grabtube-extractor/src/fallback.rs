//! Multi-persona fallback strategy.
//!
//! The system's only retry logic: a request-scoped, strictly sequential
//! walk over the persona preference order. No backoff, no racing. A
//! persona's result is accepted as soon as it contains a high-quality
//! stream; the final persona is always a terminal acceptance point, even
//! when its result is low quality.

use tracing::{info, warn};

use grabtube_models::{ResolvedVideo, VideoId};

use crate::error::{ExtractError, ExtractResult};
use crate::persona::ClientPersona;
use crate::ytdlp::VideoResolver;

/// An accepted resolution, with the persona that produced it recorded for
/// diagnostics.
#[derive(Debug)]
pub struct Resolution {
    pub video: ResolvedVideo,
    pub persona: ClientPersona,
    pub has_high_quality: bool,
}

/// Resolve a video by trying each persona in order.
///
/// Hard failures (transport, access denied, empty formats) advance to the
/// next persona; a success without high-quality streams is a soft failure
/// that also advances, except on the final persona. If every persona
/// raised a hard error, the last observed error is surfaced.
pub async fn resolve_with_fallback(
    resolver: &dyn VideoResolver,
    id: &VideoId,
    personas: &[ClientPersona],
) -> ExtractResult<Resolution> {
    let mut last_error: Option<ExtractError> = None;

    for (index, &persona) in personas.iter().enumerate() {
        let is_terminal = index == personas.len() - 1;

        match resolver.resolve(id, persona).await {
            Err(e) => {
                warn!(video_id = %id, persona = %persona, "Persona attempt failed: {}", e);
                last_error = Some(e);
            }
            Ok(video) => {
                let has_high_quality = video.has_high_quality();

                if has_high_quality || is_terminal {
                    if !has_high_quality {
                        warn!(
                            video_id = %id,
                            persona = %persona,
                            "Accepting low quality result from terminal persona"
                        );
                    }
                    info!(
                        video_id = %id,
                        persona = %persona,
                        formats = video.formats.len(),
                        high_quality = has_high_quality,
                        "Resolution accepted"
                    );
                    return Ok(Resolution {
                        video,
                        persona,
                        has_high_quality,
                    });
                }

                info!(
                    video_id = %id,
                    persona = %persona,
                    "Persona returned only low quality formats, trying next"
                );
                last_error = Some(ExtractError::extraction_failed("Low quality formats only"));
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| ExtractError::extraction_failed("No extractor personas configured")))
}
