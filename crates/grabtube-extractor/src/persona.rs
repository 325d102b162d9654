//! Client personas presented to the extractor.
//!
//! A persona is a named configuration profile (declared player client plus
//! request headers) that influences which stream set the upstream service
//! returns. Personas represent different upstream trust profiles, not
//! redundant replicas, so their preference order is fixed.

use std::fmt;

/// Browser user agent presented by the Web persona.
const WEB_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A client persona for the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPersona {
    /// Generic web client with browser-like request headers.
    Web,
    /// Native iOS client; the extractor presents its own identity.
    Ios,
    /// Native Android client; terminal persona in the fallback order.
    Android,
}

impl ClientPersona {
    /// The fixed preference order for the fallback strategy. The last
    /// entry is always a terminal acceptance point.
    pub const FALLBACK_ORDER: [ClientPersona; 3] =
        [ClientPersona::Web, ClientPersona::Ios, ClientPersona::Android];

    /// Diagnostic name, as reported in the `usedClient` debug field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientPersona::Web => "WEB",
            ClientPersona::Ios => "IOS",
            ClientPersona::Android => "ANDROID",
        }
    }

    /// Value for yt-dlp's `youtube:player_client` extractor argument.
    pub fn player_client(&self) -> &'static str {
        match self {
            ClientPersona::Web => "web",
            ClientPersona::Ios => "ios",
            ClientPersona::Android => "android",
        }
    }

    /// Extra yt-dlp arguments for this persona. Only the Web persona sets
    /// custom headers; the native clients must not carry a browser
    /// identity or the upstream rejects them.
    pub fn extra_args(&self) -> Vec<String> {
        match self {
            ClientPersona::Web => vec![
                "--user-agent".to_string(),
                WEB_USER_AGENT.to_string(),
                "--add-header".to_string(),
                "Referer:https://www.youtube.com/".to_string(),
                "--add-header".to_string(),
                "Accept-Language:en-US,en;q=0.9".to_string(),
            ],
            ClientPersona::Ios | ClientPersona::Android => Vec::new(),
        }
    }
}

impl fmt::Display for ClientPersona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_order() {
        assert_eq!(
            ClientPersona::FALLBACK_ORDER,
            [ClientPersona::Web, ClientPersona::Ios, ClientPersona::Android]
        );
    }

    #[test]
    fn test_only_web_sets_headers() {
        assert!(!ClientPersona::Web.extra_args().is_empty());
        assert!(ClientPersona::Ios.extra_args().is_empty());
        assert!(ClientPersona::Android.extra_args().is_empty());
    }

    #[test]
    fn test_diagnostic_names() {
        assert_eq!(ClientPersona::Web.as_str(), "WEB");
        assert_eq!(ClientPersona::Ios.as_str(), "IOS");
        assert_eq!(ClientPersona::Android.as_str(), "ANDROID");
        assert_eq!(ClientPersona::Android.player_client(), "android");
    }
}
