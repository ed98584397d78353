use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::errors::PipelineError;

// @module: Video reference parsing

// @const: Common YouTube URL shapes; the id is the 11 characters after the path prefix
static VIDEO_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|.+\?v=)?(?P<id>[A-Za-z0-9\-=_]{11})",
    )
    .unwrap()
});

/// Extract the canonical video id from a reference, `None` when the
/// reference does not look like a video URL
pub fn extract_video_id(reference: &str) -> Option<String> {
    VIDEO_ID_REGEX
        .captures(reference.trim())
        .and_then(|caps| caps.name("id"))
        .map(|m| m.as_str().to_string())
}

/// A video reference that is known to carry a video id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    url: String,
    video_id: String,
}

impl VideoReference {
    /// Parse a raw reference; rejects anything without an extractable id
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let url = raw.trim();
        if url.is_empty() {
            return Err(PipelineError::MalformedInput("video reference is empty".to_string()));
        }

        let video_id = extract_video_id(url).ok_or_else(|| {
            PipelineError::MalformedInput(format!("'{}' is not a recognizable video reference", url))
        })?;

        Ok(Self {
            url: url.to_string(),
            video_id,
        })
    }

    /// The reference as given by the caller (trimmed)
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.video_id)
    }
}
