/*!
 * Caption retrieval.
 *
 * A `CaptionProvider` lists the caption tracks of a video and downloads
 * the payload of one of them; the `CaptionResolver` applies the selection
 * policy on top and produces a `CaptionTrack` plus the video duration.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::video_ref::VideoReference;

pub mod resolver;
pub mod webvtt;
pub mod ytdlp;

pub use resolver::{select_track, CaptionResolver};
pub use ytdlp::YtDlpProvider;

/// Who authored a caption track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionKind {
    /// Uploaded by a person
    Human,
    /// Produced by speech recognition
    Automatic,
}

/// A caption track advertised by the provider, not yet downloaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrackInfo {
    /// Language tag as reported by the provider (`en`, `en-US`, ...)
    pub language: String,
    pub kind: CaptionKind,
    /// Payload format extension (`vtt`, `srv3`, ...)
    pub ext: String,
    /// Direct download URL when the provider exposes one
    #[serde(default)]
    pub url: Option<String>,
}

/// Everything the provider knows about a video's captions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionListing {
    /// Total video duration in seconds
    pub duration_secs: Option<f64>,
    /// Human and automatic tracks, any order
    pub tracks: Vec<CaptionTrackInfo>,
}

/// One cue of a caption track
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSegment {
    pub text: String,
    pub auto_generated: bool,
}

/// A downloaded caption track
#[derive(Debug, Clone)]
pub struct CaptionTrack {
    pub language: String,
    pub kind: CaptionKind,
    /// Cues in file order
    pub segments: Vec<CaptionSegment>,
    /// The payload exactly as downloaded
    pub raw: String,
}

impl CaptionTrack {
    /// Build a track from a downloaded payload, parsing its cues
    pub fn from_payload(info: &CaptionTrackInfo, raw: String) -> Self {
        let auto_generated = info.kind == CaptionKind::Automatic;
        let segments = webvtt::parse_cues(&raw)
            .into_iter()
            .map(|cue| CaptionSegment { text: cue.text, auto_generated })
            .collect();

        Self {
            language: info.language.clone(),
            kind: info.kind,
            segments,
            raw,
        }
    }

    pub fn is_auto_generated(&self) -> bool {
        self.kind == CaptionKind::Automatic
    }
}

/// Source of caption tracks and video metadata
#[async_trait]
pub trait CaptionProvider: Send + Sync + Debug {
    /// List the caption tracks and the duration of a video
    async fn fetch_captions(&self, reference: &VideoReference) -> Result<CaptionListing, ProviderError>;

    /// Download the payload of one advertised track
    async fn fetch_payload(
        &self,
        reference: &VideoReference,
        track: &CaptionTrackInfo,
    ) -> Result<String, ProviderError>;
}
