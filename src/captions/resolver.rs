use log::{debug, info};
use std::sync::Arc;

use super::{CaptionKind, CaptionListing, CaptionProvider, CaptionTrack, CaptionTrackInfo};
use crate::errors::CaptionError;
use crate::language_utils;
use crate::retry::{with_timeout, RetryPolicy};
use crate::video_ref::VideoReference;

fn kind_rank(kind: CaptionKind) -> u8 {
    match kind {
        CaptionKind::Human => 0,
        CaptionKind::Automatic => 1,
    }
}

/// Pick the track to read for `language`.
///
/// Human tracks always beat automatic ones; within a kind an exact
/// language tag beats a regional variant (`en` over `en-GB`). The
/// result does not depend on the order of `listing.tracks`.
pub fn select_track<'a>(listing: &'a CaptionListing, language: &str) -> Option<&'a CaptionTrackInfo> {
    listing.tracks.iter()
        .filter_map(|track| {
            language_utils::tag_match_rank(&track.language, language)
                .map(|rank| ((kind_rank(track.kind), rank, track.language.to_lowercase()), track))
        })
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, track)| track)
}

/// Resolves a video reference to a caption track and the video duration
#[derive(Debug, Clone)]
pub struct CaptionResolver {
    provider: Arc<dyn CaptionProvider>,
    language: String,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl CaptionResolver {
    pub fn new(
        provider: Arc<dyn CaptionProvider>,
        language: impl Into<String>,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            language: language.into(),
            timeout_secs,
            retry,
        }
    }

    /// The caption language this resolver reads
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Fetch metadata, select a track and download it.
    ///
    /// Returns the track and the video duration in seconds.
    pub async fn resolve(&self, reference: &VideoReference) -> Result<(CaptionTrack, f64), CaptionError> {
        let listing = self.retry
            .run("Caption listing", || {
                with_timeout(self.timeout_secs, self.provider.fetch_captions(reference))
            })
            .await?;

        let duration_secs = match listing.duration_secs {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => return Err(CaptionError::MissingDuration),
        };

        debug!(
            "Video {} lasts {:.1}s and has {} caption track(s)",
            reference.video_id(),
            duration_secs,
            listing.tracks.len()
        );

        let info = select_track(&listing, &self.language)
            .ok_or_else(|| CaptionError::NoCaptions { language: self.language.clone() })?;

        info!(
            "Using {} captions ({:?}) for video {}",
            info.language,
            info.kind,
            reference.video_id()
        );

        let payload = self.retry
            .run("Caption download", || {
                with_timeout(self.timeout_secs, self.provider.fetch_payload(reference, info))
            })
            .await?;

        Ok((CaptionTrack::from_payload(info, payload), duration_secs))
    }
}
