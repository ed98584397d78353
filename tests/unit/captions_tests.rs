/*!
 * Tests for caption track selection and resolution
 */

use std::sync::Arc;

use vidnarrate::captions::{select_track, CaptionKind, CaptionListing, CaptionResolver, CaptionTrackInfo};
use vidnarrate::errors::{CaptionError, ProviderError};
use vidnarrate::retry::RetryPolicy;
use vidnarrate::video_ref::VideoReference;
use crate::common::mock_providers::ScriptedCaptionProvider;
use crate::common::{SAMPLE_VTT, VIDEO_URL};

fn track(language: &str, kind: CaptionKind) -> CaptionTrackInfo {
    CaptionTrackInfo {
        language: language.to_string(),
        kind,
        ext: "vtt".to_string(),
        url: None,
    }
}

fn resolver(provider: &ScriptedCaptionProvider, retry: RetryPolicy) -> CaptionResolver {
    CaptionResolver::new(Arc::new(provider.clone()), "en", 5, retry)
}

/// Test that a human track wins whatever the listing order
#[test]
fn test_select_track_withBothKinds_shouldPreferHumanInAnyOrder() {
    let tracks = vec![
        track("en", CaptionKind::Automatic),
        track("en-GB", CaptionKind::Human),
        track("de", CaptionKind::Human),
        track("en", CaptionKind::Human),
    ];

    let mut listing = CaptionListing { duration_secs: Some(10.0), tracks };
    for _ in 0..listing.tracks.len() {
        let chosen = select_track(&listing, "en").unwrap();
        assert_eq!(chosen.kind, CaptionKind::Human);
        assert_eq!(chosen.language, "en");
        listing.tracks.rotate_left(1);
    }

    listing.tracks.reverse();
    assert_eq!(select_track(&listing, "en").unwrap(), &track("en", CaptionKind::Human));
}

/// Test that a regional human track beats an exact automatic one
#[test]
fn test_select_track_withRegionalHumanOnly_shouldStillPreferHuman() {
    let listing = CaptionListing {
        duration_secs: Some(10.0),
        tracks: vec![track("en", CaptionKind::Automatic), track("en-US", CaptionKind::Human)],
    };

    let chosen = select_track(&listing, "en").unwrap();
    assert_eq!(chosen.language, "en-US");
    assert_eq!(chosen.kind, CaptionKind::Human);
}

/// Test the automatic fallback and the no-match case
#[test]
fn test_select_track_withoutHumanTrack_shouldFallBackToAutomatic() {
    let listing = CaptionListing {
        duration_secs: Some(10.0),
        tracks: vec![track("fr", CaptionKind::Human), track("en", CaptionKind::Automatic)],
    };

    assert_eq!(select_track(&listing, "en").unwrap().kind, CaptionKind::Automatic);
    assert!(select_track(&listing, "ja").is_none());
    assert!(select_track(&CaptionListing::default(), "en").is_none());
}

/// Test that the resolver downloads the human track and reports the duration
#[tokio::test]
async fn test_resolve_withHumanAndAutomatic_shouldDownloadHuman() {
    let provider = ScriptedCaptionProvider::new(Some(212.0))
        .with_track("en", CaptionKind::Automatic, "WEBVTT\n\nauto text\n")
        .with_track("en", CaptionKind::Human, SAMPLE_VTT);
    let reference = VideoReference::parse(VIDEO_URL).unwrap();

    let (captions, duration) = resolver(&provider, RetryPolicy::none()).resolve(&reference).await.unwrap();

    assert_eq!(duration, 212.0);
    assert_eq!(captions.kind, CaptionKind::Human);
    assert!(!captions.is_auto_generated());
    assert_eq!(captions.raw, SAMPLE_VTT);
    assert_eq!(captions.segments.len(), 2);
    assert!(captions.segments.iter().all(|s| !s.auto_generated));
    assert_eq!(provider.payload_calls(), 1);
}

/// Test that a video without captions in the language is a NoCaptions error
#[tokio::test]
async fn test_resolve_withoutMatchingTrack_shouldFailWithoutDownloading() {
    let provider = ScriptedCaptionProvider::new(Some(60.0))
        .with_track("de", CaptionKind::Human, SAMPLE_VTT);
    let reference = VideoReference::parse(VIDEO_URL).unwrap();

    let error = resolver(&provider, RetryPolicy::none()).resolve(&reference).await.unwrap_err();

    match error {
        CaptionError::NoCaptions { language } => assert_eq!(language, "en"),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(provider.payload_calls(), 0);
}

/// Test that missing or zero durations are rejected
#[tokio::test]
async fn test_resolve_withMissingDuration_shouldFail() {
    let reference = VideoReference::parse(VIDEO_URL).unwrap();

    for duration in [None, Some(0.0), Some(-3.0), Some(f64::NAN)] {
        let provider = ScriptedCaptionProvider::new(duration)
            .with_track("en", CaptionKind::Human, SAMPLE_VTT);
        let error = resolver(&provider, RetryPolicy::none()).resolve(&reference).await.unwrap_err();
        assert!(matches!(error, CaptionError::MissingDuration), "duration {:?}", duration);
    }
}

/// Test that transient listing failures are retried within the budget
#[tokio::test]
async fn test_resolve_withTransientFailures_shouldRetry() {
    let provider = ScriptedCaptionProvider::new(Some(30.0))
        .with_track("en", CaptionKind::Human, SAMPLE_VTT)
        .with_transient_failures(2);
    let reference = VideoReference::parse(VIDEO_URL).unwrap();

    let result = resolver(&provider, RetryPolicy::new(2, 1)).resolve(&reference).await;

    assert!(result.is_ok());
    assert_eq!(provider.listing_calls(), 3);
}

/// Test that the retry budget is bounded
#[tokio::test]
async fn test_resolve_withTooManyTransientFailures_shouldGiveUp() {
    let provider = ScriptedCaptionProvider::new(Some(30.0))
        .with_track("en", CaptionKind::Human, SAMPLE_VTT)
        .with_transient_failures(5);
    let reference = VideoReference::parse(VIDEO_URL).unwrap();

    let error = resolver(&provider, RetryPolicy::new(1, 1)).resolve(&reference).await.unwrap_err();

    assert!(matches!(error, CaptionError::Provider(ProviderError::ConnectionError(_))));
    assert_eq!(provider.listing_calls(), 2);
}

/// Test that permanent failures are not retried
#[tokio::test]
async fn test_resolve_withPermanentFailure_shouldNotRetry() {
    let provider = ScriptedCaptionProvider::new(Some(30.0))
        .failing_with(ProviderError::ProcessFailed("ERROR: Video unavailable".to_string()));
    let reference = VideoReference::parse(VIDEO_URL).unwrap();

    let error = resolver(&provider, RetryPolicy::new(3, 1)).resolve(&reference).await.unwrap_err();

    assert!(matches!(error, CaptionError::Provider(ProviderError::ProcessFailed(_))));
    assert_eq!(provider.listing_calls(), 1);
}
