/*!
 * Tests for narration synthesis, engine routing and voice selection
 */

use std::sync::Arc;

use vidnarrate::audio::{AudioTrack, Reconciliation};
use vidnarrate::errors::{PipelineError, SynthesisError};
use vidnarrate::speech::cloud::split_into_chunks;
use vidnarrate::speech::{NarrationSynthesizer, SynthesisSpec, VoiceCatalog, VoiceGender, VoiceInfo};
use crate::common::mock_providers::{RecordingSpeechEngine, MOCK_SAMPLE_RATE};

fn synthesizer(offline: &RecordingSpeechEngine, cloud: &RecordingSpeechEngine) -> NarrationSynthesizer {
    NarrationSynthesizer::new(Arc::new(offline.clone()), Arc::new(cloud.clone()), "tr", 10)
}

fn spec(language: &str, gender: VoiceGender, target: f64) -> SynthesisSpec {
    SynthesisSpec {
        text: "Merhaba dünya".to_string(),
        gender,
        language: language.to_string(),
        target_duration_secs: target,
    }
}

/// Test that female voices in the default language use the cloud engine
#[tokio::test]
async fn test_synthesize_withFemaleDefaultLanguage_shouldUseCloud() {
    let offline = RecordingSpeechEngine::new("offline", 1.0);
    let cloud = RecordingSpeechEngine::new("cloud", 1.0);

    let audio = synthesizer(&offline, &cloud)
        .synthesize(&spec("tr", VoiceGender::Female, 4.0))
        .await
        .unwrap();

    assert_eq!(audio.engine, "cloud");
    assert_eq!(cloud.calls(), 1);
    assert_eq!(offline.calls(), 0);
    assert_eq!(cloud.requests(), vec![("Merhaba dünya".to_string(), "tr".to_string())]);
}

/// Test that male voices and other languages use the offline engine
#[tokio::test]
async fn test_synthesize_withMaleOrForeign_shouldUseOffline() {
    let offline = RecordingSpeechEngine::new("offline", 1.0);
    let cloud = RecordingSpeechEngine::new("cloud", 1.0);
    let synthesizer = synthesizer(&offline, &cloud);

    let male = synthesizer.synthesize(&spec("tr", VoiceGender::Male, 2.0)).await.unwrap();
    let english = synthesizer.synthesize(&spec("en", VoiceGender::Female, 2.0)).await.unwrap();

    assert_eq!(male.engine, "offline");
    assert_eq!(english.engine, "offline");
    assert_eq!(offline.calls(), 2);
    assert_eq!(cloud.calls(), 0);
}

/// Test that short speech is padded to the target duration
#[tokio::test]
async fn test_synthesize_withShortSpeech_shouldPadToTarget() {
    let offline = RecordingSpeechEngine::new("offline", 1.5);
    let cloud = RecordingSpeechEngine::new("cloud", 1.5);

    let audio = synthesizer(&offline, &cloud)
        .synthesize(&spec("en", VoiceGender::Male, 6.0))
        .await
        .unwrap();

    assert!(matches!(audio.reconciliation, Reconciliation::Padded { .. }));
    let decoded = AudioTrack::decode(&audio.bytes, Some("wav")).unwrap();
    assert_eq!(decoded.sample_rate, MOCK_SAMPLE_RATE);
    assert!((decoded.duration_secs() - 6.0).abs() < 1.0 / MOCK_SAMPLE_RATE as f64);
    assert!((audio.duration_secs - 6.0).abs() < 1e-9);
}

/// Test that long speech is truncated to the target duration
#[tokio::test]
async fn test_synthesize_withLongSpeech_shouldTruncateToTarget() {
    let offline = RecordingSpeechEngine::new("offline", 5.0);
    let cloud = RecordingSpeechEngine::new("cloud", 5.0);

    let audio = synthesizer(&offline, &cloud)
        .synthesize(&spec("en", VoiceGender::Male, 2.0))
        .await
        .unwrap();

    assert!(matches!(audio.reconciliation, Reconciliation::Truncated { .. }));
    let decoded = AudioTrack::decode(&audio.bytes, Some("wav")).unwrap();
    assert_eq!(decoded.duration_secs(), 2.0);
}

/// Test that an engine answering with no bytes is a synthesis failure, not retried
#[tokio::test]
async fn test_synthesize_withEmptyEngineOutput_shouldFailOnce() {
    let offline = RecordingSpeechEngine::new("offline", 1.0).producing_nothing();
    let cloud = RecordingSpeechEngine::new("cloud", 1.0);

    let error = synthesizer(&offline, &cloud)
        .synthesize(&spec("en", VoiceGender::Male, 2.0))
        .await
        .unwrap_err();

    assert!(matches!(&error, SynthesisError::EmptyAudio { engine } if engine == "offline"));
    assert_eq!(offline.calls(), 1);
    assert!(matches!(PipelineError::from(error), PipelineError::Synthesis(_)));
}

/// Test that an invalid target fails before any engine is called
#[tokio::test]
async fn test_synthesize_withInvalidTarget_shouldNotCallEngine() {
    let offline = RecordingSpeechEngine::new("offline", 1.0);
    let cloud = RecordingSpeechEngine::new("cloud", 1.0);

    let error = synthesizer(&offline, &cloud)
        .synthesize(&spec("tr", VoiceGender::Female, 0.0))
        .await
        .unwrap_err();

    assert!(matches!(error, SynthesisError::InvalidTarget(_)));
    assert_eq!(offline.calls() + cloud.calls(), 0);
}

/// Test that a missing artifact is classified as an integrity failure
#[test]
fn test_missingArtifact_shouldMapToIntegrityError() {
    let error = PipelineError::from(SynthesisError::MissingArtifact("gone".to_string()));
    assert!(matches!(error, PipelineError::Integrity(ref detail) if detail == "gone"));
    assert_eq!(error.exit_code(), 6);
}

/// Test chunking for the cloud engine
#[test]
fn test_split_into_chunks_shouldRespectLimitOnWordBoundaries() {
    let chunks = split_into_chunks("bir iki üç dört beş", 8);
    assert_eq!(chunks, vec!["bir iki", "üç dört", "beş"]);
    assert!(chunks.iter().all(|c| c.chars().count() <= 8));
}

/// Test that overlong words are split by characters
#[test]
fn test_split_into_chunks_withLongWord_shouldSplitIt() {
    let chunks = split_into_chunks("a çokuzunkelime b", 5);
    assert_eq!(chunks, vec!["a", "çokuz", "unkel", "ime", "b"]);
    assert!(split_into_chunks("   ", 5).is_empty());
}

/// Test that exact language tags beat regional ones
#[test]
fn test_voice_catalog_select_shouldPreferExactLanguage() {
    let catalog = VoiceCatalog::new(vec![
        VoiceInfo {
            id: "regional".to_string(),
            name: "Regional".to_string(),
            languages: vec!["de-AT".to_string()],
            gender: Some(VoiceGender::Female),
        },
        VoiceInfo {
            id: "exact".to_string(),
            name: "Exact".to_string(),
            languages: vec!["de".to_string()],
            gender: Some(VoiceGender::Female),
        },
        VoiceInfo {
            id: "unknown".to_string(),
            name: "Unknown".to_string(),
            languages: vec!["de".to_string()],
            gender: None,
        },
    ]);

    assert_eq!(catalog.select("de", VoiceGender::Female).map(|v| v.id.as_str()), Some("exact"));
    assert!(catalog.select("de", VoiceGender::Male).is_none());
    assert!(VoiceCatalog::default().is_empty());
}
