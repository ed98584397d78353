/*!
 * Narration synthesis.
 *
 * Two speech engines sit behind the `SpeechEngine` trait: a rule-based
 * offline engine (espeak-ng) and a cloud voice. The cloud voice only
 * covers the default output language with a female voice, so every other
 * language and every male request goes to the offline engine. The
 * default language is configuration (`speech.default_language`).
 */

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

use crate::audio::{AudioTrack, Reconciliation};
use crate::errors::{ProviderError, SynthesisError};
use crate::language_utils;
use crate::retry::with_timeout;

pub mod cloud;
pub mod espeak;
pub mod voices;

pub use cloud::GoogleTtsEngine;
pub use espeak::EspeakEngine;
pub use voices::{VoiceCatalog, VoiceInfo};

/// Requested narrator voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Male,
    Female,
}

impl std::fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
        }
    }
}

impl std::str::FromStr for VoiceGender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "erkek" => Ok(Self::Male),
            "female" | "f" | "kadın" | "kadin" => Ok(Self::Female),
            _ => Err(anyhow::anyhow!("Invalid voice gender: {}", s)),
        }
    }
}

/// What the speech engine is asked to produce
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisSpec {
    pub text: String,
    pub gender: VoiceGender,
    /// ISO 639-1 output language
    pub language: String,
    pub target_duration_secs: f64,
}

/// Voice preferences passed to an engine
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceHint {
    pub gender: VoiceGender,
}

/// A speech synthesis backend
#[async_trait]
pub trait SpeechEngine: Send + Sync + Debug {
    /// Engine name for logs and errors
    fn name(&self) -> &str;

    /// Container format of the bytes `synthesize` returns (`"wav"`, `"mp3"`)
    fn output_format(&self) -> &str;

    /// Speak `text` in `language`, returning encoded audio
    async fn synthesize(&self, text: &str, language: &str, hint: &VoiceHint) -> Result<Vec<u8>, ProviderError>;
}

/// Which engine serves a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineChoice {
    Offline,
    Cloud,
}

impl EngineChoice {
    pub fn for_request(language: &str, gender: VoiceGender, default_language: &str) -> Self {
        let is_default_language = language.eq_ignore_ascii_case(default_language)
            || language_utils::language_codes_match(language, default_language);

        if !is_default_language || gender == VoiceGender::Male {
            Self::Offline
        } else {
            Self::Cloud
        }
    }
}

/// Final narration audio
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// RIFF/WAV bytes, 16-bit PCM
    pub bytes: Vec<u8>,
    pub engine: String,
    pub duration_secs: f64,
    pub reconciliation: Reconciliation,
}

/// Turns narration text into a WAV track lasting the video's duration
#[derive(Debug, Clone)]
pub struct NarrationSynthesizer {
    offline: Arc<dyn SpeechEngine>,
    cloud: Arc<dyn SpeechEngine>,
    default_language: String,
    timeout_secs: u64,
}

impl NarrationSynthesizer {
    pub fn new(
        offline: Arc<dyn SpeechEngine>,
        cloud: Arc<dyn SpeechEngine>,
        default_language: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            offline,
            cloud,
            default_language: default_language.into(),
            timeout_secs,
        }
    }

    fn engine_for(&self, choice: EngineChoice) -> &Arc<dyn SpeechEngine> {
        match choice {
            EngineChoice::Offline => &self.offline,
            EngineChoice::Cloud => &self.cloud,
        }
    }

    /// Synthesize, reconcile to the target duration and encode as WAV.
    ///
    /// Failures here are never retried.
    pub async fn synthesize(&self, spec: &SynthesisSpec) -> Result<SynthesizedAudio, SynthesisError> {
        if !spec.target_duration_secs.is_finite() || spec.target_duration_secs <= 0.0 {
            return Err(SynthesisError::InvalidTarget(spec.target_duration_secs));
        }

        let choice = EngineChoice::for_request(&spec.language, spec.gender, &self.default_language);
        let engine = self.engine_for(choice);
        info!(
            "Synthesizing {} chars of {} narration with {} ({} voice)",
            spec.text.chars().count(),
            spec.language,
            engine.name(),
            spec.gender
        );

        let hint = VoiceHint { gender: spec.gender };
        let raw = with_timeout(
            self.timeout_secs,
            engine.synthesize(&spec.text, &spec.language, &hint),
        ).await?;

        if raw.is_empty() {
            return Err(SynthesisError::EmptyAudio { engine: engine.name().to_string() });
        }

        let track = AudioTrack::decode(&raw, Some(engine.output_format()))?;
        drop(raw);

        let (bytes, reconciliation, duration_secs) = write_and_verify(&track, spec.target_duration_secs)?;
        debug!("Duration reconciliation: {:?}", reconciliation);

        Ok(SynthesizedAudio {
            bytes,
            engine: engine.name().to_string(),
            duration_secs,
            reconciliation,
        })
    }
}

/// Reconcile the track straight into a scoped temporary WAV file, check it
/// landed, and read the bytes back once. The file is removed when this
/// returns. Yields the bytes, what reconciliation did, and the length of
/// the written audio.
fn write_and_verify(track: &AudioTrack, target_secs: f64) -> Result<(Vec<u8>, Reconciliation, f64), SynthesisError> {
    let file = tempfile::Builder::new()
        .prefix("vidnarrate-audio-")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| SynthesisError::Encode(format!("Cannot create audio file: {}", e)))?;

    let reconciliation = track.write_reconciled_wav(file.path(), target_secs)?;

    let size = std::fs::metadata(file.path())
        .map(|m| m.len())
        .map_err(|e| SynthesisError::MissingArtifact(e.to_string()))?;
    if size == 0 {
        return Err(SynthesisError::MissingArtifact(format!(
            "{} is empty",
            file.path().display()
        )));
    }

    let duration_secs = hound::WavReader::open(file.path())
        .map(|reader| reader.duration() as f64 / reader.spec().sample_rate.max(1) as f64)
        .map_err(|e| SynthesisError::MissingArtifact(e.to_string()))?;

    let bytes = std::fs::read(file.path()).map_err(|e| SynthesisError::MissingArtifact(e.to_string()))?;
    Ok((bytes, reconciliation, duration_secs))
}
