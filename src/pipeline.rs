/*!
 * The four-stage narration pipeline.
 *
 * `Pipeline::process` takes a video reference, a free-form target
 * language label and a voice gender, and runs:
 *
 * 1. caption resolution (captions and video duration)
 * 2. transcript normalization
 * 3. narration generation
 * 4. narration synthesis, reconciled to the video duration
 *
 * Stages run strictly in order on the calling task. A `Pipeline` holds no
 * per-request state, so one instance can serve concurrent requests.
 */

use base64::{engine::general_purpose, Engine as _};
use log::{info, warn};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::captions::CaptionResolver;
use crate::errors::{CaptionError, GenerationError, PipelineError};
use crate::language_utils;
use crate::narration::NarrationGenerator;
use crate::speech::{NarrationSynthesizer, SynthesisSpec, VoiceGender};
use crate::transcript;
use crate::video_ref::VideoReference;

/// Pipeline stage, reported to observers as it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    Normalizing,
    Generating,
    Synthesizing,
}

impl Stage {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Resolving => "Fetching captions",
            Self::Normalizing => "Cleaning transcript",
            Self::Generating => "Generating narration",
            Self::Synthesizing => "Synthesizing audio",
        }
    }
}

/// Settings the pipeline needs beyond its three stages
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Target language labels mapped to ISO codes
    pub language_aliases: BTreeMap<String, String>,
    /// Output language for labels nothing else recognises
    pub default_language: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            language_aliases: BTreeMap::new(),
            default_language: "tr".to_string(),
        }
    }
}

/// Everything `process` hands back
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    /// Narration text in the target language
    pub narration: String,
    /// RIFF/WAV bytes, base64 encoded when serialized
    #[serde(serialize_with = "serialize_base64")]
    pub audio: Vec<u8>,
    pub video_url: String,
    pub video_id: String,
    /// Source video duration in seconds
    pub video_duration: f64,
}

impl ProcessResult {
    /// The audio payload as standard base64
    pub fn audio_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.audio)
    }
}

fn serialize_base64<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&general_purpose::STANDARD.encode(bytes.as_ref()))
}

/// Resolve a free-form language label to the output language code
pub fn resolve_output_language(label: &str, options: &PipelineOptions) -> String {
    language_utils::resolve_output_language(label, &options.language_aliases, &options.default_language)
}

/// Runs the caption → transcript → narration → audio pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    resolver: CaptionResolver,
    generator: NarrationGenerator,
    synthesizer: NarrationSynthesizer,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        resolver: CaptionResolver,
        generator: NarrationGenerator,
        synthesizer: NarrationSynthesizer,
        options: PipelineOptions,
    ) -> Self {
        Self {
            resolver,
            generator,
            synthesizer,
            options,
        }
    }

    pub async fn process(
        &self,
        reference: &str,
        target_language: &str,
        gender: VoiceGender,
    ) -> Result<ProcessResult, PipelineError> {
        self.process_with_observer(reference, target_language, gender, &|_| {}).await
    }

    /// `process`, calling `on_stage` as each stage starts
    pub async fn process_with_observer(
        &self,
        reference: &str,
        target_language: &str,
        gender: VoiceGender,
        on_stage: &(dyn Fn(Stage) + Send + Sync),
    ) -> Result<ProcessResult, PipelineError> {
        let video = check_request(reference, target_language)?;

        let output_language = resolve_output_language(target_language, &self.options);
        info!(
            "Processing video {} into '{}' (speech language {}, {} voice)",
            video.video_id(),
            target_language,
            output_language,
            gender
        );

        on_stage(Stage::Resolving);
        let (track, video_duration) = self.resolver.resolve(&video).await?;

        on_stage(Stage::Normalizing);
        let text = transcript::normalize(&track.raw);
        if transcript::is_empty_transcript(&text) {
            warn!("Captions for {} contain no speech", video.video_id());
            return Err(CaptionError::EmptyTranscript.into());
        }
        info!("Transcript has {} characters", text.chars().count());

        on_stage(Stage::Generating);
        let narration = self.generator.generate(&text, target_language).await?;
        if narration.is_empty() {
            return Err(GenerationError::EmptyNarration.into());
        }

        on_stage(Stage::Synthesizing);
        let spec = SynthesisSpec {
            text: narration.clone(),
            gender,
            language: output_language,
            target_duration_secs: video_duration,
        };
        let audio = self.synthesizer.synthesize(&spec).await?;
        info!(
            "Synthesized {:.1}s of audio with {} ({} bytes)",
            audio.duration_secs,
            audio.engine,
            audio.bytes.len()
        );

        Ok(ProcessResult {
            narration,
            audio: audio.bytes,
            video_url: video.url().to_string(),
            video_id: video.video_id().to_string(),
            video_duration,
        })
    }
}

/// Reject malformed requests without touching any provider
pub fn check_request(reference: &str, target_language: &str) -> Result<VideoReference, PipelineError> {
    let video = VideoReference::parse(reference)?;
    if target_language.trim().is_empty() {
        return Err(PipelineError::MalformedInput("Target language is empty".to_string()));
    }
    Ok(video)
}
