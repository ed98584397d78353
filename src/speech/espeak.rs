use async_trait::async_trait;
use log::{debug, warn};
use std::path::PathBuf;

use super::{SpeechEngine, VoiceCatalog, VoiceHint};
use crate::app_config::EspeakConfig;
use crate::errors::ProviderError;
use crate::external_tool::run_tool;

/// Rule-based offline speech through the espeak-ng executable
#[derive(Debug, Clone)]
pub struct EspeakEngine {
    binary: String,
    rate: u32,
    pitch: u32,
    timeout_secs: u64,
    scratch_dir: Option<PathBuf>,
}

impl EspeakEngine {
    pub fn new(config: &EspeakConfig, timeout_secs: u64) -> Self {
        Self {
            binary: config.binary.clone(),
            rate: config.rate,
            pitch: config.pitch,
            timeout_secs,
            scratch_dir: None,
        }
    }

    /// Create temporary WAV files in `dir` instead of the system temp directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// List the installed voices for a language
    pub async fn list_voices(&self, language: &str) -> Result<VoiceCatalog, ProviderError> {
        let args = vec![format!("--voices={}", language)];
        let output = run_tool(&self.binary, &args, self.timeout_secs).await?;
        Ok(VoiceCatalog::parse_espeak_listing(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Pick the voice for `-v`. Without a language and gender match the
    /// first voice for the language is used; without any voice for the
    /// language this is `None` and espeak-ng speaks with its own default.
    async fn choose_voice(&self, language: &str, hint: &VoiceHint) -> Result<Option<String>, ProviderError> {
        let catalog = self.list_voices(language).await?;
        if let Some(voice) = catalog.select(language, hint.gender) {
            debug!("Using espeak-ng voice {} ({})", voice.name, voice.id);
            return Ok(Some(voice.id.clone()));
        }

        match catalog.any_for_language(language) {
            Some(voice) => {
                warn!(
                    "No installed {} voice for language '{}', using {} instead",
                    hint.gender, language, voice.id
                );
                Ok(Some(voice.id.clone()))
            }
            None => {
                warn!(
                    "No installed voice for language '{}', using the espeak-ng default voice",
                    language
                );
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    fn output_format(&self) -> &str {
        "wav"
    }

    async fn synthesize(&self, text: &str, language: &str, hint: &VoiceHint) -> Result<Vec<u8>, ProviderError> {
        let voice = self.choose_voice(language, hint).await?;

        // Removed on drop, including when the call is cancelled
        let mut builder = tempfile::Builder::new();
        builder.prefix("vidnarrate-espeak-").suffix(".wav");
        let output_file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| ProviderError::ProcessFailed(format!("Cannot create temporary file: {}", e)))?;

        let mut args = Vec::new();
        if let Some(voice) = voice {
            args.push("-v".to_string());
            args.push(voice);
        }
        args.extend([
            "-s".to_string(),
            self.rate.to_string(),
            "-p".to_string(),
            self.pitch.to_string(),
            "-w".to_string(),
            output_file.path().to_string_lossy().to_string(),
            "--".to_string(),
            text.to_string(),
        ]);

        run_tool(&self.binary, &args, self.timeout_secs).await?;

        tokio::fs::read(output_file.path())
            .await
            .map_err(|e| ProviderError::ProcessFailed(format!("Cannot read espeak-ng output: {}", e)))
    }
}
