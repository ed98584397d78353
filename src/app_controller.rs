use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::captions::{CaptionResolver, YtDlpProvider};
use crate::errors::PipelineError;
use crate::narration::NarrationGenerator;
use crate::pipeline::{Pipeline, PipelineOptions, ProcessResult, Stage};
use crate::providers;
use crate::retry::RetryPolicy;
use crate::speech::{EspeakEngine, GoogleTtsEngine, NarrationSynthesizer, VoiceGender};

// @struct: Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Pipeline built from the configuration
    pipeline: Pipeline,
}

impl Controller {
    // @creates: Controller wired to the production providers
    pub fn with_config(config: Config) -> Result<Self> {
        let pipeline = Self::build_pipeline(&config);
        Ok(Self::with_pipeline(config, pipeline))
    }

    // @creates: Controller around an already built pipeline
    pub fn with_pipeline(config: Config, pipeline: Pipeline) -> Self {
        Self { config, pipeline }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Wire the caption provider, text generator and speech engines
    /// described by `config` into a pipeline
    pub fn build_pipeline(config: &Config) -> Pipeline {
        let captions = &config.captions;
        let caption_provider = Arc::new(YtDlpProvider::new(&captions.ytdlp_path, captions.timeout_secs));
        let resolver = CaptionResolver::new(
            caption_provider,
            &captions.source_language,
            captions.timeout_secs,
            RetryPolicy::new(captions.retry_count, captions.retry_backoff_ms),
        );

        let narration = &config.narration;
        let generator = NarrationGenerator::new(providers::from_config(narration), &captions.source_language)
            .with_max_input_chars(narration.common.max_input_chars)
            .with_timeout_secs(narration.get_timeout_secs())
            .with_retry(RetryPolicy::new(narration.common.retry_count, narration.common.retry_backoff_ms))
            .with_fallback_text(&narration.common.fallback_text);

        let speech = &config.speech;
        let synthesizer = NarrationSynthesizer::new(
            Arc::new(EspeakEngine::new(&speech.espeak, speech.timeout_secs)),
            Arc::new(GoogleTtsEngine::new(&speech.cloud, speech.timeout_secs)),
            &speech.default_language,
            speech.timeout_secs,
        );

        let options = PipelineOptions {
            language_aliases: speech.language_aliases.clone(),
            default_language: speech.default_language.clone(),
        };

        Pipeline::new(resolver, generator, synthesizer, options)
    }

    /// Run the pipeline for one video with a spinner on stderr
    pub async fn run(
        &self,
        reference: &str,
        target_language: &str,
        gender: VoiceGender,
    ) -> Result<ProcessResult, PipelineError> {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(120));

        info!(
            "Narrating {} with {} ({})",
            reference,
            self.config.narration.provider.display_name(),
            self.config.narration.get_model()
        );

        let stage_spinner = spinner.clone();
        let on_stage = move |stage: Stage| stage_spinner.set_message(stage.description());

        let result = self.pipeline
            .process_with_observer(reference, target_language, gender, &on_stage)
            .await;

        match &result {
            Ok(_) => spinner.finish_with_message("Narration ready"),
            Err(e) => spinner.abandon_with_message(format!("Failed: {}", e.kind())),
        }

        result
    }

    /// Write the narration audio and, next to it, the narration text
    pub fn write_outputs(&self, result: &ProcessResult, audio_path: &Path) -> Result<()> {
        if let Some(parent) = audio_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        std::fs::write(audio_path, &result.audio)
            .with_context(|| format!("Failed to write audio to {}", audio_path.display()))?;

        let text_path = audio_path.with_extension("txt");
        std::fs::write(&text_path, &result.narration)
            .with_context(|| format!("Failed to write narration to {}", text_path.display()))?;

        info!("Wrote {} and {}", audio_path.display(), text_path.display());
        Ok(())
    }
}
