/*!
 * Text-generation provider implementations.
 *
 * This module contains client implementations for the LLM services that
 * write the narration:
 * - Gemini: Google generative language API
 * - OpenAI: OpenAI API, also used for OpenAI-compatible local servers (LM Studio)
 * - Anthropic: Anthropic messages API
 * - Ollama: Local LLM server
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{NarrationConfig, NarrationProvider};
use crate::errors::ProviderError;

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;

/// Common trait for all text-generation providers
///
/// The narration generator only needs a prompt in and text out, so every
/// backend is reduced to this one call and can be swapped for a test double.
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Complete a prompt, returning the generated text (possibly empty)
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Build the text generator for the active provider in `config`
pub fn from_config(config: &NarrationConfig) -> Arc<dyn TextGenerator> {
    let model = config.get_model();
    let api_key = config.get_api_key();
    let endpoint = config.get_endpoint();
    let timeout_secs = config.get_timeout_secs();
    let temperature = config.common.temperature;
    let max_tokens = config.common.max_output_tokens;

    match config.provider {
        NarrationProvider::Gemini => Arc::new(
            gemini::Gemini::new(api_key, endpoint, model, timeout_secs)
                .with_generation(temperature, max_tokens),
        ),
        NarrationProvider::OpenAI | NarrationProvider::LMStudio => Arc::new(
            openai::OpenAI::new(api_key, endpoint, model, timeout_secs)
                .with_generation(temperature, max_tokens)
                .with_name(config.provider.display_name()),
        ),
        NarrationProvider::Anthropic => Arc::new(
            anthropic::Anthropic::new(api_key, endpoint, model, timeout_secs)
                .with_generation(temperature, max_tokens),
        ),
        NarrationProvider::Ollama => Arc::new(
            ollama::Ollama::new(endpoint, model, timeout_secs)
                .with_generation(temperature, max_tokens),
        ),
    }
}

/// First `max_chars` characters of a response body, for logs
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        text.chars().take(max_chars).collect()
    } else {
        text.to_string()
    }
}
