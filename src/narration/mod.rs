/*!
 * Narration generation.
 *
 * The transcript is cut to a character budget, wrapped in the narration
 * prompt and sent to a `TextGenerator`. Provider output is not trusted:
 * angle brackets and control characters are stripped before it is used.
 *
 * An empty provider answer is not an error here. It is logged and
 * replaced with the configured fallback text; this is the only stage
 * that fails soft.
 */

use log::{debug, info, warn};
use std::sync::Arc;

use crate::errors::GenerationError;
use crate::providers::TextGenerator;
use crate::retry::{with_timeout, RetryPolicy};

pub mod prompt;

pub use prompt::build_translation_prompt;

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Strip angle brackets, turn control characters other than line breaks
/// into spaces, collapse the space runs that leaves, then trim
pub fn sanitize(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' | '>' => {}
            '\n' => {
                while cleaned.ends_with(' ') {
                    cleaned.pop();
                }
                cleaned.push('\n');
            }
            c if c == ' ' || c.is_control() => {
                if !cleaned.ends_with([' ', '\n']) {
                    cleaned.push(' ');
                }
            }
            c => cleaned.push(c),
        }
    }
    cleaned.trim().to_string()
}

/// Generates the narration text for a transcript
#[derive(Debug, Clone)]
pub struct NarrationGenerator {
    generator: Arc<dyn TextGenerator>,
    source_language: String,
    max_input_chars: usize,
    timeout_secs: u64,
    retry: RetryPolicy,
    fallback_text: String,
}

impl NarrationGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, source_language: impl Into<String>) -> Self {
        Self {
            generator,
            source_language: source_language.into(),
            max_input_chars: 50_000,
            timeout_secs: 120,
            retry: RetryPolicy::none(),
            fallback_text: "Özet oluşturulamadı. Lütfen tekrar deneyin.".to_string(),
        }
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_fallback_text(mut self, fallback_text: impl Into<String>) -> Self {
        self.fallback_text = fallback_text.into();
        self
    }

    pub fn fallback_text(&self) -> &str {
        &self.fallback_text
    }

    /// Produce the narration for `transcript` in `target_language`.
    ///
    /// Returns an empty string when the provider's answer held nothing but
    /// markup; the caller must treat that as a failed request.
    pub async fn generate(&self, transcript: &str, target_language: &str) -> Result<String, GenerationError> {
        let input = truncate_chars(transcript, self.max_input_chars);
        if input.len() < transcript.len() {
            info!(
                "Transcript truncated to {} of {} characters",
                self.max_input_chars,
                transcript.chars().count()
            );
        }

        let prompt = build_translation_prompt(input, &self.source_language, target_language);
        debug!("Requesting narration from {} ({} prompt chars)", self.generator.name(), prompt.chars().count());

        let raw = self.retry
            .run("Narration generation", || {
                with_timeout(self.timeout_secs, self.generator.generate(&prompt))
            })
            .await?;

        if raw.trim().is_empty() {
            warn!("{} returned an empty narration, using the fallback text", self.generator.name());
            return Ok(sanitize(&self.fallback_text));
        }

        Ok(sanitize(&raw))
    }
}
