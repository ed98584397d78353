use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use std::time::Duration;

use super::{SpeechEngine, VoiceHint};
use crate::app_config::CloudSpeechConfig;
use crate::errors::ProviderError;

/// Cloud voice through the translate text-to-speech endpoint.
///
/// The endpoint only accepts short texts, so narration is sent in chunks
/// and the returned MP3 streams are concatenated.
#[derive(Debug, Clone)]
pub struct GoogleTtsEngine {
    client: Client,
    endpoint: String,
    max_chunk_chars: usize,
    timeout_secs: u64,
}

impl GoogleTtsEngine {
    pub fn new(config: &CloudSpeechConfig, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            endpoint: config.endpoint.clone(),
            max_chunk_chars: config.max_chunk_chars.max(1),
            timeout_secs,
        }
    }

    async fn fetch_chunk(&self, chunk: &str, language: &str, index: usize, total: usize) -> Result<Vec<u8>, ProviderError> {
        let char_count = chunk.chars().count().to_string();
        let index = index.to_string();
        let total = total.to_string();
        let query = [
            ("ie", "UTF-8"),
            ("client", "tw-ob"),
            ("tl", language),
            ("q", chunk),
            ("textlen", char_count.as_str()),
            ("idx", index.as_str()),
            ("total", total.as_str()),
        ];

        let response = self.client.get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Text-to-speech API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let bytes = response.bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;
        Ok(bytes.to_vec())
    }
}

/// Split text into chunks of at most `max_chars` characters, breaking on
/// whitespace where possible. Words longer than `max_chars` are split.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[async_trait]
impl SpeechEngine for GoogleTtsEngine {
    fn name(&self) -> &str {
        "google-tts"
    }

    fn output_format(&self) -> &str {
        "mp3"
    }

    async fn synthesize(&self, text: &str, language: &str, _hint: &VoiceHint) -> Result<Vec<u8>, ProviderError> {
        let chunks = split_into_chunks(text, self.max_chunk_chars);
        debug!("Sending {} text-to-speech chunk(s)", chunks.len());

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let bytes = self.fetch_chunk(chunk, language, index, chunks.len()).await?;
            audio.extend_from_slice(&bytes);
        }

        Ok(audio)
    }
}
