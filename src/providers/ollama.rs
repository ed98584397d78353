use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{preview, TextGenerator};
use crate::errors::ProviderError;

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    model: String,
    temperature: Option<f32>,
    num_predict: Option<u32>,
    timeout_secs: u64,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    /// How long to keep the model loaded in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    /// Create a new generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
            keep_alive: None,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = temperature;
        self
    }

    /// Set the maximum number of generated tokens
    pub fn num_predict(mut self, num_predict: Option<u32>) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = num_predict;
        self
    }

    /// Set the keep-alive duration
    pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }
}

impl Ollama {
    /// Create a new Ollama client for a base URL such as `http://localhost:11434`
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url
        } else {
            format!("http://{}", base_url)
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                // Force HTTP/1.1 - Ollama uses HTTP/1.1
                .http1_only()
                .build()
                .unwrap_or_default(),
            model: model.into(),
            temperature: None,
            num_predict: None,
            timeout_secs,
        }
    }

    /// Set sampling parameters sent with every request
    pub fn with_generation(mut self, temperature: f32, num_predict: u32) -> Self {
        self.temperature = Some(temperature);
        self.num_predict = Some(num_predict);
        self
    }

    /// Generate text from the Ollama API
    pub async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self.client.post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let response_text = response.text().await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;

        Self::parse_response(&response_text)
    }

    /// Parse a generate response; servers that ignore `stream: false`
    /// answer with JSON lines whose `response` pieces are concatenated
    pub fn parse_response(response_text: &str) -> Result<GenerationResponse, ProviderError> {
        match serde_json::from_str::<GenerationResponse>(response_text) {
            Ok(generated) => Ok(generated),
            Err(e) => {
                let lines: Vec<GenerationResponse> = response_text.lines()
                    .filter(|line| !line.trim().is_empty())
                    .filter_map(|line| serde_json::from_str::<GenerationResponse>(line).ok())
                    .collect();

                if lines.is_empty() {
                    error!("Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}", e, preview(response_text, 500));
                    return Err(ProviderError::ParseError(format!("Response contains invalid JSON: {}", e)));
                }

                let full_response: String = lines.iter().map(|l| l.response.as_str()).collect();
                let last = &lines[lines.len() - 1];

                Ok(GenerationResponse {
                    model: last.model.clone(),
                    response: full_response,
                    done: true,
                    prompt_eval_count: last.prompt_eval_count,
                    eval_count: last.eval_count,
                })
            }
        }
    }
}

#[async_trait]
impl TextGenerator for Ollama {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerationRequest::new(&self.model, prompt)
            .temperature(self.temperature)
            .num_predict(self.num_predict);
        let response = self.complete(request).await?;
        Ok(response.response)
    }
}
