use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Caption retrieval settings
    #[serde(default)]
    pub captions: CaptionConfig,

    /// Narration (text generation) settings
    #[serde(default)]
    pub narration: NarrationConfig,

    /// Speech synthesis settings
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Caption provider configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaptionConfig {
    /// Path or name of the yt-dlp executable
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,

    /// The single caption language the pipeline reads (ISO code)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Timeout for each caption provider call, in seconds
    #[serde(default = "default_caption_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for transient caption provider failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            source_language: default_source_language(),
            timeout_secs: default_caption_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Text-generation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NarrationProvider {
    // @provider: Google Gemini
    #[default]
    Gemini,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: Ollama
    Ollama,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl NarrationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    /// Whether the hosted API refuses requests without a key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Gemini | Self::OpenAI | Self::Anthropic)
    }
}

impl std::fmt::Display for NarrationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for NarrationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: NarrationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(&provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(&provider_type),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Narration service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NarrationConfig {
    /// Text-generation provider to use
    #[serde(default)]
    pub provider: NarrationProvider,

    /// Available text-generation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Settings shared by all providers
    #[serde(default)]
    pub common: NarrationCommonConfig,
}

/// Common narration settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NarrationCommonConfig {
    /// Transcript characters submitted to the provider at most
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Retry count for transient provider failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Narration used when the provider answers with empty text
    #[serde(default = "default_fallback_text")]
    pub fallback_text: String,
}

impl Default for NarrationCommonConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            fallback_text: default_fallback_text(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeechConfig {
    /// Language served by the cloud voice; any other language, and every
    /// male voice request, goes to the offline engine
    #[serde(default = "default_output_language")]
    pub default_language: String,

    /// Free-form target language labels mapped to ISO codes
    #[serde(default = "default_language_aliases")]
    pub language_aliases: BTreeMap<String, String>,

    /// Offline (espeak-ng) engine settings
    #[serde(default)]
    pub espeak: EspeakConfig,

    /// Cloud voice settings
    #[serde(default)]
    pub cloud: CloudSpeechConfig,

    /// Timeout for a single synthesis call, in seconds
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            default_language: default_output_language(),
            language_aliases: default_language_aliases(),
            espeak: EspeakConfig::default(),
            cloud: CloudSpeechConfig::default(),
            timeout_secs: default_speech_timeout_secs(),
        }
    }
}

/// espeak-ng settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EspeakConfig {
    /// Path or name of the espeak-ng executable
    #[serde(default = "default_espeak_path")]
    pub binary: String,

    /// Speaking rate in words per minute
    #[serde(default = "default_speech_rate")]
    pub rate: u32,

    /// Pitch adjustment, 0 to 99
    #[serde(default = "default_speech_pitch")]
    pub pitch: u32,
}

impl Default for EspeakConfig {
    fn default() -> Self {
        Self {
            binary: default_espeak_path(),
            rate: default_speech_rate(),
            pitch: default_speech_pitch(),
        }
    }
}

/// Cloud text-to-speech settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CloudSpeechConfig {
    /// Translate TTS endpoint
    #[serde(default = "default_cloud_endpoint")]
    pub endpoint: String,

    /// Longest text sent in a single request
    #[serde(default = "default_cloud_chunk_chars")]
    pub max_chunk_chars: usize,
}

impl Default for CloudSpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_cloud_endpoint(),
            max_chunk_chars: default_cloud_chunk_chars(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_caption_timeout_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_speech_timeout_secs() -> u64 {
    180
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_max_input_chars() -> usize {
    50_000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_fallback_text() -> String {
    "Özet oluşturulamadı. Lütfen tekrar deneyin.".to_string()
}

fn default_output_language() -> String {
    "tr".to_string()
}

fn default_language_aliases() -> BTreeMap<String, String> {
    [
        ("ingilizce", "en"),
        ("türkçe", "tr"),
        ("turkce", "tr"),
    ]
    .into_iter()
    .map(|(label, code)| (label.to_string(), code.to_string()))
    .collect()
}

fn default_espeak_path() -> String {
    "espeak-ng".to_string()
}

fn default_speech_rate() -> u32 {
    150
}

fn default_speech_pitch() -> u32 {
    50
}

fn default_cloud_endpoint() -> String {
    "https://translate.google.com/translate_tts".to_string()
}

fn default_cloud_chunk_chars() -> usize {
    100
}

fn default_model(provider: &NarrationProvider) -> String {
    match provider {
        NarrationProvider::Gemini => "gemini-1.5-flash".to_string(),
        NarrationProvider::OpenAI => "gpt-4o-mini".to_string(),
        NarrationProvider::Anthropic => "claude-3-haiku-20240307".to_string(),
        NarrationProvider::Ollama => "llama3.2:3b".to_string(),
        // Placeholder; users should set to the loaded model name in LM Studio
        NarrationProvider::LMStudio => "local-model".to_string(),
    }
}

fn default_endpoint(provider: &NarrationProvider) -> String {
    match provider {
        NarrationProvider::Gemini => "https://generativelanguage.googleapis.com".to_string(),
        NarrationProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        NarrationProvider::Anthropic => "https://api.anthropic.com".to_string(),
        NarrationProvider::Ollama => "http://localhost:11434".to_string(),
        NarrationProvider::LMStudio => "http://localhost:1234/v1".to_string(),
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::get_language_name(&self.captions.source_language)?;
        crate::language_utils::get_language_name(&self.speech.default_language)?;

        for (label, code) in &self.speech.language_aliases {
            crate::language_utils::get_language_name(code)
                .map_err(|e| anyhow!("Language alias '{}' is invalid: {}", label, e))?;
        }

        if self.narration.provider.requires_api_key() && self.narration.get_api_key().is_empty() {
            return Err(anyhow!(
                "API key is required for {} provider",
                self.narration.provider.display_name()
            ));
        }

        if self.narration.common.max_input_chars == 0 {
            return Err(anyhow!("narration.common.max_input_chars must be greater than zero"));
        }

        if self.captions.timeout_secs == 0
            || self.speech.timeout_secs == 0
            || self.narration.get_timeout_secs() == 0
        {
            return Err(anyhow!("Timeouts must be greater than zero"));
        }

        if self.speech.cloud.max_chunk_chars == 0 {
            return Err(anyhow!("speech.cloud.max_chunk_chars must be greater than zero"));
        }

        let endpoints = [
            ("narration endpoint", self.narration.get_endpoint()),
            ("speech.cloud.endpoint", self.speech.cloud.endpoint.clone()),
        ];
        for (name, endpoint) in &endpoints {
            url::Url::parse(endpoint)
                .map_err(|e| anyhow!("Invalid {} '{}': {}", name, endpoint, e))?;
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            captions: CaptionConfig::default(),
            narration: NarrationConfig::default(),
            speech: SpeechConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl NarrationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &NarrationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, created on demand
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = self.available_providers.iter().position(|p| p.provider_type == provider_str);
        match position {
            Some(index) => &mut self.available_providers[index],
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider.clone()));
                let last = self.available_providers.len() - 1;
                &mut self.available_providers[last]
            }
        }
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        default_model(&self.provider)
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        default_endpoint(&self.provider)
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .unwrap_or_else(default_timeout_secs)
    }
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            provider: NarrationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(NarrationProvider::Gemini),
                ProviderConfig::new(NarrationProvider::OpenAI),
                ProviderConfig::new(NarrationProvider::Anthropic),
                ProviderConfig::new(NarrationProvider::Ollama),
                ProviderConfig::new(NarrationProvider::LMStudio),
            ],
            common: NarrationCommonConfig::default(),
        }
    }
}
