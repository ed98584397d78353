/*!
 * Error types for the vidnarrate pipeline.
 *
 * Every stage has its own error enum; `PipelineError` wraps them and carries
 * the classification the caller uses to decide how to report a failure.
 */

use thiserror::Error;

/// Errors that can occur when talking to an external provider
/// (caption source, text generation, speech synthesis)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The call did not finish within its time budget
    #[error("Provider call timed out after {0} seconds")]
    Timeout(u64),

    /// An external tool exited unsuccessfully or could not be started
    #[error("External process failed: {0}")]
    ProcessFailed(String),
}

impl ProviderError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) | Self::Timeout(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }

    /// Map a reqwest transport error onto the provider taxonomy
    pub fn from_reqwest(error: reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }

    /// Map a non-success HTTP status and body onto the provider taxonomy
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Errors raised while resolving captions for a video
#[derive(Error, Debug)]
pub enum CaptionError {
    /// The caption provider failed
    #[error("Caption provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Neither human nor automatic captions exist for the language
    #[error("No captions available for language '{language}'")]
    NoCaptions { language: String },

    /// The provider did not report a usable duration
    #[error("Video duration is missing or zero")]
    MissingDuration,

    /// The caption payload normalized to nothing
    #[error("Transcript is empty after normalization")]
    EmptyTranscript,
}

/// Errors raised while generating the narration text
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The text-generation provider failed outright
    #[error("Text generation provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The narration was empty after sanitization
    #[error("Narration is empty after sanitization")]
    EmptyNarration,
}

/// Errors raised while synthesizing the narration audio
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// The speech engine failed
    #[error("Speech engine error: {0}")]
    Provider(#[from] ProviderError),

    /// The speech engine produced no bytes
    #[error("Speech engine '{engine}' produced no audio")]
    EmptyAudio { engine: String },

    /// The synthesized bytes could not be decoded
    #[error("Failed to decode synthesized audio: {0}")]
    Decode(String),

    /// The reconciled track could not be encoded
    #[error("Failed to encode audio: {0}")]
    Encode(String),

    /// The requested target duration is not a positive number
    #[error("Invalid target duration: {0}")]
    InvalidTarget(f64),

    /// The written audio file is missing or empty
    #[error("Audio artifact is missing or empty: {0}")]
    MissingArtifact(String),
}

/// Classification of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    Retrieval,
    Generation,
    Synthesis,
    Integrity,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedInput => "malformed_input",
            Self::Retrieval => "retrieval",
            Self::Generation => "generation",
            Self::Synthesis => "synthesis",
            Self::Integrity => "integrity",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by `Pipeline::process`
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The request itself is unusable; no stage ran
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Captions or duration could not be retrieved
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] CaptionError),

    /// Narration could not be generated
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Audio could not be synthesized
    #[error("Synthesis error: {0}")]
    Synthesis(SynthesisError),

    /// The final audio artifact is missing or empty
    #[error("Integrity error: {0}")]
    Integrity(String),
}

impl From<SynthesisError> for PipelineError {
    fn from(error: SynthesisError) -> Self {
        match error {
            SynthesisError::MissingArtifact(detail) => Self::Integrity(detail),
            other => Self::Synthesis(other),
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedInput(_) => ErrorKind::MalformedInput,
            Self::Retrieval(_) => ErrorKind::Retrieval,
            Self::Generation(_) => ErrorKind::Generation,
            Self::Synthesis(_) => ErrorKind::Synthesis,
            Self::Integrity(_) => ErrorKind::Integrity,
        }
    }

    /// Process exit code used by the command-line front end
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::MalformedInput => 2,
            ErrorKind::Retrieval => 3,
            ErrorKind::Generation => 4,
            ErrorKind::Synthesis => 5,
            ErrorKind::Integrity => 6,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
