// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use vidnarrate::app_config::{self, Config, NarrationProvider};
use vidnarrate::app_controller::Controller;
use vidnarrate::errors::PipelineError;
use vidnarrate::pipeline::check_request;
use vidnarrate::speech::VoiceGender;

/// CLI Wrapper for NarrationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliNarrationProvider {
    Gemini,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    Ollama,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliNarrationProvider> for NarrationProvider {
    fn from(cli_provider: CliNarrationProvider) -> Self {
        match cli_provider {
            CliNarrationProvider::Gemini => NarrationProvider::Gemini,
            CliNarrationProvider::OpenAI => NarrationProvider::OpenAI,
            CliNarrationProvider::Anthropic => NarrationProvider::Anthropic,
            CliNarrationProvider::Ollama => NarrationProvider::Ollama,
            CliNarrationProvider::LMStudio => NarrationProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for VoiceGender to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliVoice {
    #[value(alias = "erkek")]
    Male,
    #[value(alias = "kadin")]
    Female,
}

impl From<CliVoice> for VoiceGender {
    fn from(cli_voice: CliVoice) -> Self {
        match cli_voice {
            CliVoice::Male => VoiceGender::Male,
            CliVoice::Female => VoiceGender::Female,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Narrate a video in another language
    Process(ProcessArgs),

    /// Generate shell completions for vidnarrate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ProcessArgs {
    /// Video URL (youtube.com/watch?v=..., youtu.be/..., embed URLs)
    #[arg(value_name = "VIDEO_URL")]
    video_url: String,

    /// Target language, as a name or code (e.g. 'Türkçe', 'ingilizce', 'de')
    #[arg(short = 'l', long)]
    language: String,

    /// Narrator voice
    #[arg(short = 'v', long, value_enum, default_value = "female")]
    voice: CliVoice,

    /// Where to write the WAV narration (the text goes next to it as .txt)
    #[arg(short, long, default_value = "narration.wav")]
    output: PathBuf,

    /// Print the full result as JSON (audio base64 encoded) instead of writing files
    #[arg(long)]
    json: bool,

    /// Text-generation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliNarrationProvider>,

    /// Model name for the text-generation provider
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the text-generation provider
    #[arg(long, env = "VIDNARRATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Caption language to read (ISO code)
    #[arg(short, long)]
    source_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// vidnarrate - narrate videos in another language
///
/// Fetches a video's captions, has an LLM translate them, and speaks the
/// result as an audio track as long as the video itself.
#[derive(Parser, Debug)]
#[command(name = "vidnarrate")]
#[command(version)]
#[command(about = "Translated voice narration for online videos")]
#[command(long_about = "vidnarrate reads a video's captions, translates them with an AI provider and synthesizes a narration whose length matches the video.

EXAMPLES:
    vidnarrate process https://youtu.be/dQw4w9WgXcQ -l Türkçe            # Female Turkish narration
    vidnarrate process https://youtu.be/dQw4w9WgXcQ -l ingilizce -v male # English narration, offline voice
    vidnarrate process URL -l tr --json > result.json                    # Full result as JSON
    vidnarrate process URL -l tr -p ollama -m llama3.2:3b                # Local model
    vidnarrate completions bash > vidnarrate.bash                        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

EXTERNAL TOOLS:
    yt-dlp     - caption and metadata retrieval
    espeak-ng  - offline voice (male voices and non-default languages)

EXIT CODES:
    2 malformed input, 3 caption retrieval, 4 narration generation,
    5 speech synthesis, 6 audio integrity, 1 anything else")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // Levels are narrowed later with log::set_max_level
        metadata.level() <= self.level.max(log::max_level())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn to_level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let outcome = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "vidnarrate", &mut std::io::stdout());
            Ok(())
        }
        Commands::Process(args) => run_process(args).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.downcast_ref::<PipelineError>()
                .map(PipelineError::exit_code)
                .unwrap_or(1);
            error!("{:#}", e);
            ExitCode::from(code as u8)
        }
    }
}

/// Load the configuration file, writing a default one if it is missing
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;
        Ok(config)
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        Ok(config)
    }
}

/// Apply command line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, options: &ProcessArgs) {
    if let Some(provider) = &options.provider {
        config.narration.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        config.narration.active_provider_config_mut().model = model.clone();
    }

    if let Some(api_key) = &options.api_key {
        config.narration.active_provider_config_mut().api_key = api_key.clone();
    }

    if let Some(source_lang) = &options.source_language {
        config.captions.source_language = source_lang.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_process(options: ProcessArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(to_level_filter(&cmd_log_level.clone().into()));
    }

    // Bad input is reported as such before configuration problems
    check_request(&options.video_url, &options.language)?;

    let mut config = load_config(&options.config_path)?;
    apply_overrides(&mut config, &options);

    config.validate()
        .context("Configuration validation failed")?;

    log::set_max_level(to_level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;
    let result = controller
        .run(&options.video_url, &options.language, options.voice.clone().into())
        .await?;

    if options.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize result to JSON")?;
        println!("{}", json);
    } else {
        controller.write_outputs(&result, &options.output)?;
        info!(
            "Video {} ({:.0}s): {} narration characters, {} audio bytes",
            result.video_id,
            result.video_duration,
            result.narration.chars().count(),
            result.audio.len()
        );
    }

    Ok(())
}
