use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{CaptionKind, CaptionListing, CaptionProvider, CaptionTrackInfo};
use crate::errors::ProviderError;
use crate::external_tool::run_tool;
use crate::video_ref::VideoReference;

/// Base name of downloaded caption files inside the scratch directory
const OUTPUT_STEM: &str = "captions";

/// Subtitle keys that are not speech captions
const IGNORED_TRACKS: &[&str] = &["live_chat", "rechat"];

#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    subtitles: Option<BTreeMap<String, Vec<SubtitleFormat>>>,
    #[serde(default)]
    automatic_captions: Option<BTreeMap<String, Vec<SubtitleFormat>>>,
}

#[derive(Debug, Deserialize)]
struct SubtitleFormat {
    #[serde(default)]
    ext: String,
    #[serde(default)]
    url: Option<String>,
}

/// Caption provider backed by the yt-dlp command-line tool
#[derive(Debug, Clone)]
pub struct YtDlpProvider {
    binary: String,
    timeout_secs: u64,
    scratch_dir: Option<PathBuf>,
}

impl YtDlpProvider {
    pub fn new(binary: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            binary: binary.into(),
            timeout_secs,
            scratch_dir: None,
        }
    }

    /// Download captions under `dir` instead of the system temp directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Parse the metadata JSON printed by `yt-dlp -J`
    pub fn parse_listing(json: &str) -> Result<CaptionListing, ProviderError> {
        let info: VideoInfo = serde_json::from_str(json)
            .map_err(|e| ProviderError::ParseError(format!("Invalid yt-dlp metadata: {}", e)))?;

        let mut tracks = Vec::new();
        collect_tracks(&mut tracks, info.subtitles.unwrap_or_default(), CaptionKind::Human);
        collect_tracks(&mut tracks, info.automatic_captions.unwrap_or_default(), CaptionKind::Automatic);

        Ok(CaptionListing {
            duration_secs: info.duration,
            tracks,
        })
    }
}

fn collect_tracks(
    tracks: &mut Vec<CaptionTrackInfo>,
    entries: BTreeMap<String, Vec<SubtitleFormat>>,
    kind: CaptionKind,
) {
    for (language, formats) in entries {
        if IGNORED_TRACKS.contains(&language.as_str()) || formats.is_empty() {
            continue;
        }

        let chosen = formats.iter()
            .find(|f| f.ext == "vtt")
            .or_else(|| formats.first());

        if let Some(format) = chosen {
            tracks.push(CaptionTrackInfo {
                language,
                kind,
                ext: format.ext.clone(),
                url: format.url.clone(),
            });
        }
    }
}

/// Find the caption file yt-dlp wrote into `dir`
async fn find_downloaded_file(dir: &Path) -> Result<Option<PathBuf>, ProviderError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ProviderError::ProcessFailed(format!("Cannot read scratch directory: {}", e)))?;

    while let Some(entry) = entries.next_entry()
        .await
        .map_err(|e| ProviderError::ProcessFailed(format!("Cannot read scratch directory: {}", e)))?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(&format!("{}.", OUTPUT_STEM)) && !name.ends_with(".part") {
            return Ok(Some(entry.path()));
        }
    }

    Ok(None)
}

#[async_trait]
impl CaptionProvider for YtDlpProvider {
    async fn fetch_captions(&self, reference: &VideoReference) -> Result<CaptionListing, ProviderError> {
        let args = vec![
            "-J".to_string(),
            "--skip-download".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            reference.url().to_string(),
        ];

        let output = run_tool(&self.binary, &args, self.timeout_secs).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(ProviderError::ParseError("yt-dlp printed no metadata".to_string()));
        }

        let listing = Self::parse_listing(&stdout)?;
        debug!(
            "yt-dlp listed {} caption track(s) for {}",
            listing.tracks.len(),
            reference.video_id()
        );
        Ok(listing)
    }

    async fn fetch_payload(
        &self,
        reference: &VideoReference,
        track: &CaptionTrackInfo,
    ) -> Result<String, ProviderError> {
        // Removed with everything in it when dropped, including on timeout
        let mut builder = tempfile::Builder::new();
        builder.prefix("vidnarrate-captions-");
        let scratch = match &self.scratch_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
        .map_err(|e| ProviderError::ProcessFailed(format!("Cannot create scratch directory: {}", e)))?;

        let template = scratch.path().join(format!("{}.%(ext)s", OUTPUT_STEM));
        let write_flag = match track.kind {
            CaptionKind::Human => "--write-subs",
            CaptionKind::Automatic => "--write-auto-subs",
        };

        let args = vec![
            "--skip-download".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            write_flag.to_string(),
            "--sub-langs".to_string(),
            track.language.clone(),
            "--sub-format".to_string(),
            format!("{}/vtt/best", track.ext),
            "-o".to_string(),
            template.to_string_lossy().to_string(),
            reference.url().to_string(),
        ];

        run_tool(&self.binary, &args, self.timeout_secs).await?;

        let Some(path) = find_downloaded_file(scratch.path()).await? else {
            warn!("yt-dlp finished without writing {} captions", track.language);
            return Err(ProviderError::ProcessFailed(format!(
                "yt-dlp wrote no caption file for language '{}'",
                track.language
            )));
        };

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ProviderError::ProcessFailed(format!("Cannot read caption file: {}", e)))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
