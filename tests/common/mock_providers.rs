/*!
 * Mock provider implementations for testing
 *
 * Scripted caption providers and speech engines, so that no test starts
 * yt-dlp or espeak-ng or reaches the network. Call counters are shared
 * between clones: keep one clone in the test and hand the other to the
 * pipeline.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vidnarrate::audio::AudioTrack;
use vidnarrate::captions::{CaptionKind, CaptionListing, CaptionProvider, CaptionTrackInfo};
use vidnarrate::errors::ProviderError;
use vidnarrate::speech::{SpeechEngine, VoiceHint};
use vidnarrate::video_ref::VideoReference;

/// Sample rate of the audio the scripted engines return
pub const MOCK_SAMPLE_RATE: u32 = 8000;

/// Caption provider answering from a fixed listing
#[derive(Debug, Clone)]
pub struct ScriptedCaptionProvider {
    listing: CaptionListing,
    /// Payload per track language and kind
    payloads: HashMap<(String, CaptionKind), String>,
    /// Listing calls that fail with a connection error before one succeeds
    transient_failures: usize,
    /// When set, every listing call fails with this error
    listing_error: Option<ProviderError>,
    listing_calls: Arc<AtomicUsize>,
    payload_calls: Arc<AtomicUsize>,
    /// Languages of downloaded tracks, in order
    downloaded: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCaptionProvider {
    /// A video of `duration_secs` seconds with no caption tracks
    pub fn new(duration_secs: Option<f64>) -> Self {
        Self {
            listing: CaptionListing { duration_secs, tracks: Vec::new() },
            payloads: HashMap::new(),
            transient_failures: 0,
            listing_error: None,
            listing_calls: Arc::new(AtomicUsize::new(0)),
            payload_calls: Arc::new(AtomicUsize::new(0)),
            downloaded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Advertise a track and the payload served for it
    pub fn with_track(mut self, language: &str, kind: CaptionKind, payload: &str) -> Self {
        self.listing.tracks.push(CaptionTrackInfo {
            language: language.to_string(),
            kind,
            ext: "vtt".to_string(),
            url: None,
        });
        self.payloads.insert((language.to_string(), kind), payload.to_string());
        self
    }

    /// Fail the first `count` listing calls with a transient error
    pub fn with_transient_failures(mut self, count: usize) -> Self {
        self.transient_failures = count;
        self
    }

    /// Fail every listing call with `error`
    pub fn failing_with(mut self, error: ProviderError) -> Self {
        self.listing_error = Some(error);
        self
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    pub fn payload_calls(&self) -> usize {
        self.payload_calls.load(Ordering::SeqCst)
    }

    pub fn downloaded(&self) -> Vec<String> {
        self.downloaded.lock().clone()
    }
}

#[async_trait]
impl CaptionProvider for ScriptedCaptionProvider {
    async fn fetch_captions(&self, _reference: &VideoReference) -> Result<CaptionListing, ProviderError> {
        let call = self.listing_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.listing_error {
            return Err(error.clone());
        }
        if call < self.transient_failures {
            return Err(ProviderError::ConnectionError(format!("Simulated reset (call #{})", call + 1)));
        }

        Ok(self.listing.clone())
    }

    async fn fetch_payload(
        &self,
        _reference: &VideoReference,
        track: &CaptionTrackInfo,
    ) -> Result<String, ProviderError> {
        self.payload_calls.fetch_add(1, Ordering::SeqCst);
        self.downloaded.lock().push(track.language.clone());

        self.payloads
            .get(&(track.language.clone(), track.kind))
            .cloned()
            .ok_or_else(|| ProviderError::RequestFailed(format!("No payload for {}", track.language)))
    }
}

/// Speech engine returning silent WAV audio of a fixed length
#[derive(Debug, Clone)]
pub struct RecordingSpeechEngine {
    name: String,
    speech_secs: f64,
    silent_failure: bool,
    calls: Arc<AtomicUsize>,
    /// (text, language) of every request
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingSpeechEngine {
    pub fn new(name: &str, speech_secs: f64) -> Self {
        Self {
            name: name.to_string(),
            speech_secs,
            silent_failure: false,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make the engine answer with zero bytes
    pub fn producing_nothing(mut self) -> Self {
        self.silent_failure = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SpeechEngine for RecordingSpeechEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_format(&self) -> &str {
        "wav"
    }

    async fn synthesize(&self, text: &str, language: &str, _hint: &VoiceHint) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((text.to_string(), language.to_string()));

        if self.silent_failure {
            return Ok(Vec::new());
        }

        AudioTrack::silence(self.speech_secs, MOCK_SAMPLE_RATE, 1)
            .to_wav_bytes()
            .map_err(|e| ProviderError::ProcessFailed(e.to_string()))
    }
}
