/*!
 * In-memory audio and duration reconciliation.
 *
 * Speech engines hand back encoded bytes (MP3 from the cloud voice, WAV
 * from espeak-ng). They are decoded with symphonia into interleaved `f32`
 * samples, stretched or cut to the video length by padding with silence
 * or truncating, and written out as 16-bit PCM WAV with hound.
 */

use log::{debug, warn};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::errors::SynthesisError;

/// Durations closer than this are treated as equal
pub const DURATION_TOLERANCE_SECS: f64 = 0.001;

/// Decoded PCM audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    /// Interleaved samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// What `reconcile` did to a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconciliation {
    /// Already within tolerance of the target
    Unchanged,
    /// Silence appended
    Padded { secs: f64 },
    /// Tail cut off
    Truncated { secs: f64 },
}

impl AudioTrack {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self { samples, sample_rate, channels }
    }

    /// A silent track of the given length
    pub fn silence(secs: f64, sample_rate: u32, channels: u16) -> Self {
        let frames = (secs * sample_rate as f64).round().max(0.0) as usize;
        Self::new(vec![0.0; frames * channels as usize], sample_rate, channels)
    }

    /// Number of sample frames (one sample per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Decode encoded audio bytes. `extension` is a format hint such as
    /// `"mp3"` or `"wav"`; probing still works without it.
    pub fn decode(bytes: &[u8], extension: Option<&str>) -> Result<Self, SynthesisError> {
        if bytes.is_empty() {
            return Err(SynthesisError::Decode("no bytes to decode".to_string()));
        }

        let cursor = Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| SynthesisError::Decode(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| SynthesisError::Decode("No audio track found".to_string()))?;

        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16).unwrap_or(0);
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| SynthesisError::Decode(format!("Decoder creation failed: {}", e)))?;

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    return Err(SynthesisError::Decode(format!("Packet read error: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
            };

            let spec = *decoded.spec();
            if sample_rate == 0 {
                sample_rate = spec.rate;
            }
            if channels == 0 {
                channels = spec.channels.count() as u16;
            }

            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let actual_samples = num_frames * spec.channels.count();
            samples.extend(&sample_buf.samples()[..actual_samples]);
        }

        if samples.is_empty() || sample_rate == 0 || channels == 0 {
            return Err(SynthesisError::Decode("Audio stream contained no samples".to_string()));
        }

        let track = Self::new(samples, sample_rate, channels);
        debug!(
            "Decoded {:.2}s of audio ({} Hz, {} channel(s))",
            track.duration_secs(),
            track.sample_rate,
            track.channels
        );
        Ok(track)
    }

    /// Make the track last exactly `target_secs` (to the nearest frame).
    ///
    /// Shorter tracks get trailing silence, longer ones are cut. A track
    /// already within `DURATION_TOLERANCE_SECS` is returned untouched.
    pub fn reconcile(mut self, target_secs: f64) -> Result<(Self, Reconciliation), SynthesisError> {
        let (target_frames, outcome) = self.plan_reconcile(target_secs)?;
        if outcome != Reconciliation::Unchanged {
            self.samples.resize(target_frames * self.channels as usize, 0.0);
        }
        Ok((self, outcome))
    }

    /// Frame count `reconcile` would produce, and what it would do
    fn plan_reconcile(&self, target_secs: f64) -> Result<(usize, Reconciliation), SynthesisError> {
        if !target_secs.is_finite() || target_secs <= 0.0 {
            return Err(SynthesisError::InvalidTarget(target_secs));
        }

        let current_secs = self.duration_secs();
        let current_frames = self.frames();
        if (current_secs - target_secs).abs() <= DURATION_TOLERANCE_SECS {
            return Ok((current_frames, Reconciliation::Unchanged));
        }

        let target_frames = (target_secs * self.sample_rate as f64).round() as usize;
        let outcome = if target_frames > current_frames {
            Reconciliation::Padded {
                secs: (target_frames - current_frames) as f64 / self.sample_rate as f64,
            }
        } else {
            Reconciliation::Truncated {
                secs: (current_frames - target_frames) as f64 / self.sample_rate as f64,
            }
        };

        debug!("Reconciling audio from {:.3}s to {:.3}s: {:?}", current_secs, target_secs, outcome);
        Ok((target_frames, outcome))
    }

    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    fn write_samples<W>(&self, writer: &mut hound::WavWriter<W>) -> Result<(), hound::Error>
    where
        W: std::io::Write + std::io::Seek,
    {
        write_pcm(writer, &self.samples)
    }

    /// Encode as 16-bit PCM WAV
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, SynthesisError> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buffer, self.wav_spec())
                .map_err(|e| SynthesisError::Encode(e.to_string()))?;
            self.write_samples(&mut writer)
                .map_err(|e| SynthesisError::Encode(e.to_string()))?;
            writer.finalize().map_err(|e| SynthesisError::Encode(e.to_string()))?;
        }
        Ok(buffer.into_inner())
    }

    /// `reconcile` and `write_wav` in one pass.
    ///
    /// Padding is streamed into the file as it is written, so a short
    /// narration for a long video never holds the silence in memory.
    pub fn write_reconciled_wav(&self, path: &Path, target_secs: f64) -> Result<Reconciliation, SynthesisError> {
        let (target_frames, outcome) = self.plan_reconcile(target_secs)?;
        let channels = self.channels as usize;
        let kept = target_frames.min(self.frames()) * channels;
        let silent = target_frames.saturating_sub(self.frames()) * channels;

        let mut writer = hound::WavWriter::create(path, self.wav_spec())
            .map_err(|e| SynthesisError::Encode(e.to_string()))?;
        write_pcm(&mut writer, &self.samples[..kept])
            .map_err(|e| SynthesisError::Encode(e.to_string()))?;
        for _ in 0..silent {
            writer.write_sample(0i16)
                .map_err(|e| SynthesisError::Encode(e.to_string()))?;
        }
        writer.finalize().map_err(|e| SynthesisError::Encode(e.to_string()))?;

        Ok(outcome)
    }

    /// Write as a 16-bit PCM WAV file
    pub fn write_wav(&self, path: &Path) -> Result<(), SynthesisError> {
        let mut writer = hound::WavWriter::create(path, self.wav_spec())
            .map_err(|e| SynthesisError::Encode(e.to_string()))?;
        self.write_samples(&mut writer)
            .map_err(|e| SynthesisError::Encode(e.to_string()))?;
        writer.finalize().map_err(|e| SynthesisError::Encode(e.to_string()))?;
        Ok(())
    }
}

fn write_pcm<W>(writer: &mut hound::WavWriter<W>, samples: &[f32]) -> Result<(), hound::Error>
where
    W: std::io::Write + std::io::Seek,
{
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }
    Ok(())
}
