use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// @module: Cue parsing for WebVTT and SRT caption payloads

// @const: Cue timing line; hours optional, '.' (WebVTT) or ',' (SRT) before millis
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d{2,}):)?(\d{2}):(\d{2})[.,](\d{3})\s+-->\s+(?:(\d{2,}):)?(\d{2}):(\d{2})[.,](\d{3})").unwrap()
});

// @struct: Single timed cue
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Cue text, lines joined with '\n'
    pub text: String,
}

/// Parse the cues of a WebVTT or SRT payload, in file order.
///
/// Header, NOTE, STYLE and REGION blocks are skipped, as are blocks with
/// no timing line. Cue identifiers (including SRT sequence numbers) and
/// cue settings after the timing are ignored.
pub fn parse_cues(raw: &str) -> Vec<Cue> {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let mut cues = Vec::new();

    for (block_index, block) in normalized.split("\n\n").enumerate() {
        let lines: Vec<&str> = block.lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect();

        let Some(first) = lines.first() else {
            continue;
        };

        if is_metadata_block(first) {
            continue;
        }

        let Some(timing_index) = lines.iter().position(|line| TIMING_REGEX.is_match(line.trim())) else {
            debug!("Skipping caption block {} without a timing line", block_index);
            continue;
        };

        let Some(caps) = TIMING_REGEX.captures(lines[timing_index].trim()) else {
            continue;
        };
        let start_ms = timestamp_to_ms(&caps, 1);
        let end_ms = timestamp_to_ms(&caps, 5);

        let text = lines[timing_index + 1..]
            .iter()
            .map(|line| line.trim())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            continue;
        }

        cues.push(Cue { start_ms, end_ms, text });
    }

    cues
}

fn is_metadata_block(first_line: &str) -> bool {
    let trimmed = first_line.trim_start_matches('\u{feff}').trim();
    trimmed.starts_with("WEBVTT")
        || trimmed.starts_with("NOTE")
        || trimmed == "STYLE"
        || trimmed == "REGION"
}

/// Parse timestamp captures starting at `start_idx` (hours, minutes, seconds, millis)
fn timestamp_to_ms(caps: &Captures, start_idx: usize) -> u64 {
    let field = |offset: usize| -> u64 {
        caps.get(start_idx + offset)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0))
    };

    (field(0) * 3600 + field(1) * 60 + field(2)) * 1000 + field(3)
}
