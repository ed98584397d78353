/*!
 * Transcript normalization.
 *
 * Turns a raw caption payload (WebVTT, SRT, or caption text with inline
 * markup) into a single line of spoken words. The steps run in a fixed
 * order; later patterns rely on earlier ones having run:
 *
 * 1. strip markup tags
 * 2. decode character entities
 * 3. strip timestamp ranges (and the cue settings that trail them)
 * 4. collapse whitespace
 * 5. strip bracketed non-speech annotations
 * 6. strip cue index lines
 * 7. strip the format header
 * 8. trim
 *
 * Step 4 collapses every whitespace run to one space, except that a run
 * containing a line break collapses to a single line break. Step 6 is line
 * oriented and needs those boundaries; step 8 joins what is left into one
 * line with single spaces.
 *
 * The format header is only ever the leading block of a WebVTT payload:
 * the `WEBVTT` token line plus the metadata lines (`Kind:`, `Language:`)
 * up to the first blank line or timing line. Earlier steps erase the blank
 * line that ends it, so step 7 locates the block on the raw payload and
 * drops it. Cue text that merely starts with `WEBVTT` or `Language:` is
 * speech and stays.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

static ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});").unwrap()
});

static TIMESTAMP_RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\d{2,}:)?\d{2}:\d{2}[.,]\d{3} --> (?:\d{2,}:)?\d{2}:\d{2}[.,]\d{3}[^\n]*").unwrap()
});

static LINE_BREAK_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\n\s*").unwrap());

static INLINE_SPACE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

static ANNOTATION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*?\]").unwrap());

static CUE_INDEX_LINE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^ ?\d+ ?$").unwrap());

/// Named entities seen in caption payloads
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{a0}"),
    ("ndash", "\u{2013}"),
    ("mdash", "\u{2014}"),
    ("hellip", "\u{2026}"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201c}"),
    ("rdquo", "\u{201d}"),
    ("lrm", "\u{200e}"),
    ("rlm", "\u{200f}"),
    ("copy", "\u{a9}"),
    ("reg", "\u{ae}"),
    ("trade", "\u{2122}"),
    ("eacute", "\u{e9}"),
    ("egrave", "\u{e8}"),
    ("aacute", "\u{e1}"),
    ("agrave", "\u{e0}"),
    ("ccedil", "\u{e7}"),
    ("ouml", "\u{f6}"),
    ("uuml", "\u{fc}"),
    ("auml", "\u{e4}"),
    ("szlig", "\u{df}"),
];

/// Normalize a raw caption payload into plain spoken text.
///
/// Never fails; an empty result means the payload held no speech.
pub fn normalize(raw: &str) -> String {
    let body = strip_format_header(raw);

    let text = TAG_REGEX.replace_all(body, "");
    let text = decode_entities(&text);
    let text = TIMESTAMP_RANGE_REGEX.replace_all(&text, "");
    let text = collapse_whitespace(&text);
    let text = ANNOTATION_REGEX.replace_all(&text, "");
    let text = CUE_INDEX_LINE_REGEX.replace_all(&text, "");

    // Removals above can leave doubled spaces behind
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a normalized transcript carries no speech
pub fn is_empty_transcript(text: &str) -> bool {
    text.trim().is_empty()
}

/// Decode named and numeric character references
pub fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            decode_entity(body).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<String> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    NAMED_ENTITIES.iter()
        .find(|(name, _)| *name == body)
        .map(|(_, value)| value.to_string())
}

/// Return the payload without its leading WebVTT header block.
///
/// The header needs a line break after the `WEBVTT` token, so a single
/// line of clean text is never mistaken for one.
fn strip_format_header(raw: &str) -> &str {
    let trimmed = raw.trim_start_matches('\u{feff}').trim_start();
    let Some((first_line, mut rest)) = trimmed.split_once('\n') else {
        return raw;
    };

    let first_line = first_line.trim_end();
    let is_header_token = match first_line.strip_prefix("WEBVTT") {
        Some(tail) => tail.is_empty() || tail.starts_with([' ', '\t']),
        None => false,
    };
    if !is_header_token {
        return raw;
    }

    // Metadata lines run until a blank line or the first cue timing
    loop {
        let (line, remaining) = rest.split_once('\n').unwrap_or((rest, ""));
        if line.trim().is_empty() || line.contains("-->") {
            return rest;
        }
        if remaining.is_empty() {
            return "";
        }
        rest = remaining;
    }
}

fn collapse_whitespace(text: &str) -> String {
    let text = LINE_BREAK_RUN_REGEX.replace_all(text, "\n");
    INLINE_SPACE_RUN_REGEX.replace_all(&text, " ").into_owned()
}
