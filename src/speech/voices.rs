use log::debug;

use super::VoiceGender;
use crate::language_utils;

/// An installed voice
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceInfo {
    /// Identifier the engine accepts when selecting the voice
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Language tags the voice speaks, primary first
    pub languages: Vec<String>,
    /// `None` when the engine does not say
    pub gender: Option<VoiceGender>,
}

/// Voices an engine has installed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceCatalog {
    voices: Vec<VoiceInfo>,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<VoiceInfo>) -> Self {
        Self { voices }
    }

    pub fn voices(&self) -> &[VoiceInfo] {
        &self.voices
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Best voice for the language and gender, or `None` when no voice
    /// matches both. Exact language tags beat regional variants; ties go
    /// to catalog order.
    pub fn select(&self, language: &str, gender: VoiceGender) -> Option<&VoiceInfo> {
        self.voices.iter()
            .filter(|voice| voice.gender == Some(gender))
            .filter_map(|voice| {
                voice.languages.iter()
                    .filter_map(|tag| language_utils::tag_match_rank(tag, language))
                    .min()
                    .map(|rank| (rank, voice))
            })
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, voice)| voice)
    }

    /// First voice that speaks the language at all, whatever its gender
    pub fn any_for_language(&self, language: &str) -> Option<&VoiceInfo> {
        self.voices.iter()
            .filter_map(|voice| {
                voice.languages.iter()
                    .filter_map(|tag| language_utils::tag_match_rank(tag, language))
                    .min()
                    .map(|rank| (rank, voice))
            })
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, voice)| voice)
    }

    /// Parse the table printed by `espeak-ng --voices[=<lang>]`:
    ///
    /// ```text
    /// Pty Language       Age/Gender VoiceName          File                 Other Languages
    ///  5  tr              --/M      Turkish            trk/tr
    ///  5  en-gb           --/M      English_(Great_Britain) gmw/en          (en 2)
    /// ```
    pub fn parse_espeak_listing(listing: &str) -> Self {
        let voices = listing.lines()
            .skip_while(|line| !line.trim_start().starts_with("Pty"))
            .skip(1)
            .filter_map(parse_espeak_line)
            .collect::<Vec<_>>();

        debug!("Parsed {} espeak-ng voice(s)", voices.len());
        Self::new(voices)
    }
}

fn parse_espeak_line(line: &str) -> Option<VoiceInfo> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() < 5 {
        return None;
    }

    let language = columns[1].to_string();
    let gender = match columns[2].rsplit('/').next() {
        Some("M") => Some(VoiceGender::Male),
        Some("F") => Some(VoiceGender::Female),
        _ => None,
    };
    let name = columns[3].replace('_', " ");
    let id = columns[4].to_string();

    let mut languages = vec![language];
    for other in &columns[5..] {
        let tag = other.trim_start_matches('(');
        if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            languages.push(tag.to_string());
        }
    }

    Some(VoiceInfo { id, name, languages, gender })
}
