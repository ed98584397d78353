use anyhow::{Result, anyhow};
use isolang::Language;
use std::collections::BTreeMap;

/// Language utilities for ISO language code handling
///
/// Caption tracks are tagged with ISO 639-1 codes, sometimes with a region
/// (`en-US`); speech engines want ISO 639-1; users type language names.
/// These helpers bridge the three.
/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn lookup(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => {
            let terminological = BIBLIOGRAPHIC_CODES.iter()
                .find(|(bibliographic, _)| *bibliographic == normalized)
                .map(|(_, terminological)| *terminological)
                .unwrap_or(normalized.as_str());
            Language::from_639_3(terminological)
        }
        _ => None,
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    lookup(code)
        .map(|lang| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let lang = lookup(code)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang.to_639_1()
        .map(|c| c.to_string())
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (lookup(code1), lookup(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Primary subtag of a BCP 47 style tag: `en-US` -> `en`, `pt_BR` -> `pt`
pub fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// How closely a language tag matches a wanted language.
///
/// `Some(0)` for the same language (`en`, `EN`, `eng`), `Some(1)` when
/// only the primary subtags agree (`en-GB` for `en`), `None` otherwise.
pub fn tag_match_rank(tag: &str, wanted: &str) -> Option<u8> {
    if tag.eq_ignore_ascii_case(wanted) || language_codes_match(tag, wanted) {
        return Some(0);
    }

    let tag_primary = primary_subtag(tag);
    let wanted_primary = primary_subtag(wanted);
    if tag_primary.eq_ignore_ascii_case(wanted_primary)
        || language_codes_match(tag_primary, wanted_primary)
    {
        return Some(1);
    }

    None
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    lookup(code)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Resolve a free-form target language label to the code speech is
/// produced in.
///
/// Tried in order: configured aliases, ISO codes, English names, native
/// names. Labels nothing recognises fall back to `default_language`.
pub fn resolve_output_language(
    label: &str,
    aliases: &BTreeMap<String, String>,
    default_language: &str,
) -> String {
    let trimmed = label.trim();
    let lowered = trimmed.to_lowercase();

    if let Some(code) = aliases.get(&lowered) {
        return normalize_to_part1_or_part2t(code).unwrap_or_else(|_| code.clone());
    }

    if let Ok(code) = normalize_to_part1_or_part2t(trimmed) {
        return code;
    }

    let by_name = Language::from_name(&title_case(&lowered))
        .or_else(|| Language::from_autonym(trimmed))
        .or_else(|| Language::from_autonym(&title_case(&lowered)));

    match by_name {
        Some(lang) => lang.to_639_1()
            .map(|c| c.to_string())
            .unwrap_or_else(|| lang.to_639_3().to_string()),
        None => default_language.to_string(),
    }
}

fn title_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
