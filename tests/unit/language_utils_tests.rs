/*!
 * Tests for language utility functions
 */

use std::collections::BTreeMap;

use vidnarrate::language_utils::{
    get_language_name, language_codes_match, normalize_to_part1_or_part2t, normalize_to_part2t,
    primary_subtag, resolve_output_language, tag_match_rank,
};

/// Test normalization of language codes to ISO 639-2/T format
#[test]
fn test_normalize_to_part2t_withValidCodes_shouldNormalizeCorrectly() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("tr").unwrap(), "tur");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");

    // Case insensitivity and whitespace
    assert_eq!(normalize_to_part2t(" EN ").unwrap(), "eng");

    assert!(normalize_to_part2t("xyz").is_err());
    assert!(normalize_to_part2t("e").is_err());
}

/// Test normalization to the short form speech engines expect
#[test]
fn test_normalize_to_part1_or_part2t_shouldPreferTwoLetterCodes() {
    assert_eq!(normalize_to_part1_or_part2t("tur").unwrap(), "tr");
    assert_eq!(normalize_to_part1_or_part2t("ger").unwrap(), "de");
    assert_eq!(normalize_to_part1_or_part2t("en").unwrap(), "en");
}

/// Test matching of different language code formats
#[test]
fn test_language_codes_match_withMatchingCodes_shouldReturnTrue() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("TR", "tur"));
    assert!(language_codes_match("fr", "fre"));
    assert!(!language_codes_match("en", "tr"));
    assert!(!language_codes_match("en", "not-a-code"));
}

/// Test retrieval of language names from codes
#[test]
fn test_get_language_name_withValidCodes_shouldReturnCorrectName() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("tur").unwrap(), "Turkish");
    assert!(get_language_name("xyz").is_err());
}

/// Test primary subtag extraction
#[test]
fn test_primary_subtag_withRegionalTags_shouldStripRegion() {
    assert_eq!(primary_subtag("en-US"), "en");
    assert_eq!(primary_subtag("pt_BR"), "pt");
    assert_eq!(primary_subtag("tr"), "tr");
}

/// Test ranking of caption and voice language tags
#[test]
fn test_tag_match_rank_shouldRankExactBeforeRegional() {
    assert_eq!(tag_match_rank("en", "en"), Some(0));
    assert_eq!(tag_match_rank("EN", "en"), Some(0));
    assert_eq!(tag_match_rank("eng", "en"), Some(0));
    assert_eq!(tag_match_rank("en-GB", "en"), Some(1));
    assert_eq!(tag_match_rank("en", "en-US"), Some(1));
    assert_eq!(tag_match_rank("de", "en"), None);
}

/// Test resolving free-form target language labels
#[test]
fn test_resolve_output_language_withVariousLabels_shouldResolve() {
    let aliases: BTreeMap<String, String> = [("ingilizce", "en"), ("türkçe", "tr")]
        .into_iter()
        .map(|(label, code)| (label.to_string(), code.to_string()))
        .collect();

    // Configured aliases, matched case-insensitively
    assert_eq!(resolve_output_language("ingilizce", &aliases, "tr"), "en");
    assert_eq!(resolve_output_language("  ingilizce ", &aliases, "tr"), "en");
    assert_eq!(resolve_output_language("türkçe", &aliases, "tr"), "tr");

    // ISO codes, including three-letter ones
    assert_eq!(resolve_output_language("de", &aliases, "tr"), "de");
    assert_eq!(resolve_output_language("fra", &aliases, "tr"), "fr");

    // English names
    assert_eq!(resolve_output_language("german", &aliases, "tr"), "de");
    assert_eq!(resolve_output_language("English", &aliases, "tr"), "en");

    // Anything else goes to the default
    assert_eq!(resolve_output_language("Klingonish", &aliases, "tr"), "tr");
    assert_eq!(resolve_output_language("", &aliases, "tr"), "tr");
}
