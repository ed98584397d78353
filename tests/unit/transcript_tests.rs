/*!
 * Tests for transcript normalization
 */

use vidnarrate::transcript::{decode_entities, is_empty_transcript, normalize};
use crate::common::{SAMPLE_TRANSCRIPT, SAMPLE_VTT};

/// Test a full WebVTT payload
#[test]
fn test_normalize_withWebVtt_shouldLeaveOnlySpokenText() {
    assert_eq!(normalize(SAMPLE_VTT), SAMPLE_TRANSCRIPT);
}

/// Test SRT style payloads with comma separated milliseconds
#[test]
fn test_normalize_withSrt_shouldDropIndicesAndTimings() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:02,500 --> 00:00:03,000\nworld\n";
    assert_eq!(normalize(srt), "Hello world");
}

/// Test hour-less timestamps used by short captions
#[test]
fn test_normalize_withShortTimestamps_shouldDropThem() {
    let raw = "WEBVTT\n\n00:01.000 --> 00:02.000\nshort form\n";
    assert_eq!(normalize(raw), "short form");
}

/// Test annotations that span a line break
#[test]
fn test_normalize_withMultilineAnnotation_shouldRemoveIt() {
    assert_eq!(normalize("Hi [laughs\nloudly] there"), "Hi there");
}

/// Test a payload with nothing but non-speech cues
#[test]
fn test_normalize_withOnlyAnnotations_shouldBeEmpty() {
    let raw = "WEBVTT\n\n1\n00:00:00.000 --> 00:00:01.000\n[Music]\n\n2\n00:00:01.000 --> 00:00:02.000\n[Applause]\n";
    let text = normalize(raw);
    assert_eq!(text, "");
    assert!(is_empty_transcript(&text));
}

/// Test that numbers inside sentences survive
#[test]
fn test_normalize_withNumbersInText_shouldKeepThem() {
    let raw = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nI counted 3 birds\n42\n";
    assert_eq!(normalize(raw), "I counted 3 birds");
}

/// Test that the output is a single trimmed line without markup
#[test]
fn test_normalize_output_shouldBeSingleCleanLine() {
    let text = normalize(SAMPLE_VTT);
    assert!(!text.contains('\n'));
    assert!(!text.contains('<'));
    assert!(!text.contains('['));
    assert!(!text.contains("-->"));
    assert_eq!(text, text.trim());
    assert!(!text.contains("  "));
}

/// Test idempotence on already clean text
#[test]
fn test_normalize_twice_shouldNotChangeResult() {
    let once = normalize(SAMPLE_VTT);
    assert_eq!(normalize(&once), once);

    let clean = "Merhaba dünya, bugün hava güzel.";
    assert_eq!(normalize(clean), clean);
}

/// Test that decoded entities are not mistaken for markup
#[test]
fn test_normalize_withEncodedBrackets_shouldKeepTheirText() {
    assert_eq!(normalize("a &lt;b&gt; c"), "a <b> c");
}

/// Test entity decoding on its own
#[test]
fn test_decode_entities_withNamedEntities_shouldDecode() {
    assert_eq!(decode_entities("Tom &amp; Jerry &quot;live&quot;"), "Tom & Jerry \"live\"");
    assert_eq!(decode_entities("no entities"), "no entities");
}

/// Test whitespace only transcripts
#[test]
fn test_is_empty_transcript_withWhitespace_shouldBeTrue() {
    assert!(is_empty_transcript("   \n\t"));
    assert!(!is_empty_transcript("a"));
}

/// Test that spoken cues resembling header lines are kept
#[test]
fn test_normalize_withHeaderLikeCueText_shouldKeepSpeech() {
    let raw = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nLanguage: the thing that makes us human\n\n00:00:02.000 --> 00:00:04.000\nWEBVTT is a caption format\n";
    let text = normalize(raw);
    assert_eq!(text, "Language: the thing that makes us human WEBVTT is a caption format");
    assert_eq!(normalize(&text), text);
}

/// Test that the header block with metadata is removed
#[test]
fn test_normalize_withHeaderMetadata_shouldDropWholeHeaderBlock() {
    let raw = "WEBVTT - Episode 1\nKind: captions\nLanguage: tr\nX-TIMESTAMP-MAP=LOCAL:00:00:00.000,MPEGTS:0\n\n00:00:00.000 --> 00:00:01.000\nMerhaba\n";
    assert_eq!(normalize(raw), "Merhaba");
}
