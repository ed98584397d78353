/*!
 * Tests for video reference parsing
 */

use vidnarrate::errors::{ErrorKind, PipelineError};
use vidnarrate::video_ref::{extract_video_id, VideoReference};

/// Test the URL shapes people paste
#[test]
fn test_extract_video_id_withCommonUrlShapes_shouldFindId() {
    let cases = [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "http://youtube.com/watch?v=dQw4w9WgXcQ",
        "youtube.com/watch?v=dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ",
        "https://www.youtube.com/embed/dQw4w9WgXcQ",
        "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ",
        "https://www.youtube.com/v/dQw4w9WgXcQ",
        "  https://youtu.be/dQw4w9WgXcQ  ",
    ];

    for url in cases {
        assert_eq!(extract_video_id(url).as_deref(), Some("dQw4w9WgXcQ"), "url: {}", url);
    }
}

/// Test references that carry no id
#[test]
fn test_extract_video_id_withGarbage_shouldReturnNone() {
    assert_eq!(extract_video_id("not-a-video"), None);
    assert_eq!(extract_video_id("https://example.com/watch?v=dQw4w9WgXcQ"), None);
    assert_eq!(extract_video_id("https://youtu.be/short"), None);
    assert_eq!(extract_video_id(""), None);
}

/// Test parsing keeps the trimmed URL and the id
#[test]
fn test_parse_withValidUrl_shouldKeepUrlAndId() {
    let reference = VideoReference::parse(" https://youtu.be/dQw4w9WgXcQ ").unwrap();
    assert_eq!(reference.url(), "https://youtu.be/dQw4w9WgXcQ");
    assert_eq!(reference.video_id(), "dQw4w9WgXcQ");
}

/// Test that empty and unrecognizable references are malformed input
#[test]
fn test_parse_withEmptyOrInvalid_shouldBeMalformedInput() {
    for raw in ["", "   ", "not-a-video"] {
        let error = VideoReference::parse(raw).unwrap_err();
        assert!(matches!(error, PipelineError::MalformedInput(_)));
        assert_eq!(error.kind(), ErrorKind::MalformedInput);
    }
}
