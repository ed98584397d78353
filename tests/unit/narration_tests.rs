/*!
 * Tests for narration generation
 */

use std::sync::Arc;

use vidnarrate::errors::{GenerationError, ProviderError};
use vidnarrate::narration::{build_translation_prompt, sanitize, NarrationGenerator};
use vidnarrate::providers::mock::{MockBehavior, MockTextGenerator};
use vidnarrate::retry::RetryPolicy;

const FALLBACK: &str = "Özet oluşturulamadı. Lütfen tekrar deneyin.";

fn narration_for(mock: &MockTextGenerator) -> NarrationGenerator {
    NarrationGenerator::new(Arc::new(mock.clone()), "en")
        .with_timeout_secs(5)
        .with_fallback_text(FALLBACK)
}

/// Test the happy path and the prompt that was sent
#[tokio::test]
async fn test_generate_withWorkingProvider_shouldReturnNarration() {
    let mock = MockTextGenerator::working().with_response("  Merhaba dünya.  ");

    let narration = narration_for(&mock).generate("hello world", "Türkçe").await.unwrap();

    assert_eq!(narration, "Merhaba dünya.");
    let prompts = mock.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0], build_translation_prompt("hello world", "en", "Türkçe"));
    assert!(prompts[0].contains("into Türkçe"));
}

/// Test that an empty answer is replaced by the fallback text
#[tokio::test]
async fn test_generate_withEmptyResponse_shouldUseFallback() {
    let mock = MockTextGenerator::empty();

    let narration = narration_for(&mock).generate("hello", "tr").await.unwrap();

    assert_eq!(narration, FALLBACK);
    assert_eq!(mock.request_count(), 1);
}

/// Test that whitespace-only answers count as empty
#[tokio::test]
async fn test_generate_withWhitespaceResponse_shouldUseFallback() {
    let mock = MockTextGenerator::working().with_response(" \n\t ");

    let narration = narration_for(&mock).generate("hello", "tr").await.unwrap();

    assert_eq!(narration, FALLBACK);
}

/// Test that provider markup is stripped
#[tokio::test]
async fn test_generate_withMarkupResponse_shouldSanitize() {
    let mock = MockTextGenerator::new(MockBehavior::Markup).with_response("Merhaba");

    let narration = narration_for(&mock).generate("hello", "tr").await.unwrap();

    assert_eq!(narration, "pMerhaba/p");
    assert!(!narration.contains('<'));
}

/// Test that an answer made only of markup comes back empty
#[tokio::test]
async fn test_generate_withOnlyBrackets_shouldReturnEmptySentinel() {
    let mock = MockTextGenerator::working().with_response("<<>>");

    let narration = narration_for(&mock).generate("hello", "tr").await.unwrap();

    assert!(narration.is_empty());
}

/// Test that long transcripts are cut before prompting
#[tokio::test]
async fn test_generate_withLongTranscript_shouldTruncateInput() {
    let mock = MockTextGenerator::working();
    let transcript = "ş".repeat(120);

    narration_for(&mock)
        .with_max_input_chars(100)
        .generate(&transcript, "tr")
        .await
        .unwrap();

    let prompt = &mock.prompts()[0];
    assert!(prompt.contains(&"ş".repeat(100)));
    assert!(!prompt.contains(&"ş".repeat(101)));
}

/// Test that transient failures are retried
#[tokio::test]
async fn test_generate_withIntermittentProvider_shouldRetry() {
    // Requests 2, 4, ... fail with a 503
    let mock = MockTextGenerator::intermittent(2);
    let generator = narration_for(&mock).with_retry(RetryPolicy::new(2, 1));

    assert!(generator.generate("first", "tr").await.is_ok());
    let narration = generator.generate("second", "tr").await.unwrap();

    assert_eq!(narration, "Bu videoda bir şarkı söyleniyor.");
    assert_eq!(mock.request_count(), 3);
}

/// Test that authentication failures are not retried
#[tokio::test]
async fn test_generate_withUnauthorizedProvider_shouldFailWithoutRetry() {
    let mock = MockTextGenerator::new(MockBehavior::Unauthorized);
    let generator = narration_for(&mock).with_retry(RetryPolicy::new(3, 1));

    let error = generator.generate("hello", "tr").await.unwrap_err();

    assert!(matches!(error, GenerationError::Provider(ProviderError::AuthenticationError(_))));
    assert_eq!(mock.request_count(), 1);
}

/// Test that persistent server errors exhaust the retry budget
#[tokio::test]
async fn test_generate_withFailingProvider_shouldGiveUpAfterRetries() {
    let mock = MockTextGenerator::failing();
    let generator = narration_for(&mock).with_retry(RetryPolicy::new(2, 1));

    let error = generator.generate("hello", "tr").await.unwrap_err();

    assert!(matches!(error, GenerationError::Provider(ProviderError::ApiError { status_code: 500, .. })));
    assert_eq!(mock.request_count(), 3);
}

/// Test the per-call timeout
#[tokio::test]
async fn test_generate_withSlowProvider_shouldTimeOut() {
    let mock = MockTextGenerator::new(MockBehavior::Slow { delay_ms: 3_000 });
    let generator = narration_for(&mock).with_timeout_secs(1);

    let error = generator.generate("hello", "tr").await.unwrap_err();

    assert!(matches!(error, GenerationError::Provider(ProviderError::Timeout(1))));
}

/// Test sanitization on its own
#[test]
fn test_sanitize_shouldKeepLineBreaksAndDropControls() {
    assert_eq!(sanitize("satır bir\nsatır iki\u{0}"), "satır bir\nsatır iki");
    assert_eq!(sanitize("\u{1b}[0m<i>ok</i>"), "[0miok/i");
}

/// Test that tab separated words stay separate
#[test]
fn test_sanitize_withTabsAndCarriageReturns_shouldSeparateWords() {
    assert_eq!(sanitize("Merhaba\tdünya"), "Merhaba dünya");
    assert_eq!(sanitize("Bu video\r\nçok\u{b}güzel"), "Bu video\nçok güzel");
}
