/*!
 * Prompt template for narration generation.
 */

/// Instruction sent to the text generator. Placeholders are replaced by
/// `build_translation_prompt`.
pub const NARRATION_TEMPLATE: &str = r#"Translate the following {source_language} transcript into {target_language}. Work only from the spoken content and produce a coherent, meaningful narration in plain text.

Transcript:
{transcript}

Instructions:
1. Translate the content accurately.
2. Keep the tone and register of the original speech.
3. If the content is inappropriate or offensive, write a neutral summary of it instead of refusing.
4. Do not use HTML or XML tags, markup, special formatting or control characters.
5. If you cannot translate or summarize the content for any reason, reply with a short message saying so. Never reply with an empty answer."#;

/// Render the narration prompt for a transcript
pub fn build_translation_prompt(transcript: &str, source_language: &str, target_language: &str) -> String {
    NARRATION_TEMPLATE
        .replace("{source_language}", &source_language_label(source_language))
        .replace("{target_language}", target_language.trim())
        .replace("{transcript}", transcript)
}

/// English name for a caption language code, or the code itself
fn source_language_label(code: &str) -> String {
    crate::language_utils::get_language_name(crate::language_utils::primary_subtag(code))
        .unwrap_or_else(|_| code.to_string())
}
