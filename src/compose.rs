//! Mnemonic-plan generation and provider payload construction.

use crate::completion::CompletionClient;
use crate::config::Settings;
use crate::error::MelodyError;
use crate::types::{GenerationPayload, DEFAULT_TRACK_TITLE};

/// Providers cap the lyrics field; longer text is truncated before
/// submission.
pub const MAX_LYRICS_CHARS: usize = 5000;

/// Style string forwarded to the provider with every payload.
const SONG_STYLE: &str = "bright educational jingle, clear diction, playful synth pop, \
memorable hook, repetition for easy memorisation";

const COMPOSER_SYSTEM: &str = "You are a memory-aid composer for learners. \
Design rhythm, melody, and repetition so the given study text becomes easy \
and fun to memorize. Answer concisely but concretely.";

/// Builds the structured melody guide for a piece of study text.
///
/// The numbered output format matters downstream: section 5 is where
/// [`crate::lyrics::extract_final_lyrics`] looks for the singable lyrics.
pub async fn build_mnemonic_plan(
    completion: &CompletionClient,
    study_text: &str,
) -> Result<String, MelodyError> {
    let prompt = format!(
        "Create a melody guide so the following study text can be memorized quickly.\n\n\
[Study text]\n{study_text}\n\n\
[Output format]\n\
1) 3-5 summary points (the core units to memorize)\n\
2) Recommended rhythm/tempo/meter (e.g. 4/4, 90 BPM, swing)\n\
3) Pitch guide (one line of solfege or scale degrees, two if needed)\n\
4) Repetition structure and highlights (chorus, call-and-response)\n\
5) Final singing guide lyrics (adapt the study text but keep its meaning, 4-8 lines)\n\
6) One bonus memory tip\n\n\
Rules:\n\
- The key terms of the study text must appear in the singing guide.\n\
- Keep pitch movement stepwise so beginners can follow along.\n\
- Fill in the format above and output nothing else."
    );

    completion.complete(COMPOSER_SYSTEM, &prompt, 0.5).await
}

/// Assembles the outbound payload from the chosen lyrics, applying the
/// provider length limit.
pub fn build_payload(lyrics: &str, settings: &Settings) -> GenerationPayload {
    GenerationPayload {
        lyrics: truncate_lyrics(lyrics, MAX_LYRICS_CHARS),
        style: SONG_STYLE.to_string(),
        title: DEFAULT_TRACK_TITLE.to_string(),
        model: settings.song_model.clone(),
        instrumental: false,
        callback_url: settings.callback_url.clone(),
    }
}

/// Truncates lyrics to `max_chars`, preferring to end on a line or
/// sentence boundary when one exists within the last 20% of the limit.
pub fn truncate_lyrics(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut_at = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let cut = &text[..cut_at];

    // Boundary positions are byte offsets of ASCII characters, so slicing
    // at them stays on a char boundary.
    let line_break = cut.rfind('\n');
    let sentence_end = cut.rfind(". ").map(|i| i + 1);
    let boundary = match (line_break, sentence_end) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };

    let floor = cut.len() - cut.len() / 5;
    match boundary {
        Some(i) if i >= floor => cut[..i].trim_end().to_string(),
        _ => cut.trim_end().to_string(),
    }
}
