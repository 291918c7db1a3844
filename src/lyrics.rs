//! Lyric generation and extraction.
//!
//! Lyrics for the song payload come from one of two places: a dedicated
//! completion call, or section 5 of the mnemonic plan. Plan extraction is
//! best-effort pattern matching over a model-generated document, so it
//! tries several patterns and falls back to the raw study text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::completion::CompletionClient;
use crate::error::MelodyError;

const LYRICIST_SYSTEM: &str = "You are a professional lyricist for educational songs. \
You turn study material into lyrics that are easy to sing and easy to remember.";

/// Ordered patterns for locating the "final singing guide lyrics" section
/// of a mnemonic plan. The plan format numbers its sections; section 5
/// carries the lyrics and section 6 (or a "Bonus" line) ends it.
static SECTION5_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)5[).]\s*final\s+singing\s+guide\s+lyrics[:\-]?\s*\n(.*?)(?:\n\s*6[).]|\n\s*bonus|\z)",
        r"(?is)5[).]\s*final\s+singing\s+guide[:\-]?\s*\n(.*?)(?:\n\s*6[).]|\n\s*bonus|\z)",
        r"(?is)5[).][^\n]*lyrics[^\n]*\n(.*?)(?:\n\s*6[).]|\n\s*bonus|\z)",
        r"(?is)final\s+singing\s+guide\s+lyrics[:\-]?\s*\n(.*?)(?:\n\s*(?:6[).]|bonus)|\z)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static SECTION5_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*5[).]").unwrap());
static SECTION_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(6[).]|bonus)").unwrap());
static EXCESS_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Generates standalone lyrics from study text with a dedicated completion
/// call, stripping meta lines (bracketed headers) from the reply.
pub async fn generate_lyrics(
    completion: &CompletionClient,
    study_text: &str,
) -> Result<String, MelodyError> {
    let prompt = format!(
        "Turn the following study text into song lyrics.\n\n\
[Study text]\n{study_text}\n\n\
[Requirements]\n\
- Cover every key point of the study material\n\
- Use natural sentences that are easy to sing\n\
- Keep it to roughly 4-12 lines\n\
- A repeated chorus helps\n\
- Use rhythmic phrasing so the learner can memorize it\n\n\
[Generated lyrics]"
    );

    let reply = completion.complete(LYRICIST_SYSTEM, &prompt, 0.7).await?;

    let cleaned: Vec<&str> = reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('[') && !line.starts_with('('))
        .collect();

    if cleaned.is_empty() {
        Ok(reply)
    } else {
        Ok(cleaned.join("\n"))
    }
}

/// Extracts the final singing guide lyrics (section 5) from a mnemonic
/// plan, or `None` when no pattern matches.
pub fn extract_final_lyrics(mnemonic_plan: &str) -> Option<String> {
    if mnemonic_plan.trim().is_empty() {
        return None;
    }

    for pattern in SECTION5_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(mnemonic_plan) {
            let lyrics = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if !lyrics.is_empty() {
                return Some(tidy(lyrics));
            }
        }
    }

    // Pattern matching failed; scan for the numbered section by line.
    let mut in_section = false;
    let mut collected: Vec<&str> = Vec::new();
    for line in mnemonic_plan.lines() {
        if SECTION5_START.is_match(line) {
            in_section = true;
            continue;
        }
        if in_section && SECTION_END.is_match(line) {
            break;
        }
        if in_section {
            let trimmed = line.trim();
            if !trimmed.is_empty() && !trimmed.to_lowercase().starts_with("final") {
                collected.push(trimmed);
            }
        }
    }

    if collected.is_empty() {
        None
    } else {
        Some(tidy(&collected.join("\n")))
    }
}

/// Lyrics from the plan, falling back to the raw study text when
/// extraction fails.
pub fn lyrics_from_plan(mnemonic_plan: &str, study_text: &str) -> String {
    extract_final_lyrics(mnemonic_plan).unwrap_or_else(|| study_text.to_string())
}

fn tidy(lyrics: &str) -> String {
    EXCESS_BLANK_LINES
        .replace_all(lyrics, "\n\n")
        .trim()
        .to_string()
}
