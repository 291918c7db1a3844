use melody_learning::compose::{truncate_lyrics, MAX_LYRICS_CHARS};
use melody_learning::lyrics::{extract_final_lyrics, lyrics_from_plan};

#[test]
fn short_lyrics_pass_through_untouched() {
    let text = "two short lines\nof lyrics";
    assert_eq!(truncate_lyrics(text, MAX_LYRICS_CHARS), text);
}

#[test]
fn overlong_lyrics_are_cut_at_a_line_boundary() {
    // 6000 chars of 10-char lines against the 5000 limit.
    let line = "la la laa\n";
    let text = line.repeat(600);
    assert_eq!(text.chars().count(), 6000);

    let truncated = truncate_lyrics(&text, MAX_LYRICS_CHARS);

    assert!(truncated.chars().count() <= MAX_LYRICS_CHARS);
    assert!(text.starts_with(&truncated));
    // The cut landed on a line boundary: the next original char is the
    // newline that ended the last kept line.
    assert_eq!(text.as_bytes()[truncated.len()], b'\n');
}

#[test]
fn overlong_lyrics_prefer_a_sentence_boundary() {
    let sentence = "Mitochondria make the energy. ";
    let text = sentence.repeat(250); // 7500 chars, no newlines

    let truncated = truncate_lyrics(&text, MAX_LYRICS_CHARS);

    assert!(truncated.chars().count() <= MAX_LYRICS_CHARS);
    assert!(truncated.ends_with('.'), "ends with {:?}", truncated.chars().last());
}

#[test]
fn a_hard_cut_happens_when_no_boundary_is_near_the_limit() {
    let text = "a".repeat(6000);
    let truncated = truncate_lyrics(&text, MAX_LYRICS_CHARS);
    assert_eq!(truncated.chars().count(), MAX_LYRICS_CHARS);
}

#[test]
fn boundaries_outside_the_last_fifth_are_ignored() {
    // One newline early on, then an unbroken run: the newline is far below
    // 80% of the limit, so the cut is hard.
    let text = format!("short first line\n{}", "b".repeat(6000));
    let truncated = truncate_lyrics(&text, MAX_LYRICS_CHARS);
    assert_eq!(truncated.chars().count(), MAX_LYRICS_CHARS);
}

#[test]
fn truncation_respects_multibyte_characters() {
    let text = "라".repeat(6000);
    let truncated = truncate_lyrics(&text, MAX_LYRICS_CHARS);
    assert_eq!(truncated.chars().count(), MAX_LYRICS_CHARS);
}

const PLAN: &str = "\
1) Key points
- chlorophyll absorbs light
- water splits into oxygen
2) Rhythm: 4/4, 90 BPM
3) Pitch: do re mi fa sol
4) Repetition: chorus after each verse
5) Final singing guide lyrics
Chlorophyll catches the light,
Water splits and oxygen flies,
Sugar grows as day turns bright.
6) Bonus tip: hum it on the way to school
";

#[test]
fn final_lyrics_are_extracted_from_section_five() {
    let lyrics = extract_final_lyrics(PLAN).unwrap();
    assert!(lyrics.starts_with("Chlorophyll catches the light,"));
    assert!(lyrics.ends_with("Sugar grows as day turns bright."));
    assert!(!lyrics.contains("Bonus"));
    assert!(!lyrics.contains("6)"));
}

#[test]
fn section_five_may_be_terminated_by_a_bonus_line() {
    let plan = PLAN.replace("6) Bonus tip:", "Bonus tip:");
    let lyrics = extract_final_lyrics(&plan).unwrap();
    assert!(!lyrics.to_lowercase().contains("bonus"));
}

#[test]
fn section_five_at_the_end_of_the_plan_is_extracted() {
    let plan = "\
1) Points
2) Rhythm
3) Pitch
4) Structure
5) Final singing guide lyrics
Only line of song";
    assert_eq!(extract_final_lyrics(plan).unwrap(), "Only line of song");
}

#[test]
fn dotted_section_numbering_is_accepted() {
    let plan = PLAN.replace("5)", "5.").replace("6)", "6.");
    let lyrics = extract_final_lyrics(&plan).unwrap();
    assert!(lyrics.starts_with("Chlorophyll"));
}

#[test]
fn a_plan_without_lyrics_yields_none() {
    assert_eq!(extract_final_lyrics("just some prose with no sections"), None);
    assert_eq!(extract_final_lyrics(""), None);
}

#[test]
fn plan_extraction_falls_back_to_the_study_text() {
    let study_text = "the raw study text";
    assert_eq!(lyrics_from_plan("no sections here", study_text), study_text);
    assert!(lyrics_from_plan(PLAN, study_text).starts_with("Chlorophyll"));
}
