//! Schema normalization for heterogeneous provider responses.
//!
//! Providers disagree on the field names for task ids, statuses, and result
//! containers, and change response shape between response modes. Rather than
//! a strict schema, every lookup here is an ordered list of candidate paths
//! applied first-match-wins, so tolerating a new quirk is a one-line
//! addition to a `const` table.

use std::collections::HashSet;

use serde_json::Value;

use crate::types::{TaskState, Track, DEFAULT_TRACK_TITLE};

/// Candidate paths for the task identifier in a Suno submission response.
pub(crate) const SUNO_TASK_ID_PATHS: &[&[&str]] = &[
    &["data", "taskId"],
    &["data", "task_id"],
    &["data", "workId"],
    &["taskId"],
    &["task_id"],
    &["workId"],
];

/// Candidate paths for the task identifier in a Mureka submission response.
pub(crate) const MUREKA_TASK_ID_PATHS: &[&[&str]] = &[&["id"], &["data", "id"], &["task_id"]];

/// Candidate paths for the status string in a poll response.
pub(crate) const STATUS_PATHS: &[&[&str]] = &[
    &["data", "status"],
    &["status"],
    &["data", "taskStatus"],
    &["taskStatus"],
];

/// Keys whose string value may directly be an audio URL.
const AUDIO_URL_KEYS: &[&str] = &[
    "audio_url",
    "song_url",
    "url",
    "audioUrl",
    "sourceAudioUrl",
    "streamAudioUrl",
];

/// Keys whose value is a list of track entries or bare URLs.
const TRACK_LIST_KEYS: &[&str] = &["audio_urls", "song_urls", "tracks"];

const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".m4a", ".aac"];

/// Walks `value` along `path`, returning the value at the end if every
/// segment resolves to an object member.
pub(crate) fn lookup_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Applies `paths` in order and returns the first non-empty string (or
/// stringified integer) found. Ids arrive as either type in the wild.
pub(crate) fn lookup_id(value: &Value, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| {
        let found = lookup_path(value, path)?;
        value_as_string(found).filter(|s| !s.is_empty())
    })
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extracts the raw status string from a poll response, if any.
pub fn extract_status(value: &Value) -> Option<&str> {
    STATUS_PATHS
        .iter()
        .find_map(|path| lookup_path(value, path).and_then(Value::as_str))
}

/// Maps a provider status string onto the canonical vocabulary.
///
/// Matches are case-sensitive: both providers are consistent about casing
/// within their own schema (Suno upper-case, Mureka lower-case).
pub fn canonical_status(raw: &str) -> Option<TaskState> {
    match raw {
        "SUCCESS" | "DONE" | "COMPLETED" | "completed" | "succeeded" => Some(TaskState::Succeeded),
        "FAILED" | "ERROR" | "failed" => Some(TaskState::Failed),
        _ => None,
    }
}

/// Recursively collects playable audio URLs from an arbitrarily nested
/// response tree. Duplicates are suppressed (first occurrence wins) and the
/// output follows first-discovery order, so the function is idempotent.
pub fn find_audio_urls(payload: &Value) -> Vec<String> {
    let mut collected = Vec::new();
    let mut seen = HashSet::new();
    walk_audio_urls(payload, &mut collected, &mut seen);
    collected
}

fn walk_audio_urls(value: &Value, out: &mut Vec<String>, seen: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if AUDIO_URL_KEYS.contains(&key.as_str()) {
                    if let Some(url) = audio_url_str(child) {
                        push_unique(url, out, seen);
                    }
                } else if TRACK_LIST_KEYS.contains(&key.as_str()) {
                    if let Value::Array(items) = child {
                        for item in items {
                            collect_from_track_item(item, out, seen);
                        }
                    }
                } else {
                    walk_audio_urls(child, out, seen);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_audio_urls(item, out, seen);
            }
        }
        _ => {}
    }
}

fn collect_from_track_item(item: &Value, out: &mut Vec<String>, seen: &mut HashSet<String>) {
    match item {
        Value::Object(map) => {
            for key in AUDIO_URL_KEYS {
                if let Some(url) = map.get(*key).and_then(audio_url_str) {
                    push_unique(url, out, seen);
                }
            }
        }
        other => {
            if let Some(url) = audio_url_str(other) {
                push_unique(url, out, seen);
            }
        }
    }
}

fn push_unique(url: &str, out: &mut Vec<String>, seen: &mut HashSet<String>) {
    if seen.insert(url.to_string()) {
        out.push(url.to_string());
    }
}

fn audio_url_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| looks_like_audio(s))
}

/// A string qualifies as an audio URL when it starts with `http` and
/// mentions a known audio extension. Substring match rather than suffix so
/// signed URLs with query strings still qualify.
pub(crate) fn looks_like_audio(value: &str) -> bool {
    let lowered = value.to_lowercase();
    lowered.starts_with("http") && AUDIO_EXTENSIONS.iter().any(|ext| lowered.contains(ext))
}

/// File extension for a downloaded artifact, inferred from the URL suffix.
pub(crate) fn infer_extension(url: &str) -> &'static str {
    let lowered = url.to_lowercase();
    for ext in ["mp3", "wav", "m4a", "aac"] {
        if lowered.ends_with(&format!(".{ext}")) {
            return ext;
        }
    }
    "mp3"
}

/// Extracts the status string and the normalized track list from a poll
/// response, tolerating the known container variants: the result blob may
/// live under `data.response.{sunoData,data,songs}`, `data.{sunoData,data}`,
/// or a top-level `result`; a lone object counts as a one-element list.
///
/// Never fails on well-formed-but-unrecognized input — partial responses are
/// expected mid-poll, and "nothing found" is the correct answer for them.
pub fn parse_status_and_tracks(value: &Value) -> (Option<String>, Option<Vec<Track>>) {
    let data_field = value.get("data").filter(|v| v.is_object());

    let status = extract_status(value).map(str::to_string);

    let raw = locate_result_blob(value, data_field);
    let items = raw.and_then(|blob| normalize_items(blob, data_field));

    (status, items)
}

fn locate_result_blob<'a>(value: &'a Value, data_field: Option<&'a Value>) -> Option<&'a Value> {
    if let Some(data) = data_field {
        if let Some(resp) = data.get("response").filter(|v| v.is_object()) {
            for key in ["sunoData", "data", "songs"] {
                if let Some(found) = resp.get(key).filter(|v| !v.is_null()) {
                    return Some(found);
                }
            }
        }
        for key in ["sunoData", "data"] {
            if let Some(found) = data.get(key).filter(|v| !v.is_null()) {
                return Some(found);
            }
        }
    }
    value.get("result").filter(|v| !v.is_null())
}

fn normalize_items(raw: &Value, data_field: Option<&Value>) -> Option<Vec<Track>> {
    let entries: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![raw],
        _ => return None,
    };

    let fallback_title = data_field
        .and_then(|d| d.get("title"))
        .and_then(Value::as_str);

    let tracks: Vec<Track> = entries
        .into_iter()
        .filter(|entry| entry.is_object())
        .map(|entry| track_from_entry(entry, fallback_title))
        .collect();

    if tracks.is_empty() {
        None
    } else {
        Some(tracks)
    }
}

fn track_from_entry(entry: &Value, fallback_title: Option<&str>) -> Track {
    let string_at = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| entry.get(key).and_then(value_as_string))
    };

    Track {
        id: string_at(&["id", "musicId", "songId"]),
        title: string_at(&["title"])
            .or_else(|| fallback_title.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_TRACK_TITLE.to_string()),
        audio_url: string_at(&["audioUrl", "sourceAudioUrl", "streamAudioUrl"]),
        image_url: string_at(&["imageUrl", "coverUrl"]),
    }
}

/// Builds a track list for responses with no recognized track container by
/// promoting every discovered audio URL to an anonymous track.
pub fn tracks_from_audio_urls(value: &Value) -> Vec<Track> {
    find_audio_urls(value)
        .into_iter()
        .map(|url| Track {
            id: None,
            title: DEFAULT_TRACK_TITLE.to_string(),
            audio_url: Some(url),
            image_url: None,
        })
        .collect()
}
