//! SRT cue model, timestamp formatting, and subtitle-line splitting.

use serde::{Deserialize, Serialize};

/// One numbered SRT subtitle entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrtCue {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Subtitle text.
    pub text: String,
}

impl SrtCue {
    /// Creates a cue.
    #[must_use]
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Formats seconds as an SRT timestamp (`HH:MM:SS,mmm`).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let millis = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Renders cues as an SRT document, numbering from 1.
#[must_use]
pub fn render(cues: &[SrtCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            cue.text
        ));
    }
    out
}

/// Splits a script into subtitle lines of at most `max_chars` characters.
///
/// Sentences are packed greedily; oversized sentences are split at word
/// boundaries.
#[must_use]
pub fn split_script_into_subtitles(script: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut subtitles = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in crate::script::split_into_sentences(script) {
        let sentence_len = sentence.chars().count();
        if current_len + sentence_len + usize::from(!current.is_empty()) <= max_chars {
            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(&sentence);
            current_len += sentence_len;
        } else {
            if !current.is_empty() {
                subtitles.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if sentence_len <= max_chars {
                current = sentence;
                current_len = sentence_len;
            } else {
                let mut parts = split_long_subtitle(&sentence, max_chars);
                if let Some(tail) = parts.pop() {
                    subtitles.extend(parts);
                    current_len = tail.chars().count();
                    current = tail;
                }
            }
        }
    }

    if !current.is_empty() {
        subtitles.push(current);
    }
    subtitles
}

/// Splits one long text into word-bounded parts of at most `max_chars`.
#[must_use]
pub fn split_long_subtitle(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len + word_len + usize::from(!current.is_empty()) <= max_chars {
            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        } else {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            current = word.to_string();
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }

    if parts.is_empty() {
        // No whitespace at all: hard cut on a char boundary.
        return vec![text.chars().take(max_chars).collect()];
    }
    parts
}

/// Finds the script sentence best matching a recognized fragment.
///
/// Exact containment wins (shortest match); otherwise word-set Jaccard
/// similarity with a floor of 0.15.
#[must_use]
pub fn find_best_match<'a>(text: &str, candidates: &'a [String]) -> Option<&'a String> {
    if text.trim().is_empty() || candidates.is_empty() {
        return None;
    }

    let needle = text.to_lowercase();
    let exact: Option<&String> = candidates
        .iter()
        .filter(|candidate| candidate.to_lowercase().contains(&needle))
        .min_by_key(|candidate| candidate.chars().count());
    if exact.is_some() {
        return exact;
    }

    let text_words: std::collections::HashSet<String> =
        needle.split_whitespace().map(str::to_string).collect();
    if text_words.is_empty() {
        return None;
    }

    let mut best: Option<(&String, f64)> = None;
    for candidate in candidates {
        let candidate_words: std::collections::HashSet<String> = candidate
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if candidate_words.is_empty() {
            continue;
        }
        let common = text_words.intersection(&candidate_words).count();
        if common == 0 {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let score = common as f64 / text_words.union(&candidate_words).count() as f64;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    best.and_then(|(candidate, score)| (score > 0.15).then_some(candidate))
}
