//! Speech-part extraction.
//!
//! Scripts carry visual directions and markdown formatting for the editor;
//! none of it may reach the TTS provider. This strips everything that is
//! not meant to be spoken.

use crate::util::static_regex;
use regex::Regex;
use std::sync::OnceLock;

static VISUAL_DIRECTION: OnceLock<Regex> = OnceLock::new();
static NARRATOR_PREFIX: OnceLock<Regex> = OnceLock::new();
static MARKDOWN_HEADER: OnceLock<Regex> = OnceLock::new();
static HORIZONTAL_RULE: OnceLock<Regex> = OnceLock::new();
static BOLD_MARKUP: OnceLock<Regex> = OnceLock::new();
static PARENTHETICAL: OnceLock<Regex> = OnceLock::new();
static END_TAG: OnceLock<Regex> = OnceLock::new();
static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();

/// Extracts the spoken text from a script.
///
/// Removes `[영상: …]`/`[Visual: …]` directions, narrator prefixes,
/// markdown headers and rules, bold markup (keeping the text),
/// parenthesized stage directions, and `[end]` tags, then normalizes
/// quotes and blank lines.
#[must_use]
pub fn extract_speech_parts(script: &str) -> String {
    let text = static_regex(&VISUAL_DIRECTION, r"(?i)\[(?:영상|visual|video)\s*:[^\]]*\]")
        .replace_all(script, "");
    let text = static_regex(&NARRATOR_PREFIX, r"(?i)(?:narrator|내레이터)\s*:\s*")
        .replace_all(&text, "");
    let text = static_regex(&MARKDOWN_HEADER, r"(?m)^#{1,6}\s+.*$").replace_all(&text, "");
    let text = static_regex(&HORIZONTAL_RULE, r"(?m)^-{3,}\s*$").replace_all(&text, "");
    let text = static_regex(&BOLD_MARKUP, r"\*\*([^*]*)\*\*").replace_all(&text, "$1");
    let text = static_regex(&PARENTHETICAL, r"\([^)]*\)").replace_all(&text, "");
    let text = static_regex(&END_TAG, r"(?i)\[end\]").replace_all(&text, "");

    let text = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static_regex(&BLANK_RUNS, r"\n\s*\n")
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}
