//! Parsed-source text cleanup.
//!
//! Web and PDF extractions arrive with boilerplate (cookie banners,
//! subscription prompts, share buttons) and duplicated blocks; analysis
//! quality depends on stripping these before any LLM sees the text.

use crate::util::static_regex;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static EXCESS_NEWLINES: OnceLock<Regex> = OnceLock::new();
static EXCESS_SPACES: OnceLock<Regex> = OnceLock::new();
static BOILERPLATE: OnceLock<Regex> = OnceLock::new();

fn excess_newlines() -> &'static Regex {
    static_regex(&EXCESS_NEWLINES, r"\n{3,}")
}

fn excess_spaces() -> &'static Regex {
    static_regex(&EXCESS_SPACES, r"[ \t]{2,}")
}

fn boilerplate() -> &'static Regex {
    static_regex(
        &BOILERPLATE,
        r"(?i)쿠키를 사용[^\n]*?동의|Subscribe to[^\n]*?newsletter|구독[^\n]*?뉴스레터|Published:[^\n]*?\d{4}|Last modified on[^\n]*?\d{4}|Share on (?:Twitter|Facebook|LinkedIn)|\d+ shares|©[^\n]*?All rights reserved|Terms of (?:use|service)|Privacy Policy|All Rights Reserved|Please enable JavaScript|You need to enable JavaScript|ADVERTISEMENT|Sponsored Content|Click here to view",
    )
}

/// Cleans and normalizes parsed source text.
///
/// Squeezes whitespace, strips common boilerplate lines, and removes
/// duplicated long lines (frequent in PDF extractions where headers repeat
/// per page).
#[must_use]
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = excess_newlines().replace_all(text, "\n\n");
    let text = excess_spaces().replace_all(&text, " ");
    let text = boilerplate().replace_all(&text, "");

    // Repeated page headers/footers show up as identical long lines.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut lines = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.chars().count() > 20 && !seen.insert(line) {
            continue;
        }
        lines.push(line);
    }

    let joined = lines.join("\n");
    excess_newlines()
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_squeezes_whitespace() {
        let cleaned = clean_text("하나   둘\n\n\n\n셋");
        assert_eq!(cleaned, "하나 둘\n\n셋");
    }

    #[test]
    fn test_strips_boilerplate() {
        let cleaned = clean_text("분석 본문입니다.\nADVERTISEMENT\nSubscribe to our newsletter\n이어지는 본문.");
        assert!(!cleaned.contains("ADVERTISEMENT"));
        assert!(!cleaned.to_lowercase().contains("subscribe"));
        assert!(cleaned.contains("분석 본문입니다."));
        assert!(cleaned.contains("이어지는 본문."));
    }

    #[test]
    fn test_deduplicates_repeated_long_lines() {
        let header = "국제정세 주간 브리핑 2024년 3월호 제12권";
        let text = format!("{header}\n1페이지 내용\n{header}\n2페이지 내용");
        let cleaned = clean_text(&text);
        assert_eq!(cleaned.matches(header).count(), 1);
        assert!(cleaned.contains("1페이지 내용"));
        assert!(cleaned.contains("2페이지 내용"));
    }

    #[test]
    fn test_short_lines_survive_repetition() {
        let cleaned = clean_text("예.\n예.\n예.");
        assert_eq!(cleaned.matches("예.").count(), 3);
    }
}
