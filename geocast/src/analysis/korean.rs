//! Korean text post-processing for generated scripts.
//!
//! LLM output mixes typographic punctuation and occasionally detaches
//! particles from their nouns; both read badly and trip up TTS.

use crate::util::static_regex;
use regex::Regex;
use std::sync::OnceLock;

static EXCESS_NEWLINES: OnceLock<Regex> = OnceLock::new();
static EXCESS_SPACES: OnceLock<Regex> = OnceLock::new();
static SPACE_BEFORE_NEWLINE: OnceLock<Regex> = OnceLock::new();
static DETACHED_PARTICLE: OnceLock<Regex> = OnceLock::new();

/// Normalizes punctuation and spacing in Korean script text.
#[must_use]
pub fn process_korean_text(text: &str) -> String {
    let text = text
        .replace('\u{2026}', "...")
        .replace('\u{2024}', ".")
        .replace('\u{3008}', "<")
        .replace('\u{3009}', ">")
        .replace(['\u{300c}', '\u{300d}'], "\"")
        .replace(['\u{300e}', '\u{300f}'], "'")
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let text = static_regex(&EXCESS_NEWLINES, r"\n{3,}").replace_all(&text, "\n\n");
    let text = static_regex(&EXCESS_SPACES, r" {2,}").replace_all(&text, " ");
    let text =
        static_regex(&SPACE_BEFORE_NEWLINE, r"([.!?]) +\n").replace_all(&text, "${1}\n");

    // "-습니다 만" reads as two words; rejoin the common detached endings.
    let text = text.replace("습니다 만", "습니다만").replace("입니다 만", "입니다만");

    // Rejoin single-syllable particles split from their noun.
    let text = static_regex(&DETACHED_PARTICLE, r"(\S) ([을를이가는도])(\s|$)")
        .replace_all(&text, "${1}${2}${3}");

    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_punctuation_normalization() {
        assert_eq!(
            process_korean_text("\u{201c}전략적 모호성\u{201d}\u{2026} 그리고 \u{300c}균형\u{300d}"),
            "\"전략적 모호성\"... 그리고 \"균형\""
        );
    }

    #[test]
    fn test_newline_and_space_squeeze() {
        assert_eq!(process_korean_text("첫 단락.\n\n\n\n둘째  단락."), "첫 단락.\n\n둘째 단락.");
    }

    #[test]
    fn test_detached_ending_rejoined() {
        assert_eq!(
            process_korean_text("중요합니다 만 한계도 있습니다."),
            "중요합니다만 한계도 있습니다."
        );
    }

    #[test]
    fn test_detached_particle_rejoined() {
        assert_eq!(process_korean_text("조약 을 체결했다."), "조약을 체결했다.");
        assert_eq!(process_korean_text("러시아 가 반발했다."), "러시아가 반발했다.");
    }

    #[test]
    fn test_normal_spacing_untouched() {
        let text = "한국과 미국은 동맹이다.";
        assert_eq!(process_korean_text(text), text);
    }
}
