//! Prompt builders for the analysis and scripting calls.
//!
//! Wording is deliberately compact; the pipeline treats prompts as opaque
//! strings and callers may swap these builders out entirely.

use crate::script::ContentType;

/// Prompt for the per-source expert analysis.
#[must_use]
pub fn source_analysis(index: usize, topic: &str, text: &str) -> String {
    format!(
        "당신은 국제관계, 지정학, 세계사 분야의 전문가입니다.\n\
         소스 #{number}의 내용을 주제 \"{topic}\"의 관점에서 한국어로 심층 분석해 주세요.\n\
         핵심 요점과 지정학적 의미, 역사적 맥락, 주요 관련국의 이해관계, \
         이론적 분석틀, 미래 전망을 포함해야 합니다.\n\n\
         소스 내용:\n{text}",
        number = index + 1,
    )
}

/// Prompt for the cross-source integrated analysis.
#[must_use]
pub fn integration(topic: &str, structure: &str, analyses: &str) -> String {
    format!(
        "당신은 국제관계, 지정학, 세계사 분야의 전문가입니다.\n\
         주제: {topic}\n구조: {structure}\n\n\
         다음 개별 소스 분석들을 바탕으로 주제에 관한 종합적인 통합 분석을 \
         한국어로 작성해 주세요. 소스 간 공통점과 차이점, 종합적인 지정학적 \
         함의를 포함해야 합니다.\n\n{analyses}"
    )
}

/// Prompt for one script variant.
#[must_use]
pub fn script(
    content_type: ContentType,
    topic: &str,
    structure: &str,
    additional_instructions: &str,
    integrated_analysis: &str,
) -> String {
    let length_guide = match content_type {
        ContentType::Longform => "2700-3300자 분량의 롱폼 유튜브 스크립트",
        ContentType::Shortform(_) => "250-400자 분량의 숏폼 스크립트",
    };
    let variant_note = match content_type {
        ContentType::Longform => String::new(),
        ContentType::Shortform(n) => {
            format!("\n숏폼 #{n}: 통합 분석에서 서로 다른 각도를 골라 독립적인 영상으로 만드세요.")
        }
    };
    format!(
        "당신은 국제관계 전문 유튜브 채널의 작가입니다.\n\
         주제 \"{topic}\"에 대해 {length_guide}를 자연스러운 한국어로 작성하세요.\n\
         구조: {structure}. 영상 지시는 [영상: ...] 형식으로 표기하세요.{variant_note}\n\
         {additional_instructions}\n\n통합 분석:\n{integrated_analysis}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_analysis_numbers_from_one() {
        let prompt = source_analysis(0, "북극 항로", "본문");
        assert!(prompt.contains("소스 #1"));
        assert!(prompt.contains("북극 항로"));
    }

    #[test]
    fn test_script_prompt_varies_by_content_type() {
        let long = script(ContentType::Longform, "주제", "서론-본론-결론", "", "분석");
        let short = script(ContentType::Shortform(2), "주제", "서론-본론-결론", "", "분석");
        assert!(long.contains("롱폼"));
        assert!(short.contains("숏폼 #2"));
    }
}
