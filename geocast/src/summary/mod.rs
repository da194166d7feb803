//! Run summary rendering.
//!
//! The summary is the user-facing account of the run: what was produced,
//! per-stage success/failure counts, and — most importantly — whether any
//! stage fell back to degraded output, so quality expectations are explicit.

use crate::pipeline::RunReport;
use std::fmt::Write as _;

/// Average narration speed used for the estimated play time.
const CHARS_PER_MINUTE: f64 = 360.0;

/// Renders the run report as a human-readable summary document.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn render_report(report: &RunReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# 프로젝트 요약: {}", report.topic);
    let _ = writeln!(out);
    let _ = writeln!(out, "## 기본 정보");
    let _ = writeln!(out, "- 실행 ID: {}", report.run_id);
    let _ = writeln!(out, "- 시작: {}", report.started_at.to_rfc3339());
    let _ = writeln!(out, "- 처리 시간: {:.1}초", report.elapsed_secs());
    let _ = writeln!(
        out,
        "- 품질 상태: {}",
        if report.is_degraded() {
            "일부 단계가 대체 출력으로 저하됨"
        } else {
            "정상"
        }
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## 단계별 결과");
    for stage in &report.stages {
        let mut line = format!(
            "- {}: {}/{} 성공",
            stage.phase, stage.succeeded, stage.attempted
        );
        if stage.failed > 0 {
            let _ = write!(line, ", {} 실패", stage.failed);
        }
        if stage.degraded {
            line.push_str(" [저하됨]");
        }
        if let Some(detail) = &stage.detail {
            let _ = write!(line, " ({detail})");
        }
        let _ = writeln!(out, "{line}");
    }
    let _ = writeln!(out);

    if !report.scripts.is_empty() {
        let _ = writeln!(out, "## 생성된 스크립트");
        for script in report.scripts.iter() {
            let chars = script.char_count();
            let minutes = chars as f64 / CHARS_PER_MINUTE;
            let _ = writeln!(
                out,
                "- {}: {}자 (예상 재생 시간 약 {:.0}분)",
                script.content_type,
                chars,
                minutes.max(1.0)
            );
        }
        let _ = writeln!(out);
    }

    if !report.audio.is_empty() {
        let _ = writeln!(out, "## 오디오");
        for audio in &report.audio {
            let mut line = format!(
                "- {}: {} ({}개 청크",
                audio.content_type,
                audio.path.display(),
                audio.chunk_count
            );
            if audio.failed_chunks > 0 {
                let _ = write!(line, ", {}개 누락", audio.failed_chunks);
            }
            line.push(')');
            if audio.combine_fallback {
                line.push_str(" [결합 실패, 첫 청크만 사용]");
            }
            let _ = writeln!(out, "{line}");
        }
        let _ = writeln!(out);
    }

    if !report.subtitles.is_empty() {
        let _ = writeln!(out, "## 자막");
        for subtitle in &report.subtitles {
            let _ = writeln!(
                out,
                "- {}: {} ({}개 자막{})",
                subtitle.content_type,
                subtitle.path.display(),
                subtitle.cue_count,
                if subtitle.estimated_timing {
                    ", 추정 타이밍"
                } else {
                    ""
                }
            );
        }
        let _ = writeln!(out);
    }

    if let Some(media) = &report.media {
        let _ = writeln!(out, "## 미디어 제안");
        let _ = writeln!(
            out,
            "- media/media_suggestions.txt{}",
            if media.is_degraded() {
                " [기본 제안으로 대체됨]"
            } else {
                ""
            }
        );
        if media.fallback_elements > 0 {
            let _ = writeln!(out, "- 기본값으로 대체된 추가 요소: {}개", media.fallback_elements);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Phase, StageReport};
    use crate::script::{ContentType, Script, ScriptSet};
    use chrono::Utc;
    use uuid::Uuid;

    fn minimal_report() -> RunReport {
        let mut scripts = ScriptSet::new();
        scripts.insert(Script::new(ContentType::Longform, "본문.".repeat(100)));
        RunReport {
            run_id: Uuid::new_v4(),
            topic: "북극 항로".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            stages: vec![
                StageReport::single(Phase::SourcesParsed, false, None),
                StageReport::skipped(Phase::MediaSuggested, "no long-form script"),
            ],
            scripts,
            audio: Vec::new(),
            subtitles: Vec::new(),
            media: None,
        }
    }

    #[test]
    fn test_summary_lists_stages_and_scripts() {
        let summary = render_report(&minimal_report());
        assert!(summary.contains("# 프로젝트 요약: 북극 항로"));
        assert!(summary.contains("sources_parsed: 1/1 성공"));
        assert!(summary.contains("media_suggested: 0/0 성공 (no long-form script)"));
        assert!(summary.contains("longform"));
    }

    #[test]
    fn test_degraded_stage_is_flagged() {
        let mut report = minimal_report();
        report.stages[0] = StageReport::single(Phase::Integrated, true, Some("llm down".into()));
        let summary = render_report(&report);
        assert!(summary.contains("[저하됨]"));
        assert!(summary.contains("일부 단계가 대체 출력으로 저하됨"));
    }
}
