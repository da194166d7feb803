//! End-to-end pipeline tests against in-memory collaborators.

use super::{Collaborators, Phase, Pipeline, PipelineConfig};
use crate::errors::GeocastError;
use crate::exec::RetryPolicy;
use crate::sources::SourceSpec;
use crate::testing::{
    FailingTextGenerator, MemorySink, RecordingCombiner, SilentSynthesizer, StaticFetcher,
    StaticTextGenerator,
};
use std::sync::Arc;
use std::time::Duration;

fn long_source_text() -> String {
    "대만 해협을 둘러싼 긴장이 고조되고 있습니다. ".repeat(20)
}

fn collaborators(sink: Arc<MemorySink>) -> Collaborators {
    Collaborators {
        fetcher: Arc::new(StaticFetcher::new(long_source_text())),
        ocr: None,
        text_generator: Arc::new(StaticTextGenerator::new(
            "분석과 스크립트에 두루 쓰이는 생성 결과입니다. 내용이 이어집니다.",
        )),
        synthesizer: Arc::new(SilentSynthesizer),
        combiner: Arc::new(RecordingCombiner::new()),
        transcriber: None,
        sink,
    }
}

fn quick_config(topic: &str) -> PipelineConfig {
    PipelineConfig::new(topic)
        .with_retry(RetryPolicy::new().with_base_delay(Duration::from_millis(1)))
}

#[tokio::test]
async fn test_happy_path_produces_full_report() {
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::new(quick_config("대만 해협"), collaborators(sink.clone()));

    let sources = vec![
        SourceSpec::infer("https://example.com/one"),
        SourceSpec::infer("https://example.com/two"),
    ];
    let report = pipeline.run(sources).await.expect("run succeeds");

    assert!(!report.is_degraded());
    assert_eq!(report.scripts.len(), 3);
    assert_eq!(report.audio.len(), 3);

    for phase in [
        Phase::SourcesParsed,
        Phase::Analyzed,
        Phase::Integrated,
        Phase::Scripted,
        Phase::MediaSuggested,
        Phase::SpeechSynthesized,
        Phase::SubtitlesAligned,
        Phase::Summarized,
    ] {
        assert!(report.stage(phase).is_some(), "missing stage {phase}");
    }

    let parsed = report.stage(Phase::SourcesParsed).expect("stage");
    assert_eq!(parsed.succeeded, 2);

    assert!(sink.contains("sources/source_1.txt"));
    assert!(sink.contains("analysis/integrated_analysis.txt"));
    assert!(sink.contains("final_longform_script.txt"));
    assert!(sink.contains("media/media_suggestions.txt"));
    assert!(sink.contains("project_summary.txt"));
}

#[tokio::test]
async fn test_zero_valid_sources_is_fatal() {
    let sink = Arc::new(MemorySink::new());
    let mut collaborators = collaborators(sink);
    collaborators.fetcher = Arc::new(StaticFetcher::new("짧음"));
    let pipeline = Pipeline::new(quick_config("주제"), collaborators);

    let result = pipeline
        .run(vec![SourceSpec::infer("https://example.com")])
        .await;

    assert!(matches!(result, Err(GeocastError::NoValidSources)));
}

#[tokio::test]
async fn test_llm_outage_degrades_but_completes() {
    let sink = Arc::new(MemorySink::new());
    let mut collaborators = collaborators(sink.clone());
    collaborators.text_generator = Arc::new(FailingTextGenerator);
    let pipeline = Pipeline::new(quick_config("주제"), collaborators);

    let report = pipeline
        .run(vec![SourceSpec::infer("https://example.com")])
        .await
        .expect("run completes best-effort");

    assert!(report.is_degraded());
    assert!(report.stage(Phase::Analyzed).expect("stage").degraded);
    assert!(report.stage(Phase::Integrated).expect("stage").degraded);
    // No scripts could be generated, so the fork stages were skipped.
    assert!(report.scripts.is_empty());
    assert_eq!(report.stage(Phase::MediaSuggested).expect("stage").attempted, 0);
    assert_eq!(
        report.stage(Phase::SpeechSynthesized).expect("stage").attempted,
        0
    );
    // The summary still states what happened.
    assert!(sink.contains("project_summary.txt"));
    let summary = sink.read_string("project_summary.txt").expect("summary");
    assert!(summary.contains("저하"));
}

#[tokio::test]
async fn test_subtitles_without_transcriber_are_estimated() {
    let sink = Arc::new(MemorySink::new());
    let config = quick_config("주제").with_subtitles();
    let pipeline = Pipeline::new(config, collaborators(sink.clone()));

    let report = pipeline
        .run(vec![SourceSpec::infer("https://example.com")])
        .await
        .expect("run succeeds");

    let subtitle_stage = report.stage(Phase::SubtitlesAligned).expect("stage");
    assert_eq!(subtitle_stage.succeeded, report.audio.len());
    assert!(subtitle_stage.degraded);
    assert!(report.subtitles.iter().all(|file| file.estimated_timing));
    assert!(sink.contains("subtitles/longform.srt"));
}

#[tokio::test]
async fn test_custom_content_types_limit_outputs() {
    let sink = Arc::new(MemorySink::new());
    let config = quick_config("주제")
        .with_content_types(vec![crate::script::ContentType::Longform]);
    let pipeline = Pipeline::new(config, collaborators(sink.clone()));

    let report = pipeline
        .run(vec![SourceSpec::infer("https://example.com")])
        .await
        .expect("run succeeds");

    assert_eq!(report.scripts.len(), 1);
    assert_eq!(report.audio.len(), 1);
    assert!(sink.contains("final_longform_script.txt"));
    assert!(!sink.contains("final_shortform1_script.txt"));
}
