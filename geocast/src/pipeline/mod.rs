//! Pipeline composition: phases, configuration, and the run driver.
//!
//! Control flows as a strictly forward stage pipeline. Source ingestion is
//! a hard precondition: zero valid sources halts the run. Every later stage
//! is best-effort; terminal failures are caught, reported, and the run
//! continues to a summary that states exactly what degraded.

mod report;

#[cfg(test)]
mod integration_tests;

pub use report::{RunReport, StageReport};

use crate::analysis::{Analyzer, SourceAnalysis};
use crate::errors::GeocastError;
use crate::exec::{LimiterConfig, LimiterRegistry, PoolConfig, RetryPolicy};
use crate::media::MediaSuggester;
use crate::providers::{
    ArtifactSink, AudioCombiner, Ocr, SourceFetcher, SpeechSynthesizer, TextGenerator, Transcriber,
};
use crate::script::{ChunkPolicy, ContentType, Script, ScriptSet};
use crate::sources::{SourceParser, SourceSpec};
use crate::subtitles::{SubtitleFile, SubtitleGenerator};
use crate::summary::render_report;
use crate::tts::{SpeechPipeline, VoiceRegistry};
use crate::util::generate_run_id;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// The stages of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Sources fetched, cleaned, and validated.
    SourcesParsed,
    /// Per-source expert analysis.
    Analyzed,
    /// Cross-source integrated analysis.
    Integrated,
    /// Scripts generated per content type.
    Scripted,
    /// Media suggestions produced (concurrent with speech synthesis).
    MediaSuggested,
    /// Speech synthesized per script (concurrent with media suggestions).
    SpeechSynthesized,
    /// Subtitles aligned to the synthesized audio.
    SubtitlesAligned,
    /// Run summary written.
    Summarized,
}

impl Phase {
    /// The phase name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SourcesParsed => "sources_parsed",
            Self::Analyzed => "analyzed",
            Self::Integrated => "integrated",
            Self::Scripted => "scripted",
            Self::MediaSuggested => "media_suggested",
            Self::SpeechSynthesized => "speech_synthesized",
            Self::SubtitlesAligned => "subtitles_aligned",
            Self::Summarized => "summarized",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one pipeline run.
///
/// Plain values only; reading config files or environment belongs to the
/// caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// The content topic.
    pub topic: String,
    /// The script's logical structure.
    pub structure: String,
    /// Extra instructions appended to script prompts.
    pub additional_instructions: String,
    /// Which script variants to generate.
    pub content_types: Vec<ContentType>,
    /// Narration voice name or provider id.
    pub voice: String,
    /// Whether to generate subtitles after synthesis.
    pub generate_subtitles: bool,
    /// Per-service concurrency capacities.
    pub limiters: LimiterConfig,
    /// Retry policy for external calls.
    pub retry: RetryPolicy,
    /// Worker pool sizing.
    pub pool: PoolConfig,
    /// TTS chunking policy.
    pub chunking: ChunkPolicy,
}

impl PipelineConfig {
    /// Creates a config for a topic with the stock defaults.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            structure: "서론-본론-결론".to_string(),
            additional_instructions: String::new(),
            content_types: vec![
                ContentType::Longform,
                ContentType::Shortform(1),
                ContentType::Shortform(2),
            ],
            voice: "wyatt".to_string(),
            generate_subtitles: false,
            limiters: LimiterConfig::default(),
            retry: RetryPolicy::default(),
            pool: PoolConfig::default(),
            chunking: ChunkPolicy::default(),
        }
    }

    /// Sets the content types to generate.
    #[must_use]
    pub fn with_content_types(mut self, content_types: Vec<ContentType>) -> Self {
        self.content_types = content_types;
        self
    }

    /// Sets the narration voice.
    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Enables subtitle generation.
    #[must_use]
    pub fn with_subtitles(mut self) -> Self {
        self.generate_subtitles = true;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the worker pool sizing.
    #[must_use]
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }
}

/// The external collaborators a run needs.
#[derive(Debug, Clone)]
pub struct Collaborators {
    /// Fetches source content.
    pub fetcher: Arc<dyn SourceFetcher>,
    /// OCR for image sources; `None` fails image sources.
    pub ocr: Option<Arc<dyn Ocr>>,
    /// Text generation (LLM).
    pub text_generator: Arc<dyn TextGenerator>,
    /// Speech synthesis (TTS).
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    /// Audio chunk combination.
    pub combiner: Arc<dyn AudioCombiner>,
    /// Speech-to-text for subtitle alignment; `None` uses estimated timing.
    pub transcriber: Option<Arc<dyn Transcriber>>,
    /// Artifact persistence.
    pub sink: Arc<dyn ArtifactSink>,
}

/// The content-generation pipeline.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    collaborators: Collaborators,
}

impl Pipeline {
    /// Creates a pipeline.
    #[must_use]
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the full pipeline over the given sources.
    ///
    /// Fails only when zero sources parse; everything downstream degrades
    /// instead of failing the run.
    pub async fn run(&self, sources: Vec<SourceSpec>) -> Result<RunReport, GeocastError> {
        let run_id = generate_run_id();
        let started_at = Utc::now();
        let limiters = LimiterRegistry::new(self.config.limiters);
        let mut stages = Vec::new();

        tracing::info!(%run_id, topic = %self.config.topic, sources = sources.len(), "pipeline run starting");

        // Source ingestion is the one hard precondition.
        let parser = SourceParser::new(
            Arc::clone(&self.collaborators.fetcher),
            self.collaborators.ocr.clone(),
            Arc::clone(&self.collaborators.sink),
            self.config.pool,
        );
        let parsed = parser.parse_all(sources).await;
        stages.push(StageReport::from_result(Phase::SourcesParsed, &parsed));
        if parsed.success_count() == 0 {
            tracing::error!("no valid sources; halting run");
            return Err(GeocastError::NoValidSources);
        }
        let texts = parsed.into_values();

        let analyzer = Analyzer::new(
            Arc::clone(&self.collaborators.text_generator),
            Arc::clone(&self.collaborators.sink),
            limiters.clone(),
            self.config.retry,
            self.config.pool,
        );

        // Per-source analysis; an all-failed stage degrades to excerpts so
        // integration still has material.
        let analyzed = analyzer
            .analyze_sources(texts.clone(), &self.config.topic)
            .await;
        let mut analyzed_report = StageReport::from_result(Phase::Analyzed, &analyzed);
        let folded = analyzed.fold(|| excerpt_analysis(&texts));
        if let Some(reason) = folded.degraded_reason() {
            analyzed_report = analyzed_report.with_degraded(reason.to_string());
        }
        stages.push(analyzed_report);
        let analyses = folded.into_values();

        // Integration is one call with a typed local fallback.
        let integrated = analyzer
            .integrate(&analyses, &self.config.topic, &self.config.structure)
            .await;
        stages.push(StageReport::single(
            Phase::Integrated,
            integrated.is_degraded(),
            integrated.degraded_reason.clone(),
        ));

        // Script generation per content type.
        let script_result = analyzer
            .generate_scripts(
                &integrated,
                &self.config.topic,
                &self.config.structure,
                &self.config.additional_instructions,
                &self.config.content_types,
            )
            .await;
        stages.push(StageReport::from_result(Phase::Scripted, &script_result));

        let mut scripts = ScriptSet::new();
        for script in script_result.into_values() {
            scripts.insert(script);
        }

        // Media suggestions and speech synthesis both depend only on the
        // scripts; run them concurrently and join before summarizing.
        let (media, media_report, audio, tts_report) = if scripts.is_empty() {
            tracing::warn!("no scripts generated; skipping media and speech stages");
            (
                None,
                StageReport::skipped(Phase::MediaSuggested, "no scripts generated"),
                Vec::new(),
                StageReport::skipped(Phase::SpeechSynthesized, "no scripts generated"),
            )
        } else {
            let suggester = MediaSuggester::new(
                Arc::clone(&self.collaborators.text_generator),
                Arc::clone(&self.collaborators.sink),
                limiters.clone(),
                self.config.retry,
                self.config.pool,
            );
            let speech = SpeechPipeline::new(
                Arc::clone(&self.collaborators.synthesizer),
                Arc::clone(&self.collaborators.combiner),
                Arc::clone(&self.collaborators.sink),
                limiters.clone(),
                self.config.retry,
                self.config.pool,
                self.config.chunking,
                VoiceRegistry::default(),
            );

            let media_future = async {
                match scripts.longform() {
                    Some(longform) => {
                        let suggestions = suggester.suggest(&longform.text, &self.config.topic).await;
                        let report = StageReport::single(
                            Phase::MediaSuggested,
                            suggestions.is_degraded(),
                            suggestions.degraded_reason.clone(),
                        );
                        (Some(suggestions), report)
                    }
                    None => (
                        None,
                        StageReport::skipped(Phase::MediaSuggested, "no long-form script"),
                    ),
                }
            };
            let tts_future = async {
                let all: Vec<Script> = scripts.iter().cloned().collect();
                let result = speech.synthesize_all(all, &self.config.voice).await;
                let report = StageReport::from_result(Phase::SpeechSynthesized, &result);
                (result.into_values(), report)
            };

            let ((media, media_report), (audio, tts_report)) =
                tokio::join!(media_future, tts_future);
            (media, media_report, audio, tts_report)
        };
        stages.push(media_report);
        stages.push(tts_report);

        // Subtitles need the synthesized audio, so they run after the join.
        let subtitles = if self.config.generate_subtitles && !audio.is_empty() {
            let generator = SubtitleGenerator::new(
                self.collaborators.transcriber.clone(),
                Arc::clone(&self.collaborators.sink),
                limiters,
                self.config.retry,
                self.config.pool,
            );
            let pairs: Vec<(Script, PathBuf)> = audio
                .iter()
                .filter_map(|synthesized| {
                    scripts
                        .get(synthesized.content_type)
                        .map(|script| (script.clone(), synthesized.path.clone()))
                })
                .collect();
            let result = generator.generate_batch(pairs).await;
            let mut report = StageReport::from_result(Phase::SubtitlesAligned, &result);
            let files: Vec<SubtitleFile> = result.into_values();
            if files.iter().any(|file| file.estimated_timing) {
                report = report.with_degraded("timing estimated without transcription");
            }
            stages.push(report);
            files
        } else {
            let reason = if self.config.generate_subtitles {
                "no audio synthesized"
            } else {
                "disabled"
            };
            stages.push(StageReport::skipped(Phase::SubtitlesAligned, reason));
            Vec::new()
        };

        let mut report = RunReport {
            run_id,
            topic: self.config.topic.clone(),
            started_at,
            finished_at: Utc::now(),
            stages,
            scripts,
            audio,
            subtitles,
            media,
        };

        // The summary always gets written, even for a fully degraded run.
        let summary = render_report(&report);
        match self
            .collaborators
            .sink
            .write("project_summary.txt", summary.as_bytes())
            .await
        {
            Ok(_) => report.stages.push(StageReport::single(Phase::Summarized, false, None)),
            Err(err) => {
                tracing::warn!(error = %err, "could not persist run summary");
                report.stages.push(
                    StageReport::skipped(Phase::Summarized, "summary write failed")
                        .with_degraded(err.to_string()),
                );
            }
        }
        report.finished_at = Utc::now();

        tracing::info!(
            %run_id,
            degraded = report.is_degraded(),
            elapsed_secs = report.elapsed_secs(),
            "pipeline run finished"
        );
        Ok(report)
    }
}

/// Synthetic stand-in analysis built from raw source excerpts.
///
/// Used only when every per-source analysis failed; keeps the pipeline able
/// to produce a clearly degraded script rather than nothing.
fn excerpt_analysis(texts: &[String]) -> SourceAnalysis {
    let excerpts = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let excerpt: String = text.chars().take(500).collect();
            format!("소스 #{} 내용 일부:\n{}", i + 1, excerpt)
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    SourceAnalysis {
        index: 0,
        text: format!("[분석 실패로 원문 발췌를 사용합니다]\n\n{excerpts}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::SourcesParsed.as_str(), "sources_parsed");
        assert_eq!(Phase::Summarized.to_string(), "summarized");
    }

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::new("흑해 곡물 협정");
        assert_eq!(config.structure, "서론-본론-결론");
        assert_eq!(config.content_types.len(), 3);
        assert_eq!(config.voice, "wyatt");
        assert!(!config.generate_subtitles);
    }

    #[test]
    fn test_excerpt_analysis_mentions_each_source() {
        let texts = vec!["첫 소스 본문".to_string(), "둘째 소스 본문".to_string()];
        let analysis = excerpt_analysis(&texts);
        assert!(analysis.text.contains("소스 #1"));
        assert!(analysis.text.contains("소스 #2"));
        assert!(analysis.text.contains("첫 소스 본문"));
    }
}
