//! Source analysis and script synthesis.
//!
//! Three LLM-backed steps: per-source expert analysis (fanned out), one
//! integrated cross-source analysis (single call with a deterministic local
//! fallback), and script generation per content type (fanned out).

pub mod korean;
pub mod prompts;

pub use korean::process_korean_text;

use crate::errors::RetryError;
use crate::exec::{
    call_with_retry, run_all, work_items_with_cost, LimiterRegistry, PoolConfig, RetryPolicy,
    ServiceClass, StageResult, WorkItem,
};
use crate::providers::{ArtifactSink, TextGenerator};
use crate::script::{ContentType, Script};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Per-source input above this many chars is truncated before analysis.
pub const MAX_ANALYSIS_INPUT_CHARS: usize = 15_000;

const TRUNCATION_MARKER: &str = "\n\n[텍스트가 너무 길어 나머지는 생략되었습니다]";

/// The expert analysis of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAnalysis {
    /// Input index of the source.
    pub index: usize,
    /// Analysis text.
    pub text: String,
}

/// The cross-source integrated analysis.
///
/// `degraded_reason` is set when the text came from the local fallback
/// instead of the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegratedAnalysis {
    /// Integrated analysis text.
    pub text: String,
    /// Why the fallback was used, if it was.
    pub degraded_reason: Option<String>,
}

impl IntegratedAnalysis {
    /// Returns true if the analysis came from the fallback path.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded_reason.is_some()
    }
}

/// LLM-backed analyzer for one pipeline run.
#[derive(Debug)]
pub struct Analyzer {
    text_generator: Arc<dyn TextGenerator>,
    sink: Arc<dyn ArtifactSink>,
    limiters: LimiterRegistry,
    retry: RetryPolicy,
    pool: PoolConfig,
}

impl Analyzer {
    /// Creates an analyzer over the given collaborators.
    #[must_use]
    pub fn new(
        text_generator: Arc<dyn TextGenerator>,
        sink: Arc<dyn ArtifactSink>,
        limiters: LimiterRegistry,
        retry: RetryPolicy,
        pool: PoolConfig,
    ) -> Self {
        Self {
            text_generator,
            sink,
            limiters,
            retry,
            pool,
        }
    }

    /// Analyzes every source in parallel, one outcome per source.
    ///
    /// Each analysis is persisted as `analysis/source_{n}_analysis.txt`.
    pub async fn analyze_sources(&self, texts: Vec<String>, topic: &str) -> StageResult<SourceAnalysis> {
        let items = work_items_with_cost(texts, |text| text.chars().count());
        tracing::info!(total = items.len(), "analyzing sources");

        let topic = topic.to_string();
        let result = run_all(&self.pool, items, |item: WorkItem<String>| {
            let generator = Arc::clone(&self.text_generator);
            let sink = Arc::clone(&self.sink);
            let limiters = self.limiters.clone();
            let retry = self.retry;
            let topic = topic.clone();
            async move {
                let input = truncate_chars(&item.payload, MAX_ANALYSIS_INPUT_CHARS);
                let prompt = prompts::source_analysis(item.index, &topic, &input);
                let analysis =
                    generate_with_retry(&generator, &limiters, retry, prompt).await?;

                let name = format!("analysis/source_{}_analysis.txt", item.index + 1);
                sink.write(&name, analysis.as_bytes()).await?;

                Ok(SourceAnalysis {
                    index: item.index,
                    text: analysis,
                })
            }
        })
        .await;

        tracing::info!(
            succeeded = result.success_count(),
            failed = result.failure_count(),
            "source analysis finished"
        );
        result
    }

    /// Produces the integrated analysis from the successful per-source
    /// analyses, falling back to a local concatenation when the LLM call
    /// fails terminally.
    pub async fn integrate(
        &self,
        analyses: &[SourceAnalysis],
        topic: &str,
        structure: &str,
    ) -> IntegratedAnalysis {
        let joined = analyses
            .iter()
            .map(|analysis| {
                format!("--- 소스 #{} 분석 ---\n{}", analysis.index + 1, analysis.text)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = prompts::integration(topic, structure, &joined);
        let integrated = match generate_with_retry(
            &self.text_generator,
            &self.limiters,
            self.retry,
            prompt,
        )
        .await
        {
            Ok(text) => IntegratedAnalysis {
                text,
                degraded_reason: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, "integrated analysis failed, using fallback");
                IntegratedAnalysis {
                    text: fallback_integrated(analyses),
                    degraded_reason: Some(err.to_string()),
                }
            }
        };

        if let Err(err) = self
            .sink
            .write("analysis/integrated_analysis.txt", integrated.text.as_bytes())
            .await
        {
            tracing::warn!(error = %err, "could not persist integrated analysis");
        }
        integrated
    }

    /// Generates one script per requested content type, in parallel.
    ///
    /// Scripts are Korean-post-processed and persisted as
    /// `final_{label}_script.txt`. A failed variant is a failed outcome, not
    /// an error; the caller decides what a missing variant means.
    pub async fn generate_scripts(
        &self,
        integrated: &IntegratedAnalysis,
        topic: &str,
        structure: &str,
        additional_instructions: &str,
        content_types: &[ContentType],
    ) -> StageResult<Script> {
        let items = work_items_with_cost(content_types.to_vec(), |_| {
            integrated.text.chars().count()
        });
        tracing::info!(total = items.len(), "generating scripts");

        let topic = topic.to_string();
        let structure = structure.to_string();
        let additional = additional_instructions.to_string();
        let analysis_text = integrated.text.clone();

        run_all(&self.pool, items, |item: WorkItem<ContentType>| {
            let generator = Arc::clone(&self.text_generator);
            let sink = Arc::clone(&self.sink);
            let limiters = self.limiters.clone();
            let retry = self.retry;
            let topic = topic.clone();
            let structure = structure.clone();
            let additional = additional.clone();
            let analysis_text = analysis_text.clone();
            async move {
                let content_type = item.payload;
                let prompt = prompts::script(
                    content_type,
                    &topic,
                    &structure,
                    &additional,
                    &analysis_text,
                );
                let raw = generate_with_retry(&generator, &limiters, retry, prompt).await?;
                let script = Script::new(content_type, process_korean_text(&raw));

                let name = format!("final_{}_script.txt", content_type.label());
                sink.write(&name, script.text.as_bytes()).await?;
                Ok(script)
            }
        })
        .await
    }
}

async fn generate_with_retry(
    generator: &Arc<dyn TextGenerator>,
    limiters: &LimiterRegistry,
    retry: RetryPolicy,
    prompt: String,
) -> Result<String, RetryError> {
    let generator = Arc::clone(generator);
    call_with_retry(limiters, ServiceClass::Llm, retry, move || {
        let generator = Arc::clone(&generator);
        let prompt = prompt.clone();
        async move { generator.generate(&prompt).await }
    })
    .await
}

/// Deterministic local stand-in for a failed integrated analysis.
///
/// Concatenates the per-source analyses so downstream scripting still has
/// material to work from.
#[must_use]
pub fn fallback_integrated(analyses: &[SourceAnalysis]) -> String {
    let mut parts = vec!["# 통합 분석 (개별 분석 요약)".to_string()];
    for analysis in analyses {
        let excerpt = truncate_chars(&analysis.text, 500);
        parts.push(format!("## 소스 #{}\n{}", analysis.index + 1, excerpt));
    }
    parts.join("\n\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}{TRUNCATION_MARKER}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingTextGenerator, FlakyTextGenerator, MemorySink, StaticTextGenerator};
    use pretty_assertions::assert_eq;

    fn analyzer(generator: Arc<dyn TextGenerator>, sink: Arc<MemorySink>) -> Analyzer {
        Analyzer::new(
            generator,
            sink,
            LimiterRegistry::default(),
            RetryPolicy::new().with_base_delay(std::time::Duration::from_millis(1)),
            PoolConfig::default(),
        )
    }

    #[test]
    fn test_truncate_chars_adds_marker() {
        let text = "가".repeat(20);
        let truncated = truncate_chars(&text, 10);
        assert!(truncated.starts_with(&"가".repeat(10)));
        assert!(truncated.ends_with(TRUNCATION_MARKER));

        let short = truncate_chars("짧다", 10);
        assert_eq!(short, "짧다");
    }

    #[tokio::test]
    async fn test_analyze_sources_persists_per_item() {
        let sink = Arc::new(MemorySink::new());
        let analyzer = analyzer(Arc::new(StaticTextGenerator::new("분석 결과")), sink.clone());

        let texts = vec!["첫 소스".to_string(), "둘째 소스".to_string()];
        let result = analyzer.analyze_sources(texts, "남중국해").await;

        assert_eq!(result.success_count(), 2);
        assert!(sink.contains("analysis/source_1_analysis.txt"));
        assert!(sink.contains("analysis/source_2_analysis.txt"));
    }

    #[tokio::test]
    async fn test_analyze_sources_survives_transient_failures() {
        let sink = Arc::new(MemorySink::new());
        let generator = Arc::new(FlakyTextGenerator::failing_first(1, "분석 결과"));
        let analyzer = analyzer(generator, sink);

        let result = analyzer
            .analyze_sources(vec!["소스".to_string()], "주제")
            .await;
        assert_eq!(result.success_count(), 1);
    }

    #[tokio::test]
    async fn test_integrate_falls_back_on_terminal_failure() {
        let sink = Arc::new(MemorySink::new());
        let analyzer = analyzer(Arc::new(FailingTextGenerator::default()), sink);

        let analyses = vec![SourceAnalysis {
            index: 0,
            text: "개별 분석".to_string(),
        }];
        let integrated = analyzer.integrate(&analyses, "주제", "서론-본론-결론").await;

        assert!(integrated.is_degraded());
        assert!(integrated.text.contains("개별 분석"));
        assert!(integrated.text.contains("소스 #1"));
    }

    #[tokio::test]
    async fn test_generate_scripts_one_per_content_type() {
        let sink = Arc::new(MemorySink::new());
        let analyzer = analyzer(Arc::new(StaticTextGenerator::new("스크립트 본문.")), sink.clone());

        let integrated = IntegratedAnalysis {
            text: "통합 분석".to_string(),
            degraded_reason: None,
        };
        let types = [
            ContentType::Longform,
            ContentType::Shortform(1),
            ContentType::Shortform(2),
        ];
        let result = analyzer
            .generate_scripts(&integrated, "주제", "서론-본론-결론", "", &types)
            .await;

        assert_eq!(result.success_count(), 3);
        assert!(sink.contains("final_longform_script.txt"));
        assert!(sink.contains("final_shortform1_script.txt"));
        assert!(sink.contains("final_shortform2_script.txt"));

        let scripts = result.into_values();
        assert_eq!(scripts[0].content_type, ContentType::Longform);
        assert_eq!(scripts[0].text, "스크립트 본문.");
    }
}
