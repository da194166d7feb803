//! Media suggestion generation.
//!
//! One main LLM call proposes visuals for the long-form script; four
//! additional elements (stock footage keywords, background music, data
//! visualizations, expert citations) are generated in parallel. Every piece
//! has a deterministic default so the stage always yields a usable document,
//! with degradation tracked explicitly.

use crate::exec::{
    call_with_retry, run_all, work_items, LimiterRegistry, PoolConfig, RetryPolicy, ServiceClass,
};
use crate::providers::{ArtifactSink, TextGenerator};
use crate::util::static_regex;
use dashmap::DashMap;
use md5::{Digest, Md5};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Script input beyond this many chars is truncated for the main prompt.
const MAX_SCRIPT_PROMPT_CHARS: usize = 4000;

static MEDIA_DIRECTION: OnceLock<Regex> = OnceLock::new();

/// The additional media elements generated alongside the main suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaElement {
    /// Search keywords for stock footage and imagery.
    StockKeywords,
    /// Background music direction.
    BackgroundMusic,
    /// Charts and maps worth producing.
    DataVisualizations,
    /// Expert quotes and source attributions.
    ExpertCitations,
}

impl MediaElement {
    /// All elements, in document order.
    pub const ALL: [Self; 4] = [
        Self::StockKeywords,
        Self::BackgroundMusic,
        Self::DataVisualizations,
        Self::ExpertCitations,
    ];

    /// The section heading in the combined document.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::StockKeywords => "## 전문 영상/이미지 검색 키워드",
            Self::BackgroundMusic => "## 배경음악 제안",
            Self::DataVisualizations => "## 데이터 시각화 제안",
            Self::ExpertCitations => "## 전문가 인용 및 출처 표시 제안",
        }
    }

    fn prompt(self, topic: &str, script_excerpt: &str) -> String {
        let ask = match self {
            Self::StockKeywords => {
                "스톡 영상/이미지 검색에 쓸 영문 키워드 10개를 제안하세요."
            }
            Self::BackgroundMusic => {
                "분위기 전환 지점별 배경음악 스타일과 추천 트랙 유형을 제안하세요."
            }
            Self::DataVisualizations => {
                "스크립트를 뒷받침할 지도, 차트, 연표 시각화를 제안하세요."
            }
            Self::ExpertCitations => {
                "인용할 만한 전문가와 기관, 출처 표기 방식을 제안하세요."
            }
        };
        format!(
            "당신은 국제관계 전문 유튜브 채널의 영상 제작 컨설턴트입니다.\n\
             주제: {topic}\n{ask}\n\n스크립트 일부:\n{script_excerpt}"
        )
    }

    /// The deterministic default block used when generation fails.
    #[must_use]
    pub fn default_block(self, topic: &str) -> String {
        match self {
            Self::StockKeywords => format!(
                "- {topic} (영문 번역 키워드)\n- world map geopolitics\n- military exercise footage\n- diplomatic meeting handshake\n- national flags waving"
            ),
            Self::BackgroundMusic => "- 서론: 긴장감 있는 앰비언트\n- 본론: 다큐멘터리 스타일 언더스코어\n- 결론: 차분한 피아노".to_string(),
            Self::DataVisualizations => format!(
                "- {topic} 관련 지역 지도\n- 주요 사건 연표\n- 관련국 국방비/교역 규모 비교 차트"
            ),
            Self::ExpertCitations => "- 관련 분야 싱크탱크 보고서 인용\n- 화면 하단에 출처 자막 표기".to_string(),
        }
    }
}

/// The assembled media suggestion document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSuggestions {
    /// The combined document text.
    pub text: String,
    /// Set when the main suggestion call fell back to the default document.
    pub degraded_reason: Option<String>,
    /// How many additional elements used their default block.
    pub fallback_elements: usize,
}

impl MediaSuggestions {
    /// Returns true if the main suggestions came from the fallback path.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded_reason.is_some()
    }
}

/// Extracts the `[영상: …]` directions already present in a script.
#[must_use]
pub fn extract_existing_directions(script: &str) -> Vec<String> {
    static_regex(&MEDIA_DIRECTION, r"(?i)\[(?:영상|visual|video)\s*:\s*([^\]]+)\]")
        .captures_iter(script)
        .map(|captures| captures[1].trim().to_string())
        .collect()
}

/// LLM-backed media suggester with an in-memory result cache.
#[derive(Debug)]
pub struct MediaSuggester {
    text_generator: Arc<dyn TextGenerator>,
    sink: Arc<dyn ArtifactSink>,
    limiters: LimiterRegistry,
    retry: RetryPolicy,
    pool: PoolConfig,
    cache: DashMap<String, MediaSuggestions>,
}

impl MediaSuggester {
    /// Creates a suggester over the given collaborators.
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
            cache: DashMap::new(),
        }
    }

    /// Generates the media suggestion document for a script.
    ///
    /// Results are cached by (script, topic); repeated calls for the same
    /// script are free. The document is persisted as
    /// `media/media_suggestions.txt`.
    pub async fn suggest(&self, script: &str, topic: &str) -> MediaSuggestions {
        let key = cache_key(script, topic);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(topic, "media suggestions served from cache");
            return cached.clone();
        }

        let excerpt = truncate_chars(script, MAX_SCRIPT_PROMPT_CHARS);
        let existing = extract_existing_directions(script);

        let (main, additional) = tokio::join!(
            self.main_suggestions(topic, &excerpt, &existing),
            self.additional_elements(topic, &excerpt)
        );

        let (main_text, degraded_reason) = main;
        let (element_text, fallback_elements) = additional;

        let text = format!("# 미디어 제안: {topic}\n\n{main_text}\n\n{element_text}");
        let suggestions = MediaSuggestions {
            text,
            degraded_reason,
            fallback_elements,
        };

        if let Err(err) = self
            .sink
            .write("media/media_suggestions.txt", suggestions.text.as_bytes())
            .await
        {
            tracing::warn!(error = %err, "could not persist media suggestions");
        }

        self.cache.insert(key, suggestions.clone());
        suggestions
    }

    async fn main_suggestions(
        &self,
        topic: &str,
        excerpt: &str,
        existing: &[String],
    ) -> (String, Option<String>) {
        let existing_note = if existing.is_empty() {
            String::new()
        } else {
            format!("\n이미 포함된 영상 지시 ({}개):\n- {}", existing.len(), existing.join("\n- "))
        };
        let prompt = format!(
            "당신은 국제관계 전문 유튜브 채널의 영상 제작 컨설턴트입니다.\n\
             주제 \"{topic}\"의 스크립트 구간별로 사용할 영상/이미지를 \
             [영상: ...] 형식으로 제안하세요.{existing_note}\n\n스크립트 일부:\n{excerpt}"
        );

        let generator = Arc::clone(&self.text_generator);
        let result = call_with_retry(&self.limiters, ServiceClass::Llm, self.retry, move || {
            let generator = Arc::clone(&generator);
            let prompt = prompt.clone();
            async move { generator.generate(&prompt).await }
        })
        .await;

        match result {
            Ok(text) => (text, None),
            Err(err) => {
                tracing::warn!(error = %err, "main media suggestions failed, using defaults");
                (default_main_suggestions(topic), Some(err.to_string()))
            }
        }
    }

    /// Generates the four additional elements in parallel; a failed element
    /// contributes its default block.
    async fn additional_elements(&self, topic: &str, excerpt: &str) -> (String, usize) {
        let items = work_items(MediaElement::ALL.to_vec());
        let topic_owned = topic.to_string();
        let excerpt_owned = excerpt.to_string();

        let result = run_all(&self.pool, items, |item| {
            let generator = Arc::clone(&self.text_generator);
            let limiters = self.limiters.clone();
            let retry = self.retry;
            let topic = topic_owned.clone();
            let excerpt = excerpt_owned.clone();
            async move {
                let element = item.payload;
                let prompt = element.prompt(&topic, &excerpt);
                let generator_for_call = Arc::clone(&generator);
                let text =
                    call_with_retry(&limiters, ServiceClass::Llm, retry, move || {
                        let generator = Arc::clone(&generator_for_call);
                        let prompt = prompt.clone();
                        async move { generator.generate(&prompt).await }
                    })
                    .await?;
                Ok((element, text))
            }
        })
        .await;

        let mut fallback_elements = 0usize;
        let mut produced: Vec<(MediaElement, String)> = Vec::with_capacity(MediaElement::ALL.len());
        for (outcome, element) in result.outcomes().iter().zip(MediaElement::ALL) {
            match &outcome.result {
                Ok((element, text)) => produced.push((*element, text.clone())),
                Err(_) => {
                    fallback_elements += 1;
                    produced.push((element, element.default_block(topic)));
                }
            }
        }

        let sections = produced
            .into_iter()
            .map(|(element, text)| format!("{}\n{}", element.heading(), text))
            .collect::<Vec<_>>()
            .join("\n\n");
        (sections, fallback_elements)
    }
}

/// The deterministic default main-suggestion document for a topic.
#[must_use]
pub fn default_main_suggestions(topic: &str) -> String {
    format!(
        "## 기본 영상 구성 제안\n\
         [영상: {topic} 관련 지역 지도 줌인]\n\
         [영상: 관련국 정상/외교장관 회담 자료 화면]\n\
         [영상: 주요 사건 보도 자료 화면]\n\
         [영상: 연표 그래픽으로 전개 과정 정리]"
    )
}

fn cache_key(script: &str, topic: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(script.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(topic.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
