//! Source ingestion: descriptors, fan-out parsing, validation.
//!
//! Sources are heterogeneous (web articles, YouTube videos, documents,
//! images) and individually unreliable, so parsing fans out through the
//! worker pool and every failure is captured per item. Zero valid sources
//! is the one failure the pipeline treats as fatal.

pub mod cleanup;

use crate::errors::ProviderError;
use crate::exec::{run_all, work_items, OutcomeError, PoolConfig, StageResult};
use crate::providers::{ArtifactSink, Ocr, SourceFetcher};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Minimum character count for a parsed source to count as valid.
pub const MIN_SOURCE_CHARS: usize = 100;

/// The kind of a source, driving which collaborator parses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A web article URL.
    Url,
    /// A YouTube video URL (transcript or audio transcription).
    YouTube,
    /// A plain-text file.
    Text,
    /// A PDF document.
    Pdf,
    /// A Word document.
    Docx,
    /// An image, routed through OCR.
    Image,
}

/// A source to ingest: a URL or a local file path plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// What the source is.
    pub kind: SourceKind,
    /// URL or filesystem path.
    pub location: String,
}

impl SourceSpec {
    /// Creates a spec with an explicit kind.
    #[must_use]
    pub fn new(kind: SourceKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
        }
    }

    /// Infers the kind from the location's shape.
    ///
    /// URLs are split into YouTube and general web; files go by extension.
    /// Unknown extensions fall back to plain text.
    #[must_use]
    pub fn infer(location: impl Into<String>) -> Self {
        let location = location.into();
        let kind = if location.starts_with("http://") || location.starts_with("https://") {
            if is_youtube_url(&location) {
                SourceKind::YouTube
            } else {
                SourceKind::Url
            }
        } else {
            match Path::new(&location)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
                .as_deref()
            {
                Some("pdf") => SourceKind::Pdf,
                Some("docx") => SourceKind::Docx,
                Some("jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff") => SourceKind::Image,
                _ => SourceKind::Text,
            }
        };
        Self { kind, location }
    }
}

/// Returns true if the URL points at a YouTube video.
#[must_use]
pub fn is_youtube_url(url: &str) -> bool {
    let host = url
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_start_matches("www.")
        .split('/')
        .next()
        .unwrap_or_default();
    host == "youtube.com" || host == "m.youtube.com" || host == "youtu.be"
}

/// Fan-out source parser.
#[derive(Debug)]
pub struct SourceParser {
    fetcher: Arc<dyn SourceFetcher>,
    ocr: Option<Arc<dyn Ocr>>,
    sink: Arc<dyn ArtifactSink>,
    pool: PoolConfig,
}

impl SourceParser {
    /// Creates a parser over the given collaborators.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        ocr: Option<Arc<dyn Ocr>>,
        sink: Arc<dyn ArtifactSink>,
        pool: PoolConfig,
    ) -> Self {
        Self {
            fetcher,
            ocr,
            sink,
            pool,
        }
    }

    /// Parses every source, returning one outcome per input in input order.
    ///
    /// Each valid text is cleaned, length-checked, and persisted as
    /// `sources/source_{n}.txt`.
    pub async fn parse_all(&self, sources: Vec<SourceSpec>) -> StageResult<String> {
        let total = sources.len();
        tracing::info!(total, "parsing sources");

        let items = work_items(sources);
        let result = run_all(&self.pool, items, |item| {
            let fetcher = Arc::clone(&self.fetcher);
            let ocr = self.ocr.clone();
            let sink = Arc::clone(&self.sink);
            async move {
                let text = parse_one(&*fetcher, ocr.as_deref(), &item.payload).await?;
                let cleaned = cleanup::clean_text(&text);
                if cleaned.chars().count() <= MIN_SOURCE_CHARS {
                    return Err(OutcomeError::new(format!(
                        "source produced too little text ({} chars): {}",
                        cleaned.chars().count(),
                        item.payload.location
                    )));
                }
                let name = format!("sources/source_{}.txt", item.index + 1);
                sink.write(&name, cleaned.as_bytes()).await?;
                Ok(cleaned)
            }
        })
        .await;

        tracing::info!(
            succeeded = result.success_count(),
            failed = result.failure_count(),
            "source parsing finished"
        );
        result
    }
}

async fn parse_one(
    fetcher: &dyn SourceFetcher,
    ocr: Option<&dyn Ocr>,
    source: &SourceSpec,
) -> Result<String, ProviderError> {
    match source.kind {
        SourceKind::Image => match ocr {
            Some(engine) => engine.extract_text(Path::new(&source.location)).await,
            None => Err(ProviderError::fatal(format!(
                "no OCR engine configured for image source: {}",
                source.location
            ))),
        },
        _ => fetcher.fetch(source).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingFetcher, MemorySink, StaticFetcher};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_infer_url_kinds() {
        assert_eq!(SourceSpec::infer("https://example.com/a").kind, SourceKind::Url);
        assert_eq!(
            SourceSpec::infer("https://www.youtube.com/watch?v=abc").kind,
            SourceKind::YouTube
        );
        assert_eq!(SourceSpec::infer("https://youtu.be/abc").kind, SourceKind::YouTube);
    }

    #[test]
    fn test_infer_file_kinds() {
        assert_eq!(SourceSpec::infer("paper.pdf").kind, SourceKind::Pdf);
        assert_eq!(SourceSpec::infer("notes.docx").kind, SourceKind::Docx);
        assert_eq!(SourceSpec::infer("map.PNG").kind, SourceKind::Image);
        assert_eq!(SourceSpec::infer("notes.txt").kind, SourceKind::Text);
        assert_eq!(SourceSpec::infer("notes").kind, SourceKind::Text);
    }

    #[test]
    fn test_youtube_url_detection_is_host_based() {
        assert!(is_youtube_url("https://youtube.com/watch?v=x"));
        assert!(!is_youtube_url("https://example.com/youtube.com"));
        assert!(!is_youtube_url("https://notyoutube.com/watch"));
    }

    #[tokio::test]
    async fn test_parse_all_keeps_order_and_counts() {
        let long = "지정학 분석 ".repeat(30);
        let fetcher = Arc::new(StaticFetcher::new(long.clone()));
        let sink = Arc::new(MemorySink::new());
        let parser = SourceParser::new(fetcher, None, sink.clone(), PoolConfig::default());

        let sources = vec![
            SourceSpec::infer("https://example.com/one"),
            SourceSpec::infer("https://example.com/two"),
        ];
        let result = parser.parse_all(sources).await;

        assert_eq!(result.len(), 2);
        assert_eq!(result.success_count(), 2);
        assert!(sink.contains("sources/source_1.txt"));
        assert!(sink.contains("sources/source_2.txt"));
    }

    #[tokio::test]
    async fn test_short_source_fails_validation() {
        let fetcher = Arc::new(StaticFetcher::new("too short".to_string()));
        let sink = Arc::new(MemorySink::new());
        let parser = SourceParser::new(fetcher, None, sink, PoolConfig::default());

        let result = parser
            .parse_all(vec![SourceSpec::infer("https://example.com")])
            .await;

        assert_eq!(result.success_count(), 0);
        assert_eq!(result.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_image_routes_through_ocr() {
        use crate::testing::StaticOcr;

        let fetcher = Arc::new(FailingFetcher::default());
        let ocr = Arc::new(StaticOcr::new("지도에서 추출한 텍스트. ".repeat(10)));
        let sink = Arc::new(MemorySink::new());
        let parser = SourceParser::new(fetcher, Some(ocr), sink, PoolConfig::default());

        let result = parser
            .parse_all(vec![SourceSpec::infer("battle_map.png")])
            .await;

        assert_eq!(result.success_count(), 1);
    }

    #[tokio::test]
    async fn test_image_without_ocr_fails() {
        let fetcher = Arc::new(FailingFetcher::default());
        let sink = Arc::new(MemorySink::new());
        let parser = SourceParser::new(fetcher, None, sink, PoolConfig::default());

        let result = parser
            .parse_all(vec![SourceSpec::infer("battle_map.png")])
            .await;

        assert_eq!(result.failure_count(), 1);
        let error = result.outcomes()[0].error().map(OutcomeError::message);
        assert!(error.is_some_and(|m| m.contains("no OCR engine")));
    }
}
