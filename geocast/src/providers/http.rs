//! Built-in source fetcher for web articles and local text files.
//!
//! Covers the common cases without external tooling: `http(s)` pages get
//! main-content extraction, plain-text files are read directly. Binary
//! documents and YouTube stay collaborator territory. HTTP retries happen
//! here at the transport level, not in the retry executor.

use super::SourceFetcher;
use crate::errors::ProviderError;
use crate::sources::{SourceKind, SourceSpec};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;

/// Content selectors tried in priority order.
const CONTENT_SELECTORS: [&str; 5] = [
    "article p",
    "main p",
    ".content p, .post-content p, .entry-content p, .article p",
    "[role=\"main\"] p",
    "p",
];

/// Minimum extracted length before falling through to the next selector.
const MIN_CONTENT_CHARS: usize = 200;

const HTTP_ATTEMPTS: usize = 3;

/// Fetches URLs with `reqwest` and extracts article text with `scraper`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with sane timeouts.
    pub fn new() -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("geocast/0.1")
            .build()
            .map_err(|err| ProviderError::fatal(format!("http client build failed: {err}")))?;
        Ok(Self { client })
    }

    /// Fetches a URL body, retrying transient transport and 5xx failures.
    async fn fetch_url(&self, url: &str) -> Result<String, ProviderError> {
        let mut last_error = String::new();
        for attempt in 0..HTTP_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
            }
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|err| {
                            ProviderError::transient(format!("body read failed: {err}"))
                        });
                    }
                    last_error = format!("status {status} from {url}");
                    if !status.is_server_error() {
                        return Err(ProviderError::fatal(last_error));
                    }
                }
                Err(err) => last_error = format!("request failed: {err}"),
            }
            tracing::warn!(url, attempt, error = %last_error, "http fetch attempt failed");
        }
        Err(ProviderError::transient(last_error))
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, source: &SourceSpec) -> Result<String, ProviderError> {
        match source.kind {
            SourceKind::Url => {
                let body = self.fetch_url(&source.location).await?;
                Ok(extract_article_text(&body, &source.location))
            }
            SourceKind::Text => Ok(tokio::fs::read_to_string(&source.location).await?),
            SourceKind::YouTube | SourceKind::Pdf | SourceKind::Docx | SourceKind::Image => {
                Err(ProviderError::fatal(format!(
                    "{:?} sources need a dedicated fetcher: {}",
                    source.kind, source.location
                )))
            }
        }
    }
}

/// Extracts the readable article text from an HTML body.
///
/// Tries the content selectors in order, keeps the first that yields enough
/// text, and prefixes the page title. Falls back to the meta description
/// when nothing matches.
#[must_use]
pub fn extract_article_text(body: &str, url: &str) -> String {
    let document = Html::parse_document(body);

    let title = select_first_text(&document, "title").unwrap_or_default();

    for selector in CONTENT_SELECTORS {
        if let Some(content) = select_joined_text(&document, selector) {
            if content.chars().count() > MIN_CONTENT_CHARS {
                return if title.is_empty() {
                    content
                } else {
                    format!("{title}\n\n{content}")
                };
            }
        }
    }

    let description = select_meta_description(&document).unwrap_or_default();
    if title.is_empty() && description.is_empty() {
        return format!("본문 추출 실패: {url}");
    }
    format!("제목: {title}\n\n설명: {description}\n\nURL: {url}")
}

fn select_first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;
    let text = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn select_joined_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let paragraphs: Vec<String> = document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    (!paragraphs.is_empty()).then(|| paragraphs.join("\n"))
}

fn select_meta_description(document: &Html) -> Option<String> {
    for selector in [
        "meta[name=\"description\"]",
        "meta[property=\"og:description\"]",
    ] {
        let parsed = Selector::parse(selector).ok()?;
        if let Some(content) = document
            .select(&parsed)
            .next()
            .and_then(|element| element.value().attr("content"))
        {
            let content = content.trim();
            if !content.is_empty() {
                return Some(content.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_article_paragraphs_with_title() {
        let paragraph = "국제 정세 분석 단락입니다. ".repeat(20);
        let body = format!(
            "<html><head><title>분석 기사</title></head><body>\
             <article><p>{paragraph}</p><p>{paragraph}</p></article>\
             </body></html>"
        );
        let text = extract_article_text(&body, "https://example.com");
        assert!(text.starts_with("분석 기사\n\n"));
        assert!(text.contains("국제 정세 분석 단락입니다."));
    }

    #[test]
    fn test_falls_back_to_meta_description() {
        let body = "<html><head><title>짧은 페이지</title>\
                    <meta name=\"description\" content=\"페이지 요약\"></head>\
                    <body><p>짧음</p></body></html>";
        let text = extract_article_text(body, "https://example.com");
        assert!(text.contains("제목: 짧은 페이지"));
        assert!(text.contains("설명: 페이지 요약"));
    }

    #[test]
    fn test_reports_extraction_failure() {
        let text = extract_article_text("<html><body></body></html>", "https://example.com/x");
        assert_eq!(text, "본문 추출 실패: https://example.com/x");
    }

    #[tokio::test]
    async fn test_text_file_fetch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("source.txt");
        std::fs::write(&path, "파일 본문").expect("write");

        let fetcher = HttpFetcher::new().expect("fetcher");
        let spec = SourceSpec::new(SourceKind::Text, path.to_string_lossy());
        let text = fetcher.fetch(&spec).await.expect("fetch");
        assert_eq!(text, "파일 본문");
    }

    #[tokio::test]
    async fn test_unsupported_kinds_fail_fatally() {
        let fetcher = HttpFetcher::new().expect("fetcher");
        let spec = SourceSpec::new(SourceKind::Pdf, "paper.pdf");
        let err = fetcher.fetch(&spec).await.expect_err("should fail");
        assert!(!err.is_retryable());
    }
}
