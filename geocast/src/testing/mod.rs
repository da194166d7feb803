//! Test doubles for the collaborator traits.
//!
//! Deterministic providers for exercising the pipeline without any network:
//! static responders, call counters, configurable failures, and an
//! in-memory artifact sink.

use crate::errors::ProviderError;
use crate::providers::{
    ArtifactSink, AudioCombiner, Ocr, SourceFetcher, SpeechSegment, SpeechSynthesizer,
    TextGenerator, Transcriber,
};
use crate::sources::SourceSpec;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A text generator that always returns the same response.
#[derive(Debug)]
pub struct StaticTextGenerator {
    response: String,
}

impl StaticTextGenerator {
    /// Creates a generator returning `response` for every prompt.
    #[must_use]
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for StaticTextGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Ok(self.response.clone())
    }
}

/// A text generator that counts calls.
#[derive(Debug)]
pub struct CountingTextGenerator {
    response: String,
    calls: Mutex<usize>,
}

impl CountingTextGenerator {
    /// Creates a counting generator.
    #[must_use]
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: Mutex::new(0),
        }
    }

    /// Returns how many times `generate` was called.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl TextGenerator for CountingTextGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        *self.calls.lock() += 1;
        Ok(self.response.clone())
    }
}

/// A text generator that always fails transiently.
#[derive(Debug, Default)]
pub struct FailingTextGenerator;

#[async_trait]
impl TextGenerator for FailingTextGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::transient("llm unavailable"))
    }
}

/// A text generator that fails its first N calls, then succeeds.
#[derive(Debug)]
pub struct FlakyTextGenerator {
    response: String,
    failures_left: Mutex<usize>,
}

impl FlakyTextGenerator {
    /// Creates a generator failing the first `failures` calls.
    #[must_use]
    pub fn failing_first(failures: usize, response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            failures_left: Mutex::new(failures),
        }
    }
}

#[async_trait]
impl TextGenerator for FlakyTextGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        let mut left = self.failures_left.lock();
        if *left > 0 {
            *left -= 1;
            return Err(ProviderError::transient("rate limited"));
        }
        Ok(self.response.clone())
    }
}

/// A fetcher that returns the same text for every source.
#[derive(Debug)]
pub struct StaticFetcher {
    content: String,
}

impl StaticFetcher {
    /// Creates a fetcher returning `content`.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    async fn fetch(&self, _source: &SourceSpec) -> Result<String, ProviderError> {
        Ok(self.content.clone())
    }
}

/// A fetcher that always fails transiently.
#[derive(Debug, Default)]
pub struct FailingFetcher;

#[async_trait]
impl SourceFetcher for FailingFetcher {
    async fn fetch(&self, source: &SourceSpec) -> Result<String, ProviderError> {
        Err(ProviderError::transient(format!(
            "fetch failed: {}",
            source.location
        )))
    }
}

/// An OCR engine that returns the same text for every image.
#[derive(Debug)]
pub struct StaticOcr {
    text: String,
}

impl StaticOcr {
    /// Creates an OCR double returning `text`.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Ocr for StaticOcr {
    async fn extract_text(&self, _image: &Path) -> Result<String, ProviderError> {
        Ok(self.text.clone())
    }
}

/// An in-memory artifact sink keyed by relative path.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if something was written at the relative path.
    #[must_use]
    pub fn contains(&self, relative_path: &str) -> bool {
        self.artifacts.lock().contains_key(relative_path)
    }

    /// Reads back an artifact as UTF-8.
    #[must_use]
    pub fn read_string(&self, relative_path: &str) -> Option<String> {
        self.artifacts
            .lock()
            .get(relative_path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Returns how many artifacts were written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.lock().len()
    }

    /// Returns true if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.lock().is_empty()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn write(&self, relative_path: &str, content: &[u8]) -> Result<PathBuf, ProviderError> {
        self.artifacts
            .lock()
            .insert(relative_path.to_string(), content.to_vec());
        Ok(PathBuf::from("mem").join(relative_path))
    }
}

/// A synthesizer that returns a small fixed audio blob.
#[derive(Debug, Default)]
pub struct SilentSynthesizer;

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    async fn synthesize(&self, chunk: &str, _voice_id: &str) -> Result<Vec<u8>, ProviderError> {
        // Length-dependent payload so tests can tell chunks apart.
        Ok(vec![0u8; chunk.len().min(64).max(1)])
    }
}

/// A synthesizer that fails its first N calls, then succeeds.
#[derive(Debug)]
pub struct FlakySynthesizer {
    failures_left: Mutex<usize>,
}

impl FlakySynthesizer {
    /// Creates a synthesizer failing the first `failures` calls.
    #[must_use]
    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures_left: Mutex::new(failures),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for FlakySynthesizer {
    async fn synthesize(&self, chunk: &str, _voice_id: &str) -> Result<Vec<u8>, ProviderError> {
        let mut left = self.failures_left.lock();
        if *left > 0 {
            *left -= 1;
            return Err(ProviderError::transient("tts rate limited"));
        }
        Ok(vec![0u8; chunk.len().min(64).max(1)])
    }
}

/// A synthesizer that always fails transiently.
#[derive(Debug, Default)]
pub struct FailingSynthesizer;

#[async_trait]
impl SpeechSynthesizer for FailingSynthesizer {
    async fn synthesize(&self, _chunk: &str, _voice_id: &str) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::transient("tts unavailable"))
    }
}

/// A combiner that records its inputs and pretends to combine.
#[derive(Debug, Default)]
pub struct RecordingCombiner {
    inputs: Mutex<Vec<PathBuf>>,
}

impl RecordingCombiner {
    /// Creates a recording combiner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chunk paths from the last combine call.
    #[must_use]
    pub fn last_inputs(&self) -> Vec<PathBuf> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl AudioCombiner for RecordingCombiner {
    async fn combine(&self, chunks: &[PathBuf], output: &Path) -> Result<PathBuf, ProviderError> {
        *self.inputs.lock() = chunks.to_vec();
        Ok(output.to_path_buf())
    }
}

/// A combiner that always fails.
#[derive(Debug, Default)]
pub struct FailingCombiner;

#[async_trait]
impl AudioCombiner for FailingCombiner {
    async fn combine(&self, _chunks: &[PathBuf], _output: &Path) -> Result<PathBuf, ProviderError> {
        Err(ProviderError::fatal("audio backend missing"))
    }
}

/// A transcriber that returns fixed segments.
#[derive(Debug)]
pub struct StaticTranscriber {
    segments: Vec<SpeechSegment>,
}

impl StaticTranscriber {
    /// Creates a transcriber returning `segments`.
    #[must_use]
    pub fn new(segments: Vec<SpeechSegment>) -> Self {
        Self { segments }
    }
}

#[async_trait]
impl Transcriber for StaticTranscriber {
    async fn transcribe(&self, _audio: &Path) -> Result<Vec<SpeechSegment>, ProviderError> {
        Ok(self.segments.clone())
    }
}

/// A transcriber that always fails transiently.
#[derive(Debug, Default)]
pub struct FailingTranscriber;

#[async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe(&self, _audio: &Path) -> Result<Vec<SpeechSegment>, ProviderError> {
        Err(ProviderError::transient("whisper unavailable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counting_generator_counts() {
        let generator = CountingTextGenerator::new("ok");
        assert_eq!(generator.calls(), 0);
        let _ = generator.generate("prompt").await;
        let _ = generator.generate("prompt").await;
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_flaky_generator_recovers() {
        let generator = FlakyTextGenerator::failing_first(2, "done");
        assert!(generator.generate("p").await.is_err());
        assert!(generator.generate("p").await.is_err());
        assert_eq!(generator.generate("p").await.ok().as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn test_memory_sink_round_trip() {
        let sink = MemorySink::new();
        let path = sink.write("dir/file.txt", "내용".as_bytes()).await.expect("write");
        assert_eq!(path, PathBuf::from("mem/dir/file.txt"));
        assert!(sink.contains("dir/file.txt"));
        assert_eq!(sink.read_string("dir/file.txt").as_deref(), Some("내용"));
    }
}
