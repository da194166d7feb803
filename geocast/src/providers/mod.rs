//! External collaborator interfaces.
//!
//! The pipeline treats every network-facing dependency as an opaque
//! collaborator behind a narrow async trait. Concrete SDK request shapes,
//! auth, and codec details live in implementations outside the core; all
//! boundary formats are UTF-8 text or opaque byte blobs.

mod sink;

#[cfg(feature = "fetch")]
mod http;

pub use sink::DirectorySink;

#[cfg(feature = "fetch")]
pub use http::HttpFetcher;

use crate::errors::ProviderError;
use crate::sources::SourceSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Text-generation (LLM) collaborator.
///
/// May fail transiently (rate limit, timeout); model and temperature
/// selection is the implementation's concern.
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    /// Generates text for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Speech-synthesis (TTS) collaborator.
///
/// Input is bounded to the configured chunk size by the caller.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + Debug {
    /// Synthesizes one text chunk into raw audio bytes.
    async fn synthesize(&self, chunk: &str, voice_id: &str) -> Result<Vec<u8>, ProviderError>;
}

/// One timed segment of recognized speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSegment {
    /// Segment start in seconds.
    pub start: f64,
    /// Segment end in seconds.
    pub end: f64,
    /// Recognized text.
    pub text: String,
}

/// Speech-to-text collaborator (Whisper-style).
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    /// Transcribes an audio file into timed segments.
    async fn transcribe(&self, audio: &Path) -> Result<Vec<SpeechSegment>, ProviderError>;
}

/// Image OCR collaborator.
#[async_trait]
pub trait Ocr: Send + Sync + Debug {
    /// Extracts text from an image file.
    async fn extract_text(&self, image: &Path) -> Result<String, ProviderError>;
}

/// Source-content fetcher.
///
/// Carries its own HTTP-level retry adapter rather than going through the
/// retry executor; fan-out still happens through the worker pool.
#[async_trait]
pub trait SourceFetcher: Send + Sync + Debug {
    /// Fetches the raw text content of a source.
    async fn fetch(&self, source: &SourceSpec) -> Result<String, ProviderError>;
}

/// Per-item artifact persistence.
///
/// The pipeline hands over relative paths; directory layout and naming
/// beyond that are the sink's concern.
#[async_trait]
pub trait ArtifactSink: Send + Sync + Debug {
    /// Writes bytes to a relative path, returning the resolved location.
    async fn write(&self, relative_path: &str, content: &[u8]) -> Result<PathBuf, ProviderError>;
}

/// Combines ordered audio chunks into one file.
///
/// Runs single-threaded after all chunk workers have joined.
#[async_trait]
pub trait AudioCombiner: Send + Sync + Debug {
    /// Concatenates the chunk files into `output`, returning its path.
    async fn combine(&self, chunks: &[PathBuf], output: &Path) -> Result<PathBuf, ProviderError>;
}
