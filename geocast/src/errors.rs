//! Error types for the geocast pipeline.
//!
//! The taxonomy mirrors how failures actually propagate: provider errors are
//! transient or fatal, retry errors wrap exhausted or non-retryable calls,
//! and `GeocastError` is the top-level type the pipeline surfaces.

use thiserror::Error;

/// An error returned by an external collaborator (LLM, TTS, OCR, fetch).
///
/// Collaborators mark each error retryable or not; the retry executor treats
/// everything retryable unless the collaborator said otherwise.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
    retryable: bool,
}

impl ProviderError {
    /// Creates a transient (retryable) provider error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a fatal (non-retryable) provider error.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the retry executor may try the call again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        // Local IO failures do not get better on retry.
        Self::fatal(format!("io error: {err}"))
    }
}

/// Terminal outcome of a retried call.
#[derive(Debug, Error)]
pub enum RetryError {
    /// All attempts failed; carries the last underlying error.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: usize,
        /// The error from the final attempt.
        #[source]
        last: ProviderError,
    },

    /// The call failed with an error the caller declared non-retryable.
    #[error("non-retryable failure: {0}")]
    Fatal(#[source] ProviderError),
}

impl RetryError {
    /// Returns the underlying provider error.
    #[must_use]
    pub fn provider_error(&self) -> &ProviderError {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Fatal(err) => err,
        }
    }
}

/// The main error type for geocast operations.
#[derive(Debug, Error)]
pub enum GeocastError {
    /// No source survived parsing and validation; the run cannot continue.
    #[error("no valid sources could be parsed")]
    NoValidSources,

    /// A collaborator call failed terminally.
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// A retried call failed terminally.
    #[error("{0}")]
    Retry(#[from] RetryError),

    /// A stage failed outside of item-level handling.
    #[error("stage execution error: {0}")]
    Stage(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
