//! Per-service-class concurrency limits.
//!
//! External providers rate-limit by service, not by machine, so concurrency
//! caps are keyed by the class of call being made. The registry is an
//! explicitly constructed value passed into callers; two pipeline runs with
//! separate registries never contend with each other.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A category of external call sharing one concurrency budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceClass {
    /// Text-generation (LLM) calls.
    Llm,
    /// Speech-synthesis calls.
    Tts,
    /// OCR and speech-to-text calls.
    Transcription,
}

impl ServiceClass {
    /// Returns the class name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Tts => "tts",
            Self::Transcription => "transcription",
        }
    }
}

impl fmt::Display for ServiceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concurrency capacity per service class.
///
/// Capacities reflect provider rate limits, not local CPU count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Concurrent LLM calls.
    pub llm: usize,
    /// Concurrent TTS calls.
    pub tts: usize,
    /// Concurrent OCR/STT calls.
    pub transcription: usize,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            llm: 3,
            tts: 2,
            transcription: 2,
        }
    }
}

impl LimiterConfig {
    /// Returns the capacity for a class.
    #[must_use]
    pub const fn capacity(&self, class: ServiceClass) -> usize {
        match class {
            ServiceClass::Llm => self.llm,
            ServiceClass::Tts => self.tts,
            ServiceClass::Transcription => self.transcription,
        }
    }
}

/// Registry of per-class semaphores.
///
/// Cloning shares the underlying semaphores; in-flight calls for a class
/// never exceed its configured capacity across all clones.
#[derive(Debug, Clone)]
pub struct LimiterRegistry {
    limiters: HashMap<ServiceClass, Arc<Semaphore>>,
}

impl LimiterRegistry {
    /// Creates a registry with the given capacities (minimum 1 per class).
    #[must_use]
    pub fn new(config: LimiterConfig) -> Self {
        let classes = [
            ServiceClass::Llm,
            ServiceClass::Tts,
            ServiceClass::Transcription,
        ];
        let limiters = classes
            .into_iter()
            .map(|class| {
                let capacity = config.capacity(class).max(1);
                (class, Arc::new(Semaphore::new(capacity)))
            })
            .collect();
        Self { limiters }
    }

    /// Acquires a permit for the class, waiting until one is free.
    #[allow(clippy::expect_used)]
    pub async fn acquire(&self, class: ServiceClass) -> OwnedSemaphorePermit {
        self.semaphore(class)
            .acquire_owned()
            .await
            .expect("limiter semaphores are never closed")
    }

    /// Returns the number of currently free permits for a class.
    #[must_use]
    pub fn available(&self, class: ServiceClass) -> usize {
        self.semaphore(class).available_permits()
    }

    fn semaphore(&self, class: ServiceClass) -> Arc<Semaphore> {
        Arc::clone(&self.limiters[&class])
    }
}

impl Default for LimiterRegistry {
    fn default() -> Self {
        Self::new(LimiterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacities() {
        let config = LimiterConfig::default();
        assert_eq!(config.llm, 3);
        assert_eq!(config.tts, 2);
        assert_eq!(config.transcription, 2);
    }

    #[tokio::test]
    async fn test_acquire_reduces_available() {
        let registry = LimiterRegistry::new(LimiterConfig {
            llm: 2,
            tts: 1,
            transcription: 1,
        });

        assert_eq!(registry.available(ServiceClass::Llm), 2);
        let permit = registry.acquire(ServiceClass::Llm).await;
        assert_eq!(registry.available(ServiceClass::Llm), 1);
        drop(permit);
        assert_eq!(registry.available(ServiceClass::Llm), 2);
    }

    #[tokio::test]
    async fn test_classes_are_independent() {
        let registry = LimiterRegistry::default();
        let _llm = registry.acquire(ServiceClass::Llm).await;
        assert_eq!(registry.available(ServiceClass::Tts), 2);
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let registry = LimiterRegistry::new(LimiterConfig {
            llm: 0,
            tts: 0,
            transcription: 0,
        });
        assert_eq!(registry.available(ServiceClass::Llm), 1);
    }

    #[tokio::test]
    async fn test_clones_share_capacity() {
        let registry = LimiterRegistry::new(LimiterConfig {
            llm: 1,
            tts: 1,
            transcription: 1,
        });
        let clone = registry.clone();

        let _permit = registry.acquire(ServiceClass::Llm).await;
        assert_eq!(clone.available(ServiceClass::Llm), 0);
    }
}
