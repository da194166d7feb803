//! # Geocast
//!
//! A resilient parallel pipeline for generating Korean-language
//! international-relations/geopolitics video content.
//!
//! Geocast turns a list of heterogeneous sources (URLs, documents, images)
//! into long-form and short-form video scripts, synthesized speech, media
//! suggestions, and subtitles. Every stage fans out over unreliable external
//! collaborators, so the heart of the crate is a shared execution substrate:
//!
//! - **Retry execution**: capped-attempt exponential backoff with jitter,
//!   under per-service-class concurrency limits
//! - **Worker pools**: replace-on-completion scheduling with dynamic sizing
//! - **Partial-failure folding**: typed complete/partial/degraded aggregates
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use geocast::prelude::*;
//!
//! let config = PipelineConfig::new("대만 해협 긴장 고조");
//! let pipeline = Pipeline::new(config, collaborators);
//! let report = pipeline.run(sources).await?;
//! println!("{}", render_report(&report));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod analysis;
pub mod errors;
pub mod exec;
pub mod media;
pub mod pipeline;
pub mod providers;
pub mod script;
pub mod sources;
pub mod subtitles;
pub mod summary;
pub mod testing;
pub mod tts;
pub mod util;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::{GeocastError, ProviderError, RetryError};
    pub use crate::exec::{
        call_with_retry, Folded, LimiterConfig, LimiterRegistry, Outcome, OutcomeError,
        PoolConfig, RetryPolicy, ServiceClass, StageResult, WorkItem,
    };
    pub use crate::pipeline::{Collaborators, Phase, Pipeline, PipelineConfig, RunReport, StageReport};
    pub use crate::providers::{
        ArtifactSink, AudioCombiner, DirectorySink, Ocr, SourceFetcher, SpeechSegment,
        SpeechSynthesizer, TextGenerator, Transcriber,
    };
    pub use crate::script::{ChunkPolicy, ContentType, Script, ScriptSet};
    pub use crate::sources::{SourceKind, SourceSpec};
    pub use crate::summary::render_report;
}

#[cfg(test)]
mod tests {
    #[test]
    fn library_compiles() {
        assert!(true);
    }
}
