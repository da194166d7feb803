//! Speech synthesis: chunk fan-out, per-chunk persistence, combination.
//!
//! Long scripts exceed TTS input limits, so the spoken text is chunked at
//! sentence boundaries and the chunks fan out through the worker pool under
//! the TTS concurrency limit. Combination runs single-threaded after every
//! chunk worker has joined; the combined file falls back to the first chunk
//! when the combiner fails.

pub mod voice;

pub use voice::VoiceRegistry;

use crate::exec::{
    call_with_retry, run_all, work_items_with_cost, LimiterRegistry, OutcomeError, PoolConfig,
    RetryPolicy, ServiceClass, StageResult,
};
use crate::providers::{ArtifactSink, AudioCombiner, SpeechSynthesizer};
use crate::script::{extract_speech_parts, split_into_chunks, ChunkPolicy, ContentType, Script};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// The synthesized audio for one script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedAudio {
    /// Which script this audio narrates.
    pub content_type: ContentType,
    /// Path of the combined audio file.
    pub path: PathBuf,
    /// How many chunks the script was split into.
    pub chunk_count: usize,
    /// Chunks that failed terminally and were dropped.
    pub failed_chunks: usize,
    /// Set when the combiner failed and only the first chunk is returned.
    pub combine_fallback: bool,
}

/// Chunked TTS pipeline for one run.
#[derive(Debug, Clone)]
pub struct SpeechPipeline {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    combiner: Arc<dyn AudioCombiner>,
    sink: Arc<dyn ArtifactSink>,
    limiters: LimiterRegistry,
    retry: RetryPolicy,
    pool: PoolConfig,
    chunking: ChunkPolicy,
    voices: VoiceRegistry,
}

impl SpeechPipeline {
    /// Creates a speech pipeline over the given collaborators.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        combiner: Arc<dyn AudioCombiner>,
        sink: Arc<dyn ArtifactSink>,
        limiters: LimiterRegistry,
        retry: RetryPolicy,
        pool: PoolConfig,
        chunking: ChunkPolicy,
        voices: VoiceRegistry,
    ) -> Self {
        Self {
            synthesizer,
            combiner,
            sink,
            limiters,
            retry,
            pool,
            chunking,
            voices,
        }
    }

    /// Synthesizes one script: extract speech, chunk, fan out, combine.
    ///
    /// Partial chunk failure proceeds with the successful chunks in order;
    /// zero successful chunks fails the script.
    pub async fn synthesize_script(
        &self,
        script: &Script,
        voice: &str,
    ) -> Result<SynthesizedAudio, OutcomeError> {
        let voice_id = self.voices.resolve(voice).to_string();
        let speech = extract_speech_parts(&script.text);
        let chunks = split_into_chunks(&speech, self.chunking.max_chunk_chars);
        if chunks.is_empty() {
            return Err(OutcomeError::new(format!(
                "script {} has no speakable text",
                script.content_type
            )));
        }

        let label = script.content_type.label();
        let total_chunks = chunks.len();
        tracing::info!(script = %label, chunks = total_chunks, voice = %voice_id, "synthesizing speech");

        let items = work_items_with_cost(chunks, |chunk| chunk.chars().count());
        let result = run_all(&self.pool, items, |item| {
            let synthesizer = Arc::clone(&self.synthesizer);
            let sink = Arc::clone(&self.sink);
            let limiters = self.limiters.clone();
            let retry = self.retry;
            let voice_id = voice_id.clone();
            let label = label.clone();
            async move {
                let synthesizer_for_call = Arc::clone(&synthesizer);
                let chunk = Arc::new(item.payload);
                let audio = call_with_retry(&limiters, ServiceClass::Tts, retry, move || {
                    let synthesizer = Arc::clone(&synthesizer_for_call);
                    let chunk = Arc::clone(&chunk);
                    let voice_id = voice_id.clone();
                    async move { synthesizer.synthesize(&chunk, &voice_id).await }
                })
                .await?;

                let name = format!("audio/{}_part{}.mp3", label, item.index + 1);
                let path = sink.write(&name, &audio).await?;
                Ok(path)
            }
        })
        .await;

        let failed_chunks = result.failure_count();
        let chunk_paths: Vec<PathBuf> = result.into_values();
        if chunk_paths.is_empty() {
            return Err(OutcomeError::new(format!(
                "all {total_chunks} chunks failed for script {label}"
            )));
        }

        let (path, combine_fallback) = self.combine_chunks(&chunk_paths, &label).await;
        Ok(SynthesizedAudio {
            content_type: script.content_type,
            path,
            chunk_count: total_chunks,
            failed_chunks,
            combine_fallback,
        })
    }

    /// Synthesizes every script in the set, one outcome per script.
    pub async fn synthesize_all(
        &self,
        scripts: Vec<Script>,
        voice: &str,
    ) -> StageResult<SynthesizedAudio> {
        tracing::info!(total = scripts.len(), "synthesizing script set");
        let voice = voice.to_string();
        let items = work_items_with_cost(scripts, Script::char_count);

        run_all(&self.pool, items, |item| {
            let pipeline = self.clone();
            let voice = voice.clone();
            async move { pipeline.synthesize_script(&item.payload, &voice).await }
        })
        .await
    }

    /// Combines ordered chunk files next to where they were written.
    async fn combine_chunks(&self, chunk_paths: &[PathBuf], label: &str) -> (PathBuf, bool) {
        let first = chunk_paths[0].clone();
        if chunk_paths.len() == 1 {
            return (first, false);
        }

        let output = first.with_file_name(format!("{label}_speech.mp3"));
        match self.combiner.combine(chunk_paths, &output).await {
            Ok(path) => (path, false),
            Err(err) => {
                tracing::warn!(error = %err, script = %label, "audio combination failed, keeping first chunk");
                (first, true)
            }
        }
    }
}
