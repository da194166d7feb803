//! Subtitle generation.
//!
//! The preferred path runs the audio through a transcriber and repairs weak
//! segments against the script; without a transcriber (or when it fails
//! terminally) subtitles fall back to distributing the estimated narration
//! time proportionally over script lines. The fallback is tracked as
//! degraded output, not passed off as aligned.

pub mod srt;

pub use srt::{find_best_match, format_timestamp, render, split_script_into_subtitles, SrtCue};

use crate::exec::{
    call_with_retry, run_all, work_items_with_cost, LimiterRegistry, OutcomeError, PoolConfig,
    RetryPolicy, ServiceClass, StageResult,
};
use crate::providers::{ArtifactSink, SpeechSegment, Transcriber};
use crate::script::{extract_speech_parts, ContentType, Script};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Max characters per subtitle line for long-form content.
pub const MAX_SUBTITLE_CHARS: usize = 42;
/// Max characters per subtitle line for short-form content.
pub const MAX_SUBTITLE_CHARS_SHORTFORM: usize = 35;

/// Whisper fragments of at most this many words get script repair.
const REPAIR_WORD_LIMIT: usize = 3;

/// Average narration speed used when no audio duration is known.
const WORDS_PER_SECOND: f64 = 2.5;

/// A generated subtitle file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleFile {
    /// Which script the subtitles belong to.
    pub content_type: ContentType,
    /// Path of the written `.srt` file.
    pub path: PathBuf,
    /// Number of cues.
    pub cue_count: usize,
    /// Set when the timing came from estimation instead of transcription.
    pub estimated_timing: bool,
}

/// Subtitle generator for one run.
#[derive(Debug, Clone)]
pub struct SubtitleGenerator {
    transcriber: Option<Arc<dyn Transcriber>>,
    sink: Arc<dyn ArtifactSink>,
    limiters: LimiterRegistry,
    retry: RetryPolicy,
    pool: PoolConfig,
}

impl SubtitleGenerator {
    /// Creates a generator; without a transcriber every file uses estimated
    /// timing.
    #[must_use]
    pub fn new(
        transcriber: Option<Arc<dyn Transcriber>>,
        sink: Arc<dyn ArtifactSink>,
        limiters: LimiterRegistry,
        retry: RetryPolicy,
        pool: PoolConfig,
    ) -> Self {
        Self {
            transcriber,
            sink,
            limiters,
            retry,
            pool,
        }
    }

    /// Generates subtitles for one script/audio pair.
    pub async fn generate(
        &self,
        script: &Script,
        audio_path: &Path,
    ) -> Result<SubtitleFile, OutcomeError> {
        let speech = extract_speech_parts(&script.text);
        let max_chars = max_chars_for(script.content_type);

        let (cues, estimated_timing) = match self.transcribe(audio_path).await {
            Some(segments) => (segments_to_cues(&segments, &speech, max_chars), false),
            None => (estimated_cues(&speech, max_chars)?, true),
        };
        if cues.is_empty() {
            return Err(OutcomeError::new(format!(
                "no subtitle cues could be built for {}",
                script.content_type
            )));
        }

        let name = format!("subtitles/{}.srt", script.content_type.label());
        let path = self.sink.write(&name, render(&cues).as_bytes()).await?;

        Ok(SubtitleFile {
            content_type: script.content_type,
            path,
            cue_count: cues.len(),
            estimated_timing,
        })
    }

    /// Generates subtitles for every (script, audio) pair, one outcome each.
    pub async fn generate_batch(
        &self,
        pairs: Vec<(Script, PathBuf)>,
    ) -> StageResult<SubtitleFile> {
        tracing::info!(total = pairs.len(), "generating subtitles");
        let items = work_items_with_cost(pairs, |(script, _)| script.char_count());

        run_all(&self.pool, items, |item| {
            let generator = self.clone();
            async move {
                let (script, audio_path) = item.payload;
                generator.generate(&script, &audio_path).await
            }
        })
        .await
    }

    /// Runs the transcriber with retries; `None` means "use the fallback".
    async fn transcribe(&self, audio_path: &Path) -> Option<Vec<SpeechSegment>> {
        let transcriber = self.transcriber.as_ref()?;

        let transcriber = Arc::clone(transcriber);
        let audio_path = audio_path.to_path_buf();
        let result = call_with_retry(
            &self.limiters,
            ServiceClass::Transcription,
            self.retry,
            move || {
                let transcriber = Arc::clone(&transcriber);
                let audio_path = audio_path.clone();
                async move { transcriber.transcribe(&audio_path).await }
            },
        )
        .await;

        match result {
            Ok(segments) if !segments.is_empty() => Some(segments),
            Ok(_) => {
                tracing::warn!("transcriber returned no segments, falling back to estimation");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "transcription failed, falling back to estimation");
                None
            }
        }
    }
}

const fn max_chars_for(content_type: ContentType) -> usize {
    if content_type.is_shortform() {
        MAX_SUBTITLE_CHARS_SHORTFORM
    } else {
        MAX_SUBTITLE_CHARS
    }
}

/// Builds cues from transcriber segments, repairing weak fragments against
/// the script and splitting over-long segments with proportional timing.
fn segments_to_cues(segments: &[SpeechSegment], speech: &str, max_chars: usize) -> Vec<SrtCue> {
    let mut script_sentences = crate::script::split_into_sentences(speech);
    let mut cues = Vec::new();

    for segment in segments {
        let mut text = segment.text.trim().to_string();
        if text.is_empty() {
            continue;
        }

        // Very short recognized fragments are usually mis-hearings; swap in
        // the closest script sentence and consume it.
        if text.split_whitespace().count() <= REPAIR_WORD_LIMIT {
            if let Some(best) = find_best_match(&text, &script_sentences).cloned() {
                script_sentences.retain(|sentence| sentence != &best);
                text = best;
            }
        }

        if text.chars().count() > max_chars {
            let parts = srt::split_long_subtitle(&text, max_chars);
            #[allow(clippy::cast_precision_loss)]
            let per_part = (segment.end - segment.start) / parts.len() as f64;
            for (i, part) in parts.into_iter().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let start = segment.start + per_part * i as f64;
                cues.push(SrtCue::new(start, start + per_part, part));
            }
        } else {
            cues.push(SrtCue::new(segment.start, segment.end, text));
        }
    }
    cues
}

/// Builds cues by spreading the estimated narration time over script lines.
fn estimated_cues(speech: &str, max_chars: usize) -> Result<Vec<SrtCue>, OutcomeError> {
    let subtitles = split_script_into_subtitles(speech, max_chars);
    if subtitles.is_empty() {
        return Err(OutcomeError::new("script has no speakable text"));
    }

    #[allow(clippy::cast_precision_loss)]
    let duration = (speech.split_whitespace().count() as f64 / WORDS_PER_SECOND).max(1.0);
    #[allow(clippy::cast_precision_loss)]
    let per_cue = duration / subtitles.len() as f64;

    Ok(subtitles
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            #[allow(clippy::cast_precision_loss)]
            let start = per_cue * i as f64;
            SrtCue::new(start, start + per_cue, text)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingTranscriber, MemorySink, StaticTranscriber};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn generator(transcriber: Option<Arc<dyn Transcriber>>, sink: Arc<MemorySink>) -> SubtitleGenerator {
        SubtitleGenerator::new(
            transcriber,
            sink,
            LimiterRegistry::default(),
            RetryPolicy::new().with_base_delay(Duration::from_millis(1)),
            PoolConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_estimated_timing_without_transcriber() {
        let sink = Arc::new(MemorySink::new());
        let generator = generator(None, sink.clone());

        let script = Script::new(
            ContentType::Longform,
            "대만 해협의 긴장이 고조되고 있습니다. 주변국의 대응이 주목됩니다.",
        );
        let file = generator
            .generate(&script, &PathBuf::from("audio/longform_speech.mp3"))
            .await
            .expect("subtitles");

        assert!(file.estimated_timing);
        assert!(file.cue_count >= 1);
        assert!(sink.contains("subtitles/longform.srt"));
    }

    #[tokio::test]
    async fn test_transcriber_segments_drive_timing() {
        let sink = Arc::new(MemorySink::new());
        let segments = vec![
            SpeechSegment {
                start: 0.0,
                end: 3.2,
                text: "대만 해협의 긴장이 고조되고 있습니다".to_string(),
            },
            SpeechSegment {
                start: 3.2,
                end: 6.0,
                text: "주변국의 대응이 주목됩니다".to_string(),
            },
        ];
        let generator = generator(Some(Arc::new(StaticTranscriber::new(segments))), sink.clone());

        let script = Script::new(
            ContentType::Longform,
            "대만 해협의 긴장이 고조되고 있습니다. 주변국의 대응이 주목됩니다.",
        );
        let file = generator
            .generate(&script, &PathBuf::from("audio/longform_speech.mp3"))
            .await
            .expect("subtitles");

        assert!(!file.estimated_timing);
        assert_eq!(file.cue_count, 2);
        let srt_text = sink.read_string("subtitles/longform.srt").expect("srt");
        assert!(srt_text.contains("00:00:00,000 --> 00:00:03,200"));
    }

    #[tokio::test]
    async fn test_failing_transcriber_falls_back_to_estimation() {
        let sink = Arc::new(MemorySink::new());
        let generator = generator(Some(Arc::new(FailingTranscriber::default())), sink);

        let script = Script::new(ContentType::Shortform(1), "짧은 스크립트입니다. 끝입니다.");
        let file = generator
            .generate(&script, &PathBuf::from("audio/shortform1_speech.mp3"))
            .await
            .expect("subtitles");

        assert!(file.estimated_timing);
    }

    #[tokio::test]
    async fn test_batch_generates_one_file_per_pair() {
        let sink = Arc::new(MemorySink::new());
        let generator = generator(None, sink.clone());

        let pairs = vec![
            (
                Script::new(ContentType::Longform, "롱폼 스크립트 본문입니다."),
                PathBuf::from("audio/longform_speech.mp3"),
            ),
            (
                Script::new(ContentType::Shortform(1), "숏폼 스크립트 본문입니다."),
                PathBuf::from("audio/shortform1_speech.mp3"),
            ),
        ];
        let result = generator.generate_batch(pairs).await;

        assert_eq!(result.success_count(), 2);
        assert!(sink.contains("subtitles/longform.srt"));
        assert!(sink.contains("subtitles/shortform1.srt"));
    }

    #[test]
    fn test_short_fragment_repaired_from_script() {
        let segments = vec![SpeechSegment {
            start: 0.0,
            end: 2.0,
            text: "긴장이".to_string(),
        }];
        let speech = "대만 해협의 긴장이 고조되고 있습니다.";
        let cues = segments_to_cues(&segments, speech, 42);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "대만 해협의 긴장이 고조되고 있습니다.");
    }
}
