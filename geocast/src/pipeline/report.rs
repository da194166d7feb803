//! Per-stage and whole-run reports.
//!
//! The consumer of a run needs to know not just what was produced but how
//! trustworthy it is: per-stage success/failure counts and whether any stage
//! ran in degraded (fallback) mode.

use super::Phase;
use crate::exec::StageResult;
use crate::media::MediaSuggestions;
use crate::script::ScriptSet;
use crate::subtitles::SubtitleFile;
use crate::tts::SynthesizedAudio;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How one stage went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    /// Which stage this reports on.
    pub phase: Phase,
    /// Items attempted.
    pub attempted: usize,
    /// Items that succeeded.
    pub succeeded: usize,
    /// Items that failed terminally.
    pub failed: usize,
    /// True if the stage produced fallback output.
    pub degraded: bool,
    /// Free-form note (skip reason, degradation reason).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StageReport {
    /// Builds a report from a stage's fan-out result.
    #[must_use]
    pub fn from_result<R>(phase: Phase, result: &StageResult<R>) -> Self {
        Self {
            phase,
            attempted: result.len(),
            succeeded: result.success_count(),
            failed: result.failure_count(),
            degraded: result.len() > 0 && result.success_count() == 0,
            detail: None,
        }
    }

    /// Builds a report for a single-call stage.
    #[must_use]
    pub fn single(phase: Phase, degraded: bool, detail: Option<String>) -> Self {
        Self {
            phase,
            attempted: 1,
            succeeded: 1,
            failed: 0,
            degraded,
            detail,
        }
    }

    /// Builds a report for a stage that never ran.
    #[must_use]
    pub fn skipped(phase: Phase, reason: impl Into<String>) -> Self {
        Self {
            phase,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            degraded: false,
            detail: Some(reason.into()),
        }
    }

    /// Marks the report degraded with a reason.
    #[must_use]
    pub fn with_degraded(mut self, reason: impl Into<String>) -> Self {
        self.degraded = true;
        self.detail = Some(reason.into());
        self
    }
}

/// The full record of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identity.
    pub run_id: Uuid,
    /// The content topic.
    pub topic: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Per-stage reports, in execution order.
    pub stages: Vec<StageReport>,
    /// The generated scripts.
    pub scripts: ScriptSet,
    /// Synthesized audio per script.
    pub audio: Vec<SynthesizedAudio>,
    /// Generated subtitle files.
    pub subtitles: Vec<SubtitleFile>,
    /// The media suggestion document, if the stage ran.
    pub media: Option<MediaSuggestions>,
}

impl RunReport {
    /// Returns the report for one stage.
    #[must_use]
    pub fn stage(&self, phase: Phase) -> Option<&StageReport> {
        self.stages.iter().find(|stage| stage.phase == phase)
    }

    /// Returns true if any stage ran degraded.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.stages.iter().any(|stage| stage.degraded)
    }

    /// Wall-clock duration of the run in seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        (self.finished_at - self.started_at)
            .to_std()
            .map_or(0.0, |duration| duration.as_secs_f64())
    }
}
