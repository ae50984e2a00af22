//! Run events: the narration of one simulation run.
//!
//! The stage sequencer and the session emit these in order; callers
//! observe them live and also get the full list back.

use crate::types::{Percent, RunNumber};
use serde::{Deserialize, Serialize};

/// Every event emitted during a run.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PurificationEvent {
    RunStarted {
        run: RunNumber,
    },

    // ── Stage sequence ─────────────────────────────
    StageStarted {
        stage:   String,
        message: String,
    },
    ProgressAdvanced {
        stage:    String,
        progress: f64,
    },
    StageCompleted {
        stage:      String,
        efficiency: Percent,
    },
    SequenceCompleted {
        stages: usize,
    },

    // ── Scoring and ledger ─────────────────────────
    RecommendationComputed {
        filter:                String,
        purification_estimate: Percent,
        index:                 f64,
    },
    HistoryRecorded {
        run:        RunNumber,
        ledger_len: usize,
    },
    SyncFailed {
        sink:   String,
        reason: String,
    },
}

impl PurificationEvent {
    /// Stable name, used for log lines and the IPC stream.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunStarted { .. }             => "run_started",
            Self::StageStarted { .. }           => "stage_started",
            Self::ProgressAdvanced { .. }       => "progress_advanced",
            Self::StageCompleted { .. }         => "stage_completed",
            Self::SequenceCompleted { .. }      => "sequence_completed",
            Self::RecommendationComputed { .. } => "recommendation_computed",
            Self::HistoryRecorded { .. }        => "history_recorded",
            Self::SyncFailed { .. }             => "sync_failed",
        }
    }
}
