//! Optional external row store.
//!
//! The history ledger mirrors each appended row to a named tabular
//! resource. The write is fire-and-forget: every failure is logged and
//! folded into `SyncOutcome::Failed`, never returned as an error.

use crate::ledger::LedgerRow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("row store unavailable: {0}")]
    Unavailable(String),

    #[error("row store rejected credentials")]
    Unauthorized,

    #[error("row store timed out")]
    Timeout,

    #[error("row store columns do not match the export contract: {0}")]
    SchemaMismatch(String),

    #[error("row store backend error: {0}")]
    Backend(#[from] rusqlite::Error),
}

/// A remote tabular resource that accepts appended rows.
pub trait RowSink {
    /// Resource name, for logs.
    fn name(&self) -> &str;

    fn append_row(&mut self, row: &LedgerRow) -> Result<(), SyncError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No sink configured.
    Disabled,
    Appended,
    Failed { sink: String, reason: String },
}

impl SyncOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

pub fn best_effort(sink: &mut dyn RowSink, row: &LedgerRow) -> SyncOutcome {
    match sink.append_row(row) {
        Ok(()) => {
            log::debug!("sync: appended row to {}", sink.name());
            SyncOutcome::Appended
        }
        Err(e) => {
            log::warn!("sync: append to {} failed, continuing: {e}", sink.name());
            SyncOutcome::Failed { sink: sink.name().to_string(), reason: e.to_string() }
        }
    }
}
