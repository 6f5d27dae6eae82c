use crate::error::Result;
use crate::types::{DueTime, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

// ---------------------------------------------------------------------------
// ActorRecord
// ---------------------------------------------------------------------------

/// One simulated loan applicant tracked by the ledger.
///
/// `state_data` is the target application's own persisted snapshot, opaque
/// except for its `id` and `status` fields; it is passed through unmodified
/// except where a handler explicitly patches `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRecord {
    pub id: String,
    pub status: Stage,
    pub next_action_due: DueTime,
    pub state_data: Value,
}

impl ActorRecord {
    /// Active records are the non-terminal ones; only they are ever
    /// considered for scheduling or counted toward the spawn cap.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal() && !self.next_action_due.is_terminal()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.next_action_due.is_due(now)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The durable store of actor records, read once at the start of a run and
/// written once at the end.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    pub records: Vec<ActorRecord>,
}

impl Ledger {
    /// Read the ledger file. A missing or unparseable file yields an empty
    /// ledger; loading never fails the run.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(records) => records,
                Err(e) => {
                    warn!("ledger {} is unparseable, starting empty: {e}", path.display());
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self { path, records }
    }

    /// Overwrite the ledger file with the full current collection,
    /// pretty-printed for inspectability.
    pub fn save(&self) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.records)?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn active_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_active()).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
