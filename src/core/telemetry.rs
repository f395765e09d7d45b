use crate::core::control::ExecState;
use crate::core::MogramKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// What the shell reports for one dispatched unit, after it has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub mogram_id: Uuid,
    pub name: String,
    pub kind: MogramKind,
    /// How the unit was executed (`local`, `remote`, `delegate`, ...).
    pub route: String,
    pub signature: Option<String>,
    pub status: ExecState,
    pub metadata: HashMap<String, String>,
}

impl TraceEntry {
    pub(crate) fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Receives one entry per dispatched unit. `flush` is called once the unit handed to
/// the shell has finished, after every entry of that dispatch was recorded.
pub trait Telemetry: Send + Sync {
    fn record(&self, entry: TraceEntry);

    fn flush(&self) {}
}

/// Keeps every entry in memory, in recording order.
#[derive(Default)]
pub struct MemoryTelemetry {
    traces: Mutex<Vec<TraceEntry>>,
    flushes: Mutex<usize>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_traces(&self) -> Vec<TraceEntry> {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Entries recorded for the unit with `id`, oldest first.
    pub fn traces_for(&self, id: Uuid) -> Vec<TraceEntry> {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.mogram_id == id)
            .cloned()
            .collect()
    }

    /// Number of completed top-level dispatches.
    pub fn flushes(&self) -> usize {
        *self.flushes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn clear(&self) {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Telemetry for MemoryTelemetry {
    fn record(&self, entry: TraceEntry) {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    fn flush(&self) {
        *self.flushes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }
}

/// Writes every entry to the `log` facade at info level; failed units at warn.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn record(&self, entry: TraceEntry) {
        let signature = entry.signature.as_deref().unwrap_or("-");
        if entry.status.is_failure() {
            log::warn!(
                "{} '{}' [{}] via {} ended {:?}",
                entry.kind,
                entry.name,
                signature,
                entry.route,
                entry.status
            );
        } else {
            log::info!(
                "{} '{}' [{}] via {} ended {:?}",
                entry.kind,
                entry.name,
                signature,
                entry.route,
                entry.status
            );
        }
    }
}
