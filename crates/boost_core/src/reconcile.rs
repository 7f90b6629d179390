//! Completion reconciler: pure edge detection between consecutive status
//! snapshots of the job store.
//!
//! The platform layer takes a snapshot before and after every update and
//! feeds the pair through [`diff`]; the returned alerts are the only channel
//! through which completion side effects (toasts, sound, system
//! notifications, the attention badge) are raised. Comparing snapshots keeps
//! the detector idempotent: re-observing the same pair yields the same
//! alerts, and a pair with no transition yields none.

use crate::state::{JobId, JobStatus};

/// Minimal per-record stamp the detector needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStamp {
    pub id: JobId,
    pub name: String,
    pub status: JobStatus,
}

pub type StatusSnapshot = Vec<JobStamp>;

/// User-facing side effects owed for one snapshot transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// One record entered Completed in this transition.
    FileReady { name: String },
    /// The processing wave drained: at least one record was Processing
    /// before, none is now, and at least one ended Completed. Fires once
    /// per wave.
    AllDone,
}

/// Computes the alerts owed for the transition `prev -> current`.
pub fn diff(prev: &StatusSnapshot, current: &StatusSnapshot) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for stamp in current {
        if stamp.status != JobStatus::Completed {
            continue;
        }
        let was_completed = prev
            .iter()
            .any(|p| p.id == stamp.id && p.status == JobStatus::Completed);
        if !was_completed {
            alerts.push(Alert::FileReady {
                name: stamp.name.clone(),
            });
        }
    }

    let was_processing = prev.iter().any(|p| p.status == JobStatus::Processing);
    let is_processing = current.iter().any(|c| c.status == JobStatus::Processing);
    let any_completed = current.iter().any(|c| c.status == JobStatus::Completed);
    // A wave where every job failed never reaches the aggregate alert;
    // per-record errors stay visible inline instead.
    if was_processing && !is_processing && any_completed {
        alerts.push(Alert::AllDone);
    }

    alerts
}
