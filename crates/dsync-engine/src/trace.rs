//! Human-readable record of what a run did, or would have done.

use serde::Serialize;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    /// Per-phase progress; recorded only in verbose mode.
    Progress,
    /// A mutation suppressed by dry-run mode.
    WouldPerform,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraceLine {
    pub kind: TraceKind,
    pub message: String,
}

/// Ordered trace lines for one run.
///
/// Lines are appended in the order the actions were (or would have been)
/// performed, so two dry runs over the same state yield identical traces.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SyncTrace {
    verbose: bool,
    lines: Vec<TraceLine>,
}

impl SyncTrace {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            lines: Vec::new(),
        }
    }

    /// Report progress. Logged at `info` and recorded when verbose,
    /// otherwise only logged at `debug`.
    pub fn progress(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.verbose {
            info!("{message}");
            self.lines.push(TraceLine {
                kind: TraceKind::Progress,
                message,
            });
        } else {
            debug!("{message}");
        }
    }

    /// Record a suppressed mutation as `"would <action>"`.
    pub fn would(&mut self, action: impl AsRef<str>) {
        let message = format!("would {}", action.as_ref());
        info!(dry_run = true, "{message}");
        self.lines.push(TraceLine {
            kind: TraceKind::WouldPerform,
            message,
        });
    }

    pub fn lines(&self) -> &[TraceLine] {
        &self.lines
    }

    fn messages(&self, kind: TraceKind) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| l.message.as_str())
            .collect()
    }

    pub fn would_lines(&self) -> Vec<&str> {
        self.messages(TraceKind::WouldPerform)
    }

    pub fn progress_lines(&self) -> Vec<&str> {
        self.messages(TraceKind::Progress)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append another trace's lines.
    pub fn extend(&mut self, other: SyncTrace) {
        self.lines.extend(other.lines);
    }
}
