use crate::hook::HookOutcome;
use std::path::PathBuf;

/// Points in a run reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkpoint {
    Started,
    SourceLoaded { rows: usize },
    RowsWritten { first: u32, last: u32 },
    Saved { path: PathBuf },
    HookResult(HookOutcome),
}

impl Checkpoint {
    /// Rough completion percentage at this checkpoint.
    pub fn percent(&self) -> u8 {
        match self {
            Checkpoint::Started => 10,
            Checkpoint::SourceLoaded { .. } => 40,
            Checkpoint::RowsWritten { .. } => 70,
            Checkpoint::Saved { .. } => 90,
            Checkpoint::HookResult(_) => 100,
        }
    }
}

pub trait ProgressSink {
    fn notify(&mut self, checkpoint: Checkpoint);
}

/// Reports checkpoints through `tracing`.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn notify(&mut self, checkpoint: Checkpoint) {
        let percent = checkpoint.percent();
        match checkpoint {
            Checkpoint::Started => tracing::info!(percent, "started"),
            Checkpoint::SourceLoaded { rows } => {
                tracing::info!(percent, rows, "loading export read")
            }
            Checkpoint::RowsWritten { first, last } => {
                tracing::info!(percent, first, last, "rows written")
            }
            Checkpoint::Saved { path } => {
                tracing::info!(percent, path = %path.display(), "ledger saved")
            }
            Checkpoint::HookResult(outcome) => match outcome {
                HookOutcome::Success | HookOutcome::Skipped => {
                    tracing::info!(percent, "{}", outcome)
                }
                HookOutcome::Unavailable(_) | HookOutcome::Failed(_) => {
                    tracing::warn!(percent, "{}", outcome)
                }
            },
        }
    }
}

/// Collects checkpoints in order.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordedProgress(pub Vec<Checkpoint>);

#[cfg(test)]
impl ProgressSink for RecordedProgress {
    fn notify(&mut self, checkpoint: Checkpoint) {
        self.0.push(checkpoint);
    }
}
