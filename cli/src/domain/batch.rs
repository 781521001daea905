//! Batch operation types: what a multi-service command does and how it ended.

use std::fmt;

pub use tether_common::{BatchOutcome, BatchResult, BatchSummary};

/// Lifecycle operation applied to every member of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    Stop,
    Restart,
    Remove {
        /// Also delete log files and alert state.
        purge: bool,
    },
}

impl BatchOperation {
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            BatchOperation::Stop => "stop",
            BatchOperation::Restart => "restart",
            BatchOperation::Remove { .. } => "remove",
        }
    }

    /// Past tense, for result lines.
    #[must_use]
    pub fn past_tense(self) -> &'static str {
        match self {
            BatchOperation::Stop => "stopped",
            BatchOperation::Restart => "restarted",
            BatchOperation::Remove { .. } => "removed",
        }
    }
}

impl fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// How a batch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchRun {
    /// The user declined the confirmation prompt. Nothing was executed.
    Cancelled,
    /// One result per selected service, in selection order.
    Completed(Vec<BatchResult>),
}

impl BatchRun {
    #[must_use]
    pub fn results(&self) -> &[BatchResult] {
        match self {
            BatchRun::Cancelled => &[],
            BatchRun::Completed(results) => results,
        }
    }

    /// `true` only when the batch ran and every member succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            BatchRun::Cancelled => false,
            BatchRun::Completed(results) => results.iter().all(BatchResult::is_success),
        }
    }
}

/// Destructive bulk operations need confirmation unless forced.
#[must_use]
pub fn needs_confirmation(member_count: usize, force: bool) -> bool {
    member_count > 1 && !force
}

/// Prompt shown before a bulk operation.
#[must_use]
pub fn confirmation_prompt(operation: BatchOperation, names: &[impl AsRef<str>]) -> String {
    let list = names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} {} services ({list})?", capitalize(operation.verb()), names.len())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
