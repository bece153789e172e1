//! Agent task lifecycle.
#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::{ScreenerError, SourceError};
use crate::payload::CategoryPayload;

/// Lifecycle state of an agent task.
///
/// Transitions are one-directional: `Pending -> Running -> {Succeeded, Partial, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Partial,
    Failed,
}

impl TaskStatus {
    /// Succeeded, partial and failed are terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Partial | Self::Failed)
    }

    /// Whether the task carries data that should reach the response.
    #[must_use]
    pub const fn contributes(self) -> bool {
        matches!(self, Self::Succeeded | Self::Partial)
    }

    /// Whether moving from `self` to `next` is allowed.
    ///
    /// A pending task may fail without ever running (deadline or cancellation
    /// before the agent started).
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running | Self::Failed)
                | (Self::Running, Self::Succeeded | Self::Partial | Self::Failed)
        )
    }

    /// Stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// Why a task ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Every adapter in the chain failed.
    Exhausted,
    /// The request deadline elapsed first.
    Timeout,
    /// The request was cancelled.
    Cancelled,
}

/// Attempts spent on one adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterAttempts {
    pub adapter: String,
    pub attempts: u32,
}

/// One classified failure, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptError {
    pub adapter: String,
    pub attempt: u32,
    pub error: SourceError,
}

/// State of one category for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTask {
    pub category: Category,
    pub status: TaskStatus,
    pub attempts_per_adapter: Vec<AdapterAttempts>,
    pub result: Option<CategoryPayload>,
    pub contributing_source: Option<String>,
    pub errors: Vec<AttemptError>,
    pub failure: Option<FailureReason>,
    /// Expected fields the result lacks when `status` is `Partial`.
    pub missing_fields: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AgentTask {
    /// Fresh pending task.
    #[must_use]
    pub const fn new(category: Category) -> Self {
        Self {
            category,
            status: TaskStatus::Pending,
            attempts_per_adapter: Vec::new(),
            result: None,
            contributing_source: None,
            errors: Vec::new(),
            failure: None,
            missing_fields: Vec::new(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Task the orchestrator synthesizes for a category still running at the deadline.
    #[must_use]
    pub fn timed_out(category: Category, started_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::new(category).expire(started_at, now)
    }

    /// Force this task to `Failed(timeout)` at `now`.
    ///
    /// Attempt and error ledgers are kept; any result is dropped. `started_at`
    /// is used when the task never recorded its own start.
    #[must_use]
    pub fn expire(mut self, started_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        self.started_at.get_or_insert(started_at);
        self.status = TaskStatus::Failed;
        self.failure = Some(FailureReason::Timeout);
        self.completed_at = Some(now);
        self.result = None;
        self.contributing_source = None;
        self.missing_fields.clear();
        self
    }

    /// Move to `next`, stamping start/completion times.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the transition would go backwards or leave a terminal state.
    pub fn transition(&mut self, next: TaskStatus, at: DateTime<Utc>) -> Result<(), ScreenerError> {
        if !self.status.can_transition_to(next) {
            return Err(ScreenerError::InvalidArg(format!(
                "{} task cannot move from {} to {}",
                self.category,
                self.status.as_str(),
                next.as_str()
            )));
        }
        if next == TaskStatus::Running {
            self.started_at = Some(at);
        }
        if next.is_terminal() {
            self.completed_at = Some(at);
        }
        self.status = next;
        Ok(())
    }

    /// Count one attempt against `adapter`, returning the attempt number.
    pub fn record_attempt(&mut self, adapter: &str) -> u32 {
        if let Some(last) = self.attempts_per_adapter.last_mut()
            && last.adapter == adapter
        {
            last.attempts += 1;
            return last.attempts;
        }
        self.attempts_per_adapter.push(AdapterAttempts {
            adapter: adapter.to_string(),
            attempts: 1,
        });
        1
    }

    /// Append a classified failure.
    pub fn record_error(&mut self, adapter: &str, attempt: u32, error: SourceError) {
        self.errors.push(AttemptError {
            adapter: adapter.to_string(),
            attempt,
            error,
        });
    }

    /// Total attempts across all adapters.
    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.attempts_per_adapter.iter().map(|a| a.attempts).sum()
    }

    /// Collapse a failed task into the error taxonomy.
    #[must_use]
    pub fn failure_error(&self) -> Option<ScreenerError> {
        match self.failure? {
            FailureReason::Exhausted => Some(ScreenerError::AgentExhausted {
                category: self.category,
                errors: self.errors.iter().map(|e| e.error.clone()).collect(),
            }),
            FailureReason::Timeout => Some(ScreenerError::OrchestratorTimeout {
                elapsed_ms: self
                    .started_at
                    .zip(self.completed_at)
                    .map(|(s, e)| u64::try_from((e - s).num_milliseconds()).unwrap_or(0))
                    .unwrap_or(0),
            }),
            FailureReason::Cancelled => Some(ScreenerError::Cancelled),
        }
    }
}
