//! Wire events pushed to the caller of an analysis request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::ScreenerError;
use crate::payload::CategoryPayload;
use crate::response::AggregatedResponse;
use crate::task::{AgentTask, AttemptError, FailureReason, TaskStatus};

/// Kind of a stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// One category reached a terminal state.
    TaskCompleted,
    /// The merged response; always the last event.
    Final,
    /// The request was rejected before any work started.
    Error,
}

/// Payload of a `task_completed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Adapter that produced the data, if any.
    pub source: Option<String>,
    /// Category data, if any.
    pub result: Option<CategoryPayload>,
    /// Expected fields missing from a partial result.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
    /// Why the task failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// Classified failures in attempt order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<AttemptError>,
}

/// Payload of an `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code, e.g. `invalid_symbol`.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Event payloads. Serialized without a tag; `type` on the event disambiguates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    /// Merged response of a `final` event.
    Final(Box<AggregatedResponse>),
    /// Body of an `error` event.
    Error(ErrorBody),
    /// Body of a `task_completed` event.
    Task(TaskOutcome),
}

/// One message on the analysis stream: `{type, category?, status?, payload?, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Event kind, serialized as `type`.
    #[serde(rename = "type")]
    pub kind: EventType,
    /// Category of a `task_completed` event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Terminal status of a `task_completed` event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Event body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<EventPayload>,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
}

impl StreamEvent {
    /// Event for a terminal agent task.
    #[must_use]
    pub fn task_completed(task: &AgentTask, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: EventType::TaskCompleted,
            category: Some(task.category),
            status: Some(task.status),
            payload: Some(EventPayload::Task(TaskOutcome {
                source: task.contributing_source.clone(),
                result: task.result.clone(),
                missing_fields: task.missing_fields.clone(),
                reason: task.failure,
                errors: task.errors.clone(),
            })),
            timestamp,
        }
    }

    /// The terminal event carrying the merged response.
    #[must_use]
    pub fn final_response(response: AggregatedResponse, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: EventType::Final,
            category: None,
            status: None,
            payload: Some(EventPayload::Final(Box::new(response))),
            timestamp,
        }
    }

    /// A request-level rejection.
    #[must_use]
    pub fn error(err: &ScreenerError, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: EventType::Error,
            category: None,
            status: None,
            payload: Some(EventPayload::Error(ErrorBody {
                error: err.code().to_string(),
                message: err.to_string(),
            })),
            timestamp,
        }
    }

    /// Whether this is the `final` event.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.kind == EventType::Final
    }

    /// The merged response when this is the `final` event.
    #[must_use]
    pub fn as_final(&self) -> Option<&AggregatedResponse> {
        match &self.payload {
            Some(EventPayload::Final(r)) if self.kind == EventType::Final => Some(r),
            _ => None,
        }
    }
}
