//! Event payload types carried across the workspace.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Identifier assigned to each event emitted by the platform.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Typed domain events surfaced across the system.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A pipeline run was triggered and a fresh run context created.
    RunStarted {
        /// Identifier for the run.
        run_id: Uuid,
        /// Library root being scanned.
        base_path: String,
    },
    /// The workflow moved between states.
    StateChanged {
        /// Run the transition belongs to.
        run_id: Uuid,
        /// State the workflow left.
        from: String,
        /// State the workflow entered.
        to: String,
    },
    /// A stage actor finished successfully.
    StageCompleted {
        /// Run the stage belongs to.
        run_id: Uuid,
        /// Stage label (`scan`, `permissions`, `evaluate`, `move`).
        stage: String,
        /// Short summary of the stage output.
        detail: String,
    },
    /// A stage actor returned a structured failure.
    StageFailed {
        /// Run the stage belongs to.
        run_id: Uuid,
        /// Stage label.
        stage: String,
        /// Failure kind discriminator.
        kind: String,
        /// Human-readable failure message.
        message: String,
    },
    /// Files were relocated into the destination library.
    FilesRelocated {
        /// Run that relocated the files.
        run_id: Uuid,
        /// Number of files moved during this run.
        moved: usize,
        /// Number of files skipped because they were already in place.
        skipped: usize,
    },
    /// A failure report was dispatched for manual remediation.
    ErrorsReported {
        /// Run the report belongs to.
        run_id: Uuid,
        /// Headline of the failure.
        message: String,
        /// Serialized failure report.
        report: Value,
    },
    /// The run returned to idle after relocating files.
    RunCompleted {
        /// Identifier for the completed run.
        run_id: Uuid,
    },
    /// An operator acknowledged a failed run.
    RunAcknowledged {
        /// Identifier for the acknowledged run.
        run_id: Uuid,
    },
    /// A trigger was not accepted in the current state.
    TriggerRejected {
        /// Trigger name.
        trigger: String,
        /// State the workflow was in.
        state: String,
    },
    /// Free-form notice forwarded by the supervisor.
    Notice {
        /// Notice text.
        message: String,
    },
}

impl Event {
    /// Machine-friendly discriminator for subscribers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::StateChanged { .. } => "state_changed",
            Self::StageCompleted { .. } => "stage_completed",
            Self::StageFailed { .. } => "stage_failed",
            Self::FilesRelocated { .. } => "files_relocated",
            Self::ErrorsReported { .. } => "errors_reported",
            Self::RunCompleted { .. } => "run_completed",
            Self::RunAcknowledged { .. } => "run_acknowledged",
            Self::TriggerRejected { .. } => "trigger_rejected",
            Self::Notice { .. } => "notice",
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EventEnvelope {
    /// Sequential identifier.
    pub id: EventId,
    /// Emission timestamp.
    pub timestamp: DateTime<Utc>,
    /// Wrapped event.
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let event = Event::FilesRelocated {
            run_id: Uuid::nil(),
            moved: 2,
            skipped: 1,
        };
        let value = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(value["type"], json!("files_relocated"));
        assert_eq!(value["moved"], json!(2));
    }

    #[test]
    fn kind_matches_serde_tag() {
        let event = Event::Notice {
            message: "hello".into(),
        };
        let value = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(value["type"], json!(event.kind()));
    }
}
