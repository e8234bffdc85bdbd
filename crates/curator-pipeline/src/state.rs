//! Workflow states, triggers, and the transition table.
//!
//! # Design
//! - Transitions are data: a static `(state, outcome) -> (next, merge)` table.
//! - Triggers are only accepted in quiescent states; stage states advance on
//!   stage outcomes alone.

use std::fmt;

use serde::{Deserialize, Serialize};

/// States of the scanner workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Waiting for a scan trigger.
    Idle,
    /// Enumerating candidate directories.
    Scanning,
    /// Probing candidate directories for read and write access.
    CheckingPermissions,
    /// Classifying files by extension and resolution.
    EvaluatingFiles,
    /// Relocating qualifying files.
    MovingFiles,
    /// Holding a failure until an operator acknowledges it.
    ReportingErrors,
}

impl PipelineState {
    /// Stable label used in logs, events, and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::CheckingPermissions => "checking_permissions",
            Self::EvaluatingFiles => "evaluating_files",
            Self::MovingFiles => "moving_files",
            Self::ReportingErrors => "reporting_errors",
        }
    }

    /// Stage actor invoked while the workflow is in this state.
    #[must_use]
    pub const fn stage(self) -> Option<Stage> {
        match self {
            Self::Scanning => Some(Stage::Scan),
            Self::CheckingPermissions => Some(Stage::Permissions),
            Self::EvaluatingFiles => Some(Stage::Evaluate),
            Self::MovingFiles => Some(Stage::Move),
            Self::Idle | Self::ReportingErrors => None,
        }
    }

    /// Whether the workflow rests here until the next trigger.
    #[must_use]
    pub const fn is_quiescent(self) -> bool {
        self.stage().is_none()
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four stage actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Directory discovery.
    Scan,
    /// Access partitioning.
    Permissions,
    /// File classification.
    Evaluate,
    /// File relocation.
    Move,
}

impl Stage {
    /// Stable label used in logs, events, and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Permissions => "permissions",
            Self::Evaluate => "evaluate",
            Self::Move => "move",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External inputs accepted by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trigger {
    /// Begin a run from idle.
    StartScan,
    /// Acknowledge a reported failure and return to idle.
    Restart,
}

impl Trigger {
    /// Wire name of the trigger.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartScan => "START_SCAN",
            Self::Restart => "RESTART",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result classification of a stage actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The actor produced output.
    Success,
    /// The actor returned a structured failure.
    Failure,
}

impl Outcome {
    /// Stable label used in metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// How a stage result is folded into the run context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Leave the context untouched.
    Skip,
    /// Apply `RunContext::merge` with the stage output.
    Output,
    /// Apply `RunContext::merge_failure` with the failure payload.
    Failure,
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State the stage ran in.
    pub from: PipelineState,
    /// Stage outcome.
    pub outcome: Outcome,
    /// State entered next.
    pub to: PipelineState,
    /// Merge applied before entering `to`.
    pub merge: MergePolicy,
}

const fn row(
    from: PipelineState,
    outcome: Outcome,
    to: PipelineState,
    merge: MergePolicy,
) -> Transition {
    Transition {
        from,
        outcome,
        to,
        merge,
    }
}

/// Every stage transition the workflow can take.
pub const TRANSITIONS: &[Transition] = &[
    row(
        PipelineState::Scanning,
        Outcome::Success,
        PipelineState::CheckingPermissions,
        MergePolicy::Output,
    ),
    row(
        PipelineState::Scanning,
        Outcome::Failure,
        PipelineState::ReportingErrors,
        MergePolicy::Skip,
    ),
    row(
        PipelineState::CheckingPermissions,
        Outcome::Success,
        PipelineState::EvaluatingFiles,
        MergePolicy::Output,
    ),
    row(
        PipelineState::CheckingPermissions,
        Outcome::Failure,
        PipelineState::ReportingErrors,
        MergePolicy::Failure,
    ),
    row(
        PipelineState::EvaluatingFiles,
        Outcome::Success,
        PipelineState::MovingFiles,
        MergePolicy::Output,
    ),
    row(
        PipelineState::EvaluatingFiles,
        Outcome::Failure,
        PipelineState::ReportingErrors,
        MergePolicy::Skip,
    ),
    row(
        PipelineState::MovingFiles,
        Outcome::Success,
        PipelineState::Idle,
        MergePolicy::Output,
    ),
    row(
        PipelineState::MovingFiles,
        Outcome::Failure,
        PipelineState::ReportingErrors,
        MergePolicy::Skip,
    ),
];

/// Look up the transition for a stage outcome.
#[must_use]
pub fn transition(from: PipelineState, outcome: Outcome) -> Option<Transition> {
    TRANSITIONS
        .iter()
        .find(|t| t.from == from && t.outcome == outcome)
        .copied()
}

/// State entered when `trigger` arrives in `state`, if it is accepted there.
#[must_use]
pub const fn accept(state: PipelineState, trigger: Trigger) -> Option<PipelineState> {
    match (state, trigger) {
        (PipelineState::Idle, Trigger::StartScan) => Some(PipelineState::Scanning),
        (PipelineState::ReportingErrors, Trigger::Restart) => Some(PipelineState::Idle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PipelineState; 6] = [
        PipelineState::Idle,
        PipelineState::Scanning,
        PipelineState::CheckingPermissions,
        PipelineState::EvaluatingFiles,
        PipelineState::MovingFiles,
        PipelineState::ReportingErrors,
    ];

    #[test]
    fn every_stage_state_has_both_outcomes() {
        for state in ALL {
            for outcome in [Outcome::Success, Outcome::Failure] {
                assert_eq!(
                    transition(state, outcome).is_some(),
                    state.stage().is_some(),
                    "{state} {outcome:?}"
                );
            }
        }
    }

    #[test]
    fn failures_always_route_to_reporting() {
        for row in TRANSITIONS.iter().filter(|t| t.outcome == Outcome::Failure) {
            assert_eq!(row.to, PipelineState::ReportingErrors);
        }
        let permission = transition(PipelineState::CheckingPermissions, Outcome::Failure);
        assert_eq!(permission.map(|t| t.merge), Some(MergePolicy::Failure));
    }

    #[test]
    fn triggers_only_accepted_in_quiescent_states() {
        assert_eq!(
            accept(PipelineState::Idle, Trigger::StartScan),
            Some(PipelineState::Scanning)
        );
        assert_eq!(
            accept(PipelineState::ReportingErrors, Trigger::Restart),
            Some(PipelineState::Idle)
        );
        assert_eq!(accept(PipelineState::Idle, Trigger::Restart), None);
        assert_eq!(
            accept(PipelineState::ReportingErrors, Trigger::StartScan),
            None
        );
        for state in ALL.into_iter().filter(|s| !s.is_quiescent()) {
            assert_eq!(accept(state, Trigger::StartScan), None);
            assert_eq!(accept(state, Trigger::Restart), None);
        }
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(PipelineState::CheckingPermissions.to_string(), "checking_permissions");
        assert_eq!(Trigger::StartScan.to_string(), "START_SCAN");
        assert_eq!(Stage::Move.as_str(), "move");
    }
}
