//! Any-state event handling in front of the workflow.

use curator_events::Event;
use tracing::{debug, info, warn};

use crate::error::{WorkflowError, WorkflowResult};
use crate::state::{PipelineState, Trigger};
use crate::workflow::ScannerWorkflow;

/// Events accepted by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Free-form notice, forwarded to the bus in any state.
    Notice(String),
    /// Pipeline trigger, forwarded to the workflow.
    Pipeline(Trigger),
}

/// Intercepts any-state events before handing triggers to the workflow.
pub struct Supervisor {
    workflow: ScannerWorkflow,
}

impl Supervisor {
    /// Wrap `workflow`.
    #[must_use]
    pub const fn new(workflow: ScannerWorkflow) -> Self {
        Self { workflow }
    }

    /// Wrapped workflow.
    #[must_use]
    pub const fn workflow(&self) -> &ScannerWorkflow {
        &self.workflow
    }

    /// Release the wrapped workflow.
    #[must_use]
    pub fn into_inner(self) -> ScannerWorkflow {
        self.workflow
    }

    /// Handle `event` and return the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TriggerRejected`] when the current state does not
    /// accept the trigger; the rejection is published and counted first.
    pub async fn dispatch(&mut self, event: SupervisorEvent) -> WorkflowResult<PipelineState> {
        match event {
            SupervisorEvent::Notice(message) => {
                info!(%message, "notice");
                self.publish(Event::Notice { message });
                Ok(self.workflow.state())
            }
            SupervisorEvent::Pipeline(trigger) => match self.workflow.send(trigger).await {
                Err(WorkflowError::TriggerRejected { trigger, state }) => {
                    warn!(
                        trigger = trigger.as_str(),
                        state = state.as_str(),
                        "trigger rejected"
                    );
                    self.workflow.metrics().inc_trigger_rejected();
                    self.publish(Event::TriggerRejected {
                        trigger: trigger.as_str().to_string(),
                        state: state.as_str().to_string(),
                    });
                    Err(WorkflowError::TriggerRejected { trigger, state })
                }
                other => other,
            },
        }
    }

    fn publish(&self, event: Event) {
        if let Err(error) = self.workflow.events().publish(event) {
            debug!(
                event_id = error.event_id(),
                event_kind = error.event_kind(),
                "event buffered without live subscribers"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{WorkflowDeps, WorkflowSettings};
    use curator_events::EventBus;
    use curator_fsops::LocalFs;
    use curator_telemetry::Metrics;
    use curator_test_support::{LibraryFixture, StaticProbe};
    use std::error::Error;
    use std::sync::Arc;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    fn supervisor(fixture: &LibraryFixture) -> TestResult<Supervisor> {
        let deps = WorkflowDeps::new(
            Arc::new(LocalFs),
            Arc::new(StaticProbe::new()),
            EventBus::new(),
            Metrics::new()?,
        );
        let settings = WorkflowSettings::new(fixture.base(), fixture.destination());
        Ok(Supervisor::new(ScannerWorkflow::new(settings, deps)?))
    }

    #[tokio::test]
    async fn notices_are_published_in_any_state() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let mut supervisor = supervisor(&fixture)?;
        let mut stream = supervisor.workflow().events().subscribe(None);

        let state = supervisor
            .dispatch(SupervisorEvent::Notice("maintenance window".into()))
            .await?;
        assert_eq!(state, PipelineState::Idle);
        let envelope = stream.next().await.ok_or("missing event")?;
        assert_eq!(
            envelope.event,
            Event::Notice {
                message: "maintenance window".into()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn notices_without_subscribers_stay_in_backlog() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let mut supervisor = supervisor(&fixture)?;

        let state = supervisor
            .dispatch(SupervisorEvent::Notice("nobody listening".into()))
            .await?;
        assert_eq!(state, PipelineState::Idle);
        let buffered = supervisor
            .workflow()
            .events()
            .backlog()
            .into_iter()
            .any(|envelope| {
                envelope.event
                    == Event::Notice {
                        message: "nobody listening".into(),
                    }
            });
        assert!(buffered);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_triggers_are_counted_and_published() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let mut supervisor = supervisor(&fixture)?;

        let result = supervisor
            .dispatch(SupervisorEvent::Pipeline(Trigger::Restart))
            .await;
        assert!(matches!(result, Err(WorkflowError::TriggerRejected { .. })));
        assert_eq!(
            supervisor.workflow().metrics().snapshot().triggers_rejected_total,
            1
        );
        let rejected = supervisor
            .workflow()
            .events()
            .backlog()
            .into_iter()
            .any(|envelope| {
                envelope.event
                    == Event::TriggerRejected {
                        trigger: "RESTART".into(),
                        state: "idle".into(),
                    }
            });
        assert!(rejected);
        Ok(())
    }
}
