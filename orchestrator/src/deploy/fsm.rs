//! Finite state machine for the deployment pipeline
//!
//! FETCH → PROVISION → EXECUTE → DONE, with a single absorbing FAILED
//! state reachable from any of the first three. Advancing requires an
//! explicit step outcome; there is no way back out of FAILED.

/// Pipeline step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployStep {
    /// Fetching the source repository
    Fetch,

    /// Provisioning the runtime environment and installing dependencies
    Provision,

    /// Executing the workload
    Execute,

    /// All steps completed
    Done,

    /// A step failed; no further step runs
    Failed,
}

/// Step outcome event
#[derive(Debug, Clone)]
pub enum DeployEvent {
    /// The current step succeeded
    StepSucceeded,

    /// The current step failed with a cause
    StepFailed(String),
}

/// Deployment FSM
#[derive(Debug, Clone)]
pub struct DeployFsm {
    step: DeployStep,
    error: Option<String>,
}

impl DeployFsm {
    /// Create a new FSM ready to fetch
    pub fn new() -> Self {
        Self {
            step: DeployStep::Fetch,
            error: None,
        }
    }

    /// Get the current step
    pub fn step(&self) -> &DeployStep {
        &self.step
    }

    /// Get the failure cause if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the pipeline has reached a terminal step
    pub fn is_terminal(&self) -> bool {
        matches!(self.step, DeployStep::Done | DeployStep::Failed)
    }

    /// Process a step outcome and transition
    pub fn process(&mut self, event: DeployEvent) -> Result<(), String> {
        let next = match (&self.step, &event) {
            (DeployStep::Fetch, DeployEvent::StepSucceeded) => DeployStep::Provision,
            (DeployStep::Provision, DeployEvent::StepSucceeded) => DeployStep::Execute,
            (DeployStep::Execute, DeployEvent::StepSucceeded) => DeployStep::Done,

            (
                DeployStep::Fetch | DeployStep::Provision | DeployStep::Execute,
                DeployEvent::StepFailed(cause),
            ) => {
                self.error = Some(cause.clone());
                DeployStep::Failed
            }

            (step, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", step, event));
            }
        };

        self.step = next;
        Ok(())
    }
}

impl Default for DeployFsm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path() {
        let mut fsm = DeployFsm::new();
        assert_eq!(fsm.step(), &DeployStep::Fetch);
        assert!(!fsm.is_terminal());

        fsm.process(DeployEvent::StepSucceeded).unwrap();
        assert_eq!(fsm.step(), &DeployStep::Provision);

        fsm.process(DeployEvent::StepSucceeded).unwrap();
        assert_eq!(fsm.step(), &DeployStep::Execute);

        fsm.process(DeployEvent::StepSucceeded).unwrap();
        assert_eq!(fsm.step(), &DeployStep::Done);
        assert!(fsm.is_terminal());
        assert!(fsm.error().is_none());
    }

    #[test]
    fn test_failure_from_each_step() {
        for advance in 0..3 {
            let mut fsm = DeployFsm::new();
            for _ in 0..advance {
                fsm.process(DeployEvent::StepSucceeded).unwrap();
            }
            fsm.process(DeployEvent::StepFailed("boom".to_string()))
                .unwrap();
            assert_eq!(fsm.step(), &DeployStep::Failed);
            assert_eq!(fsm.error(), Some("boom"));
            assert!(fsm.is_terminal());
        }
    }

    #[test]
    fn test_failed_is_absorbing() {
        let mut fsm = DeployFsm::new();
        fsm.process(DeployEvent::StepFailed("boom".to_string()))
            .unwrap();
        assert!(fsm.process(DeployEvent::StepSucceeded).is_err());
        assert_eq!(fsm.step(), &DeployStep::Failed);
    }

    #[test]
    fn test_done_accepts_no_events() {
        let mut fsm = DeployFsm::new();
        for _ in 0..3 {
            fsm.process(DeployEvent::StepSucceeded).unwrap();
        }
        assert!(fsm.process(DeployEvent::StepSucceeded).is_err());
        assert!(fsm
            .process(DeployEvent::StepFailed("late".to_string()))
            .is_err());
    }
}
