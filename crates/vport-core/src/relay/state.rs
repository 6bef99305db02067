//! Relay lifecycle state machine.

/// Relay state machine.
///
/// `Initializing → Running → Draining → Stopped`. Initialization failures
/// jump straight to `Stopped`; `Draining` exists so both handles are
/// released before the process reports its exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayState {
    /// Device and channel are being created.
    #[default]
    Initializing,
    /// Bridging traffic between device and channel.
    Running,
    /// Releasing both handles.
    Draining,
    /// Terminal.
    Stopped,
}

impl RelayState {
    /// Check if the relay is running.
    pub fn is_running(&self) -> bool {
        matches!(self, RelayState::Running)
    }

    /// Check if the relay has stopped.
    pub fn is_stopped(&self) -> bool {
        matches!(self, RelayState::Stopped)
    }

    /// Transition to running state.
    pub fn begin_running(&mut self) -> Result<(), RelayStateError> {
        match self {
            RelayState::Initializing => {
                *self = RelayState::Running;
                Ok(())
            }
            _ => Err(RelayStateError::InvalidTransition {
                from: self.state_name(),
                to: "Running",
            }),
        }
    }

    /// Transition to draining state.
    pub fn begin_draining(&mut self) -> Result<(), RelayStateError> {
        match self {
            RelayState::Running => {
                *self = RelayState::Draining;
                Ok(())
            }
            _ => Err(RelayStateError::InvalidTransition {
                from: self.state_name(),
                to: "Draining",
            }),
        }
    }

    /// Transition to the terminal state.
    ///
    /// Reachable from `Draining` on the normal path and from
    /// `Initializing` when startup fails before anything was opened.
    pub fn stop(&mut self) -> Result<(), RelayStateError> {
        match self {
            RelayState::Draining | RelayState::Initializing => {
                *self = RelayState::Stopped;
                Ok(())
            }
            _ => Err(RelayStateError::InvalidTransition {
                from: self.state_name(),
                to: "Stopped",
            }),
        }
    }

    /// Get the name of the current state.
    pub fn state_name(&self) -> &'static str {
        match self {
            RelayState::Initializing => "Initializing",
            RelayState::Running => "Running",
            RelayState::Draining => "Draining",
            RelayState::Stopped => "Stopped",
        }
    }
}

/// Relay state transition error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayStateError {
    /// Invalid state transition.
    InvalidTransition {
        /// State we tried to transition from.
        from: &'static str,
        /// State we tried to transition to.
        to: &'static str,
    },
}

impl std::fmt::Display for RelayStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTransition { from, to } => {
                write!(f, "Invalid relay state transition: {} -> {}", from, to)
            }
        }
    }
}

impl std::error::Error for RelayStateError {}

impl From<RelayStateError> for crate::Error {
    fn from(err: RelayStateError) -> Self {
        match err {
            RelayStateError::InvalidTransition { from, to } => crate::Error::InvalidState {
                expected: to.to_string(),
                actual: from.to_string(),
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_default() {
        let state = RelayState::default();
        assert_eq!(state, RelayState::Initializing);
        assert!(!state.is_running());
        assert!(!state.is_stopped());
    }

    #[test]
    fn full_lifecycle() {
        let mut state = RelayState::default();
        state.begin_running().unwrap();
        assert!(state.is_running());
        state.begin_draining().unwrap();
        state.stop().unwrap();
        assert!(state.is_stopped());
    }

    #[test]
    fn initialization_failure_stops_directly() {
        let mut state = RelayState::Initializing;
        state.stop().unwrap();
        assert!(state.is_stopped());
    }

    #[test]
    fn cannot_run_twice() {
        let mut state = RelayState::Initializing;
        state.begin_running().unwrap();
        assert!(state.begin_running().is_err());
    }

    #[test]
    fn cannot_drain_before_running() {
        let mut state = RelayState::Initializing;
        assert!(state.begin_draining().is_err());
    }

    #[test]
    fn cannot_stop_while_running() {
        let mut state = RelayState::Initializing;
        state.begin_running().unwrap();
        assert!(state.stop().is_err());
    }

    #[test]
    fn stopped_is_terminal() {
        let mut state = RelayState::Stopped;
        assert!(state.begin_running().is_err());
        assert!(state.begin_draining().is_err());
        assert!(state.stop().is_err());
    }

    #[test]
    fn state_error_converts_to_crate_error() {
        let mut state = RelayState::Stopped;
        let err: crate::Error = state.begin_running().unwrap_err().into();
        assert!(matches!(err, crate::Error::InvalidState { .. }));
    }
}
