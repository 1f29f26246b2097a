//! Command lifecycle state machine.

/// Lifecycle state of a remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandState {
    /// The command is running, or its output has not been polled to the end.
    #[default]
    Running,
    /// The remote side reported completion with an exit code.
    Finished,
    /// The command was canceled before completion was observed.
    Canceled,
    /// Polling stopped on an error.
    Failed,
}

impl CommandState {
    /// Check if transition to target state is valid.
    ///
    /// Only `Running` may move, and only to one of the terminal states.
    pub fn can_transition_to(&self, target: CommandState) -> bool {
        use CommandState::*;
        matches!(
            (*self, target),
            (Running, Finished) | (Running, Canceled) | (Running, Failed)
        )
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&mut self, target: CommandState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::WinrmError::InvalidState(format!(
                "invalid command state transition from {:?} to {:?}",
                self, target
            )))
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommandState::Running)
    }
}
