//! Execution state machine.

use serde::{Deserialize, Serialize};

/// Current state of an `ffmpeg` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    #[default]
    Idle,
    Launching,
    Running,
    Completed,
    Terminated,
    Failed,
}

impl ExecutionState {
    /// Returns true for `Completed`, `Terminated` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Terminated | Self::Failed)
    }
}

/// Mutable run record shared between `execute` and `terminate`.
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    state: ExecutionState,
    pid: Option<u32>,
    terminated: bool,
}

impl Lifecycle {
    pub(crate) fn state(&self) -> ExecutionState {
        self.state
    }

    pub(crate) fn transition(&mut self, new_state: ExecutionState) {
        tracing::debug!(from = ?self.state, to = ?new_state, "State transition");
        self.state = new_state;
    }

    pub(crate) fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub(crate) fn set_pid(&mut self, pid: Option<u32>) {
        self.pid = pid;
    }

    pub(crate) fn terminated(&self) -> bool {
        self.terminated
    }

    pub(crate) fn mark_terminated(&mut self) {
        self.terminated = true;
    }

    /// Pick the terminal state for a normally finished run.
    ///
    /// A termination request wins over a failing exit status.
    pub(crate) fn settle(&mut self, success: bool) -> ExecutionState {
        let state = if success {
            ExecutionState::Completed
        } else if self.terminated {
            ExecutionState::Terminated
        } else {
            ExecutionState::Failed
        };
        self.pid = None;
        self.transition(state);
        state
    }
}
