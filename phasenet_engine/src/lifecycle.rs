//! Run lifecycle shared by both engine flavors.
//!
//! ```text
//! Idle ──run()──► Running ──stop()────────► Stopped
//!                    │
//!                    └──step/derivative fails──► Error
//! ```
//!
//! `Stopped` and `Error` are terminal. `stop()` is cooperative: the loop
//! checks the state between steps, never in the middle of one.

use std::sync::atomic::{AtomicU8, Ordering};

/// State of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Idle,
    Running,
    Stopped,
    Error,
}

impl RunState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RunState::Idle,
            1 => RunState::Running,
            2 => RunState::Stopped,
            _ => RunState::Error,
        }
    }
    
    fn as_u8(self) -> u8 {
        match self {
            RunState::Idle => 0,
            RunState::Running => 1,
            RunState::Stopped => 2,
            RunState::Error => 3,
        }
    }
    
    /// Whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Stopped | RunState::Error)
    }
}

/// Atomic holder of a [`RunState`], shared between the loop and whoever
/// may stop it.
#[derive(Debug)]
pub struct RunControl {
    state: AtomicU8,
}

impl RunControl {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(RunState::Idle.as_u8()),
        }
    }
    
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }
    
    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }
    
    fn transition(&self, from: RunState, to: RunState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
    
    /// Idle -> Running. Fails with the current state otherwise.
    pub fn start(&self) -> Result<(), RunState> {
        if self.transition(RunState::Idle, RunState::Running) {
            Ok(())
        } else {
            Err(self.state())
        }
    }
    
    /// Running -> Stopped. Returns whether this call stopped the run; a
    /// no-op in any other state.
    pub fn stop(&self) -> bool {
        self.transition(RunState::Running, RunState::Stopped)
    }
    
    /// Running -> Error.
    pub fn fail(&self) -> bool {
        self.transition(RunState::Running, RunState::Error)
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_lifecycle_happy_path() {
        let control = RunControl::new();
        assert_eq!(control.state(), RunState::Idle);
        assert!(control.start().is_ok());
        assert!(control.is_running());
        assert!(control.stop());
        assert_eq!(control.state(), RunState::Stopped);
        assert!(control.state().is_terminal());
    }
    
    #[test]
    fn test_stop_outside_running_is_noop() {
        let control = RunControl::new();
        assert!(!control.stop());
        assert_eq!(control.state(), RunState::Idle);
    }
    
    #[test]
    fn test_terminal_states_stay() {
        let control = RunControl::new();
        control.start().unwrap();
        assert!(control.fail());
        assert!(!control.stop());
        assert_eq!(control.start(), Err(RunState::Error));
    }
}
