//! Run lifecycle state machine.

use serde::{Deserialize, Serialize};

/// Current state of a supervised run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Idle,
    Attempting,
    Retrying,
    Succeeded,
    Exhausted,
}

impl RunState {
    /// Whether the run has finished, one way or the other.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Exhausted)
    }

    /// State name as used for the `status` log field.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Attempting => "attempting",
            Self::Retrying => "retrying",
            Self::Succeeded => "succeeded",
            Self::Exhausted => "exhausted",
        }
    }
}

/// State machine for tracking run progress across attempts.
#[derive(Debug, Clone)]
pub struct RunStateTracker {
    state: RunState,
    attempts: u32,
}

impl Default for RunStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
            attempts: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn transition(&mut self, new_state: RunState) {
        tracing::debug!(from = ?self.state, to = ?new_state, "State transition");
        self.state = new_state;
    }

    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    /// Number of attempts started so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_match_states() {
        assert_eq!(RunState::Idle.label(), "idle");
        assert_eq!(RunState::Attempting.label(), "attempting");
        assert_eq!(RunState::Retrying.label(), "retrying");
        assert_eq!(RunState::Succeeded.label(), "succeeded");
        assert_eq!(RunState::Exhausted.label(), "exhausted");
    }

    #[test]
    fn test_terminal_states() {
        assert!(RunState::Succeeded.is_terminal());
        assert!(RunState::Exhausted.is_terminal());
        assert!(!RunState::Idle.is_terminal());
        assert!(!RunState::Attempting.is_terminal());
        assert!(!RunState::Retrying.is_terminal());
    }

    #[test]
    fn test_tracker_transitions_and_counts() {
        let mut tracker = RunStateTracker::new();
        assert_eq!(tracker.state(), RunState::Idle);
        assert_eq!(tracker.attempts(), 0);

        tracker.transition(RunState::Attempting);
        tracker.record_attempt();
        assert_eq!(tracker.state(), RunState::Attempting);
        assert_eq!(tracker.attempts(), 1);

        tracker.transition(RunState::Exhausted);
        assert!(tracker.state().is_terminal());
    }
}
