//! Navigator status as seen by the UI

use crate::error::StepFailure;
use serde::Serialize;

/// What the navigator is doing with the current step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    /// Not in demo mode, or nothing scheduled
    #[default]
    Idle,
    /// Read delay running
    WaitingToStart,
    Executing,
    /// Issuing a route change
    Navigating,
    /// Checking the location (and content, on heavy pages)
    Verifying,
    /// Current step completed; settle delay may be running
    Completed,
    /// Current step failed; auto-advance halted
    Failed,
    Paused,
}

impl StepPhase {
    /// True while a step is actively executing
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Executing | Self::Navigating | Self::Verifying)
    }
}

/// Snapshot published on every phase or position change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigatorStatus {
    pub phase: StepPhase,
    pub is_demo_mode: bool,
    pub is_paused: bool,
    pub current_step: usize,
    pub step_count: usize,
    pub step_id: String,
    /// Undismissed failure of the current step
    pub failure: Option<StepFailure>,
}

impl NavigatorStatus {
    /// "3 / 16" style progress label
    #[must_use]
    pub fn progress_label(&self) -> String {
        format!("{} / {}", self.current_step + 1, self.step_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_label_is_one_based() {
        let status = NavigatorStatus {
            current_step: 2,
            step_count: 16,
            ..NavigatorStatus::default()
        };
        assert_eq!(status.progress_label(), "3 / 16");
    }

    #[test]
    fn busy_phases() {
        assert!(StepPhase::Navigating.is_busy());
        assert!(!StepPhase::WaitingToStart.is_busy());
        assert!(!StepPhase::Failed.is_busy());
    }
}
