//! Error types for the tour navigator
//!
//! Nothing here escapes a running tour: navigation failures are recorded as
//! a [`StepFailure`] on the navigator status and auto-advance halts until the
//! user retries, skips or resets.

use serde::Serialize;
use std::path::PathBuf;

/// Main navigator error type
#[derive(Debug, thiserror::Error)]
pub enum NavigatorError {
    /// Browser never reached the target route
    #[error("navigation to {target} failed after {attempts} attempts (at {last_location})")]
    NavigationFailed {
        step_id: String,
        target: String,
        attempts: u32,
        last_location: String,
    },

    /// A navigation step has no route to go to
    #[error("no route for step {step_id} ({action})")]
    UnknownRoute { step_id: String, action: String },

    /// The step stopped being current while it ran
    #[error("step {step_id} superseded before it finished")]
    Superseded { step_id: String },

    /// Route template could not be parsed
    #[error("invalid route template: {0}")]
    InvalidRoute(String),

    /// Effect executor failed
    #[error("effect failed: {0}")]
    Effect(#[from] EffectError),
}

impl NavigatorError {
    /// Check if a user retry might succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NavigationFailed { .. } | Self::Effect(_))
    }
}

/// Failure reported by a [`crate::TourEffects`] implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    /// The router refused the transition
    #[error("navigation rejected: {0}")]
    Rejected(String),

    /// The effect target is gone (page torn down, browser closed)
    #[error("effects unavailable: {0}")]
    Unavailable(String),
}

/// Navigator configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::NavigatorConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but make no sense together
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Visible, dismissible error tied to the step that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFailure {
    pub step_index: usize,
    pub step_id: String,
    /// Route the step was trying to reach
    pub target: Option<String>,
    pub message: String,
    pub attempts: u32,
    /// Hidden from the status indicator, still halting auto-advance
    pub dismissed: bool,
}

impl StepFailure {
    /// Build from the error that halted a step
    #[must_use]
    pub fn from_error(step_index: usize, step_id: impl Into<String>, error: &NavigatorError) -> Self {
        let (target, attempts) = match error {
            NavigatorError::NavigationFailed {
                target, attempts, ..
            } => (Some(target.clone()), *attempts),
            _ => (None, 0),
        };
        Self {
            step_index,
            step_id: step_id.into(),
            target,
            message: error.to_string(),
            attempts,
            dismissed: false,
        }
    }
}
