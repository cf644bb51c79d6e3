//! Effect executor seam
//!
//! The navigator never touches a router or DOM itself. Everything observable
//! outside the store goes through [`TourEffects`]: route changes, reading the
//! current location, measuring rendered content and simulated async work.

use crate::error::EffectError;
use rops_model::StepAction;
use std::time::Duration;

/// Side effects the navigator drives
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TourEffects: Send + Sync {
    /// Request a route change
    ///
    /// Returning `Ok` does not mean the location changed; the navigator
    /// verifies that separately.
    async fn navigate(&self, path: &str) -> Result<(), EffectError>;

    /// Current location path, query and fragment included if present
    async fn current_path(&self) -> String;

    /// Number of rendered characters in the main content region
    async fn main_content_len(&self) -> usize;

    /// Stand-in for a network call made by `action`
    async fn simulate_work(&self, action: &StepAction, duration: Duration);
}
