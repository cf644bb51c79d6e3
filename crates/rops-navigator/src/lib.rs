//! Research Ops Tour Navigator
//!
//! Executes a guided tour held in a [`rops_store::DemoStore`]:
//! - Read delay before each step, settle delay before advancing
//! - Navigation with bounded verification and a route-pattern fallback
//! - Content check on heavy pages
//! - Pause/resume and user-driven retry, skip and reset
//! - Stale continuations discarded after reset, exit or manual navigation
//!
//! Side effects go through a [`TourEffects`] implementation supplied by the
//! host (a router, a headless browser or a test fake).
//!
//! # Example
//!
//! ```rust,ignore
//! use rops_model::StepTable;
//! use rops_navigator::{NavigatorConfig, TourNavigator};
//! use rops_store::DemoStore;
//! use std::sync::Arc;
//!
//! # async fn example(effects: Arc<dyn rops_navigator::TourEffects>) {
//! let store = Arc::new(DemoStore::in_memory(StepTable::enterprise()));
//! let navigator = TourNavigator::new(store, effects, NavigatorConfig::default());
//! let driver = navigator.spawn();
//! navigator.start_demo();
//! # navigator.shutdown();
//! # driver.await.ok();
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod effects;
mod error;
mod navigator;
mod retry;
mod route;
mod status;

pub use config::NavigatorConfig;
pub use effects::TourEffects;
pub use error::{ConfigError, EffectError, NavigatorError, StepFailure};
pub use navigator::TourNavigator;
pub use retry::{retry, RetryOutcome, RetryPolicy};
pub use route::{normalize_path, NavigationMatch, Page, RoutePattern, RouteTable};
pub use status::{NavigatorStatus, StepPhase};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a tour
    pub use crate::{
        NavigatorConfig, NavigatorStatus, Page, StepPhase, TourEffects, TourNavigator,
    };
    pub use rops_model::{DemoStep, StepAction, StepTable};
    pub use rops_store::DemoStore;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
