//! Headless browser over the demo store
//!
//! [`SimulatedBrowser`] keeps a location and a history, accepts navigation
//! to any path the route table knows, and measures "main content" by
//! rendering the current page from a store snapshot.

use crate::view::render_path;
use parking_lot::Mutex;
use rops_model::StepAction;
use rops_navigator::{normalize_path, EffectError, Page, RouteTable, TourEffects};
use rops_store::DemoStore;
use std::sync::Arc;
use std::time::Duration;

/// [`TourEffects`] implementation rendering pages from a [`DemoStore`]
#[derive(Debug)]
pub struct SimulatedBrowser {
    store: Arc<DemoStore>,
    routes: RouteTable,
    history: Mutex<Vec<String>>,
}

impl SimulatedBrowser {
    /// Browser at `/`
    #[must_use]
    pub fn new(store: Arc<DemoStore>) -> Self {
        Self::at(store, "/")
    }

    /// Browser at an arbitrary starting location
    #[must_use]
    pub fn at(store: Arc<DemoStore>, path: &str) -> Self {
        Self {
            store,
            routes: RouteTable::standard(),
            history: Mutex::new(vec![path.to_string()]),
        }
    }

    /// Current location
    #[must_use]
    pub fn location(&self) -> String {
        self.history.lock().last().cloned().unwrap_or_else(|| "/".to_string())
    }

    /// Every location visited, starting location first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }

    /// Page at the current location, if it is routed
    #[must_use]
    pub fn page(&self) -> Option<Page> {
        self.routes.resolve(&self.location())
    }

    /// Text of the current page
    #[must_use]
    pub fn render(&self) -> String {
        let location = self.location();
        let page = self.routes.resolve(&location);
        self.store.read(|state| render_path(page, &location, state))
    }

    /// Go back one entry; returns false at the start of history
    pub fn back(&self) -> bool {
        let mut history = self.history.lock();
        if history.len() > 1 {
            history.pop();
            true
        } else {
            false
        }
    }
}

#[async_trait::async_trait]
impl TourEffects for SimulatedBrowser {
    async fn navigate(&self, path: &str) -> Result<(), EffectError> {
        let Some(page) = self.routes.resolve(path) else {
            tracing::warn!(path, "no route");
            return Err(EffectError::Rejected(format!("no route for {path}")));
        };
        let path = normalize_path(path);
        tracing::debug!(%path, %page, "navigated");
        self.history.lock().push(path);
        Ok(())
    }

    async fn current_path(&self) -> String {
        self.location()
    }

    async fn main_content_len(&self) -> usize {
        self.render().chars().count()
    }

    async fn simulate_work(&self, action: &StepAction, duration: Duration) {
        tracing::debug!(%action, ms = duration.as_millis(), "simulated work");
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
