//! Testing utilities for the Research Ops workspace
//!
//! A scriptable [`TourEffects`] fake and fixtures for building stores and
//! navigators with zero delays.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rops_model::{DemoStep, StepAction, StepTable};
use rops_navigator::{EffectError, NavigatorConfig, TourEffects, TourNavigator};
use rops_store::DemoStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// How the fake router reacts to a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterBehavior {
    /// Location changes immediately
    Follow,
    /// Location never changes
    Stuck,
    /// Location changes after this many further location reads
    Lag(u32),
}

#[derive(Debug)]
struct Inner {
    location: String,
    pending: Option<(String, u32)>,
    behavior: RouterBehavior,
    redirects: HashMap<String, String>,
    blocked: HashSet<String>,
    content_len: usize,
    navigations: Vec<String>,
    work: Vec<(StepAction, Duration)>,
}

/// Scriptable effects: fake router, content meter and work log
#[derive(Debug)]
pub struct ScriptedEffects {
    inner: Mutex<Inner>,
}

impl ScriptedEffects {
    /// At `/`, following every navigation, with plenty of rendered content
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                location: "/".to_string(),
                pending: None,
                behavior: RouterBehavior::Follow,
                redirects: HashMap::new(),
                blocked: HashSet::new(),
                content_len: 1_000,
                navigations: Vec::new(),
                work: Vec::new(),
            }),
        }
    }

    pub fn with_behavior(self, behavior: RouterBehavior) -> Self {
        self.inner.lock().behavior = behavior;
        self
    }

    /// Land on `to` whenever `from` is requested
    pub fn with_redirect(self, from: &str, to: &str) -> Self {
        self.inner
            .lock()
            .redirects
            .insert(from.to_string(), to.to_string());
        self
    }

    /// Reject navigations to `path`
    pub fn with_blocked(self, path: &str) -> Self {
        self.inner.lock().blocked.insert(path.to_string());
        self
    }

    pub fn with_content_len(self, chars: usize) -> Self {
        self.set_content_len(chars);
        self
    }

    pub fn set_content_len(&self, chars: usize) {
        self.inner.lock().content_len = chars;
    }

    pub fn set_behavior(&self, behavior: RouterBehavior) {
        self.inner.lock().behavior = behavior;
    }

    /// Move the fake browser without a navigation request
    pub fn jump_to(&self, path: &str) {
        let mut inner = self.inner.lock();
        inner.location = path.to_string();
        inner.pending = None;
    }

    pub fn location(&self) -> String {
        self.inner.lock().location.clone()
    }

    /// Every navigation request, in order
    pub fn navigations(&self) -> Vec<String> {
        self.inner.lock().navigations.clone()
    }

    /// Actions that ran simulated work, in order
    pub fn work_log(&self) -> Vec<StepAction> {
        self.inner
            .lock()
            .work
            .iter()
            .map(|(action, _)| action.clone())
            .collect()
    }
}

impl Default for ScriptedEffects {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TourEffects for ScriptedEffects {
    async fn navigate(&self, path: &str) -> Result<(), EffectError> {
        let mut inner = self.inner.lock();
        inner.navigations.push(path.to_string());
        if inner.blocked.contains(path) {
            return Err(EffectError::Rejected(path.to_string()));
        }
        let landing = inner
            .redirects
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.to_string());
        match inner.behavior {
            RouterBehavior::Follow => inner.location = landing,
            RouterBehavior::Stuck => {}
            RouterBehavior::Lag(reads) => {
                // a repeated request does not restart the transition
                if inner.pending.as_ref().map(|(l, _)| l) != Some(&landing) {
                    inner.pending = Some((landing, reads));
                }
            }
        }
        Ok(())
    }

    async fn current_path(&self) -> String {
        let mut inner = self.inner.lock();
        if let Some((landing, reads)) = inner.pending.take() {
            if reads == 0 {
                inner.location = landing;
            } else {
                inner.pending = Some((landing, reads - 1));
            }
        }
        inner.location.clone()
    }

    async fn main_content_len(&self) -> usize {
        self.inner.lock().content_len
    }

    async fn simulate_work(&self, action: &StepAction, duration: Duration) {
        self.inner.lock().work.push((action.clone(), duration));
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Navigator config with every delay zeroed
pub fn fast_config() -> NavigatorConfig {
    NavigatorConfig::instant()
}

/// In-memory store over the enterprise tour
pub fn enterprise_store() -> Arc<DemoStore> {
    Arc::new(DemoStore::in_memory(StepTable::enterprise()))
}

/// In-memory store over a custom step list
pub fn store_with(steps: Vec<DemoStep>) -> Arc<DemoStore> {
    Arc::new(DemoStore::in_memory(StepTable::new(steps).unwrap()))
}

/// Step with no payload
pub fn step(id: &str, action: StepAction) -> DemoStep {
    DemoStep::new(id, id, format!("{id} step"), action)
}

/// Navigator over `store` with default scripted effects
pub fn navigator_for(
    store: Arc<DemoStore>,
    config: NavigatorConfig,
) -> (Arc<TourNavigator>, Arc<ScriptedEffects>) {
    navigator_with(store, ScriptedEffects::new(), config)
}

/// Navigator over `store` with the given effects
pub fn navigator_with(
    store: Arc<DemoStore>,
    effects: ScriptedEffects,
    config: NavigatorConfig,
) -> (Arc<TourNavigator>, Arc<ScriptedEffects>) {
    let effects = Arc::new(effects);
    let navigator = TourNavigator::new(store, effects.clone(), config);
    (navigator, effects)
}

/// Let spawned tasks run for `duration` of (paused) tokio time
pub async fn run_for(duration: Duration) {
    tokio::time::sleep(duration).await;
}
