//! Demo state
//!
//! [`DemoState`] is the full value held by the store. Readers get clones via
//! [`crate::DemoStore::snapshot`]; only the store mutates it.

use crate::persist::PersistedState;
use rops_model::{DemoStep, Module, QcFlag, Request, Source, WorkingDoc};
use serde::Serialize;

/// Tour progress plus the collections that stand in for a backend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoState {
    pub is_demo_mode: bool,
    pub current_step: usize,
    pub is_guided_tour: bool,
    pub is_paused: bool,
    pub steps: Vec<DemoStep>,
    pub requests: Vec<Request>,
    pub working_docs: Vec<WorkingDoc>,
    pub modules: Vec<Module>,
    pub sources: Vec<Source>,
    pub qc_flags: Vec<QcFlag>,
    /// Bumped by start, reset and exit; scheduled work compares against it
    pub session: u64,
}

impl DemoState {
    /// Fresh state for a step list
    #[must_use]
    pub fn new(steps: Vec<DemoStep>) -> Self {
        Self {
            is_demo_mode: false,
            current_step: 0,
            is_guided_tour: false,
            is_paused: false,
            steps,
            requests: Vec::new(),
            working_docs: Vec::new(),
            modules: Vec::new(),
            sources: Vec::new(),
            qc_flags: Vec::new(),
            session: 0,
        }
    }

    /// Step at the current index
    ///
    /// Step lists are never empty and the index is kept in range.
    #[inline]
    #[must_use]
    pub fn current(&self) -> &DemoStep {
        &self.steps[self.current_step]
    }

    /// Step by id
    #[must_use]
    pub fn step(&self, step_id: &str) -> Option<&DemoStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// True when the current step is the terminal one
    #[inline]
    #[must_use]
    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 >= self.steps.len()
    }

    /// Number of completed steps
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.completed).count()
    }

    /// True when every data collection is empty
    #[must_use]
    pub fn has_no_data(&self) -> bool {
        self.requests.is_empty()
            && self.working_docs.is_empty()
            && self.modules.is_empty()
            && self.sources.is_empty()
            && self.qc_flags.is_empty()
    }

    /// Most recently added request
    #[inline]
    #[must_use]
    pub fn latest_request(&self) -> Option<&Request> {
        self.requests.last()
    }

    /// Most recently added working document
    #[inline]
    #[must_use]
    pub fn latest_working_doc(&self) -> Option<&WorkingDoc> {
        self.working_docs.last()
    }

    /// Working document by its own id or by the id of its request
    #[must_use]
    pub fn working_doc_for(&self, id: &str) -> Option<&WorkingDoc> {
        self.working_docs
            .iter()
            .rev()
            .find(|d| d.id == id || d.request_id == id)
    }

    /// Modules of a working document, in display order
    #[must_use]
    pub fn modules_of(&self, working_doc_id: &str) -> Vec<&Module> {
        let mut modules: Vec<&Module> = self
            .modules
            .iter()
            .filter(|m| m.working_doc_id == working_doc_id)
            .collect();
        modules.sort_by_key(|m| m.order);
        modules
    }

    /// Sources of a working document
    #[must_use]
    pub fn sources_of(&self, working_doc_id: &str) -> Vec<&Source> {
        self.sources
            .iter()
            .filter(|s| s.working_doc_id == working_doc_id)
            .collect()
    }

    /// The fields that survive a reload
    #[inline]
    #[must_use]
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            is_demo_mode: self.is_demo_mode,
            current_step: self.current_step,
            is_guided_tour: self.is_guided_tour,
            is_paused: self.is_paused,
        }
    }

    pub(crate) fn clear_data(&mut self) {
        self.requests.clear();
        self.working_docs.clear();
        self.modules.clear();
        self.sources.clear();
        self.qc_flags.clear();
    }

    pub(crate) fn clear_completion(&mut self) {
        for step in &mut self.steps {
            step.completed = false;
        }
    }
}
