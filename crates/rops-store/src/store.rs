//! Observable demo store
//!
//! Single source of truth for tour progress and the mock-backed collections.
//! All mutations are synchronous: by the time a mutator returns, the change is
//! visible to [`DemoStore::snapshot`] and subscribers have been signalled.
//! The persisted subset is written through to the [`StateStorage`] backend
//! whenever one of its fields changes.

use crate::persist::{MemoryStorage, PersistedState, StateStorage, DEFAULT_STORAGE_KEY};
use crate::state::DemoState;
use chrono::Utc;
use parking_lot::RwLock;
use rops_model::{DemoData, Module, Source, StepTable, WorkingDoc};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Observable container for [`DemoState`]
pub struct DemoStore {
    state: RwLock<DemoState>,
    storage: Arc<dyn StateStorage>,
    storage_key: String,
    revision: watch::Sender<u64>,
}

impl fmt::Debug for DemoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemoStore")
            .field("storage_key", &self.storage_key)
            .field("revision", &*self.revision.borrow())
            .finish_non_exhaustive()
    }
}

impl DemoStore {
    /// Create a store, restoring the persisted tour position if present
    ///
    /// A missing, malformed or unreadable blob falls back to the default
    /// initial state. A stored step index past the end of `table` is clamped.
    #[must_use]
    pub fn new(table: StepTable, storage: Arc<dyn StateStorage>) -> Self {
        Self::with_key(table, storage, DEFAULT_STORAGE_KEY)
    }

    /// Create a store persisting under a custom key
    #[must_use]
    pub fn with_key(
        table: StepTable,
        storage: Arc<dyn StateStorage>,
        storage_key: impl Into<String>,
    ) -> Self {
        let storage_key = storage_key.into();
        let mut state = DemoState::new(table.into_steps());

        if let Some(persisted) = restore(storage.as_ref(), &storage_key, state.step_count()) {
            tracing::info!(
                demo_mode = persisted.is_demo_mode,
                step = persisted.current_step,
                "restored demo position"
            );
            state.is_demo_mode = persisted.is_demo_mode;
            state.current_step = persisted.current_step;
            state.is_guided_tour = persisted.is_guided_tour;
            state.is_paused = persisted.is_paused;
        }

        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(state),
            storage,
            storage_key,
            revision,
        }
    }

    /// Store backed by throwaway in-memory storage
    #[must_use]
    pub fn in_memory(table: StepTable) -> Self {
        Self::new(table, Arc::new(MemoryStorage::new()))
    }

    /// Clone of the current state
    #[must_use]
    pub fn snapshot(&self) -> DemoState {
        self.state.read().clone()
    }

    /// Run `f` against the current state without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&DemoState) -> R) -> R {
        f(&self.state.read())
    }

    /// Number of changes applied since construction
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Subscribe to change notifications
    #[must_use]
    pub fn subscribe(&self) -> StoreSubscription {
        StoreSubscription {
            rx: self.revision.subscribe(),
        }
    }

    /// Storage key of the persisted blob
    #[inline]
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Start (or restart) the tour from step 0 with empty collections
    pub fn start_demo(&self) {
        self.mutate("start_demo", |state| {
            state.clear_data();
            state.clear_completion();
            state.current_step = 0;
            state.is_demo_mode = true;
            state.is_paused = false;
            state.session += 1;
            true
        });
        tracing::info!("demo started");
    }

    /// Advance one step; no-op on the last step
    pub fn next_step(&self) -> bool {
        self.mutate("next_step", |state| {
            if state.is_last_step() {
                return false;
            }
            state.current_step += 1;
            true
        })
    }

    /// Go back one step; no-op on the first step
    pub fn prev_step(&self) -> bool {
        self.mutate("prev_step", |state| {
            if state.current_step == 0 {
                return false;
            }
            state.current_step -= 1;
            true
        })
    }

    /// Jump to a step; out-of-range indices are ignored
    pub fn go_to_step(&self, index: usize) -> bool {
        self.mutate("go_to_step", |state| {
            if index >= state.step_count() || index == state.current_step {
                return false;
            }
            state.current_step = index;
            true
        })
    }

    /// Mark a step completed; unknown ids and repeated calls are no-ops
    pub fn complete_step(&self, step_id: &str) -> bool {
        let changed = self.mutate("complete_step", |state| {
            match state.steps.iter_mut().find(|s| s.id == step_id) {
                Some(step) if !step.completed => {
                    step.completed = true;
                    true
                }
                Some(_) => false,
                None => {
                    tracing::debug!(step = step_id, "complete_step for unknown step ignored");
                    false
                }
            }
        });
        if changed {
            tracing::debug!(step = step_id, "step completed");
        }
        changed
    }

    /// Restart from scratch and stay in demo mode
    ///
    /// Clears every collection, zeroes the index, clears completion and pause.
    pub fn reset_demo(&self) {
        self.mutate("reset_demo", |state| {
            state.clear_data();
            state.clear_completion();
            state.current_step = 0;
            state.is_demo_mode = true;
            state.is_paused = false;
            state.session += 1;
            true
        });
        tracing::info!("demo reset");
    }

    /// Leave demo mode
    ///
    /// Only the mode flag changes: the step index, completion flags and
    /// injected data stay inspectable until the next start or reset.
    pub fn exit_demo(&self) {
        self.mutate("exit_demo", |state| {
            state.is_demo_mode = false;
            state.session += 1;
            true
        });
        tracing::info!("demo exited");
    }

    /// Inject a step payload
    ///
    /// Appends to the collection named by the payload kind; module and source
    /// lists are flattened. A status patch rewrites `status` and `updated_at`
    /// of the matching request and appends nothing.
    pub fn add_demo_data(&self, data: DemoData) -> bool {
        let kind = data.kind();
        let changed = self.mutate("add_demo_data", |state| apply_demo_data(state, data));
        if changed {
            tracing::debug!(kind, "demo data added");
        }
        changed
    }

    /// Inject a step payload only while `step_index` of `session` is the
    /// current step in demo mode
    ///
    /// The position check and the write happen under one lock. Returns `None`
    /// when the tour has moved on and nothing was written.
    pub fn add_demo_data_at(&self, session: u64, step_index: usize, data: DemoData) -> Option<bool> {
        let kind = data.kind();
        let changed = self.mutate_at("add_demo_data", session, step_index, |state| {
            apply_demo_data(state, data)
        })?;
        if changed {
            tracing::debug!(kind, "demo data added");
        }
        Some(changed)
    }

    /// Append generated text to a working document
    pub fn append_doc_content(&self, working_doc_id: &str, text: &str) -> bool {
        self.mutate("append_doc_content", |state| {
            let Some(doc) = state.working_docs.iter_mut().find(|d| d.id == working_doc_id) else {
                return false;
            };
            append_text(doc, text);
            true
        })
    }

    /// Append generated text to the most recent working document while
    /// `step_index` of `session` is current
    ///
    /// `None` when the tour has moved on; `Some(false)` when there is no
    /// document to write to.
    pub fn append_latest_doc_content_at(
        &self,
        session: u64,
        step_index: usize,
        text: &str,
    ) -> Option<bool> {
        self.mutate_at("append_doc_content", session, step_index, |state| {
            let Some(doc) = state.working_docs.last_mut() else {
                return false;
            };
            append_text(doc, text);
            true
        })
    }

    /// Pause or resume auto-advance
    pub fn set_paused(&self, paused: bool) -> bool {
        self.mutate("set_paused", |state| {
            if state.is_paused == paused {
                return false;
            }
            state.is_paused = paused;
            true
        })
    }

    /// Toggle the guided tour overlay flag
    pub fn set_guided_tour(&self, guided: bool) -> bool {
        self.mutate("set_guided_tour", |state| {
            if state.is_guided_tour == guided {
                return false;
            }
            state.is_guided_tour = guided;
            true
        })
    }

    /// Flip a module's enabled flag, returning the new value
    pub fn toggle_module(&self, module_id: &str) -> Option<bool> {
        let mut enabled = None;
        self.mutate("toggle_module", |state| {
            let Some(module) = state.modules.iter_mut().find(|m| m.id == module_id) else {
                return false;
            };
            module.enabled = !module.enabled;
            enabled = Some(module.enabled);
            true
        });
        enabled
    }

    /// Append a module added by the user outside the scripted tour
    pub fn add_manual_module(&self, module: Module) {
        self.mutate("add_manual_module", |state| {
            state.modules.push(module);
            true
        });
    }

    /// Append a source added by the user outside the scripted tour
    pub fn add_manual_source(&self, source: Source) {
        self.mutate("add_manual_source", |state| {
            state.sources.push(source);
            true
        });
    }

    fn mutate(&self, op: &'static str, f: impl FnOnce(&mut DemoState) -> bool) -> bool {
        let mut state = self.state.write();
        let before = state.persisted();
        if !f(&mut *state) {
            return false;
        }

        let after = state.persisted();
        if before != after {
            self.persist(after);
        }
        drop(state);

        self.revision.send_modify(|rev| *rev += 1);
        tracing::trace!(op, "demo state changed");
        true
    }

    /// `mutate` guarded by the tour position, checked under the write lock
    fn mutate_at(
        &self,
        op: &'static str,
        session: u64,
        step_index: usize,
        f: impl FnOnce(&mut DemoState) -> bool,
    ) -> Option<bool> {
        let mut current = true;
        let changed = self.mutate(op, |state| {
            current =
                state.is_demo_mode && state.session == session && state.current_step == step_index;
            current && f(state)
        });
        if !current {
            tracing::debug!(op, session, step = step_index, "stale write discarded");
            return None;
        }
        Some(changed)
    }

    fn persist(&self, persisted: PersistedState) {
        let result = persisted
            .encode()
            .and_then(|blob| self.storage.save(&self.storage_key, &blob));
        if let Err(e) = result {
            tracing::warn!(error = %e, key = %self.storage_key, "failed to persist demo state");
        }
    }
}

fn apply_demo_data(state: &mut DemoState, data: DemoData) -> bool {
    match data {
        DemoData::Request(request) => {
            state.requests.push(request);
            true
        }
        DemoData::WorkingDoc(doc) => {
            state.working_docs.push(doc);
            true
        }
        DemoData::Modules(modules) => {
            state.modules.extend(modules.into_vec());
            true
        }
        DemoData::Sources(sources) => {
            state.sources.extend(sources.into_vec());
            true
        }
        DemoData::QcFlag(flag) => {
            state.qc_flags.push(flag);
            true
        }
        DemoData::UpdateRequestStatus(patch) => {
            let target = match patch.request_id.as_deref() {
                Some(id) => state.requests.iter_mut().find(|r| r.id == id),
                None => state.requests.last_mut(),
            };
            match target {
                Some(request) => {
                    request.status = patch.status;
                    request.updated_at = Utc::now();
                    true
                }
                None => {
                    tracing::warn!(
                        request = patch.request_id.as_deref().unwrap_or("<latest>"),
                        "status patch matched no request"
                    );
                    false
                }
            }
        }
    }
}

fn append_text(doc: &mut WorkingDoc, text: &str) {
    if !doc.content.is_empty() && !doc.content.ends_with('\n') {
        doc.content.push('\n');
    }
    doc.content.push_str(text);
    doc.updated_at = Utc::now();
}

fn restore(storage: &dyn StateStorage, key: &str, step_count: usize) -> Option<PersistedState> {
    let blob = match storage.load(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, key, "could not read persisted demo state");
            return None;
        }
    };

    match PersistedState::decode(&blob) {
        Ok(mut persisted) => {
            if persisted.current_step >= step_count {
                tracing::warn!(
                    step = persisted.current_step,
                    step_count,
                    "persisted step out of range, clamping"
                );
                persisted.current_step = step_count.saturating_sub(1);
            }
            Some(persisted)
        }
        Err(e) => {
            tracing::warn!(error = %e, key, "discarding malformed demo state");
            None
        }
    }
}

/// Change notifications from a [`DemoStore`]
#[derive(Debug, Clone)]
pub struct StoreSubscription {
    rx: watch::Receiver<u64>,
}

impl StoreSubscription {
    /// Wait for the next change; `None` once the store is dropped
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// True if a change arrived since the last `changed()`
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Latest revision seen by the store
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rops_model::{DemoStep, StepAction};

    fn two_step_store() -> DemoStore {
        let table = StepTable::new(vec![
            DemoStep::new("one", "One", "first", StepAction::NavigateToRequests),
            DemoStep::new("two", "Two", "second", StepAction::DemoComplete),
        ])
        .unwrap();
        DemoStore::in_memory(table)
    }

    #[test]
    fn new_store_is_idle() {
        let store = two_step_store();
        let state = store.snapshot();

        assert!(!state.is_demo_mode);
        assert_eq!(state.current_step, 0);
        assert_eq!(state.session, 0);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn noop_mutations_do_not_bump_revision() {
        let store = two_step_store();
        store.prev_step();
        store.complete_step("missing");
        store.set_paused(false);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn start_bumps_session() {
        let store = two_step_store();
        store.start_demo();
        store.start_demo();
        assert_eq!(store.snapshot().session, 2);
    }

    #[test]
    fn positioned_write_rejected_after_reset() {
        let store = two_step_store();
        store.start_demo();
        let session = store.snapshot().session;
        let flag = DemoData::QcFlag(rops_model::QcFlag {
            id: "qc-1".to_string(),
            working_doc_id: "doc-1".to_string(),
            severity: rops_model::QcSeverity::Info,
            message: "check".to_string(),
            resolved: false,
        });

        store.reset_demo();
        let revision = store.revision();
        assert_eq!(store.add_demo_data_at(session, 0, flag.clone()), None);
        assert_eq!(store.append_latest_doc_content_at(session, 0, "text"), None);
        assert!(store.snapshot().qc_flags.is_empty());
        assert_eq!(store.revision(), revision);

        let session = store.snapshot().session;
        assert_eq!(store.add_demo_data_at(session, 1, flag.clone()), None);
        assert_eq!(store.add_demo_data_at(session, 0, flag), Some(true));
        assert_eq!(store.append_latest_doc_content_at(session, 0, "text"), Some(false));
        assert_eq!(store.snapshot().qc_flags.len(), 1);
    }

    #[test]
    fn positioned_write_rejected_after_exit() {
        let store = two_step_store();
        store.start_demo();
        let session = store.snapshot().session;
        store.exit_demo();

        let patch = DemoData::UpdateRequestStatus(rops_model::StatusPatch::latest(
            rops_model::RequestStatus::Qc,
        ));
        assert_eq!(store.add_demo_data_at(session, 0, patch), None);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = two_step_store();
        let mut sub = store.subscribe();

        store.start_demo();
        assert!(sub.has_changed());
        assert_eq!(sub.changed().await, Some(1));
        assert!(!sub.has_changed());
    }

    #[tokio::test]
    async fn subscription_ends_when_store_dropped() {
        let store = two_step_store();
        let mut sub = store.subscribe();
        drop(store);
        assert_eq!(sub.changed().await, None);
    }

    #[test]
    fn toggle_module_reports_new_value() {
        let store = two_step_store();
        store.add_manual_module(Module {
            id: "m1".to_string(),
            working_doc_id: "d1".to_string(),
            name: "Scope".to_string(),
            description: String::new(),
            status: rops_model::ModuleStatus::Pending,
            enabled: true,
            order: 1,
        });

        assert_eq!(store.toggle_module("m1"), Some(false));
        assert_eq!(store.toggle_module("m1"), Some(true));
        assert_eq!(store.toggle_module("nope"), None);
    }
}
