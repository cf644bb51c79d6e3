//! Tour navigator
//!
//! Drives the current step of a [`DemoStore`] tour:
//!
//! 1. When an incomplete step becomes current, wait the read delay.
//! 2. Execute it: navigate and verify, inject its payload, or simulate work.
//! 3. On success mark it completed and, unless paused or on the last step,
//!    advance after the settle delay.
//! 4. On failure record a [`StepFailure`] and stop until the user retries,
//!    skips or resets.
//!
//! Every scheduled continuation carries a ticket (session, index, step id).
//! A continuation whose ticket no longer describes the store's current step
//! is discarded, so reset, exit and manual navigation can never be undone by
//! a timer that fires late.

use crate::config::NavigatorConfig;
use crate::effects::TourEffects;
use crate::error::{NavigatorError, StepFailure};
use crate::retry::{retry, RetryOutcome, RetryPolicy};
use crate::route::{NavigationMatch, Page, RouteTable};
use crate::status::{NavigatorStatus, StepPhase};
use parking_lot::Mutex;
use rops_model::{ActionKind, DemoStep, StepAction};
use rops_store::{DemoState, DemoStore};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Text appended to the latest working document by `populate_content`
const DRAFTED_SECTIONS: &str = "\n\n## Executive summary\n\
Nordic fintech adoption continues to outpace the EU average, led by \
account-to-account payments and embedded lending.\n\n\
## Market sizing\n\
Serviceable market estimated at EUR 2.1bn across Sweden, Norway, Denmark \
and Finland, growing 14% annually.\n\n\
## Competitive landscape\n\
Three incumbents hold 60% share; challengers compete on onboarding speed \
and open-banking integrations.\n";

/// Identity of the step a continuation was scheduled for
#[derive(Debug, Clone, PartialEq, Eq)]
struct StepTicket {
    session: u64,
    index: usize,
    step_id: String,
}

impl StepTicket {
    fn superseded(&self) -> NavigatorError {
        NavigatorError::Superseded {
            step_id: self.step_id.clone(),
        }
    }
}

/// Consistent read of the store taken once per decision
#[derive(Debug, Clone)]
struct StepView {
    ticket: StepTicket,
    step: DemoStep,
    demo_mode: bool,
    paused: bool,
    is_last: bool,
}

impl StepView {
    fn of(state: &DemoState) -> Self {
        let step = state.current().clone();
        Self {
            ticket: StepTicket {
                session: state.session,
                index: state.current_step,
                step_id: step.id.clone(),
            },
            step,
            demo_mode: state.is_demo_mode,
            paused: state.is_paused,
            is_last: state.is_last_step(),
        }
    }

    fn describes(&self, ticket: &StepTicket) -> bool {
        self.demo_mode && self.ticket == *ticket
    }
}

#[derive(Debug)]
struct Scheduled {
    ticket: StepTicket,
    handle: JoinHandle<()>,
}

impl Scheduled {
    fn cancel(self) {
        self.handle.abort();
    }
}

#[derive(Debug, Default)]
struct Runtime {
    /// Read delay before execution
    timer: Option<Scheduled>,
    /// Step being executed
    execution: Option<Scheduled>,
    /// Settle delay before advancing
    advance: Option<Scheduled>,
    failure: Option<(StepTicket, StepFailure)>,
    phase: StepPhase,
}

impl Runtime {
    fn cancel_timers(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        if let Some(advance) = self.advance.take() {
            advance.cancel();
        }
    }

    fn cancel_all(&mut self) {
        self.cancel_timers();
        if let Some(execution) = self.execution.take() {
            execution.cancel();
        }
    }

    fn cancel_stale(&mut self, current: &StepTicket) {
        for slot in [&mut self.timer, &mut self.execution, &mut self.advance] {
            if slot.as_ref().is_some_and(|s| s.ticket != *current) {
                if let Some(stale) = slot.take() {
                    tracing::debug!(step = %stale.ticket.step_id, "cancelling stale continuation");
                    stale.cancel();
                }
            }
        }
        if self.failure.as_ref().is_some_and(|(t, _)| t != current) {
            self.failure = None;
        }
    }

    fn owns(&self, ticket: &StepTicket) -> bool {
        self.execution.as_ref().is_some_and(|s| s.ticket == *ticket)
    }
}

/// Guided tour navigator
///
/// Construct with [`TourNavigator::new`]; drive it either by calling the
/// control methods (each re-synchronises) or by [`TourNavigator::spawn`],
/// which also reacts to store changes made elsewhere.
///
/// All methods that schedule work must be called from within a Tokio
/// runtime.
pub struct TourNavigator {
    store: Arc<DemoStore>,
    effects: Arc<dyn TourEffects>,
    config: NavigatorConfig,
    routes: RouteTable,
    runtime: Mutex<Runtime>,
    status: watch::Sender<NavigatorStatus>,
    shutdown: Notify,
}

impl fmt::Debug for TourNavigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourNavigator")
            .field("store", &self.store)
            .field("config", &self.config)
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

impl TourNavigator {
    /// Create a navigator over `store`
    #[must_use]
    pub fn new(
        store: Arc<DemoStore>,
        effects: Arc<dyn TourEffects>,
        config: NavigatorConfig,
    ) -> Arc<Self> {
        let (status, _) = watch::channel(NavigatorStatus::default());
        let navigator = Arc::new(Self {
            store,
            effects,
            config,
            routes: RouteTable::standard(),
            runtime: Mutex::new(Runtime::default()),
            status,
            shutdown: Notify::new(),
        });
        navigator.publish(&navigator.runtime.lock());
        navigator
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<DemoStore> {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Steps of the loaded table, with completion flags
    #[must_use]
    pub fn steps(&self) -> Vec<DemoStep> {
        self.store.read(|s| s.steps.clone())
    }

    #[must_use]
    pub fn current_step(&self) -> usize {
        self.store.read(|s| s.current_step)
    }

    #[must_use]
    pub fn is_demo_mode(&self) -> bool {
        self.store.read(|s| s.is_demo_mode)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.store.read(|s| s.is_paused)
    }

    /// Latest published status
    #[must_use]
    pub fn status(&self) -> NavigatorStatus {
        self.status.borrow().clone()
    }

    /// Subscribe to status changes
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<NavigatorStatus> {
        self.status.subscribe()
    }

    /// Enter demo mode at step 0 with fresh data
    pub fn start_demo(self: &Arc<Self>) {
        tracing::info!("starting demo");
        self.store.start_demo();
        self.sync();
    }

    /// Move to the next step; returns false on the last step
    pub fn next_step(self: &Arc<Self>) -> bool {
        let moved = self.store.next_step();
        self.sync();
        moved
    }

    /// Move to the previous step; returns false on the first step
    pub fn prev_step(self: &Arc<Self>) -> bool {
        let moved = self.store.prev_step();
        self.sync();
        moved
    }

    /// Restart the tour at step 0 with cleared data, staying in demo mode
    pub fn reset_demo(self: &Arc<Self>) {
        tracing::info!("resetting demo");
        self.store.reset_demo();
        self.sync();
    }

    /// Leave demo mode; data and position stay inspectable
    pub fn exit_demo(self: &Arc<Self>) {
        tracing::info!("exiting demo");
        self.store.exit_demo();
        self.sync();
    }

    /// Suspend scheduling; a step already executing runs to completion
    pub fn pause(self: &Arc<Self>) {
        if self.store.set_paused(true) {
            tracing::info!(step = self.current_step(), "tour paused");
        }
        self.sync();
    }

    /// Resume scheduling from the current step
    ///
    /// A step completed while paused is not advanced past retroactively.
    pub fn resume(self: &Arc<Self>) {
        if self.store.set_paused(false) {
            tracing::info!(step = self.current_step(), "tour resumed");
        }
        self.sync();
    }

    /// Flip the pause flag; returns the new value
    pub fn toggle_pause(self: &Arc<Self>) -> bool {
        if self.is_paused() {
            self.resume();
            false
        } else {
            self.pause();
            true
        }
    }

    /// Mark the current step completed by an explicit user action
    ///
    /// Cancels the pending read delay. Schedules the advance unless paused
    /// or on the last step.
    pub fn complete_current_step(self: &Arc<Self>) {
        let mut rt = self.runtime.lock();
        let view = self.store.read(StepView::of);
        if !view.demo_mode {
            return;
        }
        if let Some(timer) = rt.timer.take() {
            timer.cancel();
        }
        if let Some(execution) = rt.execution.take() {
            tracing::debug!(step = %execution.ticket.step_id, "cancelling in-flight execution");
            execution.cancel();
        }
        if self.store.complete_step(&view.ticket.step_id) {
            tracing::info!(step = %view.ticket.step_id, "step completed by user");
            rt.failure = None;
            rt.phase = StepPhase::Completed;
            if !view.paused && !view.is_last {
                self.schedule_advance(&mut rt, view.ticket);
            }
        }
        self.publish(&rt);
    }

    /// Clear the current step's failure and run it again
    pub fn retry_current(self: &Arc<Self>) {
        if self.runtime.lock().failure.take().is_some() {
            tracing::info!(step = self.current_step(), "retrying failed step");
        }
        self.sync();
    }

    /// Hide the failure from the status without resuming auto-advance
    pub fn dismiss_error(&self) {
        let mut rt = self.runtime.lock();
        if let Some((_, failure)) = rt.failure.as_mut() {
            failure.dismissed = true;
        }
        self.publish(&rt);
    }

    /// Reconcile scheduled work with the store
    ///
    /// Cancels continuations for steps that are no longer current and
    /// schedules the current step if it is incomplete, not failed and
    /// nothing is already pending for it. Idempotent.
    pub fn sync(self: &Arc<Self>) {
        let view = self.store.read(StepView::of);
        let mut rt = self.runtime.lock();

        if !view.demo_mode {
            rt.cancel_all();
            rt.failure = None;
            rt.phase = StepPhase::Idle;
            self.publish(&rt);
            return;
        }

        rt.cancel_stale(&view.ticket);

        if view.paused {
            rt.cancel_timers();
            if rt.execution.is_none() {
                rt.phase = StepPhase::Paused;
            }
        } else if view.step.completed {
            if rt.execution.is_none() {
                rt.phase = StepPhase::Completed;
            }
        } else if rt.failure.is_some() {
            rt.phase = StepPhase::Failed;
        } else if rt.timer.is_none() && rt.execution.is_none() {
            self.schedule_execution(&mut rt, view.ticket);
        }
        self.publish(&rt);
    }

    /// Run until [`TourNavigator::shutdown`], re-synchronising on every
    /// store change
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let navigator = Arc::clone(self);
        let mut changes = self.store.subscribe();
        tokio::spawn(
            async move {
                navigator.sync();
                loop {
                    tokio::select! {
                        () = navigator.shutdown.notified() => break,
                        changed = changes.changed() => match changed {
                            Some(revision) => {
                                tracing::trace!(revision, "store changed");
                                navigator.sync();
                            }
                            None => break,
                        },
                    }
                }
                navigator.runtime.lock().cancel_all();
                tracing::debug!("navigator stopped");
            }
            .instrument(tracing::info_span!("navigator")),
        )
    }

    /// Stop the driver loop and cancel everything scheduled
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
        self.runtime.lock().cancel_all();
    }

    fn schedule_execution(self: &Arc<Self>, rt: &mut Runtime, ticket: StepTicket) {
        let navigator = Arc::clone(self);
        let delay = self.config.read_delay();
        let scheduled = ticket.clone();
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            navigator.begin_execution(&scheduled);
        });
        tracing::debug!(step = %ticket.step_id, delay_ms = self.config.read_delay_ms, "step scheduled");
        rt.timer = Some(Scheduled { ticket, handle });
        rt.phase = StepPhase::WaitingToStart;
    }

    fn begin_execution(self: &Arc<Self>, ticket: &StepTicket) {
        let mut rt = self.runtime.lock();
        if !rt.timer.as_ref().is_some_and(|s| s.ticket == *ticket) {
            return;
        }
        rt.timer = None;

        let view = self.store.read(StepView::of);
        if !view.describes(ticket) || view.paused || view.step.completed {
            tracing::debug!(step = %ticket.step_id, "scheduled step no longer runnable");
            self.publish(&rt);
            return;
        }

        let navigator = Arc::clone(self);
        let span = tracing::info_span!("tour_step", step = %ticket.step_id, index = ticket.index);
        let running = ticket.clone();
        let handle = tokio::spawn(
            async move { navigator.execute(running, view.step).await }.instrument(span),
        );
        rt.execution = Some(Scheduled {
            ticket: ticket.clone(),
            handle,
        });
        rt.phase = StepPhase::Executing;
        self.publish(&rt);
    }

    async fn execute(self: Arc<Self>, ticket: StepTicket, step: DemoStep) {
        tracing::info!(action = %step.action, "executing step");
        let result = self.perform(&ticket, &step).await;

        let mut rt = self.runtime.lock();
        if rt.owns(&ticket) {
            rt.execution = None;
        }
        let view = self.store.read(StepView::of);
        if !view.describes(&ticket) {
            tracing::debug!("discarding result of superseded step");
            return;
        }

        match result {
            Ok(()) => {
                rt.phase = StepPhase::Completed;
                if self.store.complete_step(&ticket.step_id) {
                    tracing::info!("step completed");
                    if view.paused {
                        tracing::debug!("paused; not advancing");
                    } else if !view.is_last {
                        self.schedule_advance(&mut rt, ticket);
                    }
                } else {
                    tracing::debug!("step already completed; advance left as scheduled");
                }
            }
            Err(error) if view.step.completed => {
                tracing::debug!(%error, "step completed by user; failure ignored");
                rt.phase = StepPhase::Completed;
            }
            Err(error) => {
                tracing::warn!(%error, "step failed; auto-advance halted");
                let failure = StepFailure::from_error(ticket.index, &ticket.step_id, &error);
                rt.failure = Some((ticket, failure));
                rt.phase = StepPhase::Failed;
            }
        }
        self.publish(&rt);
    }

    fn schedule_advance(self: &Arc<Self>, rt: &mut Runtime, ticket: StepTicket) {
        let navigator = Arc::clone(self);
        let delay = self.config.settle_delay();
        let scheduled = ticket.clone();
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            navigator.advance(&scheduled);
        });
        if let Some(previous) = rt.advance.replace(Scheduled { ticket, handle }) {
            tracing::debug!(step = %previous.ticket.step_id, "replacing pending advance");
            previous.cancel();
        }
    }

    fn advance(self: &Arc<Self>, ticket: &StepTicket) {
        {
            let mut rt = self.runtime.lock();
            if !rt.advance.as_ref().is_some_and(|s| s.ticket == *ticket) {
                return;
            }
            rt.advance = None;

            let view = self.store.read(StepView::of);
            if !view.describes(ticket) || view.paused {
                tracing::debug!(step = %ticket.step_id, "advance discarded");
                return;
            }
            self.store.next_step();
        }
        self.sync();
    }

    async fn perform(&self, ticket: &StepTicket, step: &DemoStep) -> Result<(), NavigatorError> {
        if step.requires_navigation() {
            let target = self.target_for(step)?;
            self.navigate_to(ticket, &target).await?;
            if !self.is_current(ticket) {
                return Err(ticket.superseded());
            }
        }

        match step.action.kind() {
            ActionKind::Navigation => {}
            ActionKind::DataInjection => self.inject(ticket, step)?,
            ActionKind::SimulatedWork => {
                self.effects
                    .simulate_work(&step.action, self.config.simulated_work())
                    .await;
                if step.action == StepAction::PopulateContent {
                    self.populate_content(ticket)?;
                }
            }
            ActionKind::Terminal => tracing::info!("tour complete"),
            ActionKind::Unrecognized => {
                tracing::warn!(action = %step.action, "unrecognised step action; passing through");
                self.effects
                    .simulate_work(&step.action, self.config.simulated_work())
                    .await;
            }
        }
        Ok(())
    }

    /// Write the step payload if the ticket still describes the current step
    fn inject(&self, ticket: &StepTicket, step: &DemoStep) -> Result<(), NavigatorError> {
        let Some(data) = step.data.clone() else {
            tracing::debug!(action = %step.action, "step carries no payload");
            return Ok(());
        };
        let kind = data.kind();
        match self.store.add_demo_data_at(ticket.session, ticket.index, data) {
            Some(true) => tracing::debug!(kind, "payload injected"),
            Some(false) => tracing::debug!(kind, "payload changed nothing"),
            None => return Err(ticket.superseded()),
        }
        Ok(())
    }

    fn populate_content(&self, ticket: &StepTicket) -> Result<(), NavigatorError> {
        match self
            .store
            .append_latest_doc_content_at(ticket.session, ticket.index, DRAFTED_SECTIONS)
        {
            Some(true) => tracing::debug!("drafted sections appended"),
            Some(false) => tracing::warn!("no working document to populate"),
            None => return Err(ticket.superseded()),
        }
        Ok(())
    }

    /// Route a navigation step should reach
    fn target_for(&self, step: &DemoStep) -> Result<String, NavigatorError> {
        if let Some(path) = &step.expected_path {
            return Ok(path.clone());
        }
        let page = match step.action {
            StepAction::NavigateToRequests => Page::Requests,
            StepAction::NavigateToWorkingStudio | StepAction::NavigateBackToStudio => {
                Page::WorkingStudio
            }
            StepAction::NavigateToSources => Page::Sources,
            StepAction::NavigateToSubjects => Page::Subjects,
            _ => {
                return Err(NavigatorError::UnknownRoute {
                    step_id: step.id.clone(),
                    action: step.action.to_string(),
                })
            }
        };
        let param = self.store.read(|s| {
            s.latest_working_doc()
                .map(|d| d.request_id.clone())
                .or_else(|| s.latest_request().map(|r| r.id.clone()))
        });
        Ok(self
            .routes
            .path_for(page, param.as_deref().unwrap_or("new")))
    }

    async fn navigate_to(
        &self,
        ticket: &StepTicket,
        target: &str,
    ) -> Result<NavigationMatch, NavigatorError> {
        let heavy = self
            .routes
            .resolve(target)
            .is_some_and(|page| self.config.is_heavy(page));
        let policy = RetryPolicy::fixed(self.config.max_nav_attempts, self.config.verify_interval());
        self.set_phase(ticket, StepPhase::Navigating);

        let outcome = retry(
            &policy,
            || self.is_current(ticket),
            |attempt| self.navigation_attempt(ticket, target, heavy, attempt),
        )
        .await;

        match outcome {
            RetryOutcome::Success(matched) => {
                tracing::debug!(path = target, ?matched, "navigation verified");
                Ok(matched)
            }
            RetryOutcome::Exhausted { error, attempts } => {
                Err(NavigatorError::NavigationFailed {
                    step_id: ticket.step_id.clone(),
                    target: target.to_string(),
                    attempts,
                    last_location: error,
                })
            }
            RetryOutcome::Aborted => Err(ticket.superseded()),
        }
    }

    /// One navigate-and-verify round; the error is the observed location
    async fn navigation_attempt(
        &self,
        ticket: &StepTicket,
        target: &str,
        heavy: bool,
        attempt: u32,
    ) -> Result<NavigationMatch, String> {
        let location = self.effects.current_path().await;
        if self.routes.satisfies(target, &location).is_none() {
            tracing::debug!(attempt, path = target, from = %location, "navigating");
            if let Err(error) = self.effects.navigate(target).await {
                tracing::warn!(attempt, path = target, %error, "navigation request failed");
                return Err(location);
            }
        }

        self.set_phase(ticket, StepPhase::Verifying);
        let location = self.effects.current_path().await;
        let Some(matched) = self.routes.satisfies(target, &location) else {
            tracing::debug!(attempt, path = target, at = %location, "not there yet");
            return Err(location);
        };

        if heavy {
            if let Err(chars) = self.await_content().await {
                tracing::debug!(attempt, path = target, chars, "page content not rendered");
                return Err(location);
            }
        }
        Ok(matched)
    }

    /// Wait for the main content of a heavy page; the error is the last
    /// measured length
    async fn await_content(&self) -> Result<usize, usize> {
        let delay = self.config.content_check_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let policy = RetryPolicy::fixed(self.config.content_attempts, delay);
        let min = self.config.min_content_chars;

        retry(&policy, || true, |_| async move {
            let chars = self.effects.main_content_len().await;
            if chars >= min {
                Ok(chars)
            } else {
                Err(chars)
            }
        })
        .await
        .into_result(|| 0)
    }

    fn is_current(&self, ticket: &StepTicket) -> bool {
        self.store.read(|s| {
            s.is_demo_mode
                && s.session == ticket.session
                && s.current_step == ticket.index
                && s.current().id == ticket.step_id
        })
    }

    fn set_phase(&self, ticket: &StepTicket, phase: StepPhase) {
        let mut rt = self.runtime.lock();
        if rt.owns(ticket) {
            rt.phase = phase;
            self.publish(&rt);
        }
    }

    fn publish(&self, rt: &Runtime) {
        let status = self.store.read(|s| NavigatorStatus {
            phase: rt.phase,
            is_demo_mode: s.is_demo_mode,
            is_paused: s.is_paused,
            current_step: s.current_step,
            step_count: s.step_count(),
            step_id: s.current().id.clone(),
            failure: rt
                .failure
                .as_ref()
                .filter(|(_, f)| !f.dismissed)
                .map(|(_, f)| f.clone()),
        });
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}
