//! TourNavigator Tests
//!
//! Step scheduling, navigation verification, staleness, pause semantics and
//! the full enterprise tour against the scripted effects fake.

use pretty_assertions::assert_eq;
use rops_model::{DemoData, RequestStatus, StepAction, StepTable};
use rops_navigator::{NavigatorConfig, NavigatorError, StepPhase, TourNavigator};
use rops_store::{DemoStore, MemoryStorage, PersistedState, DEFAULT_STORAGE_KEY};
use rops_test_utils::{
    enterprise_store, fast_config, navigator_for, navigator_with, run_for, step, store_with,
    RouterBehavior, ScriptedEffects,
};
use std::sync::Arc;
use std::time::Duration;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn completed(navigator: &TourNavigator) -> Vec<bool> {
    navigator.steps().iter().map(|s| s.completed).collect()
}

fn qc_flag(id: &str) -> DemoData {
    DemoData::QcFlag(rops_model::QcFlag {
        id: id.to_string(),
        working_doc_id: "doc-1".to_string(),
        severity: rops_model::QcSeverity::Warning,
        message: "Missing citation".to_string(),
        resolved: false,
    })
}

// ============================================================================
// Full tour
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_enterprise_tour_runs_to_completion() {
    let (navigator, effects) = navigator_for(enterprise_store(), fast_config());

    navigator.start_demo();
    run_for(Duration::from_secs(1)).await;

    let state = navigator.store().snapshot();
    assert_eq!(state.current_step, 15);
    assert_eq!(state.completed_count(), 16);
    assert_eq!(navigator.status().phase, StepPhase::Completed);

    assert_eq!(state.requests.len(), 1);
    assert_eq!(state.requests[0].status, RequestStatus::Qc);
    assert_eq!(state.working_docs.len(), 1);
    assert!(state.working_docs[0].content.contains("Executive summary"));
    assert_eq!(state.modules.len(), 3);
    assert_eq!(state.sources.len(), 2);
    assert_eq!(state.qc_flags.len(), 1);

    assert_eq!(
        effects.navigations(),
        vec![
            "/requests".to_string(),
            "/working-studio/req-demo-001".to_string(),
            "/sources".to_string(),
            "/working-studio/req-demo-001".to_string(),
            "/subjects".to_string(),
        ]
    );
    assert_eq!(
        effects.work_log(),
        vec![
            StepAction::DemoAiAssist,
            StepAction::PopulateContent,
            StepAction::ExportDocument,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_basic_tour_uses_derived_routes() {
    let store = Arc::new(DemoStore::in_memory(StepTable::basic()));
    let (navigator, effects) = navigator_for(store, fast_config());

    navigator.start_demo();
    run_for(Duration::from_secs(1)).await;

    assert!(completed(&navigator).iter().all(|&c| c));
    let navigations = effects.navigations();
    assert_eq!(navigations[0], "/requests");
    // open-studio runs after the request exists but before the document
    assert_eq!(navigations[1], "/working-studio/req-demo-001");
    assert!(navigations.contains(&"/sources".to_string()));
}

// ============================================================================
// Timing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_read_delay_then_settle_delay() {
    let (navigator, _effects) = navigator_for(enterprise_store(), NavigatorConfig::default());

    navigator.start_demo();
    assert_eq!(navigator.status().phase, StepPhase::WaitingToStart);

    run_for(ms(2_900)).await;
    assert!(!completed(&navigator)[0]);

    run_for(ms(200)).await; // t = 3.1s
    assert!(completed(&navigator)[0]);
    assert_eq!(navigator.current_step(), 0);

    run_for(ms(2_300)).await; // t = 5.4s
    assert_eq!(navigator.current_step(), 0);

    run_for(ms(200)).await; // t = 5.6s
    assert_eq!(navigator.current_step(), 1);
    assert!(!completed(&navigator)[1]);
}

// ============================================================================
// Navigation verification
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_pattern_fallback_accepts_other_studio_id() {
    let store = store_with(vec![step("studio", StepAction::NavigateToWorkingStudio)
        .with_expected_path("/working-studio/req-1")]);
    let effects = ScriptedEffects::new().with_redirect("/working-studio/req-1", "/working-studio/doc-9");
    let (navigator, effects) = navigator_with(store, effects, fast_config());

    navigator.start_demo();
    run_for(ms(100)).await;

    assert_eq!(completed(&navigator), vec![true]);
    assert_eq!(effects.location(), "/working-studio/doc-9");
    assert_eq!(effects.navigations().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_verification_retries_until_arrival() {
    let store = store_with(vec![step("lib", StepAction::NavigateToSources)]);
    let effects = ScriptedEffects::new().with_behavior(RouterBehavior::Lag(1));
    let (navigator, effects) = navigator_with(store, effects, fast_config());

    navigator.start_demo();
    run_for(ms(100)).await;

    assert_eq!(completed(&navigator), vec![true]);
    assert_eq!(effects.location(), "/sources");
}

#[tokio::test(start_paused = true)]
async fn test_stuck_router_fails_after_bounded_attempts() {
    let store = store_with(vec![
        step("lib", StepAction::NavigateToSources),
        step("done", StepAction::DemoComplete),
    ]);
    let effects = ScriptedEffects::new().with_behavior(RouterBehavior::Stuck);
    let (navigator, effects) = navigator_with(store, effects, NavigatorConfig::default());

    navigator.start_demo();
    run_for(Duration::from_secs(30)).await;

    let status = navigator.status();
    assert_eq!(status.phase, StepPhase::Failed);
    let failure = status.failure.expect("failure recorded");
    assert_eq!(failure.step_id, "lib");
    assert_eq!(failure.attempts, 3);
    assert_eq!(effects.navigations().len(), 3);

    // auto-advance halted
    assert_eq!(navigator.current_step(), 0);
    assert_eq!(completed(&navigator), vec![false, false]);
}

#[tokio::test(start_paused = true)]
async fn test_heavy_page_without_content_fails() {
    let store = store_with(vec![step("studio", StepAction::NavigateToWorkingStudio)]);
    let effects = ScriptedEffects::new().with_content_len(0);
    let (navigator, _effects) = navigator_with(store, effects, fast_config());

    navigator.start_demo();
    run_for(ms(100)).await;

    let failure = navigator.status().failure.expect("failure recorded");
    assert_eq!(failure.target.as_deref(), Some("/working-studio/new"));
    assert!(!completed(&navigator)[0]);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_failure_recovers() {
    let store = store_with(vec![
        step("lib", StepAction::NavigateToSources),
        step("done", StepAction::DemoComplete),
    ]);
    let effects = ScriptedEffects::new().with_behavior(RouterBehavior::Stuck);
    let (navigator, effects) = navigator_with(store, effects, fast_config());

    navigator.start_demo();
    run_for(ms(100)).await;
    assert!(navigator.status().failure.is_some());

    effects.set_behavior(RouterBehavior::Follow);
    navigator.retry_current();
    run_for(ms(100)).await;

    assert!(navigator.status().failure.is_none());
    assert_eq!(completed(&navigator), vec![true, true]);
    assert_eq!(navigator.current_step(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_skip_clears_failure() {
    let store = store_with(vec![
        step("lib", StepAction::NavigateToSources),
        step("done", StepAction::DemoComplete),
    ]);
    let effects = ScriptedEffects::new().with_blocked("/sources");
    let (navigator, _effects) = navigator_with(store, effects, fast_config());

    navigator.start_demo();
    run_for(ms(100)).await;
    assert!(navigator.status().failure.is_some());

    assert!(navigator.next_step());
    run_for(ms(100)).await;

    assert!(navigator.status().failure.is_none());
    assert_eq!(completed(&navigator), vec![false, true]);
}

// ============================================================================
// Staleness
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_exit_during_read_delay_cancels_step() {
    let (navigator, effects) = navigator_for(enterprise_store(), NavigatorConfig::default());

    navigator.start_demo();
    run_for(Duration::from_secs(1)).await;
    navigator.exit_demo();
    run_for(Duration::from_secs(10)).await;

    assert!(!navigator.is_demo_mode());
    assert!(!completed(&navigator)[0]);
    assert!(effects.navigations().is_empty());
    assert_eq!(navigator.status().phase, StepPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_reset_during_settle_delay_discards_advance() {
    let (navigator, _effects) = navigator_for(enterprise_store(), NavigatorConfig::default());

    navigator.start_demo();
    run_for(ms(3_100)).await;
    assert!(completed(&navigator)[0]);

    navigator.reset_demo();
    assert!(!completed(&navigator)[0]);

    // the old advance would have fired at 5.5s
    run_for(ms(2_500)).await; // t = 5.6s
    assert_eq!(navigator.current_step(), 0);
    assert!(!completed(&navigator)[0]);
}

#[tokio::test(start_paused = true)]
async fn test_manual_next_cancels_pending_step() {
    let (navigator, effects) = navigator_for(enterprise_store(), NavigatorConfig::default());

    navigator.start_demo();
    run_for(Duration::from_secs(1)).await;
    navigator.next_step();

    run_for(ms(2_500)).await; // t = 3.5s
    assert!(!completed(&navigator)[0]);
    assert!(effects.navigations().is_empty());

    run_for(ms(600)).await; // t = 4.1s
    assert!(completed(&navigator)[1]);
    assert!(!completed(&navigator)[0]);
}

#[tokio::test(start_paused = true)]
async fn test_completed_step_is_not_re_executed() {
    let (navigator, effects) = navigator_for(enterprise_store(), fast_config());

    navigator.start_demo();
    run_for(ms(10)).await;
    let first_pass = effects.navigations().len();

    navigator.prev_step();
    navigator.prev_step();
    run_for(ms(10)).await;

    // stepping back onto completed steps does not run them again
    assert_eq!(effects.navigations().len(), first_pass);
}

#[tokio::test(start_paused = true)]
async fn test_reset_before_injection_writes_nothing() {
    let store = store_with(vec![
        step("qc", StepAction::RunQualityCheck).with_data(qc_flag("qc-1")),
        step("done", StepAction::DemoComplete),
    ]);
    let (navigator, _effects) = navigator_for(store, fast_config());

    // queued behind the read-delay task, ahead of the execution it spawns
    navigator.start_demo();
    let store = navigator.store().clone();
    let reset = tokio::spawn(async move {
        store.reset_demo();
        store.set_paused(true);
    });
    reset.await.unwrap();
    run_for(ms(100)).await;

    let state = navigator.store().snapshot();
    assert_eq!(state.session, 2);
    assert!(state.qc_flags.is_empty());
    assert_eq!(completed(&navigator), vec![false, false]);
    assert!(navigator.status().failure.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_user_completion_during_navigation_wins() {
    let store = store_with(vec![
        step("lib", StepAction::NavigateToSources),
        step("done", StepAction::DemoComplete),
    ]);
    let effects = ScriptedEffects::new().with_behavior(RouterBehavior::Stuck);
    let config = NavigatorConfig::default().with_read_delay(Duration::ZERO);
    let (navigator, effects) = navigator_with(store, effects, config);

    navigator.start_demo();
    run_for(ms(100)).await;
    navigator.complete_current_step();

    // the stuck navigation would have exhausted its attempts by now
    run_for(ms(1_400)).await; // t = 1.5s
    let status = navigator.status();
    assert_eq!(status.phase, StepPhase::Completed);
    assert!(status.failure.is_none());
    assert_eq!(effects.navigations().len(), 1);
    assert_eq!(navigator.current_step(), 0);

    run_for(ms(1_200)).await; // t = 2.7s, settle elapsed
    assert_eq!(navigator.current_step(), 1);
    assert_eq!(completed(&navigator), vec![true, true]);
}

// ============================================================================
// Pause
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_during_read_delay_defers_step() {
    let (navigator, _effects) = navigator_for(enterprise_store(), NavigatorConfig::default());

    navigator.start_demo();
    run_for(Duration::from_secs(1)).await;
    navigator.pause();
    assert_eq!(navigator.status().phase, StepPhase::Paused);

    run_for(Duration::from_secs(10)).await;
    assert!(!completed(&navigator)[0]);

    navigator.resume();
    run_for(ms(3_100)).await;
    assert!(completed(&navigator)[0]);
}

#[tokio::test(start_paused = true)]
async fn test_pause_after_completion_blocks_advance() {
    let (navigator, _effects) = navigator_for(enterprise_store(), NavigatorConfig::default());

    navigator.start_demo();
    run_for(ms(3_100)).await;
    assert!(completed(&navigator)[0]);

    navigator.pause();
    run_for(Duration::from_secs(10)).await;
    assert_eq!(navigator.current_step(), 0);

    navigator.resume();
    run_for(Duration::from_secs(10)).await;
    assert_eq!(navigator.current_step(), 0);
    assert_eq!(navigator.status().phase, StepPhase::Completed);

    navigator.next_step();
    run_for(ms(3_100)).await;
    assert!(completed(&navigator)[1]);
}

#[tokio::test(start_paused = true)]
async fn test_user_completion_while_paused_does_not_advance() {
    let (navigator, _effects) = navigator_for(enterprise_store(), NavigatorConfig::default());

    navigator.start_demo();
    navigator.pause();
    navigator.complete_current_step();

    assert!(completed(&navigator)[0]);
    run_for(Duration::from_secs(10)).await;
    assert_eq!(navigator.current_step(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_user_completion_advances_after_settle() {
    let (navigator, effects) = navigator_for(enterprise_store(), NavigatorConfig::default());

    navigator.start_demo();
    navigator.complete_current_step();
    run_for(ms(2_600)).await;

    assert_eq!(navigator.current_step(), 1);
    assert!(effects.navigations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_toggle_pause() {
    let (navigator, _effects) = navigator_for(enterprise_store(), fast_config());
    navigator.start_demo();

    assert!(navigator.toggle_pause());
    assert!(navigator.is_paused());
    assert!(!navigator.toggle_pause());
    assert!(!navigator.is_paused());
}

// ============================================================================
// Actions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unknown_action_passes_through() {
    let store = store_with(vec![
        step("mystery", StepAction::Unknown("launch_confetti".to_string())),
        step("done", StepAction::DemoComplete),
    ]);
    let (navigator, effects) = navigator_for(store, fast_config());

    navigator.start_demo();
    run_for(ms(100)).await;

    assert_eq!(completed(&navigator), vec![true, true]);
    assert_eq!(
        effects.work_log(),
        vec![StepAction::Unknown("launch_confetti".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_populate_without_document_still_completes() {
    let store = store_with(vec![step("fill", StepAction::PopulateContent)]);
    let (navigator, _effects) = navigator_for(store, fast_config());

    navigator.start_demo();
    run_for(ms(100)).await;

    assert_eq!(completed(&navigator), vec![true]);
    assert!(navigator.store().snapshot().working_docs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_data_step_with_route_navigates_first() {
    let store = store_with(vec![step("qc", StepAction::RunQualityCheck)
        .with_expected_path("/requests")
        .with_data(qc_flag("qc-1"))]);
    let (navigator, effects) = navigator_for(store, fast_config());

    navigator.start_demo();
    run_for(ms(100)).await;

    assert_eq!(effects.navigations(), vec!["/requests".to_string()]);
    assert_eq!(navigator.store().snapshot().qc_flags.len(), 1);
}

// ============================================================================
// Driver loop
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_driver_reacts_to_external_store_changes() {
    let store = enterprise_store();
    let (navigator, _effects) = navigator_for(store.clone(), NavigatorConfig::default());
    let driver = navigator.spawn();

    store.start_demo();
    run_for(ms(3_100)).await;
    assert!(completed(&navigator)[0]);

    navigator.shutdown();
    driver.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_restored_position_resumes_tour() {
    let blob = PersistedState {
        is_demo_mode: true,
        current_step: 7,
        is_guided_tour: true,
        is_paused: false,
    }
    .encode()
    .unwrap();
    let storage = Arc::new(MemoryStorage::with_entry(DEFAULT_STORAGE_KEY, blob));
    let store = Arc::new(DemoStore::new(StepTable::enterprise(), storage));
    let (navigator, effects) = navigator_for(store, NavigatorConfig::default());

    let driver = navigator.spawn();
    run_for(ms(3_100)).await;

    assert!(completed(&navigator)[7]);
    assert_eq!(effects.navigations(), vec!["/sources".to_string()]);

    navigator.shutdown();
    driver.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_status_watch_reports_failure() {
    let store = store_with(vec![step("lib", StepAction::NavigateToSources)]);
    let effects = ScriptedEffects::new().with_behavior(RouterBehavior::Stuck);
    let (navigator, _effects) = navigator_with(store, effects, fast_config());
    let mut status = navigator.watch_status();

    navigator.start_demo();
    let failed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if status.borrow_and_update().phase == StepPhase::Failed {
                break;
            }
            status.changed().await.unwrap();
        }
    })
    .await;

    assert!(failed.is_ok());
    navigator.dismiss_error();
    assert!(navigator.status().failure.is_none());
}

#[test]
fn test_navigation_error_is_retryable() {
    let err = NavigatorError::NavigationFailed {
        step_id: "x".to_string(),
        target: "/".to_string(),
        attempts: 1,
        last_location: "/a".to_string(),
    };
    assert!(err.is_retryable());
}
