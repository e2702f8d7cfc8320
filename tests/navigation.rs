//! End-to-end navigation engine tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use waypoint::config::schema::{EngineConfig, SubmissionPolicy};
use waypoint::data::loader::{action_fn, loader_fn, DataError, DataOutcome};
use waypoint::navigation::controller::SubmitError;
use waypoint::routing::matcher::MatchOutcome;
use waypoint::routing::tree::{NodeId, RouteSpec, RouteTree};
use waypoint::{Engine, EngineEvent, NavigateOptions, NavigationPhase};

mod common;

/// Leaf node id for a path, for keying into snapshot data.
fn leaf_id(engine: &Engine, path: &str) -> NodeId {
    match engine.route_tree().resolve(path) {
        MatchOutcome::Matched(m) => m.matches.last().unwrap().node,
        MatchOutcome::NoMatch => panic!("expected {path} to match"),
    }
}

fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

#[tokio::test]
async fn test_navigate_commits_loader_data() {
    let (loader, calls) = common::counting_loader(json!({ "who": "Ada" }));
    let tree = RouteTree::build(vec![RouteSpec::path("contacts")
        .loader(loader)
        .child(RouteSpec::path(":id"))])
    .unwrap();
    let engine = Engine::with_defaults(tree);

    engine.navigate("/contacts/42", NavigateOptions::default()).await.unwrap();

    let snap = engine.snapshot();
    assert_eq!(snap.phase, NavigationPhase::Idle);
    assert_eq!(snap.location.as_ref().unwrap().path, "/contacts/42");
    assert_eq!(snap.matches.len(), 2);
    assert!(!snap.not_found);

    let contacts = snap.matches[0].node;
    assert_eq!(snap.data.get(&contacts), Some(&json!({ "who": "Ada" })));
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_last_navigation_wins() {
    let (slow, slow_calls) = common::slow_loader(Duration::from_millis(300), json!("slow"));
    let (fast, _) = common::counting_loader(json!("fast"));
    let tree = RouteTree::build(vec![
        RouteSpec::path("a").loader(slow),
        RouteSpec::path("b").loader(fast),
    ])
    .unwrap();
    let engine = Arc::new(Engine::with_defaults(tree));

    let first = engine.clone();
    let handle =
        tokio::spawn(async move { first.navigate("/a", NavigateOptions::default()).await });

    // Let navigation A get in flight, then supersede it.
    tokio::time::sleep(Duration::from_millis(50)).await;
    engine.navigate("/b", NavigateOptions::default()).await.unwrap();
    handle.await.unwrap().unwrap();

    // Wait out A's loader; its late result must never surface.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let snap = engine.snapshot();
    assert_eq!(snap.location.as_ref().unwrap().path, "/b");
    let b = leaf_id(&engine, "/b");
    assert_eq!(snap.data.get(&b), Some(&json!("fast")));
    assert_eq!(slow_calls.load(std::sync::atomic::Ordering::SeqCst), 1, "A's loader ran");
    assert!(
        !snap.data.values().any(|v| v == &json!("slow")),
        "A's result was published despite supersession"
    );
}

#[tokio::test]
async fn test_loader_failure_routes_to_nearest_handler_without_blocking_siblings() {
    let (parent_loader, _) = common::counting_loader(json!("parent data"));
    let tree = RouteTree::build(vec![RouteSpec::path("contacts")
        .loader(parent_loader)
        .error_handler(common::json_error_handler())
        .child(RouteSpec::path(":id").loader(common::failing_loader("boom")))])
    .unwrap();
    let engine = Engine::with_defaults(tree);

    engine.navigate("/contacts/42", NavigateOptions::default()).await.unwrap();

    let snap = engine.snapshot();
    let contacts = snap.matches[0].node;
    // The sibling loader's data still landed.
    assert_eq!(snap.data.get(&contacts), Some(&json!("parent data")));
    // The child's failure surfaced at the parent, the nearest handler.
    assert_eq!(
        snap.errors.get(&contacts),
        Some(&json!({ "error": "loader failed: boom" }))
    );
}

#[tokio::test]
async fn test_unhandled_failure_reaches_subscribers() {
    let tree = RouteTree::build(vec![
        RouteSpec::path("broken").loader(common::failing_loader("boom"))
    ])
    .unwrap();
    let engine = Engine::with_defaults(tree);
    let mut rx = engine.subscribe();

    engine.navigate("/broken", NavigateOptions::default()).await.unwrap();

    let snap = engine.snapshot();
    assert!(snap.errors.is_empty());
    let events = drain_events(&mut rx);
    assert!(
        events.iter().any(|e| matches!(
            e,
            EngineEvent::UnhandledError { message } if message.contains("boom")
        )),
        "expected an UnhandledError event, got {events:?}"
    );
}

#[tokio::test]
async fn test_fresh_cache_short_circuits_loader() {
    let (loader, calls) = common::counting_loader(json!("cached"));
    let tree = RouteTree::build(vec![RouteSpec::path("contacts").loader(loader)]).unwrap();
    let engine = Engine::with_defaults(tree);

    engine.navigate("/contacts", NavigateOptions::default()).await.unwrap();
    engine.navigate("/contacts", NavigateOptions::default()).await.unwrap();
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    engine
        .navigate("/contacts", NavigateOptions { force_revalidate: true })
        .await
        .unwrap();
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_submit_invalidates_cache_and_revalidates() {
    let (loader, loads) = common::counting_loader(json!("list"));
    let (action, actions) = common::recording_action(Ok(DataOutcome::Data(json!({ "id": 7 }))));
    let tree = RouteTree::build(vec![RouteSpec::path("contacts")
        .loader(loader)
        .action(action)])
    .unwrap();
    let engine = Engine::with_defaults(tree);

    engine.navigate("/contacts", NavigateOptions::default()).await.unwrap();
    assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 1);

    engine.submit(json!({ "name": "Grace" }), "/contacts").await.unwrap();

    // The action ran exactly once and its loader re-fetched despite
    // unchanged parameters.
    assert_eq!(actions.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 2);

    let snap = engine.snapshot();
    assert_eq!(snap.phase, NavigationPhase::Idle);
    assert_eq!(snap.action_data, Some(json!({ "id": 7 })));
}

#[tokio::test]
async fn test_submit_phases_run_submitting_then_loading_then_idle() {
    let (loader, _) = common::counting_loader(json!(null));
    let (action, _) = common::recording_action(Ok(DataOutcome::Data(json!(null))));
    let tree = RouteTree::build(vec![RouteSpec::path("contacts")
        .loader(loader)
        .action(action)])
    .unwrap();
    let engine = Engine::with_defaults(tree);
    let mut rx = engine.subscribe();

    engine.submit(json!({}), "/contacts").await.unwrap();

    let phases: Vec<NavigationPhase> = drain_events(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::PhaseChanged(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            NavigationPhase::Submitting,
            NavigationPhase::Loading,
            NavigationPhase::Idle,
        ]
    );
}

#[tokio::test]
async fn test_submit_without_action_is_rejected() {
    let (loader, _) = common::counting_loader(json!(null));
    let tree = RouteTree::build(vec![RouteSpec::path("contacts").loader(loader)]).unwrap();
    let engine = Engine::with_defaults(tree);

    let err = engine.submit(json!({}), "/contacts").await.unwrap_err();
    assert!(matches!(err, SubmitError::NoAction(_)));
    assert_eq!(engine.snapshot().phase, NavigationPhase::Idle);
}

#[tokio::test]
async fn test_failed_action_surfaces_handler_and_keeps_data() {
    let (loader, loads) = common::counting_loader(json!("list"));
    let (action, _) =
        common::recording_action(Err(DataError::Action("db unavailable".into())));
    let tree = RouteTree::build(vec![RouteSpec::path("contacts")
        .loader(loader)
        .action(action)
        .error_handler(common::json_error_handler())])
    .unwrap();
    let engine = Engine::with_defaults(tree);

    engine.navigate("/contacts", NavigateOptions::default()).await.unwrap();
    engine.submit(json!({}), "/contacts").await.unwrap();

    let snap = engine.snapshot();
    let contacts = snap.matches[0].node;
    assert_eq!(
        snap.errors.get(&contacts),
        Some(&json!({ "error": "action failed: db unavailable" }))
    );
    // Committed data survives a failed action; no revalidation ran.
    assert_eq!(snap.data.get(&contacts), Some(&json!("list")));
    assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(snap.action_data, None);
}

#[tokio::test]
async fn test_loader_redirect_triggers_follow_up_navigation() {
    let redirecting = loader_fn(|_cx| async move {
        Ok(DataOutcome::Redirect("/welcome".to_string()))
    });
    let (welcome_loader, _) = common::counting_loader(json!("hello"));
    let tree = RouteTree::build(vec![
        RouteSpec::path("old").loader(redirecting),
        RouteSpec::path("welcome").loader(welcome_loader),
    ])
    .unwrap();
    let engine = Engine::with_defaults(tree);
    let mut rx = engine.subscribe();

    engine.navigate("/old", NavigateOptions::default()).await.unwrap();

    let snap = engine.snapshot();
    assert_eq!(snap.location.as_ref().unwrap().path, "/welcome");
    let events = drain_events(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::Redirected { to } if to == "/welcome")));
}

#[tokio::test]
async fn test_action_redirect_revalidates_at_target() {
    let create = action_fn(|_cx| async move {
        Ok(DataOutcome::Redirect("/contacts/7".to_string()))
    });
    let (detail_loader, detail_loads) = common::counting_loader(json!({ "id": 7 }));
    let tree = RouteTree::build(vec![RouteSpec::path("contacts")
        .action(create)
        .child(RouteSpec::path(":id").loader(detail_loader))])
    .unwrap();
    let engine = Engine::with_defaults(tree);

    engine.submit(json!({ "name": "Grace" }), "/contacts").await.unwrap();

    let snap = engine.snapshot();
    assert_eq!(snap.location.as_ref().unwrap().path, "/contacts/7");
    assert_eq!(detail_loads.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_not_found_commits_empty_match() {
    let tree = RouteTree::build(vec![RouteSpec::path("contacts")]).unwrap();
    let engine = Engine::with_defaults(tree);

    engine.navigate("/missing", NavigateOptions::default()).await.unwrap();

    let snap = engine.snapshot();
    assert!(snap.not_found);
    assert!(snap.matches.is_empty());
    assert_eq!(snap.location.as_ref().unwrap().path, "/missing");
    assert_eq!(snap.phase, NavigationPhase::Idle);
}

#[tokio::test]
async fn test_reject_policy_refuses_concurrent_submission() {
    let slow_action = action_fn(|_cx| async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(DataOutcome::Data(json!(null)))
    });
    let tree = RouteTree::build(vec![RouteSpec::path("contacts").action(slow_action)]).unwrap();
    let mut config = EngineConfig::default();
    config.submission.policy = SubmissionPolicy::Reject;
    let engine = Arc::new(Engine::new(tree, config));

    let first = engine.clone();
    let handle = tokio::spawn(async move { first.submit(json!({}), "/contacts").await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = engine.submit(json!({}), "/contacts").await.unwrap_err();
    assert!(matches!(err, SubmitError::Busy));

    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_supersede_policy_second_submission_wins() {
    // One action, two personalities: the first call is slow, the second
    // resolves immediately.
    let calls = Arc::new(AtomicU32::new(0));
    let action = {
        let calls = calls.clone();
        action_fn(move |_cx| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    Ok(DataOutcome::Data(json!("first")))
                } else {
                    Ok(DataOutcome::Data(json!("second")))
                }
            }
        })
    };
    let (loader, _) = common::counting_loader(json!("list"));
    let tree = RouteTree::build(vec![RouteSpec::path("contacts")
        .loader(loader)
        .action(action)])
    .unwrap();
    let engine = Arc::new(Engine::with_defaults(tree));

    let first = engine.clone();
    let handle = tokio::spawn(async move { first.submit(json!({}), "/contacts").await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    engine.submit(json!({}), "/contacts").await.unwrap();
    // The superseded submission resolves without error; its result is
    // discarded on the way out.
    handle.await.unwrap().unwrap();

    let snap = engine.snapshot();
    assert_eq!(snap.phase, NavigationPhase::Idle);
    assert_eq!(snap.action_data, Some(json!("second")));
    assert_eq!(calls.load(Ordering::SeqCst), 2, "both actions ran");
}

#[tokio::test]
async fn test_loader_timeout_routes_to_error_handler() {
    let (slow, _) = common::slow_loader(Duration::from_secs(5), json!("never"));
    let tree = RouteTree::build(vec![RouteSpec::path("contacts")
        .loader(slow)
        .error_handler(common::json_error_handler())])
    .unwrap();
    let mut config = EngineConfig::default();
    config.timeouts.loader_secs = 1;
    let engine = Engine::new(tree, config);

    engine.navigate("/contacts", NavigateOptions::default()).await.unwrap();

    let snap = engine.snapshot();
    assert_eq!(snap.phase, NavigationPhase::Idle);
    let contacts = snap.matches[0].node;
    assert_eq!(
        snap.errors.get(&contacts),
        Some(&json!({ "error": "loader timed out after 1 seconds" }))
    );
    assert!(snap.data.is_empty());
}

#[tokio::test]
async fn test_action_timeout_routes_to_error_handler() {
    let slow_action = action_fn(|_cx| async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(DataOutcome::Data(json!(null)))
    });
    let tree = RouteTree::build(vec![RouteSpec::path("contacts")
        .action(slow_action)
        .error_handler(common::json_error_handler())])
    .unwrap();
    let mut config = EngineConfig::default();
    config.timeouts.action_secs = 1;
    let engine = Engine::new(tree, config);

    engine.submit(json!({}), "/contacts").await.unwrap();

    let snap = engine.snapshot();
    assert_eq!(snap.phase, NavigationPhase::Idle);
    let contacts = leaf_id(&engine, "/contacts");
    assert_eq!(
        snap.errors.get(&contacts),
        Some(&json!({ "error": "action timed out after 1 seconds" }))
    );
    assert_eq!(snap.action_data, None);
}
