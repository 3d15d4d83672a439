//! Controller entry point, timeout and error policy

mod common;

use common::{frigate, identity, reconciler_with, InMemoryPodStore, Op};
use frigate_controller::config::ControllerConfig;
use frigate_controller::controller::reconciler::{
    reconcile, reconcile_with_timeout, ReconcilerError, ResourceIdentity,
};
use frigate_controller::runtime::error_policy::handle_reconciliation_error;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;

fn backoff_config() -> ControllerConfig {
    ControllerConfig {
        backoff_start_ms: 1000,
        backoff_max_ms: 4000,
        ..ControllerConfig::default()
    }
}

#[tokio::test]
async fn test_reconcile_awaits_change_after_success() {
    let store = InMemoryPodStore::new();
    let ctx = reconciler_with(Arc::clone(&store), ControllerConfig::default());

    let action = reconcile(frigate("alpha"), ctx).await.unwrap();

    assert_eq!(action, Action::await_change());
    assert!(store.pod(&identity("alpha")).is_some());
}

#[tokio::test]
async fn test_reconcile_uses_frigate_namespace_and_name() {
    let store = InMemoryPodStore::new();
    let ctx = reconciler_with(Arc::clone(&store), ControllerConfig::default());

    reconcile(frigate("bravo"), ctx).await.unwrap();

    assert!(store.pod(&ResourceIdentity::new("fleet", "bravo")).is_some());
    assert!(store.pod(&ResourceIdentity::new("default", "bravo")).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_times_out() {
    let store = InMemoryPodStore::new();
    store.delay_gets(Duration::from_secs(60));
    let config = ControllerConfig {
        reconcile_timeout_secs: 5,
        ..ControllerConfig::default()
    };
    let ctx = reconciler_with(Arc::clone(&store), config);

    let err = reconcile_with_timeout(frigate("charlie"), ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcilerError::TimedOut(d) if d == Duration::from_secs(5)));
    assert_eq!(err.tag(), "T:");
    // The abandoned call never reached the store
    assert!(store.ops().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fast_store_finishes_within_timeout() {
    let store = InMemoryPodStore::new();
    store.delay_gets(Duration::from_secs(1));
    let config = ControllerConfig {
        reconcile_timeout_secs: 5,
        ..ControllerConfig::default()
    };
    let ctx = reconciler_with(Arc::clone(&store), config);

    let action = reconcile_with_timeout(frigate("delta"), ctx).await.unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(store.ops(), vec![Op::Get, Op::Create, Op::Update]);
}

#[tokio::test]
async fn test_error_backoff_doubles_and_caps() {
    let store = InMemoryPodStore::new();
    store.fail_on(Op::Get);
    let ctx = reconciler_with(store, backoff_config());
    let obj = frigate("echo");

    let mut delays = Vec::new();
    for _ in 0..4 {
        let err = reconcile(Arc::clone(&obj), Arc::clone(&ctx)).await.unwrap_err();
        delays.push(handle_reconciliation_error(Arc::clone(&obj), &err, Arc::clone(&ctx)));
    }

    assert_eq!(
        delays,
        vec![
            Action::requeue(Duration::from_secs(1)),
            Action::requeue(Duration::from_secs(2)),
            Action::requeue(Duration::from_secs(4)),
            Action::requeue(Duration::from_secs(4)),
        ]
    );
    assert_eq!(ctx.error_count(&identity("echo")), 4);
}

#[tokio::test]
async fn test_error_backoff_is_tracked_per_resource() {
    let store = InMemoryPodStore::new();
    store.fail_on(Op::Get);
    let ctx = reconciler_with(store, backoff_config());
    let first = frigate("foxtrot");
    let second = frigate("golf");

    for _ in 0..2 {
        let err = reconcile(Arc::clone(&first), Arc::clone(&ctx)).await.unwrap_err();
        handle_reconciliation_error(Arc::clone(&first), &err, Arc::clone(&ctx));
    }
    let err = reconcile(Arc::clone(&second), Arc::clone(&ctx)).await.unwrap_err();
    let action = handle_reconciliation_error(second, &err, Arc::clone(&ctx));

    assert_eq!(action, Action::requeue(Duration::from_secs(1)));
    assert_eq!(ctx.error_count(&identity("foxtrot")), 2);
    assert_eq!(ctx.error_count(&identity("golf")), 1);
}

#[tokio::test]
async fn test_success_resets_error_backoff() {
    let failing = InMemoryPodStore::new();
    failing.fail_on(Op::Create);
    let ctx = reconciler_with(failing, backoff_config());
    let obj = frigate("hotel");

    for _ in 0..2 {
        let err = reconcile(Arc::clone(&obj), Arc::clone(&ctx)).await.unwrap_err();
        assert_eq!(err.tag(), "U:");
        handle_reconciliation_error(Arc::clone(&obj), &err, Arc::clone(&ctx));
    }
    assert_eq!(ctx.error_count(&identity("hotel")), 2);

    // Same backoff state, healthy store
    let healthy = frigate_controller::controller::reconciler::Reconciler {
        store: InMemoryPodStore::new(),
        ..(*ctx).clone()
    };
    let healthy = Arc::new(healthy);
    reconcile(Arc::clone(&obj), Arc::clone(&healthy)).await.unwrap();
    assert_eq!(healthy.error_count(&identity("hotel")), 0);

    let err = ReconcilerError::TimedOut(Duration::from_secs(30));
    let action = handle_reconciliation_error(obj, &err, healthy);
    assert_eq!(action, Action::requeue(Duration::from_secs(1)));
}

#[tokio::test]
async fn test_recovered_resources_leave_no_backoff_state() {
    let failing = InMemoryPodStore::new();
    failing.fail_on(Op::Get);
    let ctx = reconciler_with(failing, backoff_config());
    let frigates: Vec<_> = (0..50).map(|i| frigate(&format!("ship-{i}"))).collect();

    for obj in &frigates {
        let err = reconcile(Arc::clone(obj), Arc::clone(&ctx)).await.unwrap_err();
        handle_reconciliation_error(Arc::clone(obj), &err, Arc::clone(&ctx));
    }
    assert_eq!(ctx.backoff_states.lock().unwrap().len(), 50);

    let healthy = Arc::new(frigate_controller::controller::reconciler::Reconciler {
        store: InMemoryPodStore::new(),
        ..(*ctx).clone()
    });
    for obj in &frigates {
        reconcile(Arc::clone(obj), Arc::clone(&healthy)).await.unwrap();
    }

    assert!(healthy.backoff_states.lock().unwrap().is_empty());
}
