mod auth_support;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use resales_auth::auth::{IdentityListener, Principal};
use resales_auth::session::{AuthOperationState, SessionSnapshot, SessionStateStore};
use tokio::sync::watch;

use auth_support::{FakeIdentityService, Harness};

async fn wait_until(
    rx: &mut watch::Receiver<SessionSnapshot>,
    predicate: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("store update timed out")
        .expect("store dropped")
        .clone()
}

fn principal(uid: &str, email: &str) -> Principal {
    Principal {
        uid: uid.to_string(),
        email: Some(email.to_string()),
        display_name: None,
    }
}

#[tokio::test]
async fn external_revocation_clears_session_without_orchestrator() {
    let harness = Harness::new(
        FakeIdentityService::new()
            .with_account("a@x.com", "pw1")
            .signed_in_as("a@x.com"),
    );
    let core = harness.start_core();
    assert!(core.store().is_logged_in());
    let mut rx = core.store().watch();

    harness.identity.push_external_change(None);

    let snapshot = wait_until(&mut rx, |snapshot| snapshot.session.is_none()).await;
    assert!(!snapshot.is_logged_in());
    assert!(core.store().current().is_none());
    assert_eq!(harness.identity.sign_out_calls(), 0);

    core.shutdown().await;
}

#[tokio::test]
async fn external_sign_in_from_foreign_thread_reaches_store() {
    let harness = Harness::new(FakeIdentityService::new());
    let core = harness.start_core();
    let mut updates = core.store().observe();
    assert!(updates.next().await.unwrap().session.is_none());

    harness
        .identity
        .push_external_change(Some(principal("uid-9", "nine@x.com")));

    let snapshot = tokio::time::timeout(Duration::from_secs(2), updates.next())
        .await
        .expect("update delivered")
        .unwrap();
    assert_eq!(snapshot.session.unwrap().email(), Some("nine@x.com"));

    core.shutdown().await;
}

#[tokio::test]
async fn shutdown_unsubscribes_exactly_once() {
    let harness = Harness::new(FakeIdentityService::new());
    let core = harness.start_core();
    assert_eq!(harness.identity.listener_count(), 1);

    core.shutdown().await;

    assert_eq!(harness.identity.listener_count(), 0);
    assert_eq!(harness.identity.removed_listeners(), 1);
}

#[tokio::test]
async fn no_store_writes_after_unsubscribe() {
    let identity = Arc::new(FakeIdentityService::new());
    let store = Arc::new(SessionStateStore::default());
    let subscription = IdentityListener::new(identity.clone()).subscribe(store.clone());

    subscription.unsubscribe().await;
    identity.push_external_change(Some(principal("uid-1", "late@x.com")));
    tokio::task::yield_now().await;

    assert!(store.current().is_none());
    assert_eq!(store.version(), 0);
}

#[tokio::test]
async fn core_start_seeds_store_from_provider() {
    let harness = Harness::new(
        FakeIdentityService::new()
            .with_account("a@x.com", "pw1")
            .signed_in_as("a@x.com"),
    );
    let core = harness.start_core();

    assert_eq!(core.store().current().unwrap().email(), Some("a@x.com"));

    core.shutdown().await;
}

#[tokio::test]
async fn orchestrator_and_listener_agree_after_sign_in() {
    let harness = Harness::new(FakeIdentityService::new().with_account("a@x.com", "pw1"));
    let core = harness.start_core();

    core.orchestrator().sign_in("a@x.com", "pw1").await;
    // Let the listener's echo of the same principal drain.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let session = core.store().current().unwrap();
    assert_eq!(session.email(), Some("a@x.com"));
    assert!(matches!(
        core.store().operation_state(),
        AuthOperationState::Succeeded
    ));

    core.shutdown().await;
}

#[tokio::test]
async fn dropped_core_stops_applying_events() {
    let harness = Harness::new(
        FakeIdentityService::new()
            .with_account("a@x.com", "pw1")
            .signed_in_as("a@x.com"),
    );
    let core = harness.start_core();
    let store = core.store().clone();

    drop(core);
    tokio::time::sleep(Duration::from_millis(10)).await;
    harness.identity.push_external_change(None);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(store.is_logged_in());
    assert_eq!(harness.identity.listener_count(), 1);
    assert_eq!(harness.identity.removed_listeners(), 0);
}
