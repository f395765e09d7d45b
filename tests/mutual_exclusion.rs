//! Locked, transactional invocation of providers that require exclusive access.

mod common;

use common::{int, shell_with, MockDiscovery, MockLocks, MockProvider, MockTxns};
use exertion::prelude::*;
use std::sync::Arc;

fn counter(name: &str) -> MockProvider {
    MockProvider::computing(name, |cxt| {
        let next = int(cxt, "count") + 1;
        cxt.put_value("count", next);
    })
}

fn increment() -> Mogram {
    Task::new("inc", Signature::net("increment", "Counter"))
        .with_context(Context::new("inc").with("count", 1))
        .into()
}

#[tokio::test]
async fn test_granted_lock_runs_inside_committed_transaction() {
    let discovery = Arc::new(MockDiscovery::new());
    let provider = Arc::new(counter("counter").exclusive());
    discovery.register("Counter", provider.clone());
    let locks = Arc::new(MockLocks::granting());
    let txns = Arc::new(MockTxns::new());
    let shell = shell_with(&discovery).with_mutual_exclusion(locks.clone(), txns.clone());

    let task = increment();
    let task_id = task.id();
    let task = shell.exert(task, None, &[]).await;

    assert_eq!(task.status(), ExecState::Done);
    assert_eq!(int(task.context(), "count"), 2);
    assert_eq!(task.control().mutex_id(), Some(provider.id()));
    assert_eq!(txns.created(), 1);
    assert_eq!(txns.committed(), 1);
    assert_eq!(txns.aborted(), 0);
    assert_eq!(
        locks.requests(),
        vec![(format!("Counter:{}", provider.id()), task_id)]
    );
}

#[tokio::test]
async fn test_denied_lock_aborts_without_calling_provider() {
    let discovery = Arc::new(MockDiscovery::new());
    let provider = Arc::new(counter("counter").exclusive());
    discovery.register("Counter", provider.clone());
    let txns = Arc::new(MockTxns::new());
    let shell = shell_with(&discovery)
        .with_mutual_exclusion(Arc::new(MockLocks::denying()), txns.clone());

    let task = shell.exert(increment(), None, &[]).await;

    assert_eq!(provider.calls(), 0);
    assert_eq!(txns.created(), 1);
    assert_eq!(txns.aborted(), 1);
    assert_eq!(txns.committed(), 0);
    assert_eq!(task.status(), ExecState::Failed);
    assert_eq!(
        task.exceptions()[0].message,
        format!("no lock available for: counter:{}", provider.id())
    );
    assert_eq!(int(task.context(), "count"), 1);
}

#[tokio::test]
async fn test_failed_call_aborts_transaction() {
    let discovery = Arc::new(MockDiscovery::new());
    let provider = Arc::new(
        MockProvider::new("counter", |_| Err(RemoteError::Invocation("disk full".into()))).exclusive(),
    );
    discovery.register("Counter", provider.clone());
    let txns = Arc::new(MockTxns::new());
    let shell = shell_with(&discovery)
        .with_mutual_exclusion(Arc::new(MockLocks::granting()), txns.clone());

    let task = shell.exert(increment(), None, &[]).await;

    assert_eq!(provider.calls(), 1);
    assert_eq!(txns.aborted(), 1);
    assert_eq!(txns.committed(), 0);
    assert!(task.status().is_failure());
    assert!(task.exceptions()[0].message.contains("disk full"));
}

#[tokio::test]
async fn test_failed_commit_aborts_and_keeps_the_computed_context() {
    let discovery = Arc::new(MockDiscovery::new());
    let provider = Arc::new(counter("counter").exclusive());
    discovery.register("Counter", provider.clone());
    let txns = Arc::new(MockTxns::failing_commit());
    let shell = shell_with(&discovery)
        .with_mutual_exclusion(Arc::new(MockLocks::granting()), txns.clone());

    let task = shell.exert(increment(), None, &[]).await;

    assert_eq!(provider.calls(), 1);
    assert_eq!(txns.committed(), 0);
    assert_eq!(txns.aborted(), 1);
    assert_eq!(int(task.context(), "count"), 2);
    assert_eq!(task.status(), ExecState::Failed);
    assert_eq!(task.exceptions().len(), 1);
    assert_eq!(
        task.exceptions()[0].message,
        "transaction commit failed: transaction error: commit lost"
    );
}

#[tokio::test]
async fn test_exclusive_provider_without_lock_service_is_a_configuration_error() {
    let discovery = Arc::new(MockDiscovery::new());
    let provider = Arc::new(counter("counter").exclusive());
    discovery.register("Counter", provider.clone());
    let shell = shell_with(&discovery);

    let mut task = increment();
    let err = shell.try_exert(&mut task, None, &[]).await.unwrap_err();

    assert!(matches!(err.root_cause(), DispatchError::Configuration(_)));
    assert_eq!(provider.calls(), 0);
    assert!(task.status().is_failure());
}

#[tokio::test]
async fn test_shared_provider_bypasses_locking() {
    let discovery = Arc::new(MockDiscovery::new());
    discovery.register("Counter", Arc::new(counter("counter")));
    let locks = Arc::new(MockLocks::granting());
    let txns = Arc::new(MockTxns::new());
    let shell = shell_with(&discovery).with_mutual_exclusion(locks.clone(), txns.clone());

    let task = shell.exert(increment(), None, &[]).await;

    assert_eq!(task.status(), ExecState::Done);
    assert!(locks.requests().is_empty());
    assert_eq!(txns.created(), 0);
    assert!(task.control().mutex_id().is_none());
}
