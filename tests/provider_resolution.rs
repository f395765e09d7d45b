//! Provider lookup through discovery and the bounded, expiring provider cache.

mod common;

use common::{int, shell_with, MockDiscovery, MockProvider};
use exertion::prelude::*;
use exertion::ProviderCache;
use std::sync::Arc;
use std::time::Duration;

fn adder(name: &str) -> Arc<MockProvider> {
    Arc::new(MockProvider::computing(name, |cxt| {
        let sum = int(cxt, "x1") + int(cxt, "x2");
        cxt.put_value("result", sum);
    }))
}

fn add_task() -> Mogram {
    Task::new("add", Signature::net("add", "Adder"))
        .with_context(Context::new("add").with("x1", 1).with("x2", 2))
        .into()
}

#[tokio::test]
async fn test_cache_stays_within_capacity() {
    let discovery = Arc::new(MockDiscovery::new());
    for i in 0..25 {
        discovery.register(&format!("Service{i}"), adder(&format!("p{i}")));
    }
    let shell = shell_with(&discovery);

    for i in 0..25 {
        let task: Mogram = Task::new(format!("t{i}"), Signature::net("add", format!("Service{i}"))).into();
        let task = shell.exert(task, None, &[]).await;
        assert_eq!(task.status(), ExecState::Done);
    }

    assert_eq!(shell.cache().capacity(), 20);
    assert_eq!(shell.cache().len(), 20);
    assert_eq!(discovery.finds(), 25);
}

#[tokio::test]
async fn test_repeated_dispatch_hits_the_cache() {
    let discovery = Arc::new(MockDiscovery::new());
    let provider = adder("adder");
    discovery.register("Adder", provider.clone());
    let shell = shell_with(&discovery);

    for _ in 0..3 {
        let task = shell.exert(add_task(), None, &[]).await;
        assert_eq!(int(task.context(), "result"), 3);
    }

    assert_eq!(discovery.finds(), 1);
    assert_eq!(provider.calls(), 3);
    // one check after the load, one per cache hit
    assert_eq!(provider.pings(), 3);
}

#[tokio::test]
async fn test_dead_cached_provider_is_reloaded_once() {
    let discovery = Arc::new(MockDiscovery::new());
    let old = adder("old");
    discovery.register("Adder", old.clone());
    let shell = shell_with(&discovery);
    shell.exert(add_task(), None, &[]).await;

    old.set_alive(false);
    let replacement = adder("replacement");
    discovery.register("Adder", replacement.clone());
    let task = shell.exert(add_task(), None, &[]).await;

    assert_eq!(task.status(), ExecState::Done);
    assert_eq!(discovery.finds(), 2);
    assert_eq!(old.calls(), 1);
    assert_eq!(replacement.calls(), 1);

    shell.exert(add_task(), None, &[]).await;
    assert_eq!(discovery.finds(), 2);
    assert_eq!(replacement.calls(), 2);
}

#[tokio::test]
async fn test_failed_reload_reports_provider_unavailable() {
    let discovery = Arc::new(MockDiscovery::new());
    let old = adder("old");
    discovery.register("Adder", old.clone());
    let shell = shell_with(&discovery);
    shell.exert(add_task(), None, &[]).await;

    old.set_alive(false);
    discovery.unregister("Adder");
    let mut task = add_task();
    let err = shell.try_exert(&mut task, None, &[]).await.unwrap_err();

    assert!(matches!(
        err.root_cause(),
        DispatchError::ProviderUnavailable { service_type, .. } if service_type == "Adder"
    ));
    assert!(task.status().is_failure());
    assert!(shell.cache().is_empty());
}

#[tokio::test]
async fn test_found_provider_that_is_not_alive_is_not_cached() {
    let discovery = Arc::new(MockDiscovery::new());
    let dead = adder("dead");
    dead.set_alive(false);
    discovery.register("Adder", dead.clone());
    let shell = shell_with(&discovery);

    let task = shell.exert(add_task(), None, &[]).await;

    assert!(task.status().is_failure());
    assert_eq!(dead.calls(), 0);
    assert!(shell.cache().is_empty());
}

#[tokio::test]
async fn test_named_provider_is_located_by_name_first() {
    let discovery = Arc::new(MockDiscovery::new());
    let east = adder("east");
    let any = adder("any");
    discovery.register_named("east", east.clone());
    discovery.register("Adder", any.clone());
    let shell = shell_with(&discovery);

    let task: Mogram = Task::new("add", Signature::net("add", "Adder").with_provider("east")).into();
    shell.exert(task, None, &[]).await;

    assert_eq!(east.calls(), 1);
    assert_eq!(any.calls(), 0);
    assert_eq!(discovery.locates(), 1);
    assert_eq!(discovery.finds(), 0);
}

#[tokio::test]
async fn test_unknown_name_falls_back_to_service_type() {
    let discovery = Arc::new(MockDiscovery::new());
    let any = adder("any");
    discovery.register("Adder", any.clone());
    let shell = shell_with(&discovery);

    let task: Mogram = Task::new("add", Signature::net("add", "Adder").with_provider("west")).into();
    let task = shell.exert(task, None, &[]).await;

    assert_eq!(task.status(), ExecState::Done);
    assert_eq!(any.calls(), 1);
    assert_eq!(discovery.locates(), 1);
    assert_eq!(discovery.finds(), 1);
}

#[tokio::test]
async fn test_shells_share_one_cache() {
    let discovery = Arc::new(MockDiscovery::new());
    discovery.register("Adder", adder("adder"));
    let cache = Arc::new(ProviderCache::default());
    let first = Shell::new(discovery.clone()).with_cache(cache.clone());
    let second = Shell::new(discovery.clone()).with_cache(cache.clone());

    first.exert(add_task(), None, &[]).await;
    let task = second.exert(add_task(), None, &[]).await;

    assert_eq!(int(task.context(), "result"), 3);
    assert_eq!(discovery.finds(), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_zero_ttl_always_asks_discovery() {
    let discovery = Arc::new(MockDiscovery::new());
    discovery.register("Adder", adder("adder"));
    let shell = shell_with(&discovery)
        .with_config(ShellConfig::default().with_cache_ttl(Duration::ZERO));

    shell.exert(add_task(), None, &[]).await;
    shell.exert(add_task(), None, &[]).await;

    assert_eq!(discovery.finds(), 2);
}
