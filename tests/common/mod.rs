//! Mock collaborators shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use exertion::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Behaviour = dyn Fn(Mogram) -> Result<Option<Mogram>, RemoteError> + Send + Sync;

/// A provider that runs a closure over the unit it receives and counts what happens.
pub struct MockProvider {
    name: String,
    id: Uuid,
    alive: AtomicBool,
    exclusive: bool,
    calls: AtomicUsize,
    pings: AtomicUsize,
    seen: Mutex<Vec<String>>,
    behaviour: Box<Behaviour>,
}

impl MockProvider {
    pub fn new<F>(name: &str, behaviour: F) -> Self
    where
        F: Fn(Mogram) -> Result<Option<Mogram>, RemoteError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            id: Uuid::new_v4(),
            alive: AtomicBool::new(true),
            exclusive: false,
            calls: AtomicUsize::new(0),
            pings: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            behaviour: Box::new(behaviour),
        }
    }

    /// A provider that applies `f` to the context of every unit it receives.
    pub fn computing<F>(name: &str, f: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        Self::new(name, move |mut mogram| {
            f(mogram.context_mut());
            Ok(Some(mogram))
        })
    }

    /// A provider whose invocation returns no result.
    pub fn returning_nothing(name: &str) -> Self {
        Self::new(name, |_| Ok(None))
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    /// Names of the units this provider executed, in call order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn requires_exclusive_access(&self) -> bool {
        self.exclusive
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.alive.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unreachable(self.name.clone()))
        }
    }

    async fn exert(
        &self,
        mogram: Mogram,
        _txn: Option<&Transaction>,
        _args: &[Arg],
    ) -> Result<Option<Mogram>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(mogram.name().to_string());
        (self.behaviour)(mogram)
    }
}

/// Discovery keyed by service type, with an optional by-name registry for `locate`.
#[derive(Default)]
pub struct MockDiscovery {
    by_type: Mutex<HashMap<String, ProviderHandle>>,
    by_name: Mutex<HashMap<String, ProviderHandle>>,
    finds: AtomicUsize,
    locates: AtomicUsize,
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, service_type: &str, provider: Arc<MockProvider>) {
        self.register_handle(service_type, ProviderHandle::Provider(provider));
    }

    pub fn register_handle(&self, service_type: &str, handle: ProviderHandle) {
        self.by_type
            .lock()
            .unwrap()
            .insert(service_type.to_string(), handle);
    }

    pub fn register_named(&self, name: &str, provider: Arc<MockProvider>) {
        self.by_name
            .lock()
            .unwrap()
            .insert(name.to_string(), ProviderHandle::Provider(provider));
    }

    pub fn unregister(&self, service_type: &str) {
        self.by_type.lock().unwrap().remove(service_type);
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn locates(&self) -> usize {
        self.locates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Discovery for MockDiscovery {
    async fn find_provider(&self, signature: &Signature) -> Result<Option<ProviderHandle>, RemoteError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .by_type
            .lock()
            .unwrap()
            .get(signature.service_type())
            .cloned())
    }

    async fn locate(&self, name: &str, _signature: &Signature) -> Result<Option<ProviderHandle>, RemoteError> {
        self.locates.fetch_add(1, Ordering::SeqCst);
        Ok(self.by_name.lock().unwrap().get(name).cloned())
    }
}

/// Lock service that grants or denies every request.
pub struct MockLocks {
    grant: AtomicBool,
    acquired: Mutex<Vec<(String, Uuid)>>,
}

impl MockLocks {
    pub fn granting() -> Self {
        Self {
            grant: AtomicBool::new(true),
            acquired: Mutex::new(Vec::new()),
        }
    }

    pub fn denying() -> Self {
        Self {
            grant: AtomicBool::new(false),
            acquired: Mutex::new(Vec::new()),
        }
    }

    /// Every (key, owner) pair a lock was requested for.
    pub fn requests(&self) -> Vec<(String, Uuid)> {
        self.acquired.lock().unwrap().clone()
    }
}

#[async_trait]
impl LockService for MockLocks {
    async fn acquire(&self, key: &str, owner: Uuid, _txn: &Transaction) -> Result<LockResult, RemoteError> {
        self.acquired.lock().unwrap().push((key.to_string(), owner));
        if self.grant.load(Ordering::SeqCst) {
            Ok(LockResult::Granted)
        } else {
            Ok(LockResult::Denied)
        }
    }
}

#[derive(Default)]
pub struct MockTxns {
    created: AtomicUsize,
    committed: AtomicUsize,
    aborted: AtomicUsize,
    lose_commits: bool,
}

impl MockTxns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every commit is attempted and then reported as lost.
    pub fn failing_commit() -> Self {
        Self {
            lose_commits: true,
            ..Self::default()
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn committed(&self) -> usize {
        self.committed.load(Ordering::SeqCst)
    }

    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionManager for MockTxns {
    async fn create(&self) -> Result<Transaction, RemoteError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Transaction::new())
    }

    async fn commit(&self, _txn: &Transaction) -> Result<(), RemoteError> {
        if self.lose_commits {
            return Err(RemoteError::Transaction("commit lost".into()));
        }
        self.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn abort(&self, _txn: &Transaction) -> Result<(), RemoteError> {
        self.aborted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn int(cxt: &Context, path: &str) -> i64 {
    cxt.get_value(path).and_then(|v| v.as_i64()).unwrap_or(0)
}

pub fn shell_with(discovery: &Arc<MockDiscovery>) -> Shell {
    Shell::new(discovery.clone())
}
