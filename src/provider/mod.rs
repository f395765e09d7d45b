//! Interfaces of the collaborators the shell consumes: providers, the discovery
//! service, and the lock/transaction services behind mutual exclusion.

pub mod txn;

use crate::core::arg::Arg;
use crate::core::error::RemoteError;
use crate::core::signature::{ServiceLogic, Signature};
use crate::core::Mogram;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use txn::Transaction;
use uuid::Uuid;

/// A live, possibly remote, executor of units of work.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Identity of this provider instance; part of the mutual-exclusion lock key.
    fn id(&self) -> Uuid;

    /// Providers that return `true` are only invoked under a lock and a fresh transaction.
    fn requires_exclusive_access(&self) -> bool {
        false
    }

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), RemoteError>;

    /// Executes `mogram` and returns the updated unit. `Ok(None)` means the provider
    /// produced no result.
    async fn exert(
        &self,
        mogram: Mogram,
        txn: Option<&Transaction>,
        args: &[Arg],
    ) -> Result<Option<Mogram>, RemoteError>;
}

/// What resolving a signature yields.
#[derive(Clone)]
pub enum ProviderHandle {
    /// A full provider; cached by the resolver.
    Provider(Arc<dyn Provider>),
    /// An embeddable in-process stand-in; used once and never cached.
    Delegate(Arc<dyn ServiceLogic>),
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderHandle::Provider(p) => f
                .debug_struct("Provider")
                .field("name", &p.name())
                .field("id", &p.id())
                .finish(),
            ProviderHandle::Delegate(_) => f.write_str("Delegate(..)"),
        }
    }
}

/// The distributed lookup service.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Finds any live provider matching the signature's service type and provider name.
    async fn find_provider(&self, signature: &Signature) -> Result<Option<ProviderHandle>, RemoteError>;

    /// Direct locate-by-name, tried first for signatures naming a specific provider.
    async fn locate(
        &self,
        _name: &str,
        _signature: &Signature,
    ) -> Result<Option<ProviderHandle>, RemoteError> {
        Ok(None)
    }
}
