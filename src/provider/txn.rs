use crate::core::error::RemoteError;
use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

/// Handle to a transaction created by a [`TransactionManager`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transaction {
    id: Uuid,
}

impl Transaction {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.id)
    }
}

#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn create(&self) -> Result<Transaction, RemoteError>;
    async fn commit(&self, txn: &Transaction) -> Result<(), RemoteError>;
    async fn abort(&self, txn: &Transaction) -> Result<(), RemoteError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockResult {
    Granted,
    Denied,
}

/// Named locks scoped to a transaction; a lock is released when its transaction
/// commits or aborts.
#[async_trait]
pub trait LockService: Send + Sync {
    async fn acquire(
        &self,
        key: &str,
        owner: Uuid,
        txn: &Transaction,
    ) -> Result<LockResult, RemoteError>;
}
