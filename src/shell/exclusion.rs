use crate::core::arg::Arg;
use crate::core::error::{DispatchError, Fault};
use crate::core::Mogram;
use crate::provider::txn::{LockResult, LockService, Transaction, TransactionManager};
use crate::provider::Provider;
use std::sync::Arc;

/// Lock service and transaction manager used for providers that require exclusive access.
#[derive(Clone)]
pub struct MutualExclusion {
    locks: Arc<dyn LockService>,
    txns: Arc<dyn TransactionManager>,
}

impl MutualExclusion {
    pub fn new(locks: Arc<dyn LockService>, txns: Arc<dyn TransactionManager>) -> Self {
        Self { locks, txns }
    }

    /// Invokes `provider` holding the lock for its (service type, identity) pair inside a
    /// fresh transaction. The transaction is committed after the call, or aborted when
    /// the lock is denied or the call fails. A failed commit is aborted too; the
    /// returned unit keeps what the provider computed and carries the commit fault.
    /// The provider still receives the caller's ambient transaction.
    pub(crate) async fn exert(
        &self,
        provider: &Arc<dyn Provider>,
        mogram: &mut Mogram,
        ambient: Option<&Transaction>,
        args: &[Arg],
    ) -> Result<Option<Mogram>, DispatchError> {
        let service_type = mogram
            .process_signature()
            .map(|s| s.service_type().to_string())
            .unwrap_or_default();
        let key = format!("{}:{}", service_type, provider.id());
        let txn = self.txns.create().await?;

        let granted = match self.locks.acquire(&key, mogram.id(), &txn).await {
            Ok(LockResult::Granted) => true,
            Ok(LockResult::Denied) => false,
            Err(e) => {
                log::warn!("Lock acquisition for '{}' failed: {}", key, e);
                false
            }
        };
        if !granted {
            self.abort(&txn).await;
            return Err(DispatchError::LockDenied(format!(
                "{}:{}",
                provider.name(),
                provider.id()
            )));
        }

        mogram.control_mut().set_mutex_id(provider.id());
        match provider.exert(mogram.clone(), ambient, args).await {
            Ok(result) => match self.txns.commit(&txn).await {
                Ok(()) => Ok(result),
                Err(e) => {
                    log::error!("Commit of {} for '{}' failed: {}", txn, key, e);
                    self.abort(&txn).await;
                    Ok(result.map(|mut m| {
                        m.report_exception(Fault::exception(format!(
                            "transaction commit failed: {e}"
                        )));
                        m
                    }))
                }
            },
            Err(e) => {
                self.abort(&txn).await;
                Err(e.into())
            }
        }
    }

    async fn abort(&self, txn: &Transaction) {
        if let Err(e) = self.txns.abort(txn).await {
            log::error!("Failed to abort {}: {}", txn, e);
        }
    }
}
