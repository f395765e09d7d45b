//! Signature to provider resolution, backed by a bounded expiring cache.

use crate::core::error::DispatchError;
use crate::core::signature::{ProviderName, Signature};
use crate::provider::{Discovery, Provider, ProviderHandle};
use crate::shell::config::{ShellConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

struct CachedProvider {
    provider: Arc<dyn Provider>,
    loaded_at: Instant,
}

/// Bounded map from signature to provider; entries expire a fixed time after write.
///
/// Meant to be shared between shells behind an `Arc`. Under capacity pressure the
/// entry loaded longest ago is evicted.
pub struct ProviderCache {
    capacity: usize,
    ttl: Duration,
    entries: Mutex<HashMap<Signature, CachedProvider>>,
}

impl ProviderCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &ShellConfig) -> Self {
        Self::new(config.cache_capacity, config.cache_ttl())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Signature, CachedProvider>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, signature: &Signature) -> Option<Arc<dyn Provider>> {
        let mut entries = self.lock();
        match entries.get(signature) {
            Some(entry) if entry.loaded_at.elapsed() < self.ttl => Some(entry.provider.clone()),
            Some(_) => {
                entries.remove(signature);
                None
            }
            None => None,
        }
    }

    /// Stores `provider` for `signature`, replacing any previous load.
    pub fn insert(&self, signature: Signature, provider: Arc<dyn Provider>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.loaded_at.elapsed() < ttl);

        if !entries.contains_key(&signature) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.loaded_at)
                .map(|(sig, _)| sig.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            signature,
            CachedProvider {
                provider,
                loaded_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, signature: &Signature) -> bool {
        self.lock().remove(signature).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for ProviderCache {
    fn default() -> Self {
        Self::new(
            DEFAULT_CACHE_CAPACITY,
            Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        )
    }
}

/// Maps a signature to a live executor: cache first, then discovery.
pub struct ProviderResolver {
    discovery: Arc<dyn Discovery>,
    cache: Arc<ProviderCache>,
}

impl ProviderResolver {
    pub fn new(discovery: Arc<dyn Discovery>, cache: Arc<ProviderCache>) -> Self {
        Self { discovery, cache }
    }

    pub fn cache(&self) -> &Arc<ProviderCache> {
        &self.cache
    }

    /// Returns a handle that passed a liveness check during this call.
    pub async fn resolve(&self, signature: &Signature) -> Result<ProviderHandle, DispatchError> {
        if let Some(provider) = self.cache.get(signature) {
            match provider.ping().await {
                Ok(()) => return Ok(ProviderHandle::Provider(provider)),
                Err(e) => {
                    log::warn!(
                        "Cached provider '{}' for {} failed its liveness check ({}), reloading",
                        provider.name(),
                        signature,
                        e
                    );
                    self.cache.invalidate(signature);
                }
            }
        }
        self.load(signature).await
    }

    async fn load(&self, signature: &Signature) -> Result<ProviderHandle, DispatchError> {
        let mut found = None;
        if let ProviderName::Named(name) = signature.provider_name() {
            match self.discovery.locate(name, signature).await {
                Ok(handle) => found = handle,
                Err(e) => log::debug!("Locating provider '{}' by name failed: {}", name, e),
            }
        }
        if found.is_none() {
            found = match self.discovery.find_provider(signature).await {
                Ok(handle) => handle,
                Err(e) => {
                    log::error!("Discovery failed for {}: {}", signature, e);
                    None
                }
            };
        }

        match found {
            Some(ProviderHandle::Provider(provider)) => {
                if let Err(e) = provider.ping().await {
                    log::error!(
                        "Provider '{}' found for {} is not alive: {}",
                        provider.name(),
                        signature,
                        e
                    );
                    return Err(unavailable(signature));
                }
                self.cache.insert(signature.clone(), provider.clone());
                Ok(ProviderHandle::Provider(provider))
            }
            Some(delegate @ ProviderHandle::Delegate(_)) => Ok(delegate),
            None => {
                log::error!("No provider available for {}", signature);
                Err(unavailable(signature))
            }
        }
    }
}

fn unavailable(signature: &Signature) -> DispatchError {
    DispatchError::ProviderUnavailable {
        provider: signature.provider_name().to_string(),
        service_type: signature.service_type().to_string(),
    }
}
