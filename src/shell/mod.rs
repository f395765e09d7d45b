//! The dispatch shell: resolves executors for units of work, drives them and
//! extracts the caller-visible result.

pub mod config;
mod control_flow;
pub mod exclusion;
pub mod finalize;
pub mod normalize;
mod persist;
mod prepare;
pub mod resolver;
pub mod router;
pub mod sorter;

use crate::core::arg::Arg;
use crate::core::error::{DispatchError, Fault};
use crate::core::signature::Signature;
use crate::core::telemetry::{Telemetry, TraceEntry};
use crate::core::Mogram;
use crate::provider::txn::{LockService, Transaction, TransactionManager};
use crate::provider::Discovery;
use config::ShellConfig;
use exclusion::MutualExclusion;
use finalize::Evaluation;
use futures::future::BoxFuture;
use resolver::{ProviderCache, ProviderResolver};
use router::Route;
use std::collections::HashMap;
use std::sync::Arc;

/// Position of a dispatch in the recursion: delegation depth, and whether the unit is
/// a descendant of the unit the caller handed in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    depth: usize,
    nested: bool,
}

impl Frame {
    fn root() -> Self {
        Self {
            depth: 0,
            nested: false,
        }
    }

    fn is_root(self) -> bool {
        self.depth == 0 && !self.nested
    }

    /// A child of a composite unit.
    pub(crate) fn nested(self) -> Self {
        Self {
            nested: true,
            ..self
        }
    }

    /// A unit running in place of another one.
    pub(crate) fn deeper(self) -> Self {
        Self {
            depth: self.depth + 1,
            nested: true,
        }
    }
}

/// Orchestrates the dispatch of units of work.
///
/// # Example
///
/// ```no_run
/// use exertion::prelude::*;
/// use std::sync::Arc;
///
/// # async fn run(discovery: Arc<dyn Discovery>) -> Result<(), DispatchError> {
/// let shell = Shell::new(discovery);
/// let mut task: Mogram = Task::new("add", Signature::net("add", "Adder"))
///     .with_context(Context::new("add").with("x", 1).with("y", 2))
///     .into();
/// let value = shell
///     .evaluate(&mut task, &[Arg::RequestPath(RequestPath::outputs(["result"]))])
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Shell {
    config: ShellConfig,
    discovery: Arc<dyn Discovery>,
    resolver: ProviderResolver,
    exclusion: Option<MutualExclusion>,
    telemetry: Option<Arc<dyn Telemetry>>,
}

impl Shell {
    pub fn new(discovery: Arc<dyn Discovery>) -> Self {
        let config = ShellConfig::default();
        let cache = Arc::new(ProviderCache::from_config(&config));
        Self {
            resolver: ProviderResolver::new(discovery.clone(), cache),
            config,
            discovery,
            exclusion: None,
            telemetry: None,
        }
    }

    /// Applies `config`. The provider cache is rebuilt with the configured bounds, so
    /// call [`Shell::with_cache`] afterwards to share an existing cache.
    pub fn with_config(mut self, config: ShellConfig) -> Self {
        let cache = Arc::new(ProviderCache::from_config(&config));
        self.resolver = ProviderResolver::new(self.discovery.clone(), cache);
        self.config = config;
        self
    }

    pub fn with_cache(mut self, cache: Arc<ProviderCache>) -> Self {
        self.resolver = ProviderResolver::new(self.discovery.clone(), cache);
        self
    }

    /// Enables the locked, transactional invocation path for providers that ask for it.
    pub fn with_mutual_exclusion(
        mut self,
        locks: Arc<dyn LockService>,
        txns: Arc<dyn TransactionManager>,
    ) -> Self {
        self.exclusion = Some(MutualExclusion::new(locks, txns));
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ProviderCache> {
        self.resolver.cache()
    }

    /// Dispatches `mogram` and returns it updated. Failures of any kind are recorded
    /// on the returned unit's exception log and status.
    pub async fn exert(&self, mut mogram: Mogram, txn: Option<&Transaction>, args: &[Arg]) -> Mogram {
        if let Err(e) = self.try_exert(&mut mogram, txn, args).await {
            log::debug!("'{}' returned with a dispatch error: {}", mogram.name(), e);
        }
        mogram
    }

    /// Like [`Shell::exert`], but sends the unit to the provider named `provider_name`.
    pub async fn exert_on(
        &self,
        mut mogram: Mogram,
        txn: Option<&Transaction>,
        provider_name: &str,
        args: &[Arg],
    ) -> Mogram {
        if let Err(e) = self
            .dispatch(&mut mogram, txn, Some(provider_name), args, Frame::root())
            .await
        {
            log::debug!("'{}' returned with a dispatch error: {}", mogram.name(), e);
        }
        mogram
    }

    /// Dispatches `mogram` in place. Errors that prevented dispatch are returned as
    /// well as recorded on the unit; execution failures only show on the unit.
    pub async fn try_exert(
        &self,
        mogram: &mut Mogram,
        txn: Option<&Transaction>,
        args: &[Arg],
    ) -> Result<(), DispatchError> {
        self.dispatch(mogram, txn, None, args, Frame::root()).await
    }

    /// Exerts `mogram` and finalizes its result. An already finalized unit is read back
    /// without being dispatched again.
    ///
    /// A unit that could not be resolved or executed answers with its accumulated
    /// [`Evaluation::Trace`]. Only configuration errors (an unknown fidelity, runaway
    /// delegation, an exclusive provider without lock services) are returned as `Err`.
    pub async fn evaluate(&self, mogram: &mut Mogram, args: &[Arg]) -> Result<Evaluation, DispatchError> {
        if !mogram.context().is_finalized() {
            if let Err(err) = self.try_exert(mogram, None, args).await {
                if matches!(err.root_cause(), DispatchError::Configuration(_)) {
                    return Err(err);
                }
                log::debug!("'{}' evaluates to its trace: {}", mogram.name(), err);
            }
        }
        Ok(finalize::finalize(mogram, args))
    }

    pub fn finalize(&self, mogram: &mut Mogram, args: &[Arg]) -> Evaluation {
        finalize::finalize(mogram, args)
    }

    /// The process signature `mogram` would be resolved with.
    pub fn correct_process_signature(&self, mogram: &mut Mogram) -> Signature {
        normalize::correct_process_signature(mogram, &self.config.spacer_name)
    }

    pub(crate) fn dispatch<'a>(
        &'a self,
        mogram: &'a mut Mogram,
        txn: Option<&'a Transaction>,
        provider_name: Option<&'a str>,
        args: &'a [Arg],
        frame: Frame,
    ) -> BoxFuture<'a, Result<(), DispatchError>> {
        Box::pin(async move {
            if frame.depth > self.config.max_delegation_depth {
                let err = DispatchError::Configuration(format!(
                    "delegation deeper than {} levels at '{}'",
                    self.config.max_delegation_depth,
                    mogram.name()
                ))
                .into_routine();
                log::error!("{}", err);
                mogram.fail(Fault::from(&err));
                return Err(err);
            }

            log::debug!("Dispatching {} '{}'", mogram.kind(), mogram.name());
            let outcome = match self.run(mogram, txn, provider_name, args, frame).await {
                Ok(route) => {
                    if !mogram.status().is_failure() {
                        persist::post_process(mogram);
                    }
                    self.record(mogram, route);
                    Ok(())
                }
                Err(err) => {
                    let err = err.into_routine();
                    log::error!("Dispatch of '{}' failed: {}", mogram.name(), err);
                    mogram.fail(Fault::from(&err));
                    self.record(mogram, Route::Aborted);
                    Err(err)
                }
            };
            if frame.is_root() {
                if let Some(telemetry) = &self.telemetry {
                    telemetry.flush();
                }
            }
            outcome
        })
    }

    async fn run(
        &self,
        mogram: &mut Mogram,
        txn: Option<&Transaction>,
        provider_name: Option<&str>,
        args: &[Arg],
        frame: Frame,
    ) -> Result<Route, DispatchError> {
        if let Some(name) = crate::core::arg::fidelity(args) {
            mogram.control_mut().fidelities_mut().select(name)?;
        }
        mogram.substitute(args);
        if !frame.nested && mogram.control().is_initializable() {
            prepare::init_exec_state(mogram, args);
        }
        let resuming = mogram.status().is_resumable();
        prepare::realize_dependencies(mogram, args)?;

        mogram.begin();
        let route = self
            .route(mogram, txn, provider_name, args, frame, resuming)
            .await?;
        mogram.finish();
        Ok(route)
    }

    fn record(&self, mogram: &Mogram, route: Route) {
        let Some(telemetry) = &self.telemetry else {
            return;
        };
        let mut metadata = HashMap::new();
        if let Some(id) = mogram.control().mutex_id() {
            metadata.insert("mutex_id".to_string(), id.to_string());
        }
        if !mogram.exceptions().is_empty() {
            metadata.insert("exceptions".to_string(), mogram.exceptions().len().to_string());
        }
        telemetry.record(TraceEntry {
            timestamp: TraceEntry::now_millis(),
            mogram_id: mogram.id(),
            name: mogram.name().to_string(),
            kind: mogram.kind(),
            route: route.to_string(),
            signature: mogram.process_signature().map(ToString::to_string),
            status: mogram.status(),
            metadata,
        });
    }
}
