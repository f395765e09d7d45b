use super::{normalize, sorter, Frame, Shell};
use crate::core::arg::Arg;
use crate::core::control::{ControlContext, ExecState};
use crate::core::error::{DispatchError, Fault};
use crate::core::routine::block::Block;
use crate::core::routine::job::Job;
use crate::core::routine::task::Task;
use crate::core::signature::{ProviderName, Signature};
use crate::core::Mogram;
use crate::provider::txn::Transaction;
use crate::provider::{Provider, ProviderHandle};
use std::fmt;
use std::sync::Arc;

/// How a unit was executed; reported to telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Local,
    Delegate,
    Model,
    ControlFlow,
    Remote,
    Unselectable,
    Aborted,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Route::Local => "local",
            Route::Delegate => "delegate",
            Route::Model => "model",
            Route::ControlFlow => "control-flow",
            Route::Remote => "remote",
            Route::Unselectable => "unselectable",
            Route::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Whether the unit runs in this process. Composite units without a process signature
/// run their children here.
fn runs_locally(mogram: &Mogram) -> bool {
    match mogram.process_signature() {
        Some(sig) => !sig.is_remote(),
        None => mogram.is_compound(),
    }
}

fn trace_service(control: &mut ControlContext, signature: &Signature) {
    control.append_trace(format!("service shell for signature: {signature}"));
}

impl Shell {
    pub(crate) async fn route(
        &self,
        mogram: &mut Mogram,
        txn: Option<&Transaction>,
        provider_name: Option<&str>,
        args: &[Arg],
        frame: Frame,
        resuming: bool,
    ) -> Result<Route, DispatchError> {
        match mogram {
            Mogram::Model(model) => {
                if let Err(fault) = model.evaluate() {
                    log::error!("Model '{}' failed: {}", model.core.name, fault);
                    model.core.fail(fault);
                }
                return Ok(Route::Model);
            }
            Mogram::Job(job) => sorter::sort_job(job)?,
            _ => {}
        }

        if let Mogram::Task(task) = mogram {
            if let Some(delegate) = task.delegate.take() {
                self.run_delegate(task, *delegate, txn, frame).await?;
                return Ok(Route::Delegate);
            }
            let selects = task.core.control.fidelities().selects().len();
            if task.has_model() && selects <= 1 {
                if let Err(fault) = task.run_model() {
                    log::error!("Model of task '{}' failed: {}", task.core.name, fault);
                    task.core.fail(fault);
                }
                return Ok(Route::Model);
            }
            if selects > 1 {
                self.run_control_flow(task, txn, frame).await;
                return Ok(Route::ControlFlow);
            }
        }

        if runs_locally(mogram) {
            match mogram {
                Mogram::Task(task) => {
                    if let Some(signature) = task.core.control.fidelities().process_signature().cloned() {
                        trace_service(&mut task.core.control, &signature);
                    }
                    if let Err(fault) = task.do_task() {
                        log::error!("Task '{}' failed: {}", task.core.name, fault);
                        task.core.fail(fault);
                    }
                }
                Mogram::Job(job) => self.run_job(job, txn, frame, resuming).await,
                Mogram::Block(block) => self.run_block(block, txn, frame, resuming).await,
                Mogram::Model(_) => {}
            }
            return Ok(Route::Local);
        }

        let mut signature = normalize::correct_process_signature(mogram, &self.config.spacer_name);
        if !signature.is_selectable() {
            log::warn!("Not selectable exertion operation: {}", signature);
            mogram.fail(Fault::exception(format!(
                "No such operation in the requested signature: {signature}"
            )));
            return Ok(Route::Unselectable);
        }
        if let Some(name) = provider_name.filter(|n| !n.is_empty()) {
            signature.set_provider_name(ProviderName::named(name));
            mogram
                .control_mut()
                .fidelities_mut()
                .set_process_signature(signature.clone());
        }

        match self.resolver.resolve(&signature).await? {
            ProviderHandle::Provider(provider) => {
                self.call_provider(&provider, mogram, &signature, txn, args)
                    .await?;
                Ok(Route::Remote)
            }
            ProviderHandle::Delegate(logic) => match mogram {
                Mogram::Task(task) => {
                    let stand_in = Task::new(
                        task.core.name.clone(),
                        Signature::with_target(signature.selector(), signature.service_type(), logic),
                    );
                    self.run_delegate(task, stand_in, txn, frame).await?;
                    Ok(Route::Delegate)
                }
                other => Err(DispatchError::Configuration(format!(
                    "an in-process delegate cannot execute {} '{}'",
                    other.kind(),
                    other.name()
                ))),
            },
        }
    }

    /// Runs `delegate` over a copy of the task's data and takes its results back.
    async fn run_delegate(
        &self,
        task: &mut Task,
        delegate: Task,
        txn: Option<&Transaction>,
        frame: Frame,
    ) -> Result<(), DispatchError> {
        let mut unit = Mogram::Task(delegate);
        if let Some(signature) = unit.process_signature() {
            trace_service(&mut task.core.control, signature);
        }
        unit.context_mut().append(&task.core.context);
        self.dispatch(&mut unit, txn, None, &[], frame.deeper())
            .await?;

        task.core.context.append(unit.context());
        task.core.exceptions.extend(unit.exceptions().iter().cloned());
        if unit.status().is_failure() {
            task.core.status = unit.status();
            task.core.control.set_exec_state(unit.status());
        }
        Ok(())
    }

    async fn call_provider(
        &self,
        provider: &Arc<dyn Provider>,
        mogram: &mut Mogram,
        signature: &Signature,
        txn: Option<&Transaction>,
        args: &[Arg],
    ) -> Result<(), DispatchError> {
        mogram.trim_not_serializable_signatures();
        trace_service(mogram.control_mut(), signature);
        let logged = mogram.exceptions().len();

        let outcome = if provider.requires_exclusive_access() {
            let Some(exclusion) = &self.exclusion else {
                return Err(DispatchError::Configuration(format!(
                    "provider '{}' requires exclusive access but no lock service is configured",
                    provider.name()
                )));
            };
            exclusion.exert(provider, mogram, txn, args).await
        } else {
            provider
                .exert(mogram.clone(), txn, args)
                .await
                .map_err(DispatchError::from)
        };

        match outcome {
            Ok(Some(result)) => {
                *mogram = result;
                let fresh = mogram.exceptions().get(logged..).unwrap_or_default();
                if !fresh.is_empty() {
                    for fault in fresh {
                        log::error!("Got exception running: {}: {}", mogram.name(), fault);
                    }
                    let status = if fresh.iter().any(Fault::is_fatal) {
                        ExecState::Error
                    } else {
                        ExecState::Failed
                    };
                    mogram.set_status(status);
                }
            }
            Ok(None) => {
                let err = DispatchError::DispatchFailure {
                    signature: signature.to_string(),
                    reason: format!("provider '{}' returned no result", provider.name()),
                };
                log::error!("{}", err);
                mogram.fail(Fault::from(&err));
            }
            Err(err @ DispatchError::LockDenied(_)) => {
                log::warn!("{}", err);
                mogram.fail(Fault::from(&err));
            }
            Err(err) => {
                let err = DispatchError::DispatchFailure {
                    signature: signature.to_string(),
                    reason: err.to_string(),
                };
                log::error!("{}", err);
                mogram.fail(Fault::from(&err));
            }
        }
        Ok(())
    }

    /// Runs the children in their sorted order, each scoped to the job context, merging
    /// every child's context back. A failing child does not stop its siblings.
    async fn run_job(&self, job: &mut Job, txn: Option<&Transaction>, frame: Frame, resuming: bool) {
        let mut failed = Vec::new();
        for child in job.children.iter_mut() {
            if resuming && child.status() == ExecState::Done {
                continue;
            }
            child.context_mut().set_scope(job.core.context.clone());
            if let Err(e) = self.dispatch(child, txn, None, &[], frame.nested()).await {
                log::warn!("Child '{}' of job '{}' aborted: {}", child.name(), job.core.name, e);
            }
            child.context_mut().clear_scope();
            job.core.context.append(child.context());
            if child.status().is_failure() {
                failed.push(child.name().to_string());
            }
        }
        if !failed.is_empty() {
            log::warn!("Job '{}' failed in: {}", job.core.name, failed.join(", "));
            job.core.status = ExecState::Failed;
            job.core.control.set_exec_state(ExecState::Failed);
        }
    }

    /// Runs the children strictly in order over the block context; the first failing
    /// child ends the block.
    async fn run_block(&self, block: &mut Block, txn: Option<&Transaction>, frame: Frame, resuming: bool) {
        for child in block.children.iter_mut() {
            if resuming && child.status() == ExecState::Done {
                continue;
            }
            child.context_mut().set_scope(block.core.context.clone());
            if let Err(e) = self.dispatch(child, txn, None, &[], frame.nested()).await {
                log::warn!("Child '{}' of block '{}' aborted: {}", child.name(), block.core.name, e);
            }
            child.context_mut().clear_scope();
            block.core.context.append(child.context());
            if child.status().is_failure() {
                log::warn!("Block '{}' stopped at '{}'", block.core.name, child.name());
                block.core.status = child.status();
                block.core.control.set_exec_state(child.status());
                break;
            }
        }
    }
}
