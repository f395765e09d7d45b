use super::{Frame, Shell};
use crate::core::error::Fault;
use crate::core::routine::task::Task;
use crate::core::signature::{Signature, SignatureRole};
use crate::core::Mogram;
use crate::provider::txn::Transaction;

impl Shell {
    /// Runs a task whose active fidelity holds several signatures: every prepare step,
    /// then the process alternatives in order until one succeeds, then every
    /// postprocess step. Each step is a single-signature task over the task's data.
    pub(crate) async fn run_control_flow(&self, task: &mut Task, txn: Option<&Transaction>, frame: Frame) {
        let selects = task.core.control.fidelities().selects().to_vec();
        let by_role = |role: SignatureRole| -> Vec<Signature> {
            selects.iter().filter(|s| s.role() == role).cloned().collect()
        };

        for signature in by_role(SignatureRole::Prepare) {
            if let Err(faults) = self.run_step(task, signature, txn, frame).await {
                fail_with(task, faults, "prepare step failed");
                return;
            }
        }

        let mut attempts = Vec::new();
        let mut processed = false;
        for signature in by_role(SignatureRole::Process) {
            match self.run_step(task, signature, txn, frame).await {
                Ok(()) => {
                    processed = true;
                    break;
                }
                Err(faults) => attempts.extend(faults),
            }
        }
        if !processed {
            fail_with(task, attempts, "no process signature succeeded");
            return;
        }

        for signature in by_role(SignatureRole::Postprocess) {
            if let Err(faults) = self.run_step(task, signature, txn, frame).await {
                fail_with(task, faults, "postprocess step failed");
                return;
            }
        }
    }

    async fn run_step(
        &self,
        task: &mut Task,
        signature: Signature,
        txn: Option<&Transaction>,
        frame: Frame,
    ) -> Result<(), Vec<Fault>> {
        let name = format!("{}:{}", task.core.name, signature.selector());
        let mut step: Mogram = Task::new(name, signature.with_role(SignatureRole::Process))
            .with_context(task.core.context.clone())
            .into();
        // errors are recorded on the step itself
        let _ = self.dispatch(&mut step, txn, None, &[], frame.nested()).await;

        if step.status().is_failure() || !step.exceptions().is_empty() {
            log::warn!("Step '{}' of task '{}' failed", step.name(), task.core.name);
            return Err(step.exceptions().to_vec());
        }
        task.core.context.append(step.context());
        Ok(())
    }
}

fn fail_with(task: &mut Task, faults: Vec<Fault>, summary: &str) {
    if faults.is_empty() {
        task.core.fail(Fault::exception(format!("{} in task '{}'", summary, task.core.name)));
        return;
    }
    for fault in faults {
        task.core.fail(fault);
    }
}
