use super::model::Model;
use super::{routine_builders, RoutineCore};
use crate::core::error::Fault;
use crate::core::fidelity::{Fidelity, FidelitySelector};
use crate::core::signature::Signature;

/// Atomic unit of work bound to one process signature.
#[derive(Debug, Clone)]
pub struct Task {
    pub(crate) core: RoutineCore,
    pub(crate) model: Option<Model>,
    pub(crate) delegate: Option<Box<Task>>,
}

impl Task {
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        let mut core = RoutineCore::new(name);
        *core.control.fidelities_mut() = FidelitySelector::single(signature);
        Self {
            core,
            model: None,
            delegate: None,
        }
    }

    /// A task whose signature is synthesized at dispatch time.
    pub fn unbound(name: impl Into<String>) -> Self {
        Self {
            core: RoutineCore::new(name),
            model: None,
            delegate: None,
        }
    }

    /// A task with one fidelity made of several signatures (prepare, process
    /// alternatives, postprocess).
    pub fn with_signatures(name: impl Into<String>, signatures: Vec<Signature>) -> Self {
        let mut core = RoutineCore::new(name);
        *core.control.fidelities_mut() =
            FidelitySelector::new(vec![Fidelity::new("", signatures)]);
        Self {
            core,
            model: None,
            delegate: None,
        }
    }

    /// Embeds a computation graph evaluated in-process against this task's context.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = Some(model);
        self
    }

    /// Runs `delegate` in place of this task on the next dispatch.
    pub fn with_delegate(mut self, delegate: Task) -> Self {
        self.delegate = Some(Box::new(delegate));
        self
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    fn on_context_set(&mut self) {}

    /// Executes the process signature's in-process target against the task context.
    pub(crate) fn do_task(&mut self) -> Result<(), Fault> {
        let signature = self
            .core
            .control
            .fidelities()
            .process_signature()
            .cloned()
            .ok_or_else(|| Fault::exception(format!("task '{}' has no process signature", self.core.name)))?;
        let target = signature.target().ok_or_else(|| {
            Fault::exception(format!("signature {signature} has no in-process target"))
        })?;
        target.exec(signature.selector(), &mut self.core.context)
    }

    pub(crate) fn run_model(&mut self) -> Result<(), Fault> {
        match &self.model {
            Some(model) => model.apply(&mut self.core.context),
            None => Err(Fault::exception(format!(
                "task '{}' has no model",
                self.core.name
            ))),
        }
    }
}

routine_builders!(Task);
