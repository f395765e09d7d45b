pub mod arg;
pub mod context;
pub mod control;
pub mod error;
pub mod fidelity;
pub mod routine;
pub mod signature;
pub mod telemetry;
pub mod validation;

use arg::Arg;
use context::{Context, ContextValue};
use control::{ControlContext, ExecState};
use error::Fault;
use routine::block::Block;
use routine::job::Job;
use routine::model::Model;
use routine::task::Task;
use routine::{Depender, Persister, RoutineCore};
use serde::{Deserialize, Serialize};
use signature::Signature;
use std::fmt;
use uuid::Uuid;

/// The kind tag of a [`Mogram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MogramKind {
    Task,
    Job,
    Block,
    Model,
}

impl fmt::Display for MogramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MogramKind::Task => "task",
            MogramKind::Job => "job",
            MogramKind::Block => "block",
            MogramKind::Model => "model",
        };
        f.write_str(name)
    }
}

/// A unit of work: an executable routine (task, job, block) or a declarative model.
#[derive(Debug, Clone)]
pub enum Mogram {
    Task(Task),
    Job(Job),
    Block(Block),
    Model(Model),
}

impl From<Task> for Mogram {
    fn from(task: Task) -> Self {
        Mogram::Task(task)
    }
}

impl From<Job> for Mogram {
    fn from(job: Job) -> Self {
        Mogram::Job(job)
    }
}

impl From<Block> for Mogram {
    fn from(block: Block) -> Self {
        Mogram::Block(block)
    }
}

impl From<Model> for Mogram {
    fn from(model: Model) -> Self {
        Mogram::Model(model)
    }
}

impl Mogram {
    pub(crate) fn core(&self) -> &RoutineCore {
        match self {
            Mogram::Task(t) => &t.core,
            Mogram::Job(j) => &j.core,
            Mogram::Block(b) => &b.core,
            Mogram::Model(m) => &m.core,
        }
    }

    pub(crate) fn core_mut(&mut self) -> &mut RoutineCore {
        match self {
            Mogram::Task(t) => &mut t.core,
            Mogram::Job(j) => &mut j.core,
            Mogram::Block(b) => &mut b.core,
            Mogram::Model(m) => &mut m.core,
        }
    }

    pub fn kind(&self) -> MogramKind {
        match self {
            Mogram::Task(_) => MogramKind::Task,
            Mogram::Job(_) => MogramKind::Job,
            Mogram::Block(_) => MogramKind::Block,
            Mogram::Model(_) => MogramKind::Model,
        }
    }

    pub fn id(&self) -> Uuid {
        self.core().id
    }

    pub fn name(&self) -> &str {
        &self.core().name
    }

    pub fn context(&self) -> &Context {
        &self.core().context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.core_mut().context
    }

    pub fn control(&self) -> &ControlContext {
        &self.core().control
    }

    pub fn control_mut(&mut self) -> &mut ControlContext {
        &mut self.core_mut().control
    }

    pub fn status(&self) -> ExecState {
        self.core().status
    }

    /// Sets the unit status and mirrors it into the control context.
    pub fn set_status(&mut self, status: ExecState) {
        let core = self.core_mut();
        core.status = status;
        core.control.set_exec_state(status);
    }

    pub fn exceptions(&self) -> &[Fault] {
        &self.core().exceptions
    }

    pub fn report_exception(&mut self, fault: Fault) {
        self.core_mut().report(fault);
    }

    /// Logs `fault` and marks the unit `Failed` (`Error` when the fault is fatal).
    pub fn fail(&mut self, fault: Fault) {
        self.core_mut().fail(fault);
    }

    pub fn trace(&self) -> &[String] {
        self.control().trace()
    }

    pub fn process_signature(&self) -> Option<&Signature> {
        self.control().fidelities().process_signature()
    }

    pub fn is_job(&self) -> bool {
        matches!(self, Mogram::Job(_))
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Mogram::Job(_) | Mogram::Block(_))
    }

    pub fn children(&self) -> &[Mogram] {
        match self {
            Mogram::Job(j) => &j.children,
            Mogram::Block(b) => &b.children,
            Mogram::Task(_) | Mogram::Model(_) => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Mogram>> {
        match self {
            Mogram::Job(j) => Some(&mut j.children),
            Mogram::Block(b) => Some(&mut b.children),
            Mogram::Task(_) | Mogram::Model(_) => None,
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Mogram::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_job(&self) -> Option<&Job> {
        match self {
            Mogram::Job(j) => Some(j),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Mogram::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn child(&self, name: &str) -> Option<&Mogram> {
        self.children().iter().find(|c| c.name() == name)
    }

    pub fn persisters(&self) -> &[Persister] {
        &self.core().persisters
    }

    pub(crate) fn dependers(&self) -> &[Depender] {
        &self.core().dependers
    }

    /// The unit's natural result: the value at its declared return path. A block
    /// without one answers with the result of its last child.
    pub fn return_value(&self) -> Option<ContextValue> {
        let core = self.core();
        if let Some(path) = &core.return_path {
            return core.context.get_value(path).cloned();
        }
        match self {
            Mogram::Block(b) => b.children.last().and_then(Mogram::return_value),
            _ => None,
        }
    }

    /// Visits every descendant, children before parents, ending with `self`.
    pub fn for_each_mogram(&self, f: &mut dyn FnMut(&Mogram)) {
        for child in self.children() {
            child.for_each_mogram(f);
        }
        f(self);
    }

    pub(crate) fn for_each_mogram_mut(&mut self, f: &mut dyn FnMut(&mut Mogram)) {
        if let Some(children) = self.children_mut() {
            for child in children {
                child.for_each_mogram_mut(f);
            }
        }
        f(self);
    }

    /// Removes signatures with in-process targets so the unit can travel to a remote executor.
    pub(crate) fn trim_not_serializable_signatures(&mut self) {
        self.for_each_mogram_mut(&mut |m| m.control_mut().fidelities_mut().strip_non_transportable());
    }

    /// Writes every `Arg::Entry` into the unit's context.
    pub(crate) fn substitute(&mut self, args: &[Arg]) {
        let cxt = self.context_mut();
        for (path, value) in arg::entries(args) {
            cxt.put_value(path.clone(), value.clone());
        }
    }

    pub(crate) fn begin(&mut self) {
        self.set_status(ExecState::Running);
    }

    /// A unit still `Running` after its route completed is `Done`.
    pub(crate) fn finish(&mut self) {
        if self.status() == ExecState::Running {
            self.set_status(ExecState::Done);
        } else {
            let status = self.status();
            self.control_mut().set_exec_state(status);
        }
    }
}
