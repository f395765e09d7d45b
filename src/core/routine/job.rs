use super::{routine_builders, RoutineCore};
use crate::core::signature::Signature;
use crate::core::Mogram;

/// A declared data dependency between two children of a job, by child name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub consumer: String,
    pub producer: String,
}

/// Composite unit whose children run in dependency order over a merged context.
#[derive(Debug, Clone)]
pub struct Job {
    pub(crate) core: RoutineCore,
    pub(crate) children: Vec<Mogram>,
    pub(crate) dependencies: Vec<Dependency>,
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: RoutineCore::new(name),
            children: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Binds the job to a process signature, e.g. a remote job dispatcher.
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.core
            .control
            .fidelities_mut()
            .set_process_signature(signature);
        self
    }

    pub fn with_child(mut self, child: impl Into<Mogram>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Declares that `consumer` reads an output of `producer`.
    pub fn with_dependency(mut self, consumer: impl Into<String>, producer: impl Into<String>) -> Self {
        self.dependencies.push(Dependency {
            consumer: consumer.into(),
            producer: producer.into(),
        });
        self
    }

    pub fn children(&self) -> &[Mogram] {
        &self.children
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn child(&self, name: &str) -> Option<&Mogram> {
        self.children.iter().find(|c| c.name() == name)
    }

    fn on_context_set(&mut self) {}
}

routine_builders!(Job);
