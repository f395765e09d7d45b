use super::{routine_builders, RoutineCore};
use crate::core::context::{Context, ContextValue};
use crate::core::signature::Signature;
use crate::core::Mogram;

/// Composite unit executed strictly in declaration order over one shared context.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) core: RoutineCore,
    pub(crate) children: Vec<Mogram>,
    init_context: Context,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        let core = RoutineCore::new(name);
        let init_context = core.context.clone();
        Self {
            core,
            children: Vec::new(),
            init_context,
        }
    }

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

    pub fn children(&self) -> &[Mogram] {
        &self.children
    }

    /// The context the block was declared with; resets start over from it.
    pub fn init_context(&self) -> &Context {
        &self.init_context
    }

    fn on_context_set(&mut self) {
        self.init_context = self.core.context.clone();
    }

    /// Restores the declared context, re-applies `entries` and merges `incoming`.
    pub(crate) fn reset_scope<'a>(
        &mut self,
        entries: impl Iterator<Item = (&'a String, &'a ContextValue)>,
        incoming: Option<&Context>,
    ) {
        let cxt = &mut self.core.context;
        cxt.clear_scope();
        cxt.append(&self.init_context);
        for (path, value) in entries {
            cxt.put_value(path.clone(), value.clone());
        }
        if let Some(incoming) = incoming {
            cxt.append(incoming);
        }
        for child in &mut self.children {
            child.context_mut().clear_scope();
        }
    }
}

routine_builders!(Block);
