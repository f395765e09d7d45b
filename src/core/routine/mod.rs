pub mod block;
pub mod job;
pub mod model;
pub mod task;

use crate::core::arg::Arg;
use crate::core::context::{Context, ContextValue};
use crate::core::control::{ControlContext, ExecState};
use crate::core::error::Fault;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// State every kind of unit of work carries.
#[derive(Debug, Clone)]
pub struct RoutineCore {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) context: Context,
    pub(crate) control: ControlContext,
    pub(crate) status: ExecState,
    pub(crate) exceptions: Vec<Fault>,
    pub(crate) return_path: Option<String>,
    pub(crate) persisters: Vec<Persister>,
    pub(crate) dependers: Vec<Depender>,
}

impl RoutineCore {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            context: Context::new(name.clone()),
            name,
            control: ControlContext::default(),
            status: ExecState::Initial,
            exceptions: Vec::new(),
            return_path: None,
            persisters: Vec::new(),
            dependers: Vec::new(),
        }
    }

    pub(crate) fn report(&mut self, fault: Fault) {
        self.exceptions.push(fault);
    }

    /// Logs `fault` and moves the unit to `Failed`, or `Error` for fatal faults.
    pub(crate) fn fail(&mut self, fault: Fault) {
        self.status = if fault.is_fatal() {
            ExecState::Error
        } else {
            ExecState::Failed
        };
        self.control.set_exec_state(self.status);
        self.exceptions.push(fault);
    }
}

/// Copies the value at `source_path` into a shared slot after every dispatch.
///
/// Clones share the slot, so the caller keeps one handle and attaches another to the unit.
#[derive(Clone)]
pub struct Persister {
    source_path: String,
    slot: Arc<Mutex<Option<ContextValue>>>,
}

impl Persister {
    pub fn new(source_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn value(&self) -> Option<ContextValue> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn store(&self, value: ContextValue) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }
}

impl fmt::Debug for Persister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persister")
            .field("source_path", &self.source_path)
            .field("value", &self.value())
            .finish()
    }
}

pub type DependerFn = dyn Fn(&mut Context, &[Arg]) -> Result<(), Fault> + Send + Sync;

/// A dependent computation run against the unit's context right before dispatch.
#[derive(Clone)]
pub struct Depender {
    name: String,
    logic: Arc<DependerFn>,
}

impl Depender {
    pub fn new<F>(name: impl Into<String>, logic: F) -> Self
    where
        F: Fn(&mut Context, &[Arg]) -> Result<(), Fault> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            logic: Arc::new(logic),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn realize(&self, context: &mut Context, args: &[Arg]) -> Result<(), Fault> {
        (self.logic)(context, args)
    }
}

impl fmt::Debug for Depender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Depender").field("name", &self.name).finish()
    }
}

/// Builder setters shared by every unit kind.
macro_rules! routine_builders {
    ($ty:ty) => {
        impl $ty {
            pub fn with_context(mut self, context: $crate::core::context::Context) -> Self {
                self.core.context = context;
                self.on_context_set();
                self
            }

            pub fn with_access(mut self, access: $crate::core::control::Access) -> Self {
                self.core.control.set_access(access);
                self
            }

            pub fn with_fidelity(mut self, fidelity: $crate::core::fidelity::Fidelity) -> Self {
                self.core.control.fidelities_mut().add(fidelity);
                self
            }

            /// Path whose value is this unit's natural result when no request path is set.
            pub fn with_return_path(mut self, path: impl Into<String>) -> Self {
                self.core.return_path = Some(path.into());
                self
            }

            pub fn with_persister(mut self, persister: $crate::core::routine::Persister) -> Self {
                self.core.persisters.push(persister);
                self
            }

            pub fn with_depender(mut self, depender: $crate::core::routine::Depender) -> Self {
                self.core.dependers.push(depender);
                self
            }

            pub fn initializable(mut self, initializable: bool) -> Self {
                self.core.control.set_initializable(initializable);
                self
            }
        }
    };
}

pub(crate) use routine_builders;
