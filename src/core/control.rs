use crate::core::fidelity::FidelitySelector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Execution state of a unit of work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecState {
    #[default]
    Initial,
    Running,
    Suspended,
    Done,
    Failed,
    Error,
}

impl ExecState {
    pub fn is_failure(self) -> bool {
        matches!(self, ExecState::Failed | ExecState::Error)
    }

    /// States from which a dispatch continues with the accumulated context and trace.
    pub fn is_resumable(self) -> bool {
        matches!(self, ExecState::Suspended | ExecState::Failed)
    }
}

/// Whether a unit goes straight to a provider (`Push`) or into a queued dispatcher (`Pull`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    #[default]
    Push,
    Pull,
}

/// Execution strategy and state carried alongside a unit's data context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlContext {
    exec_state: ExecState,
    access: Access,
    fidelities: FidelitySelector,
    trace: Vec<String>,
    mutex_id: Option<Uuid>,
    initializable: bool,
}

impl Default for ControlContext {
    fn default() -> Self {
        Self {
            exec_state: ExecState::Initial,
            access: Access::Push,
            fidelities: FidelitySelector::default(),
            trace: Vec::new(),
            mutex_id: None,
            initializable: true,
        }
    }
}

impl ControlContext {
    pub fn exec_state(&self) -> ExecState {
        self.exec_state
    }

    pub fn set_exec_state(&mut self, state: ExecState) {
        self.exec_state = state;
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn set_access(&mut self, access: Access) {
        self.access = access;
    }

    pub fn fidelities(&self) -> &FidelitySelector {
        &self.fidelities
    }

    pub fn fidelities_mut(&mut self) -> &mut FidelitySelector {
        &mut self.fidelities
    }

    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    pub fn append_trace(&mut self, entry: impl Into<String>) {
        self.trace.push(entry.into());
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Identity of the provider holding the exclusive lock for the last invocation.
    pub fn mutex_id(&self) -> Option<Uuid> {
        self.mutex_id
    }

    pub fn set_mutex_id(&mut self, id: Uuid) {
        self.mutex_id = Some(id);
    }

    /// Whether an `Initial` unit is reset before dispatch.
    pub fn is_initializable(&self) -> bool {
        self.initializable
    }

    pub fn set_initializable(&mut self, initializable: bool) {
        self.initializable = initializable;
    }
}
