use crate::core::arg::{self, Arg};
use crate::core::control::ExecState;
use crate::core::error::DispatchError;
use crate::core::Mogram;

/// Resets an `Initial` unit and its `Initial` descendants before dispatch.
///
/// Exceptions and trace are cleared, blocks start over from their declared context
/// (plus entry overrides and the incoming context) and every other unit loses its
/// scope. Units in any other state are left as they are, which is how suspended and
/// failed units resume with what they have accumulated.
pub(crate) fn init_exec_state(mogram: &mut Mogram, args: &[Arg]) {
    if mogram.control().exec_state() != ExecState::Initial {
        return;
    }
    let incoming = arg::incoming_context(args);
    mogram.for_each_mogram_mut(&mut |m| {
        if m.control().exec_state() == ExecState::Initial {
            m.set_status(ExecState::Initial);
            let core = m.core_mut();
            core.exceptions.clear();
            core.control.clear_trace();
        }
        match m {
            Mogram::Block(block) => block.reset_scope(arg::entries(args), incoming),
            other => other.context_mut().clear_scope(),
        }
    });
}

/// Runs the unit's dependers against its context; the first fault aborts dispatch.
pub(crate) fn realize_dependencies(mogram: &mut Mogram, args: &[Arg]) -> Result<(), DispatchError> {
    let dependers = mogram.dependers().to_vec();
    for depender in &dependers {
        if let Err(fault) = depender.realize(mogram.context_mut(), args) {
            log::error!(
                "Depender '{}' of '{}' failed: {}",
                depender.name(),
                mogram.name(),
                fault
            );
            return Err(DispatchError::Fault(fault).into_routine());
        }
    }
    Ok(())
}
