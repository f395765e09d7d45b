use crate::core::control::Access;
use crate::core::signature::{ProviderName, Signature, SignatureRole, EXERT_SELECTOR, JOBBER, SPACER};
use crate::core::Mogram;

/// Reconciles the unit's process signature with its access mode and stores the result
/// back into the active fidelity.
///
/// Pull units are sent to the queue dispatcher (`spacer_name` unless the signature
/// names a provider), push units that target the queue dispatcher go to the job
/// dispatcher instead. Jobs whose signature declares an access mode are left alone.
/// A unit without a process signature gets the job dispatcher's `exert`.
pub fn correct_process_signature(mogram: &mut Mogram, spacer_name: &str) -> Signature {
    let current = match mogram.process_signature() {
        Some(sig) => sig.clone(),
        None => Signature::net(EXERT_SELECTOR, JOBBER),
    };
    if mogram.is_job() && current.access().is_some() {
        return current;
    }

    let access = current.access().unwrap_or_else(|| mogram.control().access());
    let mut sig = current.clone();
    match access {
        Access::Pull if sig.service_type() != SPACER => {
            let provider = match sig.provider_name() {
                named @ ProviderName::Named(_) => named.clone(),
                ProviderName::Any => ProviderName::named(spacer_name),
            };
            retarget(&mut sig, SPACER, provider);
        }
        Access::Push if sig.service_type() == SPACER => {
            retarget(&mut sig, JOBBER, ProviderName::Any);
        }
        _ => {}
    }

    if sig.service_type() != current.service_type() {
        log::info!("signature (before) = {}", current);
        log::info!("signature (after)  = {}", sig);
    }
    let control = mogram.control_mut();
    control.set_access(access);
    control.fidelities_mut().set_process_signature(sig.clone());
    sig
}

fn retarget(sig: &mut Signature, service_type: &str, provider: ProviderName) {
    sig.set_service_type(service_type);
    sig.set_selector(EXERT_SELECTOR);
    sig.set_provider_name(provider);
    sig.set_role(SignatureRole::Process);
}
