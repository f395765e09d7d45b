use crate::core::error::DispatchError;
use crate::core::signature::{Signature, SignatureRole};
use serde::{Deserialize, Serialize};

/// One alternative configuration of a unit: a named set of signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fidelity {
    pub name: String,
    pub selects: Vec<Signature>,
}

impl Fidelity {
    pub fn new(name: impl Into<String>, selects: Vec<Signature>) -> Self {
        Self {
            name: name.into(),
            selects,
        }
    }

    pub fn process_signature(&self) -> Option<&Signature> {
        self.selects
            .iter()
            .find(|s| s.role() == SignatureRole::Process)
    }
}

/// Multiplexer over a unit's fidelities. Without an explicit selection the first
/// fidelity is active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FidelitySelector {
    fidelities: Vec<Fidelity>,
    selected: Option<usize>,
}

impl FidelitySelector {
    pub fn new(fidelities: Vec<Fidelity>) -> Self {
        Self {
            fidelities,
            selected: None,
        }
    }

    /// A selector holding one anonymous fidelity with a single signature.
    pub fn single(signature: Signature) -> Self {
        Self::new(vec![Fidelity::new("", vec![signature])])
    }

    pub fn add(&mut self, fidelity: Fidelity) {
        self.fidelities.push(fidelity);
    }

    pub fn fidelities(&self) -> &[Fidelity] {
        &self.fidelities
    }

    pub fn select(&mut self, name: &str) -> Result<(), DispatchError> {
        match self.fidelities.iter().position(|f| f.name == name) {
            Some(idx) => {
                self.selected = Some(idx);
                Ok(())
            }
            None => Err(DispatchError::Configuration(format!(
                "no fidelity named '{name}'"
            ))),
        }
    }

    fn active_index(&self) -> Option<usize> {
        match self.selected {
            Some(idx) if idx < self.fidelities.len() => Some(idx),
            _ if self.fidelities.is_empty() => None,
            _ => Some(0),
        }
    }

    pub fn selected(&self) -> Option<&Fidelity> {
        self.active_index().map(|idx| &self.fidelities[idx])
    }

    /// Signatures of the active fidelity.
    pub fn selects(&self) -> &[Signature] {
        self.selected().map(|f| f.selects.as_slice()).unwrap_or(&[])
    }

    pub fn process_signature(&self) -> Option<&Signature> {
        self.selected().and_then(Fidelity::process_signature)
    }

    /// Replaces the process signature of the active fidelity, creating a fidelity
    /// when the unit has none.
    pub fn set_process_signature(&mut self, signature: Signature) {
        let Some(idx) = self.active_index() else {
            self.fidelities.push(Fidelity::new("", vec![signature]));
            return;
        };
        let selects = &mut self.fidelities[idx].selects;
        match selects
            .iter()
            .position(|s| s.role() == SignatureRole::Process)
        {
            Some(pos) => selects[pos] = signature,
            None => selects.insert(0, signature),
        }
    }

    /// Drops signatures that cannot travel to a remote executor.
    pub fn strip_non_transportable(&mut self) {
        for fidelity in &mut self.fidelities {
            fidelity.selects.retain(Signature::is_transportable);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::Context;
    use crate::core::error::Fault;

    fn local(_selector: &str, _context: &mut Context) -> Result<(), Fault> {
        Ok(())
    }

    #[test]
    fn test_first_fidelity_is_active_by_default() {
        let mut selector = FidelitySelector::new(vec![
            Fidelity::new("fast", vec![Signature::net("add", "Adder")]),
            Fidelity::new("exact", vec![Signature::net("add", "BigAdder")]),
        ]);
        assert_eq!(selector.process_signature().unwrap().service_type(), "Adder");

        selector.select("exact").unwrap();
        assert_eq!(
            selector.process_signature().unwrap().service_type(),
            "BigAdder"
        );
        assert!(matches!(
            selector.select("missing"),
            Err(DispatchError::Configuration(_))
        ));
    }

    #[test]
    fn test_process_signature_skips_prepare_steps() {
        let mut selector = FidelitySelector::new(vec![Fidelity::new(
            "",
            vec![
                Signature::net("warm", "Cache").with_role(SignatureRole::Prepare),
                Signature::net("add", "Adder"),
            ],
        )]);
        assert_eq!(selector.process_signature().unwrap().selector(), "add");

        selector.set_process_signature(Signature::net("exert", "Jobber"));
        assert_eq!(selector.selects().len(), 2);
        assert_eq!(selector.process_signature().unwrap().selector(), "exert");
    }

    #[test]
    fn test_set_process_signature_on_empty_selector() {
        let mut selector = FidelitySelector::default();
        assert!(selector.process_signature().is_none());
        selector.set_process_signature(Signature::net("exert", "Jobber"));
        assert_eq!(selector.selects().len(), 1);
    }

    #[test]
    fn test_strip_non_transportable() {
        let mut selector = FidelitySelector::new(vec![Fidelity::new(
            "",
            vec![
                Signature::net("add", "Adder"),
                Signature::object("log", "Logger", local).with_role(SignatureRole::Postprocess),
            ],
        )]);
        selector.strip_non_transportable();
        assert_eq!(selector.selects().len(), 1);
    }
}
