use super::{routine_builders, RoutineCore};
use crate::core::context::{Context, ContextValue};
use crate::core::error::Fault;
use std::fmt;
use std::sync::Arc;

pub type ProcedureFn = dyn Fn(&Context) -> Result<ContextValue, Fault> + Send + Sync;

/// Declarative computation graph: ordered procedures, each writing its result at a path.
///
/// Later procedures see the results of earlier ones.
#[derive(Clone)]
pub struct Model {
    pub(crate) core: RoutineCore,
    procedures: Vec<(String, Arc<ProcedureFn>)>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: RoutineCore::new(name),
            procedures: Vec::new(),
        }
    }

    pub fn with_procedure<F>(mut self, path: impl Into<String>, procedure: F) -> Self
    where
        F: Fn(&Context) -> Result<ContextValue, Fault> + Send + Sync + 'static,
    {
        self.procedures.push((path.into(), Arc::new(procedure)));
        self
    }

    pub fn procedure_paths(&self) -> impl Iterator<Item = &str> {
        self.procedures.iter().map(|(path, _)| path.as_str())
    }

    fn on_context_set(&mut self) {}

    /// Runs every procedure against `context`, stopping at the first fault.
    pub fn apply(&self, context: &mut Context) -> Result<(), Fault> {
        for (path, procedure) in &self.procedures {
            let value = procedure(context)?;
            context.put_value(path.clone(), value);
        }
        Ok(())
    }

    /// Runs the procedures against the model's own context.
    pub(crate) fn evaluate(&mut self) -> Result<(), Fault> {
        let mut context = std::mem::take(&mut self.core.context);
        let outcome = self.apply(&mut context);
        self.core.context = context;
        outcome
    }
}

routine_builders!(Model);

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("core", &self.core)
            .field("procedures", &self.procedure_paths().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_procedures_run_in_order() {
        let mut model = Model::new("area")
            .with_context(Context::new("area").with("w", 3).with("h", 4))
            .with_procedure("area", |cxt| {
                let w = cxt.get_value("w").and_then(|v| v.as_i64()).unwrap_or(0);
                let h = cxt.get_value("h").and_then(|v| v.as_i64()).unwrap_or(0);
                Ok(json!(w * h))
            })
            .with_procedure("double", |cxt| {
                let area = cxt.get_value("area").and_then(|v| v.as_i64()).unwrap_or(0);
                Ok(json!(area * 2))
            });

        model.evaluate().unwrap();
        assert_eq!(model.core.context.get_value("double"), Some(&json!(24)));
    }

    #[test]
    fn test_fault_stops_evaluation() {
        let mut model = Model::new("m")
            .with_procedure("a", |_| Err(Fault::exception("no input")))
            .with_procedure("b", |_| Ok(json!(1)));
        assert!(model.evaluate().is_err());
        assert!(!model.core.context.contains("b"));
    }
}
