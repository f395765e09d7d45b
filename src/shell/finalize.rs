use crate::core::arg::{self, Arg};
use crate::core::context::{Context, ContextValue, RequestPath};
use crate::core::error::Fault;
use crate::core::Mogram;

/// What `evaluate` hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// A single value from the context.
    Value(ContextValue),
    /// A sub-context (or the whole context) holding the requested paths.
    Context(Context),
    /// The unit failed; these are the logged causes.
    Trace(Vec<Fault>),
}

impl Evaluation {
    pub fn is_trace(&self) -> bool {
        matches!(self, Evaluation::Trace(_))
    }

    pub fn as_value(&self) -> Option<&ContextValue> {
        match self {
            Evaluation::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&Context> {
        match self {
            Evaluation::Context(c) => Some(c),
            _ => None,
        }
    }

    /// The result as a plain value; a context becomes its entries as an object.
    pub fn into_value(self) -> Option<ContextValue> {
        match self {
            Evaluation::Value(v) => Some(v),
            Evaluation::Context(c) => Some(c.to_value()),
            Evaluation::Trace(_) => None,
        }
    }
}

/// Extracts the caller-requested result from an executed unit.
///
/// A unit with logged exceptions answers with its trace, and a failed composite with
/// the exceptions of its descendants. Otherwise the context's
/// request path decides: a single output path yields its value, several yield a
/// sub-context, and a return path caches the result so that later calls read it back
/// instead of recomputing. Composite units asked for outputs without a return path
/// always answer with a sub-context. Without a request path the unit's natural
/// return value is used, then `Arg::Outputs`, then the whole context.
pub fn finalize(mogram: &mut Mogram, args: &[Arg]) -> Evaluation {
    if !mogram.exceptions().is_empty() {
        return Evaluation::Trace(mogram.exceptions().to_vec());
    }
    if mogram.status().is_failure() {
        // a composite that failed through its children
        let mut faults = Vec::new();
        mogram.for_each_mogram(&mut |m| faults.extend(m.exceptions().iter().cloned()));
        return Evaluation::Trace(faults);
    }
    if let Some(rp) = arg::request_path(args) {
        mogram.context_mut().set_request_path(rp.clone());
    }

    let compound = mogram.is_compound();
    let natural = mogram.return_value();
    let cxt = mogram.context_mut();
    let request = cxt.request_path().cloned().unwrap_or_default();

    if cxt.is_finalized() {
        if let Some(stored) = read_finalized(cxt, &request) {
            return stored;
        }
    }

    let outs = request.out_paths.as_slice();
    match (outs.len(), request.return_path.as_deref()) {
        (0, Some(ret)) => match cxt.get_value(ret) {
            Some(value) => Evaluation::Value(value.clone()),
            None => fallback(cxt, natural, args),
        },
        (0, None) => fallback(cxt, natural, args),
        (1, ret) if !compound || ret.is_some() => {
            let value = cxt
                .get_value(&outs[0])
                .cloned()
                .unwrap_or(ContextValue::Null);
            if let Some(ret) = ret {
                cxt.put_value(ret, value.clone());
                cxt.set_finalized(true);
            }
            Evaluation::Value(value)
        }
        (_, None) => Evaluation::Context(cxt.sub_context(outs)),
        (_, Some(ret)) => match cxt.get_value(ret).cloned() {
            Some(stored @ ContextValue::Object(_)) => {
                let nested = Context::from_value(cxt.name(), &stored).unwrap_or_default();
                match nested.get_value(ret) {
                    Some(inner) => Evaluation::Value(inner.clone()),
                    None => Evaluation::Context(nested),
                }
            }
            Some(ContextValue::Null) | None => {
                let sub = cxt.sub_context(outs);
                cxt.put_value(ret, sub.to_value());
                cxt.set_finalized(true);
                Evaluation::Context(sub)
            }
            Some(value) => Evaluation::Value(value),
        },
    }
}

fn read_finalized(cxt: &Context, request: &RequestPath) -> Option<Evaluation> {
    let ret = request.return_path.as_deref()?;
    let stored = cxt.get_value(ret)?;
    if request.out_paths.len() > 1 {
        if let Some(sub) = Context::from_value(cxt.name(), stored) {
            return Some(Evaluation::Context(sub));
        }
    }
    Some(Evaluation::Value(stored.clone()))
}

fn fallback(cxt: &Context, natural: Option<ContextValue>, args: &[Arg]) -> Evaluation {
    if let Some(value) = natural {
        return Evaluation::Value(value);
    }
    match arg::outputs(args) {
        Some(paths) => Evaluation::Context(cxt.sub_context(paths)),
        None => Evaluation::Context(cxt.clone()),
    }
}
