use crate::core::context::{Context, ContextValue, RequestPath};

/// Extra arguments passed alongside a unit to `exert` and `evaluate`.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A named entry substituted into the unit's context (and re-applied to blocks on reset).
    Entry(String, ContextValue),
    /// Incoming context merged into blocks when they are reset.
    Context(Context),
    /// Selects the named fidelity before dispatch.
    Fidelity(String),
    /// Request path installed on the unit's context before finalization.
    RequestPath(RequestPath),
    /// Output paths used by `finalize` when the context declares no request path.
    Outputs(Vec<String>),
}

impl Arg {
    pub fn entry(path: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        Arg::Entry(path.into(), value.into())
    }

    pub fn fidelity(name: impl Into<String>) -> Self {
        Arg::Fidelity(name.into())
    }

    pub fn outputs<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arg::Outputs(paths.into_iter().map(Into::into).collect())
    }
}

pub(crate) fn entries(args: &[Arg]) -> impl Iterator<Item = (&String, &ContextValue)> {
    args.iter().filter_map(|arg| match arg {
        Arg::Entry(path, value) => Some((path, value)),
        _ => None,
    })
}

/// The last non-empty incoming context among `args`.
pub(crate) fn incoming_context(args: &[Arg]) -> Option<&Context> {
    args.iter().rev().find_map(|arg| match arg {
        Arg::Context(cxt) if !cxt.is_empty() => Some(cxt),
        _ => None,
    })
}

pub(crate) fn fidelity(args: &[Arg]) -> Option<&str> {
    args.iter().rev().find_map(|arg| match arg {
        Arg::Fidelity(name) => Some(name.as_str()),
        _ => None,
    })
}

pub(crate) fn request_path(args: &[Arg]) -> Option<&RequestPath> {
    args.iter().rev().find_map(|arg| match arg {
        Arg::RequestPath(rp) => Some(rp),
        _ => None,
    })
}

pub(crate) fn outputs(args: &[Arg]) -> Option<&[String]> {
    args.iter().rev().find_map(|arg| match arg {
        Arg::Outputs(paths) => Some(paths.as_slice()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_context_skips_empty() {
        let args = vec![
            Arg::Context(Context::new("a").with("x", 1)),
            Arg::Context(Context::new("empty")),
            Arg::fidelity("fast"),
        ];
        assert_eq!(incoming_context(&args).map(Context::name), Some("a"));
        assert_eq!(fidelity(&args), Some("fast"));
        assert!(outputs(&args).is_none());
    }
}
