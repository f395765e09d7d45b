use serde::{Deserialize, Serialize};
use serde_json::Map;

/// The value type stored in a [`Context`]. Object values are nested contexts.
pub type ContextValue = serde_json::Value;

/// Separator between the segments of a hierarchical context path.
pub const PATH_SEPARATOR: char = '/';

/// Which context path(s) make up the caller-visible result of a unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPath {
    pub out_paths: Vec<String>,
    pub return_path: Option<String>,
}

impl RequestPath {
    /// A request for the value stored at a single return path.
    pub fn returning(path: impl Into<String>) -> Self {
        Self {
            out_paths: Vec::new(),
            return_path: Some(path.into()),
        }
    }

    /// A request for a set of output paths.
    pub fn outputs<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            out_paths: paths.into_iter().map(Into::into).collect(),
            return_path: None,
        }
    }

    /// Sets the return path where the computed result is stored.
    pub fn with_return_path(mut self, path: impl Into<String>) -> Self {
        self.return_path = Some(path.into());
        self
    }
}

/// Ordered path -> value data carrier shared between a unit of work and its executor.
///
/// Paths are hierarchical (`"arg/x"`). A lookup that misses in this context falls back
/// to the enclosing scope, which is how children of a block or job see the data of
/// their parent without aliasing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    name: String,
    entries: Map<String, ContextValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<Box<Context>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_path: Option<RequestPath>,
    #[serde(default)]
    finalized: bool,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder form of [`Context::put_value`].
    pub fn with(mut self, path: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.put_value(path, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores `value` at `path`, returning the previous value if there was one.
    pub fn put_value(
        &mut self,
        path: impl Into<String>,
        value: impl Into<ContextValue>,
    ) -> Option<ContextValue> {
        self.entries.insert(path.into(), value.into())
    }

    /// Looks up `path` in this context, then inside nested contexts stored under a
    /// prefix of `path`, then in the enclosing scope.
    pub fn get_value(&self, path: &str) -> Option<&ContextValue> {
        self.local_value(path)
            .or_else(|| self.scope.as_deref().and_then(|s| s.get_value(path)))
    }

    fn local_value(&self, path: &str) -> Option<&ContextValue> {
        if let Some(value) = self.entries.get(path) {
            return Some(value);
        }
        // longest stored prefix first
        let mut cut = path.len();
        while let Some(idx) = path[..cut].rfind(PATH_SEPARATOR) {
            let (prefix, rest) = (&path[..idx], &path[idx + 1..]);
            if let Some(nested @ ContextValue::Object(_)) = self.entries.get(prefix) {
                if let Some(found) = nested.pointer(&format!("/{rest}")) {
                    return Some(found);
                }
            }
            cut = idx;
        }
        None
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get_value(path).is_some()
    }

    pub fn remove(&mut self, path: &str) -> Option<ContextValue> {
        self.entries.shift_remove(path)
    }

    /// Number of entries owned by this context (the scope is not counted).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &ContextValue)> {
        self.entries.iter()
    }

    /// Builds a fresh context holding only `paths`; paths without a value are skipped.
    pub fn sub_context<S: AsRef<str>>(&self, paths: &[S]) -> Context {
        let mut out = Context::new(self.name.clone());
        for path in paths {
            let path = path.as_ref();
            if let Some(value) = self.get_value(path) {
                out.put_value(path, value.clone());
            }
        }
        out
    }

    /// Entries whose path lives under `prefix`, addressed by the full path.
    pub fn sub_context_under(&self, prefix: &str) -> Context {
        let lead = format!("{prefix}{PATH_SEPARATOR}");
        let mut out = Context::new(prefix);
        for (path, value) in &self.entries {
            if path == prefix || path.starts_with(&lead) {
                out.put_value(path.clone(), value.clone());
            }
        }
        out
    }

    /// Overlays the entries of `other` onto this context. Values are copied and the
    /// scope of `other` is ignored.
    pub fn append(&mut self, other: &Context) {
        for (path, value) in &other.entries {
            self.entries.insert(path.clone(), value.clone());
        }
    }

    pub fn scope(&self) -> Option<&Context> {
        self.scope.as_deref()
    }

    pub fn set_scope(&mut self, scope: Context) {
        self.scope = Some(Box::new(scope));
    }

    pub fn clear_scope(&mut self) {
        self.scope = None;
    }

    pub fn request_path(&self) -> Option<&RequestPath> {
        self.request_path.as_ref()
    }

    pub fn set_request_path(&mut self, request_path: RequestPath) {
        self.request_path = Some(request_path);
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub(crate) fn set_finalized(&mut self, finalized: bool) {
        self.finalized = finalized;
    }

    /// The entries of this context as a JSON object (a nested context value).
    pub fn to_value(&self) -> ContextValue {
        ContextValue::Object(self.entries.clone())
    }

    /// Reads a nested context value back into a context; `None` unless `value` is an object.
    pub fn from_value(name: impl Into<String>, value: &ContextValue) -> Option<Context> {
        match value {
            ContextValue::Object(map) => Some(Context {
                name: name.into(),
                entries: map.clone(),
                ..Context::default()
            }),
            _ => None,
        }
    }
}
