use crate::core::context::Context;
use crate::core::control::Access;
use crate::core::error::Fault;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Service type of the direct job-dispatcher provider.
pub const JOBBER: &str = "Jobber";
/// Service type of the queue-style (space based) dispatcher provider.
pub const SPACER: &str = "Spacer";
/// Selector every dispatcher provider answers to.
pub const EXERT_SELECTOR: &str = "exert";
/// Provider name that matches any provider of the requested type.
pub const ANY: &str = "*";

/// In-process service code an object signature points at.
///
/// The selector names the operation; results are written back into `context`.
pub trait ServiceLogic: Send + Sync + 'static {
    fn exec(&self, selector: &str, context: &mut Context) -> Result<(), Fault>;
}

impl<F> ServiceLogic for F
where
    F: Fn(&str, &mut Context) -> Result<(), Fault> + Send + Sync + 'static,
{
    fn exec(&self, selector: &str, context: &mut Context) -> Result<(), Fault> {
        self(selector, context)
    }
}

/// Shared handle to in-process service code.
#[derive(Clone)]
pub struct ObjectTarget(Arc<dyn ServiceLogic>);

impl ObjectTarget {
    pub fn new(logic: Arc<dyn ServiceLogic>) -> Self {
        Self(logic)
    }

    pub fn exec(&self, selector: &str, context: &mut Context) -> Result<(), Fault> {
        self.0.exec(selector, context)
    }
}

impl fmt::Debug for ObjectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ObjectTarget(..)")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderName {
    #[default]
    Any,
    Named(String),
}

impl ProviderName {
    pub fn named(name: impl Into<String>) -> Self {
        ProviderName::Named(name.into())
    }

    pub fn is_named(&self) -> bool {
        matches!(self, ProviderName::Named(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProviderName::Any => ANY,
            ProviderName::Named(name) => name,
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a signature runs relative to the unit's primary operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureRole {
    #[default]
    Process,
    Prepare,
    Postprocess,
}

/// A required capability: which service type, which operation, which provider.
///
/// A signature with an in-process target is an object signature and runs locally;
/// any other signature is remote-style and has to be resolved to a provider.
/// Equality and hashing only look at the service type, selector and provider name,
/// which is what the provider cache keys on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    service_type: String,
    selector: String,
    #[serde(default)]
    provider_name: ProviderName,
    #[serde(default)]
    access: Option<Access>,
    #[serde(default)]
    role: SignatureRole,
    #[serde(skip)]
    target: Option<ObjectTarget>,
}

impl Signature {
    /// A remote-style signature for `selector` on providers of `service_type`.
    pub fn net(selector: impl Into<String>, service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            selector: selector.into(),
            provider_name: ProviderName::Any,
            access: None,
            role: SignatureRole::Process,
            target: None,
        }
    }

    /// An object signature executing `selector` on in-process `logic`.
    pub fn object<L: ServiceLogic>(
        selector: impl Into<String>,
        service_type: impl Into<String>,
        logic: L,
    ) -> Self {
        Self::with_target(selector, service_type, Arc::new(logic))
    }

    pub fn with_target(
        selector: impl Into<String>,
        service_type: impl Into<String>,
        logic: Arc<dyn ServiceLogic>,
    ) -> Self {
        Self {
            target: Some(ObjectTarget::new(logic)),
            ..Self::net(selector, service_type)
        }
    }

    pub fn with_provider(mut self, name: impl Into<String>) -> Self {
        self.provider_name = ProviderName::named(name);
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_role(mut self, role: SignatureRole) -> Self {
        self.role = role;
        self
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn provider_name(&self) -> &ProviderName {
        &self.provider_name
    }

    /// The access mode the signature declares explicitly, if any.
    pub fn access(&self) -> Option<Access> {
        self.access
    }

    pub fn role(&self) -> SignatureRole {
        self.role
    }

    pub fn target(&self) -> Option<&ObjectTarget> {
        self.target.as_ref()
    }

    pub fn is_remote(&self) -> bool {
        self.target.is_none()
    }

    /// Whether the signature can travel to a remote executor with its unit.
    pub fn is_transportable(&self) -> bool {
        self.target.is_none()
    }

    /// A signature is selectable when it names an operation.
    pub fn is_selectable(&self) -> bool {
        !self.selector.trim().is_empty()
    }

    pub(crate) fn set_service_type(&mut self, service_type: impl Into<String>) {
        self.service_type = service_type.into();
    }

    pub(crate) fn set_selector(&mut self, selector: impl Into<String>) {
        self.selector = selector.into();
    }

    pub(crate) fn set_provider_name(&mut self, name: ProviderName) {
        self.provider_name = name;
    }

    pub(crate) fn set_role(&mut self, role: SignatureRole) {
        self.role = role;
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.service_type == other.service_type
            && self.selector == other.selector
            && self.provider_name == other.provider_name
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.service_type.hash(state);
        self.selector.hash(state);
        self.provider_name.hash(state);
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}@{}",
            self.service_type, self.selector, self.provider_name
        )?;
        if self.target.is_some() {
            f.write_str(" (object)")?;
        }
        Ok(())
    }
}
