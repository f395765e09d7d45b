use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How bad a logged fault is. `Error` is the non-recoverable class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Exception,
    Error,
}

/// One entry of a unit's exception log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct Fault {
    pub message: String,
    pub severity: Severity,
}

impl Fault {
    pub fn exception(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Exception,
        }
    }

    /// A non-recoverable fault; a unit logging one ends in the `Error` state.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<&DispatchError> for Fault {
    fn from(err: &DispatchError) -> Self {
        match err {
            DispatchError::Fault(fault) => fault.clone(),
            other => Fault::exception(other.to_string()),
        }
    }
}

/// Failures reported by the collaborators the shell consumes: providers, the
/// discovery service, the lock service and the transaction manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("remote invocation failed: {0}")]
    Invocation(String),

    #[error("discovery failed: {0}")]
    Discovery(String),

    #[error("transaction error: {0}")]
    Transaction(String),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(
        "provider key: [{provider}], type: {service_type} not found, make sure it is running and there is an available discovery service"
    )]
    ProviderUnavailable {
        provider: String,
        service_type: String,
    },

    #[error("dispatch failed for signature {signature}: {reason}")]
    DispatchFailure { signature: String, reason: String },

    #[error("no lock available for: {0}")]
    LockDenied(String),

    #[error("routine failure: {0}")]
    Routine(#[source] Box<DispatchError>),

    #[error(transparent)]
    Fault(#[from] Fault),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl DispatchError {
    /// Classifies `self` as a routine failure, wrapping it once.
    pub fn into_routine(self) -> DispatchError {
        match self {
            routine @ DispatchError::Routine(_) => routine,
            other => DispatchError::Routine(Box::new(other)),
        }
    }

    /// The innermost cause behind any number of routine wrappers.
    pub fn root_cause(&self) -> &DispatchError {
        match self {
            DispatchError::Routine(inner) => inner.root_cause(),
            other => other,
        }
    }
}
