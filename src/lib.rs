//! # Exertion
//!
//! A dispatch shell for service-oriented units of work ("mograms"): tasks, jobs,
//! blocks and models bound to service signatures.
//!
//! ## Features
//!
//! - **Signature-based resolution**: a signature names a service type, an operation and
//!   optionally a provider; the shell finds a live provider through a discovery service
//!   and keeps it in a bounded, expiring cache
//! - **Local, delegated and remote execution**: object signatures run in-process,
//!   everything else is handed to a resolved provider or a queued dispatcher
//! - **Composite units**: jobs run their children in dependency order and tolerate
//!   partial failure, blocks run strictly in order over one shared context
//! - **Mutual exclusion**: providers that ask for it are only invoked under a lock
//!   inside a fresh transaction
//! - **Failure is data**: execution failures end up in the unit's exception log and
//!   status, and `evaluate` answers with the trace instead of a value
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exertion::prelude::*;
//! use std::sync::Arc;
//!
//! struct NoProviders;
//!
//! #[async_trait::async_trait]
//! impl Discovery for NoProviders {
//!     async fn find_provider(&self, _sig: &Signature) -> Result<Option<ProviderHandle>, RemoteError> {
//!         Ok(None)
//!     }
//! }
//!
//! fn multiply(_selector: &str, cxt: &mut Context) -> Result<(), Fault> {
//!     let x = cxt.get_value("x").and_then(|v| v.as_i64()).unwrap_or(0);
//!     cxt.put_value("y", x * 2);
//!     Ok(())
//! }
//!
//! # async fn run() -> Result<(), DispatchError> {
//! let shell = Shell::new(Arc::new(NoProviders));
//! let mut task: Mogram = Task::new("double", Signature::object("multiply", "Multiplier", multiply))
//!     .with_context(Context::new("double").with("x", 5))
//!     .into();
//! let result = shell
//!     .evaluate(&mut task, &[Arg::RequestPath(RequestPath::outputs(["y"]))])
//!     .await?;
//! assert_eq!(result.as_value(), Some(&serde_json::json!(10)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`shell`]: the orchestrator, provider resolution and result finalization
//! - [`provider`]: interfaces of the consumed collaborators (providers, discovery,
//!   locks, transactions)
//! - [`prelude`]: commonly used types (import with `use exertion::prelude::*`)

// ============================================================================
// Modules
// ============================================================================

mod core;
pub mod provider;
pub mod shell;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

// Data model
pub use core::arg::Arg;
pub use core::context::{Context, ContextValue, RequestPath, PATH_SEPARATOR};
pub use core::control::{Access, ControlContext, ExecState};
pub use core::fidelity::{Fidelity, FidelitySelector};
pub use core::signature::{
    ObjectTarget, ProviderName, ServiceLogic, Signature, SignatureRole, ANY, EXERT_SELECTOR,
    JOBBER, SPACER,
};
pub use core::{Mogram, MogramKind};

// Units of work
pub use core::routine::block::Block;
pub use core::routine::job::{Dependency, Job};
pub use core::routine::model::Model;
pub use core::routine::task::Task;
pub use core::routine::{Depender, Persister};

// Errors
pub use core::error::{DispatchError, Fault, RemoteError, Severity};

// Telemetry and validation
pub use core::telemetry::{LogTelemetry, MemoryTelemetry, Telemetry, TraceEntry};
pub use core::validation::{validate_job, ValidationIssue, ValidationResult};

// Shell
pub use shell::config::ShellConfig;
pub use shell::finalize::Evaluation;
pub use shell::resolver::{ProviderCache, ProviderResolver};
pub use shell::router::Route;
pub use shell::Shell;

// Collaborators
pub use provider::txn::{LockResult, LockService, Transaction, TransactionManager};
pub use provider::{Discovery, Provider, ProviderHandle};

// ============================================================================
// Prelude
// ============================================================================

/// Imports everything needed to build units of work and dispatch them.
///
/// # Example
/// ```rust
/// use exertion::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        // Data model
        Access,
        Arg,
        // Units
        Block,
        Context,
        ContextValue,
        Depender,
        // Collaborators
        Discovery,
        // Errors
        DispatchError,
        Evaluation,
        ExecState,
        Fault,
        Fidelity,
        Job,
        LockResult,
        LockService,
        Model,
        Mogram,
        Persister,
        Provider,
        ProviderHandle,
        RemoteError,
        RequestPath,
        // Shell
        Shell,
        ShellConfig,
        Signature,
        SignatureRole,
        Task,
        Transaction,
        TransactionManager,
    };
}

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
