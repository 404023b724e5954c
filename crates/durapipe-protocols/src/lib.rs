//! # Durapipe Protocols
//!
//! Core protocol definitions (traits) for the Durapipe framework.
//! Contains only interface definitions and the shared task-handle
//! primitives - no engine implementation.
//!
//! ## Core Traits
//!
//! - [`WorkflowContext`] - Engine-provided context driving a workflow execution
//! - [`WorkflowHandler`] / [`ActivityHandler`] - The invocable forms the engine runs
//! - [`UnitRegistryAccess`] - The engine's registration surface
//! - [`Transport`] - Conversion between typed entities and their wire form
//! - [`StateStore`] - Persistent key/value collaborator for final results

pub mod engine;
pub mod error;
pub mod store;
pub mod task;
pub mod transport;

pub use engine::{
    ActivityContext, ActivityHandler, ActivityRegistration, UnitRegistryAccess, WorkflowContext,
    WorkflowHandler, WorkflowRegistration,
};
pub use error::{
    ActivityError, ContextError, RegistryError, StoreError, TransportError, WorkflowError,
};
pub use store::StateStore;
pub use task::{when_all, TaskCompletion, TaskHandle, TaskOutcome};
pub use transport::Transport;
