//! # Durapipe Core
//!
//! Unit registration framework for the Durapipe orchestration system.
//!
//! ## Components
//!
//! - [`context`] - Execution-scoped slot holding the current workflow context
//! - [`UnitRegistry`] - Wraps plain async functions into registrable workflow
//!   and activity units and tracks them for bulk engine registration
//!
//! Workflow bodies call activity stubs as if they were local functions; the
//! framework substitutes an engine-scheduled call, marshalling typed inputs
//! to transport form at the boundary.

pub mod context;
pub mod registry;

pub use registry::{ActivityStub, RawActivityStub, UnitRegistry, WorkflowStub};
