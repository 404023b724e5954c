//! Engine contract: the interface between orchestration code and the
//! durable execution engine that drives it.
//!
//! The engine itself lives outside this crate. Everything here is what the
//! two sides agree on: how a workflow sees its execution context, what an
//! activity receives, and how wrapped units are registered.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ActivityError, RegistryError, WorkflowError};
use crate::task::TaskHandle;

/// Engine-provided context for one workflow execution.
///
/// Scheduling is infallible at the call site; lookup and execution failures
/// surface through the returned handle.
pub trait WorkflowContext: Send + Sync {
    /// The engine-assigned orchestration instance identifier.
    fn instance_id(&self) -> &str;

    /// Whether this execution is a replay of already-recorded history.
    ///
    /// Replayed executions must not repeat side effects outside activity
    /// calls; the engine serves recorded results for those.
    fn is_replaying(&self) -> bool;

    /// Schedule a registered activity by name with a transport-form payload.
    fn call_activity(&self, name: &str, input: Value) -> TaskHandle;
}

/// Context passed to an activity invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityContext {
    /// Instance id of the workflow that scheduled this call.
    pub workflow_id: String,
    /// Sequential id of this call within the workflow instance.
    pub task_id: u64,
}

/// The invocable form of a registered workflow.
#[async_trait]
pub trait WorkflowHandler: Send + Sync {
    async fn run(
        &self,
        ctx: Arc<dyn WorkflowContext>,
        input: Value,
    ) -> Result<Value, WorkflowError>;
}

/// The invocable form of a registered activity.
#[async_trait]
pub trait ActivityHandler: Send + Sync {
    async fn run(&self, ctx: ActivityContext, input: Value) -> Result<Value, ActivityError>;
}

/// A named workflow ready for engine registration.
#[derive(Clone)]
pub struct WorkflowRegistration {
    pub name: String,
    pub handler: Arc<dyn WorkflowHandler>,
}

/// A named activity ready for engine registration.
#[derive(Clone)]
pub struct ActivityRegistration {
    pub name: String,
    pub handler: Arc<dyn ActivityHandler>,
}

/// The engine's registration surface.
pub trait UnitRegistryAccess: Send + Sync {
    fn register_workflow(&self, registration: WorkflowRegistration) -> Result<(), RegistryError>;

    fn register_activity(&self, registration: ActivityRegistration) -> Result<(), RegistryError>;
}

impl std::fmt::Debug for WorkflowRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowRegistration")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for ActivityRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityRegistration")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
