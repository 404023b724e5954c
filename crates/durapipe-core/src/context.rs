//! Execution-scoped workflow context slot.
//!
//! Activity stubs need the current workflow's scheduling context without it
//! being threaded through every call site. The slot is task-local, not a
//! process global: it is installed once at workflow entry and read-only for
//! the lifetime of that logical execution, and concurrent workflow instances
//! run on separate tasks with independent slots, so no lock is involved.

use std::future::Future;
use std::sync::Arc;

use durapipe_protocols::error::ContextError;
use durapipe_protocols::WorkflowContext;

tokio::task_local! {
    static WORKFLOW_CONTEXT: Arc<dyn WorkflowContext>;
}

/// Run a future with the given workflow context installed in the slot.
///
/// Called by the workflow wrapper on every invocation, including replays.
pub async fn scope<F>(ctx: Arc<dyn WorkflowContext>, fut: F) -> F::Output
where
    F: Future,
{
    WORKFLOW_CONTEXT.scope(ctx, fut).await
}

/// Read the current workflow context.
///
/// Fails with [`ContextError::NotSet`] when no workflow execution is active
/// on this logical path.
pub fn current() -> Result<Arc<dyn WorkflowContext>, ContextError> {
    WORKFLOW_CONTEXT
        .try_with(|ctx| ctx.clone())
        .map_err(|_| ContextError::NotSet)
}
