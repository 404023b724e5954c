//! Task handles for scheduled activity calls.
//!
//! A [`TaskHandle`] is created pending when an activity call is scheduled and
//! completed exactly once by the engine through its paired [`TaskCompletion`].
//! Outright failure and success are kept distinct so the workflow's fan-in
//! barrier can classify both channels with one predicate.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

/// The explicit outcome of one activity invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The activity returned a value. The value itself may still carry an
    /// application-level error marker.
    Completed(Value),
    /// The activity handler failed or could not be invoked.
    Failed(String),
}

struct TaskState {
    outcome: Mutex<Option<TaskOutcome>>,
    notify: Notify,
}

/// Handle to a pending or resolved activity call.
///
/// Cheap to clone; all clones observe the same resolution.
#[derive(Clone)]
pub struct TaskHandle {
    state: Arc<TaskState>,
}

/// Completion side of a [`TaskHandle`]. Held by the engine, used once.
pub struct TaskCompletion {
    state: Arc<TaskState>,
}

impl TaskHandle {
    /// Create a pending handle and its paired completion.
    pub fn pending() -> (TaskHandle, TaskCompletion) {
        let state = Arc::new(TaskState {
            outcome: Mutex::new(None),
            notify: Notify::new(),
        });
        (
            TaskHandle {
                state: state.clone(),
            },
            TaskCompletion { state },
        )
    }

    /// Create an already-completed handle (replay, tests).
    pub fn completed(value: Value) -> TaskHandle {
        Self::resolved(TaskOutcome::Completed(value))
    }

    /// Create an already-failed handle (replay, tests).
    pub fn failed(error: impl Into<String>) -> TaskHandle {
        Self::resolved(TaskOutcome::Failed(error.into()))
    }

    fn resolved(outcome: TaskOutcome) -> TaskHandle {
        TaskHandle {
            state: Arc::new(TaskState {
                outcome: Mutex::new(Some(outcome)),
                notify: Notify::new(),
            }),
        }
    }

    /// Whether the call has resolved (completed or failed).
    pub fn is_resolved(&self) -> bool {
        self.state.outcome.lock().is_some()
    }

    /// Whether the call failed outright. `false` while still pending.
    pub fn is_failed(&self) -> bool {
        matches!(*self.state.outcome.lock(), Some(TaskOutcome::Failed(_)))
    }

    /// The resolved value. `None` while pending or on outright failure.
    pub fn result(&self) -> Option<Value> {
        match &*self.state.outcome.lock() {
            Some(TaskOutcome::Completed(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// The failure message. `None` while pending or on success.
    pub fn error(&self) -> Option<String> {
        match &*self.state.outcome.lock() {
            Some(TaskOutcome::Failed(error)) => Some(error.clone()),
            _ => None,
        }
    }

    /// The full outcome, if resolved.
    pub fn outcome(&self) -> Option<TaskOutcome> {
        self.state.outcome.lock().clone()
    }

    /// Suspend until the call resolves.
    pub async fn wait(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_resolved() {
                return;
            }
            notified.await;
        }
    }
}

impl TaskCompletion {
    /// Resolve the paired handle. Consumes the completion; a handle is
    /// completed at most once.
    pub fn complete(self, outcome: TaskOutcome) {
        {
            let mut slot = self.state.outcome.lock();
            debug_assert!(slot.is_none(), "task handle completed twice");
            *slot = Some(outcome);
        }
        self.state.notify.notify_waiters();
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("outcome", &*self.state.outcome.lock())
            .finish()
    }
}

/// Fan-in barrier: suspend until every handle in the group has resolved.
///
/// Resolution means completed *or* failed - the barrier never short-circuits
/// on first completion, so error detection can inspect the full group.
pub async fn when_all(handles: &[TaskHandle]) {
    futures::future::join_all(handles.iter().map(|handle| handle.wait())).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pending_handle_unresolved() {
        let (handle, _completion) = TaskHandle::pending();
        assert!(!handle.is_resolved());
        assert!(!handle.is_failed());
        assert!(handle.result().is_none());
        assert!(handle.error().is_none());
    }

    #[test]
    fn test_complete_resolves_all_clones() {
        let (handle, completion) = TaskHandle::pending();
        let clone = handle.clone();
        completion.complete(TaskOutcome::Completed(json!("done")));
        assert!(handle.is_resolved());
        assert_eq!(clone.result(), Some(json!("done")));
        assert!(!clone.is_failed());
    }

    #[test]
    fn test_failed_handle() {
        let handle = TaskHandle::failed("unknown activity");
        assert!(handle.is_resolved());
        assert!(handle.is_failed());
        assert!(handle.result().is_none());
        assert_eq!(handle.error().as_deref(), Some("unknown activity"));
    }

    #[tokio::test]
    async fn test_wait_returns_after_completion() {
        let (handle, completion) = TaskHandle::pending();
        let waiter = tokio::spawn({
            let handle = handle.clone();
            async move {
                handle.wait().await;
                handle.result()
            }
        });
        tokio::task::yield_now().await;
        completion.complete(TaskOutcome::Completed(json!(42)));
        assert_eq!(waiter.await.unwrap(), Some(json!(42)));
    }

    #[tokio::test]
    async fn test_wait_on_already_resolved_handle() {
        let handle = TaskHandle::completed(json!(null));
        handle.wait().await;
        assert_eq!(handle.result(), Some(json!(null)));
    }

    #[tokio::test]
    async fn test_when_all_waits_for_every_handle() {
        let (first, first_completion) = TaskHandle::pending();
        let (second, second_completion) = TaskHandle::pending();
        let handles = vec![first.clone(), second.clone()];

        let barrier = tokio::spawn(async move {
            when_all(&handles).await;
            (first.is_resolved(), second.is_resolved())
        });

        tokio::task::yield_now().await;
        // Complete in reverse order; the barrier must still wait for both.
        second_completion.complete(TaskOutcome::Failed("late".to_string()));
        tokio::task::yield_now().await;
        first_completion.complete(TaskOutcome::Completed(json!("ok")));

        assert_eq!(barrier.await.unwrap(), (true, true));
    }

    #[tokio::test]
    async fn test_when_all_empty_group() {
        when_all(&[]).await;
    }
}
