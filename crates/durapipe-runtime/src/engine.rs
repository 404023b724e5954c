//! In-process durable execution engine.
//!
//! `LocalEngine` honors the same contract an external engine would: it runs a
//! workflow handler on its own task, schedules each activity call on a
//! separate task so a step's calls are eligible to run concurrently, and
//! records every completion in per-instance history. Replaying an instance
//! re-executes the workflow body with `is_replaying = true`, serving each
//! activity call from history instead of invoking the activity, and flags any
//! divergence from the recorded call sequence as nondeterminism.

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info};

use durapipe_protocols::error::RegistryError;
use durapipe_protocols::{
    ActivityContext, ActivityHandler, ActivityRegistration, TaskHandle, TaskOutcome,
    UnitRegistryAccess, WorkflowContext, WorkflowHandler, WorkflowRegistration,
};

use crate::error::EngineError;

/// One recorded activity call within an instance.
///
/// Created at scheduling time so the record order is the deterministic
/// scheduling order, not the completion order; the outcome is filled in when
/// the activity resolves.
#[derive(Debug, Clone)]
struct CompletionRecord {
    task_id: u64,
    name: String,
    input: Value,
    outcome: Option<TaskOutcome>,
}

struct InstanceRecord {
    workflow: String,
    input: Value,
    completions: Mutex<Vec<CompletionRecord>>,
}

struct EngineInner {
    workflows: DashMap<String, Arc<dyn WorkflowHandler>>,
    activities: DashMap<String, Arc<dyn ActivityHandler>>,
    instances: DashMap<String, Arc<InstanceRecord>>,
}

/// In-process engine implementing the registration and execution contract.
#[derive(Clone)]
pub struct LocalEngine {
    inner: Arc<EngineInner>,
}

impl LocalEngine {
    /// Create a new engine with no registered units.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EngineInner {
                workflows: DashMap::new(),
                activities: DashMap::new(),
                instances: DashMap::new(),
            }),
        }
    }

    /// Run a registered workflow to completion.
    ///
    /// The handler executes on its own task, so its execution-scoped context
    /// slot is independent of any other running instance.
    pub async fn run(
        &self,
        workflow: &str,
        instance_id: &str,
        input: Value,
    ) -> Result<Value, EngineError> {
        let handler = self
            .inner
            .workflows
            .get(workflow)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EngineError::UnknownWorkflow(workflow.to_string()))?;

        let record = Arc::new(InstanceRecord {
            workflow: workflow.to_string(),
            input: input.clone(),
            completions: Mutex::new(Vec::new()),
        });
        self.inner
            .instances
            .insert(instance_id.to_string(), record.clone());

        info!("Starting workflow {} (instance {})", workflow, instance_id);

        let ctx: Arc<dyn WorkflowContext> = Arc::new(LiveContext {
            instance_id: instance_id.to_string(),
            inner: self.inner.clone(),
            record,
            next_task_id: AtomicU64::new(0),
        });
        let task = tokio::spawn(async move { handler.run(ctx, input).await });

        match task.await {
            Ok(Ok(value)) => {
                info!("Workflow {} (instance {}) completed", workflow, instance_id);
                Ok(value)
            }
            Ok(Err(e)) => {
                error!(
                    "Workflow {} (instance {}) failed: {}",
                    workflow, instance_id, e
                );
                Err(EngineError::WorkflowFailed(e.to_string()))
            }
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(EngineError::WorkflowFailed(e.to_string())),
        }
    }

    /// Re-execute a finished instance's workflow body against its recorded
    /// history. Activities are not invoked; their recorded outcomes are
    /// served, so side effects do not repeat.
    pub async fn replay(&self, instance_id: &str) -> Result<Value, EngineError> {
        let record = self
            .inner
            .instances
            .get(instance_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EngineError::UnknownInstance(instance_id.to_string()))?;
        let handler = self
            .inner
            .workflows
            .get(&record.workflow)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EngineError::UnknownWorkflow(record.workflow.clone()))?;

        info!(
            "Replaying workflow {} (instance {})",
            record.workflow, instance_id
        );

        let replay_ctx = Arc::new(ReplayContext {
            instance_id: instance_id.to_string(),
            completions: record.completions.lock().clone(),
            cursor: AtomicUsize::new(0),
            mismatch: Mutex::new(None),
        });
        let ctx: Arc<dyn WorkflowContext> = replay_ctx.clone();
        let input = record.input.clone();
        let task = tokio::spawn(async move { handler.run(ctx, input).await });

        let result = match task.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(EngineError::WorkflowFailed(e.to_string())),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(EngineError::WorkflowFailed(e.to_string())),
        };

        if let Some(message) = replay_ctx.mismatch.lock().take() {
            error!(
                "Replay of instance {} diverged: {}",
                instance_id, message
            );
            return Err(EngineError::ReplayMismatch(message));
        }
        result
    }

    /// Number of recorded activity completions for an instance.
    pub fn completion_count(&self, instance_id: &str) -> Option<usize> {
        self.inner
            .instances
            .get(instance_id)
            .map(|entry| entry.completions.lock().len())
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistryAccess for LocalEngine {
    fn register_workflow(&self, registration: WorkflowRegistration) -> Result<(), RegistryError> {
        if self.inner.workflows.contains_key(&registration.name) {
            return Err(RegistryError::Duplicate(registration.name));
        }
        debug!("Registered workflow: {}", registration.name);
        self.inner
            .workflows
            .insert(registration.name, registration.handler);
        Ok(())
    }

    fn register_activity(&self, registration: ActivityRegistration) -> Result<(), RegistryError> {
        if self.inner.activities.contains_key(&registration.name) {
            return Err(RegistryError::Duplicate(registration.name));
        }
        debug!("Registered activity: {}", registration.name);
        self.inner
            .activities
            .insert(registration.name, registration.handler);
        Ok(())
    }
}

/// Context for a live (first) execution: schedules real activity invocations.
struct LiveContext {
    instance_id: String,
    inner: Arc<EngineInner>,
    record: Arc<InstanceRecord>,
    next_task_id: AtomicU64,
}

impl WorkflowContext for LiveContext {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn is_replaying(&self) -> bool {
        false
    }

    fn call_activity(&self, name: &str, input: Value) -> TaskHandle {
        let task_id = self.next_task_id.fetch_add(1, Ordering::SeqCst);
        let (handle, completion) = TaskHandle::pending();

        // Record in scheduling order; the outcome lands later.
        self.record.completions.lock().push(CompletionRecord {
            task_id,
            name: name.to_string(),
            input: input.clone(),
            outcome: None,
        });

        let inner = self.inner.clone();
        let record = self.record.clone();
        let name = name.to_string();
        let workflow_id = self.instance_id.clone();
        tokio::spawn(async move {
            let handler = inner
                .activities
                .get(&name)
                .map(|entry| entry.value().clone());
            let outcome = match handler {
                Some(handler) => {
                    debug!(
                        "Invoking activity {} (instance {}, task {})",
                        name, workflow_id, task_id
                    );
                    let ctx = ActivityContext {
                        workflow_id,
                        task_id,
                    };
                    match handler.run(ctx, input).await {
                        Ok(value) => TaskOutcome::Completed(value),
                        Err(e) => TaskOutcome::Failed(e.to_string()),
                    }
                }
                None => TaskOutcome::Failed(format!("Activity not found: {}", name)),
            };

            let mut completions = record.completions.lock();
            if let Some(entry) = completions.iter_mut().find(|r| r.task_id == task_id) {
                entry.outcome = Some(outcome.clone());
            }
            drop(completions);
            completion.complete(outcome);
        });

        handle
    }
}

/// Context for a replayed execution: serves activity calls from history.
struct ReplayContext {
    instance_id: String,
    completions: Vec<CompletionRecord>,
    cursor: AtomicUsize,
    mismatch: Mutex<Option<String>>,
}

impl ReplayContext {
    fn flag(&self, message: String) -> TaskHandle {
        let mut mismatch = self.mismatch.lock();
        if mismatch.is_none() {
            *mismatch = Some(message.clone());
        }
        TaskHandle::failed(message)
    }
}

impl WorkflowContext for ReplayContext {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn is_replaying(&self) -> bool {
        true
    }

    fn call_activity(&self, name: &str, input: Value) -> TaskHandle {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let Some(record) = self.completions.get(index) else {
            return self.flag(format!(
                "call {} ({}) runs past the {} recorded completions",
                index,
                name,
                self.completions.len()
            ));
        };
        if record.name != name || record.input != input {
            return self.flag(format!(
                "call {} scheduled {} but history recorded {}",
                index, name, record.name
            ));
        }
        match &record.outcome {
            Some(TaskOutcome::Completed(value)) => TaskHandle::completed(value.clone()),
            Some(TaskOutcome::Failed(error)) => TaskHandle::failed(error.clone()),
            None => self.flag(format!(
                "call {} ({}) was scheduled but never completed in the recorded run",
                index, name
            )),
        }
    }
}
