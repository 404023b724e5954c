//! The processing workflow: deterministic step and action orchestration.
//!
//! The workflow body is replay-safe: no wall-clock branching, no randomness,
//! no direct I/O. Its only suspension points are the per-step fan-in barrier
//! and the final persistence call; everything that varies between replays
//! flows through activity handles the engine deduplicates.

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use durapipe_core::{ActivityStub, UnitRegistry, WorkflowStub};
use durapipe_protocols::error::{RegistryError, WorkflowError};
use durapipe_protocols::{when_all, StateStore, TaskHandle, WorkflowContext};

use crate::activities::{self, ActionProcessor, ShiftCipherProcessor};
use crate::model::{
    ProcessingAction, ProcessingActionResult, ProcessingPayload, ProcessingResult,
    ProcessingStepResult, RunStatus,
};

/// Registered name of the processing workflow.
pub const PROCESSING_WORKFLOW: &str = "processing_workflow";
/// Registered name of the transform activity.
pub const INVOKE_PROCESSOR: &str = "invoke_processor";
/// Registered name of the persistence activity.
pub const SAVE_STATE: &str = "save_state";
/// Fixed completion marker returned by a finished workflow run.
pub const WORKFLOW_DONE: &str = "workflow done";

/// Stubs for the pipeline's registered units.
pub struct PipelineUnits {
    pub workflow: WorkflowStub,
    pub invoke_processor: ActivityStub<ProcessingAction>,
    pub save_state: ActivityStub<ProcessingResult>,
}

/// Record the pipeline's units in the registry with the default shift cipher
/// transform.
pub fn register_units(
    registry: &UnitRegistry,
    store: Arc<dyn StateStore>,
) -> Result<PipelineUnits, RegistryError> {
    register_units_with_processor(registry, store, Arc::new(ShiftCipherProcessor::default()))
}

/// Record the pipeline's units with a custom action processor.
pub fn register_units_with_processor(
    registry: &UnitRegistry,
    store: Arc<dyn StateStore>,
    processor: Arc<dyn ActionProcessor>,
) -> Result<PipelineUnits, RegistryError> {
    let invoke_processor =
        registry.activity(INVOKE_PROCESSOR, move |ctx, action: ProcessingAction| {
            let processor = processor.clone();
            async move { activities::invoke_processor(processor, ctx, action).await }
        })?;

    let save_state = registry.activity(SAVE_STATE, move |ctx, result: ProcessingResult| {
        let store = store.clone();
        async move { activities::save_state(store, ctx, result).await }
    })?;

    let workflow = {
        let invoke = invoke_processor.clone();
        let save = save_state.clone();
        registry.workflow(PROCESSING_WORKFLOW, move |ctx, input| {
            let invoke = invoke.clone();
            let save = save.clone();
            async move { processing_workflow(ctx, input, invoke, save).await }
        })?
    };

    Ok(PipelineUnits {
        workflow,
        invoke_processor,
        save_state,
    })
}

/// The orchestration body. Calls here must be deterministic.
async fn processing_workflow(
    ctx: Arc<dyn WorkflowContext>,
    input: Value,
    invoke_processor: ActivityStub<ProcessingAction>,
    save_state: ActivityStub<ProcessingResult>,
) -> Result<Value, WorkflowError> {
    let payload = match ProcessingPayload::parse(input) {
        Ok(payload) => payload,
        Err(e) => {
            error!("processing_workflow error: {}", e);
            return Err(e.into());
        }
    };
    if !ctx.is_replaying() {
        info!("processing_workflow - received new payload: {:?}", payload);
    }

    let mut have_errors = false;
    let mut step_results: Vec<Vec<TaskHandle>> = Vec::new();
    for step in &payload.steps {
        info!("processing step: {}", step.name);

        // Schedule every action before awaiting any, so all of them are
        // eligible to run concurrently, then hold at the fan-in barrier.
        let mut handles = Vec::with_capacity(step.actions.len());
        for action in &step.actions {
            handles.push(invoke_processor.call(action)?);
        }
        when_all(&handles).await;

        let step_failed = step_has_errors(&handles);
        step_results.push(handles);
        if step_failed {
            info!(
                "processing step completed with errors - skipping any remaining work: {}",
                step.name
            );
            have_errors = true;
            break;
        }
        info!("processing step completed: {}", step.name);
    }

    let result = assemble_result(ctx.instance_id(), have_errors, &payload, &step_results);
    info!("processing_workflow completed: {:?}", result);

    let persisted = save_state.call(&result)?;
    persisted.wait().await;
    if persisted.is_failed() {
        let message = persisted
            .error()
            .unwrap_or_else(|| "unknown persistence failure".to_string());
        error!("processing_workflow error: {}", message);
        return Err(WorkflowError::Persistence(message));
    }

    Ok(Value::String(WORKFLOW_DONE.to_string()))
}

/// Whether any handle in a step's group is in error. A step with no actions
/// is vacuously successful.
fn step_has_errors(handles: &[TaskHandle]) -> bool {
    handles.iter().any(is_error)
}

/// One failure predicate across both channels: an outright failed handle, a
/// missing resolved value, or a resolved value carrying the error marker.
fn is_error(handle: &TaskHandle) -> bool {
    if handle.is_failed() {
        return true;
    }
    match handle.result() {
        None => true,
        Some(Value::Null) => true,
        Some(value) => value
            .as_object()
            .is_some_and(|map| map.contains_key("error")),
    }
}

/// Build one step result per *input* step, executed or not. Result positions
/// are fixed by input order; steps never reached get `None` per action.
fn assemble_result(
    instance_id: &str,
    have_errors: bool,
    payload: &ProcessingPayload,
    step_results: &[Vec<TaskHandle>],
) -> ProcessingResult {
    let steps = payload
        .steps
        .iter()
        .enumerate()
        .map(|(step_index, step)| ProcessingStepResult {
            name: step.name.clone(),
            actions: step
                .actions
                .iter()
                .enumerate()
                .map(|(action_index, action)| {
                    let result = step_results
                        .get(step_index)
                        .and_then(|handles| handles.get(action_index))
                        .and_then(|handle| handle.result())
                        .filter(|value| !value.is_null());
                    ProcessingActionResult {
                        content: action.content.clone(),
                        result,
                    }
                })
                .collect(),
        })
        .collect();

    ProcessingResult {
        id: instance_id.to_string(),
        status: if have_errors {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        },
        steps,
    }
}
