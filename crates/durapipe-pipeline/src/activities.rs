//! Pipeline activities: per-action transform and final-result persistence.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info};

use durapipe_protocols::error::ActivityError;
use durapipe_protocols::{ActivityContext, StateStore, Transport};

use crate::model::{ProcessingAction, ProcessingResult};

/// Per-action computation invoked by the processing workflow.
#[async_trait]
pub trait ActionProcessor: Send + Sync {
    /// Process one action's content. Failure is reported as an `Err` string
    /// here and converted to an error marker value at the activity boundary.
    async fn process(&self, action: &ProcessingAction) -> Result<String, String>;
}

/// Shift cipher processor: rotates each ASCII letter forward within its own
/// case's alphabet (`z` wraps to `a`, `Z` to `A`); other characters pass
/// through. Incidental business logic standing in for a real transform.
pub struct ShiftCipherProcessor {
    shift: u8,
}

impl ShiftCipherProcessor {
    pub fn new(shift: u8) -> Self {
        Self { shift: shift % 26 }
    }
}

impl Default for ShiftCipherProcessor {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl ActionProcessor for ShiftCipherProcessor {
    async fn process(&self, action: &ProcessingAction) -> Result<String, String> {
        Ok(shift_letters(&action.content, self.shift))
    }
}

fn shift_letters(input: &str, shift: u8) -> String {
    input
        .chars()
        .map(|c| match c {
            'a'..='z' => rotate(c, b'a', shift),
            'A'..='Z' => rotate(c, b'A', shift),
            _ => c,
        })
        .collect()
}

fn rotate(c: char, base: u8, shift: u8) -> char {
    (((c as u8 - base + shift) % 26) + base) as char
}

/// Transform activity body.
///
/// A processor failure is returned as an `{"error": ...}` value rather than
/// an `Err`: a failed handle would mark the whole run failed at the engine,
/// while the marker lets the fan-in barrier observe a resolved-but-errored
/// handle and keep both failure channels uniformly checkable.
pub(crate) async fn invoke_processor(
    processor: Arc<dyn ActionProcessor>,
    ctx: ActivityContext,
    action: ProcessingAction,
) -> Result<Value, ActivityError> {
    info!(
        "invoke_processor triggered (wf_id: {}; task_id: {}): {:?}",
        ctx.workflow_id, ctx.task_id, action
    );

    match processor.process(&action).await {
        Ok(result) => Ok(Value::String(result)),
        Err(e) => {
            error!("invoke_processor error: {}", e);
            Ok(json!({ "error": e }))
        }
    }
}

/// Persistence activity body: writes the serialized result under the
/// orchestration instance id. Store failure propagates - the engine must see
/// this final step fail.
pub(crate) async fn save_state(
    store: Arc<dyn StateStore>,
    ctx: ActivityContext,
    result: ProcessingResult,
) -> Result<Value, ActivityError> {
    info!(
        "save_state triggered (wf_id: {}; task_id: {})",
        ctx.workflow_id, ctx.task_id
    );

    store
        .save(&ctx.workflow_id, &result.to_transport())
        .await
        .map_err(|e| {
            error!("save_state error: {}", e);
            ActivityError::Store(e)
        })?;
    Ok(Value::Null)
}
