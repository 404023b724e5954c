//! Typed payload model for the processing pipeline.
//!
//! These are the entities exchanged between orchestrator and activities.
//! Each one that crosses the durability boundary implements [`Transport`]
//! explicitly - the boundary only carries plain JSON maps, so type identity
//! is rebuilt on each side rather than trusted to survive the trip.

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use durapipe_protocols::error::TransportError;
use durapipe_protocols::Transport;

/// The unit of work fanned out within a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingAction {
    pub content: String,
}

impl ProcessingAction {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// A named step. Its actions execute concurrently; their input order fixes
/// the output ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStep {
    pub name: String,
    pub actions: Vec<ProcessingAction>,
}

impl ProcessingStep {
    pub fn new(name: impl Into<String>, actions: Vec<ProcessingAction>) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }
}

/// The orchestration's sole input; steps execute strictly in sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingPayload {
    pub steps: Vec<ProcessingStep>,
}

impl ProcessingPayload {
    /// Parse the external untyped input into the typed payload.
    pub fn parse(raw: Value) -> Result<Self, TransportError> {
        Self::from_transport(raw)
    }
}

/// Per-action outcome. `result` is `None` when the action's output could not
/// be obtained (step never reached, or the handle failed outright); a present
/// value is either the success string or the `{"error": ...}` marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingActionResult {
    pub content: String,
    pub result: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStepResult {
    pub name: String,
    pub actions: Vec<ProcessingActionResult>,
}

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Completed,
    Failed,
}

/// The sole persisted artifact, built exactly once at the end of a run.
/// Always mirrors the input payload's step and action shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub id: String,
    pub status: RunStatus,
    pub steps: Vec<ProcessingStepResult>,
}

impl Transport for ProcessingAction {
    fn to_transport(&self) -> Value {
        json!({ "content": self.content })
    }

    fn from_transport(value: Value) -> Result<Self, TransportError> {
        serde_json::from_value(value).map_err(|e| TransportError::MalformedInput(e.to_string()))
    }
}

impl Transport for ProcessingPayload {
    fn to_transport(&self) -> Value {
        json!({
            "steps": self
                .steps
                .iter()
                .map(|step| json!({
                    "name": step.name,
                    "actions": step
                        .actions
                        .iter()
                        .map(|action| action.to_transport())
                        .collect::<Vec<_>>(),
                }))
                .collect::<Vec<_>>(),
        })
    }

    fn from_transport(value: Value) -> Result<Self, TransportError> {
        serde_json::from_value(value).map_err(|e| TransportError::MalformedInput(e.to_string()))
    }
}

impl Transport for ProcessingResult {
    fn to_transport(&self) -> Value {
        json!({
            "id": self.id,
            "status": self.status,
            "steps": self
                .steps
                .iter()
                .map(|step| json!({
                    "name": step.name,
                    "actions": step
                        .actions
                        .iter()
                        .map(|action| json!({
                            "content": action.content,
                            "result": action.result,
                        }))
                        .collect::<Vec<_>>(),
                }))
                .collect::<Vec<_>>(),
        })
    }

    fn from_transport(value: Value) -> Result<Self, TransportError> {
        serde_json::from_value(value).map_err(|e| TransportError::MalformedInput(e.to_string()))
    }
}
