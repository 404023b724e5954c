//! # Durapipe Pipeline
//!
//! The processing pipeline registered into the Durapipe framework: the typed
//! payload model, the deterministic multi-step workflow, and its two
//! activities (per-action transform and final-result persistence).
//!
//! Steps execute strictly in input order; each step fans its actions out into
//! concurrent activity calls, waits for all of them, and short-circuits the
//! remaining steps on the first error. The assembled result always mirrors
//! the input payload's shape, whether or not execution reached every step.

pub mod activities;
pub mod model;
pub mod workflow;

pub use activities::{ActionProcessor, ShiftCipherProcessor};
pub use model::{
    ProcessingAction, ProcessingActionResult, ProcessingPayload, ProcessingResult,
    ProcessingStep, ProcessingStepResult, RunStatus,
};
pub use workflow::{
    register_units, register_units_with_processor, PipelineUnits, INVOKE_PROCESSOR,
    PROCESSING_WORKFLOW, SAVE_STATE, WORKFLOW_DONE,
};
