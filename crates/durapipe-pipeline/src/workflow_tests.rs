//! Tests for error classification and result assembly.

use super::*;
use serde_json::json;

use crate::model::ProcessingStep;

#[test]
fn test_is_error_on_failed_handle() {
    assert!(is_error(&TaskHandle::failed("activity blew up")));
}

#[test]
fn test_is_error_on_error_marker_value() {
    assert!(is_error(&TaskHandle::completed(json!({ "error": "bad" }))));
}

#[test]
fn test_is_error_on_missing_value() {
    assert!(is_error(&TaskHandle::completed(json!(null))));
}

#[test]
fn test_is_error_false_on_plain_result() {
    assert!(!is_error(&TaskHandle::completed(json!("bcd"))));
    // Objects without the marker key are ordinary results.
    assert!(!is_error(&TaskHandle::completed(json!({ "ok": true }))));
}

#[test]
fn test_step_with_no_actions_is_vacuously_successful() {
    assert!(!step_has_errors(&[]));
}

#[test]
fn test_step_has_errors_mixes_channels() {
    let handles = vec![
        TaskHandle::completed(json!("fine")),
        TaskHandle::failed("broken"),
    ];
    assert!(step_has_errors(&handles));
}

fn two_step_payload() -> ProcessingPayload {
    ProcessingPayload {
        steps: vec![
            ProcessingStep::new(
                "s1",
                vec![ProcessingAction::new("abc"), ProcessingAction::new("def")],
            ),
            ProcessingStep::new("s2", vec![ProcessingAction::new("ghi")]),
        ],
    }
}

#[test]
fn test_assemble_result_full_run() {
    let payload = two_step_payload();
    let step_results = vec![
        vec![
            TaskHandle::completed(json!("bcd")),
            TaskHandle::completed(json!("efg")),
        ],
        vec![TaskHandle::completed(json!("hij"))],
    ];

    let result = assemble_result("wf-1", false, &payload, &step_results);
    assert_eq!(result.id, "wf-1");
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.steps[0].actions[0].result, Some(json!("bcd")));
    assert_eq!(result.steps[0].actions[1].result, Some(json!("efg")));
    assert_eq!(result.steps[1].actions[0].result, Some(json!("hij")));
}

#[test]
fn test_assemble_result_short_circuit_keeps_shape() {
    let payload = two_step_payload();
    // Only the first step executed; its second action carried the marker.
    let step_results = vec![vec![
        TaskHandle::completed(json!("bcd")),
        TaskHandle::completed(json!({ "error": "boom" })),
    ]];

    let result = assemble_result("wf-1", true, &payload, &step_results);
    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.steps[0].name, "s1");
    assert_eq!(result.steps[1].name, "s2");
    assert_eq!(
        result.steps[0].actions[1].result,
        Some(json!({ "error": "boom" }))
    );
    // The never-reached step keeps its action shape with no results.
    assert_eq!(result.steps[1].actions.len(), 1);
    assert_eq!(result.steps[1].actions[0].content, "ghi");
    assert_eq!(result.steps[1].actions[0].result, None);
}

#[test]
fn test_assemble_result_failed_handle_yields_none() {
    let payload = ProcessingPayload {
        steps: vec![ProcessingStep::new(
            "s1",
            vec![ProcessingAction::new("abc")],
        )],
    };
    let step_results = vec![vec![TaskHandle::failed("activity not found")]];

    let result = assemble_result("wf-1", true, &payload, &step_results);
    assert_eq!(result.steps[0].actions[0].result, None);
}

#[test]
fn test_assemble_result_empty_payload() {
    let payload = ProcessingPayload { steps: vec![] };
    let result = assemble_result("wf-1", false, &payload, &[]);
    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.steps.is_empty());
}
