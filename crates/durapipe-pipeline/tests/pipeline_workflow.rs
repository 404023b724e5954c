//! End-to-end pipeline tests against the local engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use durapipe_core::UnitRegistry;
use durapipe_pipeline::{
    register_units, register_units_with_processor, ActionProcessor, ProcessingAction,
    ShiftCipherProcessor, PROCESSING_WORKFLOW, WORKFLOW_DONE,
};
use durapipe_protocols::error::{ContextError, StoreError};
use durapipe_protocols::StateStore;
use durapipe_runtime::{EngineError, LocalEngine, MemoryStateStore};

/// Ciphers like the default processor but fails for a designated content.
struct FailOn {
    trigger: String,
    cipher: ShiftCipherProcessor,
}

impl FailOn {
    fn new(trigger: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            cipher: ShiftCipherProcessor::default(),
        }
    }
}

#[async_trait]
impl ActionProcessor for FailOn {
    async fn process(&self, action: &ProcessingAction) -> Result<String, String> {
        if action.content == self.trigger {
            return Err(format!("cannot process {}", action.content));
        }
        self.cipher.process(action).await
    }
}

/// Ciphers after a delay proportional to content length, so longer inputs
/// complete later and a step's completion order scrambles.
struct SlowCipher {
    cipher: ShiftCipherProcessor,
}

#[async_trait]
impl ActionProcessor for SlowCipher {
    async fn process(&self, action: &ProcessingAction) -> Result<String, String> {
        tokio::time::sleep(Duration::from_millis(action.content.len() as u64 * 20)).await;
        self.cipher.process(action).await
    }
}

/// Counts save calls; replay must not add to the count.
struct CountingStore {
    inner: MemoryStateStore,
    saves: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStateStore::new(),
            saves: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StateStore for CountingStore {
    async fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }
}

/// Always refuses to save.
struct BrokenStore;

#[async_trait]
impl StateStore for BrokenStore {
    async fn save(&self, _key: &str, _value: &Value) -> Result<(), StoreError> {
        Err(StoreError::Backend("state store unavailable".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<Option<Value>, StoreError> {
        Ok(None)
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

fn build_engine(store: Arc<dyn StateStore>, processor: Arc<dyn ActionProcessor>) -> LocalEngine {
    let registry = UnitRegistry::new();
    register_units_with_processor(&registry, store, processor).unwrap();
    let engine = LocalEngine::new();
    registry.attach(&engine).unwrap();
    engine
}

#[tokio::test]
async fn test_single_step_cipher_completes() {
    // Scenario: one step, two actions, default shift-by-1 cipher.
    let store = Arc::new(MemoryStateStore::new());
    let engine = build_engine(
        store.clone(),
        Arc::new(ShiftCipherProcessor::default()),
    );

    let input = json!({
        "steps": [{ "name": "s1", "actions": [{ "content": "abc" }, { "content": "xyz" }] }]
    });
    let output = engine
        .run(PROCESSING_WORKFLOW, "wf-1", input)
        .await
        .unwrap();
    assert_eq!(output, json!(WORKFLOW_DONE));

    let persisted = store.get("wf-1").await.unwrap().unwrap();
    assert_eq!(
        persisted,
        json!({
            "id": "wf-1",
            "status": "Completed",
            "steps": [{
                "name": "s1",
                "actions": [
                    { "content": "abc", "result": "bcd" },
                    { "content": "xyz", "result": "yza" },
                ],
            }],
        })
    );
}

#[tokio::test]
async fn test_action_error_short_circuits_later_steps() {
    // Scenario: two steps, the first step's second action fails.
    let store = Arc::new(MemoryStateStore::new());
    let engine = build_engine(store.clone(), Arc::new(FailOn::new("boom")));

    let input = json!({
        "steps": [
            { "name": "s1", "actions": [{ "content": "abc" }, { "content": "boom" }] },
            { "name": "s2", "actions": [{ "content": "xyz" }, { "content": "pqr" }] },
        ]
    });
    let output = engine
        .run(PROCESSING_WORKFLOW, "wf-1", input)
        .await
        .unwrap();
    // Action errors are pipeline data, not an orchestration crash.
    assert_eq!(output, json!(WORKFLOW_DONE));

    let persisted = store.get("wf-1").await.unwrap().unwrap();
    assert_eq!(persisted["status"], json!("Failed"));
    assert_eq!(
        persisted["steps"][0]["actions"][0],
        json!({ "content": "abc", "result": "bcd" })
    );
    assert_eq!(
        persisted["steps"][0]["actions"][1],
        json!({ "content": "boom", "result": { "error": "cannot process boom" } })
    );
    // The skipped step keeps its full shape with null results.
    assert_eq!(
        persisted["steps"][1],
        json!({
            "name": "s2",
            "actions": [
                { "content": "xyz", "result": null },
                { "content": "pqr", "result": null },
            ],
        })
    );
}

#[tokio::test]
async fn test_empty_payload_completes() {
    let store = Arc::new(MemoryStateStore::new());
    let engine = build_engine(
        store.clone(),
        Arc::new(ShiftCipherProcessor::default()),
    );

    let output = engine
        .run(PROCESSING_WORKFLOW, "wf-1", json!({ "steps": [] }))
        .await
        .unwrap();
    assert_eq!(output, json!(WORKFLOW_DONE));

    let persisted = store.get("wf-1").await.unwrap().unwrap();
    assert_eq!(persisted["status"], json!("Completed"));
    assert_eq!(persisted["steps"], json!([]));
}

#[tokio::test]
async fn test_step_with_no_actions_is_successful() {
    let store = Arc::new(MemoryStateStore::new());
    let engine = build_engine(
        store.clone(),
        Arc::new(ShiftCipherProcessor::default()),
    );

    let input = json!({
        "steps": [
            { "name": "empty", "actions": [] },
            { "name": "s2", "actions": [{ "content": "abc" }] },
        ]
    });
    engine
        .run(PROCESSING_WORKFLOW, "wf-1", input)
        .await
        .unwrap();

    let persisted = store.get("wf-1").await.unwrap().unwrap();
    assert_eq!(persisted["status"], json!("Completed"));
    assert_eq!(
        persisted["steps"][1]["actions"][0]["result"],
        json!("bcd")
    );
}

#[tokio::test]
async fn test_stub_call_outside_workflow_raises_context_not_set() {
    let registry = UnitRegistry::new();
    let units = register_units(&registry, Arc::new(MemoryStateStore::new())).unwrap();

    let result = units.invoke_processor.call(&ProcessingAction::new("abc"));
    assert!(matches!(result, Err(ContextError::NotSet)));
}

#[tokio::test]
async fn test_result_order_is_input_order_not_completion_order() {
    let store = Arc::new(MemoryStateStore::new());
    let engine = build_engine(
        store.clone(),
        Arc::new(SlowCipher {
            cipher: ShiftCipherProcessor::default(),
        }),
    );

    // The first action sleeps longest and completes last.
    let input = json!({
        "steps": [{ "name": "s1", "actions": [
            { "content": "dddd" },
            { "content": "bb" },
            { "content": "a" },
        ] }]
    });
    engine
        .run(PROCESSING_WORKFLOW, "wf-1", input)
        .await
        .unwrap();

    let persisted = store.get("wf-1").await.unwrap().unwrap();
    let results: Vec<&Value> = persisted["steps"][0]["actions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|action| &action["result"])
        .collect();
    assert_eq!(results, vec![&json!("eeee"), &json!("cc"), &json!("b")]);
}

#[tokio::test]
async fn test_replay_is_deterministic_and_repeats_no_side_effects() {
    let store = Arc::new(CountingStore::new());
    let engine = build_engine(
        store.clone(),
        Arc::new(ShiftCipherProcessor::default()),
    );

    let input = json!({
        "steps": [{ "name": "s1", "actions": [{ "content": "abc" }, { "content": "xyz" }] }]
    });
    let first = engine
        .run(PROCESSING_WORKFLOW, "wf-1", input)
        .await
        .unwrap();
    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    let persisted_after_run = store.get("wf-1").await.unwrap();

    let replayed = engine.replay("wf-1").await.unwrap();
    assert_eq!(replayed, first);
    // The persistence activity was served from history, not re-invoked.
    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    assert_eq!(store.get("wf-1").await.unwrap(), persisted_after_run);
}

#[tokio::test]
async fn test_persistence_failure_fails_the_run() {
    let engine = build_engine(
        Arc::new(BrokenStore),
        Arc::new(ShiftCipherProcessor::default()),
    );

    let input = json!({
        "steps": [{ "name": "s1", "actions": [{ "content": "abc" }] }]
    });
    let result = engine.run(PROCESSING_WORKFLOW, "wf-1", input).await;
    assert!(
        matches!(result, Err(EngineError::WorkflowFailed(message)) if message.contains("persist"))
    );
}

#[tokio::test]
async fn test_malformed_input_fails_the_run() {
    let engine = build_engine(
        Arc::new(MemoryStateStore::new()),
        Arc::new(ShiftCipherProcessor::default()),
    );

    let result = engine
        .run(PROCESSING_WORKFLOW, "wf-1", json!({ "stages": [] }))
        .await;
    assert!(
        matches!(result, Err(EngineError::WorkflowFailed(message)) if message.contains("Malformed"))
    );
}

#[tokio::test]
async fn test_concurrent_instances_use_independent_contexts() {
    let store = Arc::new(MemoryStateStore::new());
    let engine = build_engine(
        store.clone(),
        Arc::new(ShiftCipherProcessor::default()),
    );

    let input_a = json!({ "steps": [{ "name": "s1", "actions": [{ "content": "abc" }] }] });
    let input_b = json!({ "steps": [{ "name": "s1", "actions": [{ "content": "xyz" }] }] });
    let (a, b) = tokio::join!(
        engine.run(PROCESSING_WORKFLOW, "wf-a", input_a),
        engine.run(PROCESSING_WORKFLOW, "wf-b", input_b),
    );
    a.unwrap();
    b.unwrap();

    let persisted_a = store.get("wf-a").await.unwrap().unwrap();
    let persisted_b = store.get("wf-b").await.unwrap().unwrap();
    assert_eq!(persisted_a["id"], json!("wf-a"));
    assert_eq!(persisted_a["steps"][0]["actions"][0]["result"], json!("bcd"));
    assert_eq!(persisted_b["id"], json!("wf-b"));
    assert_eq!(persisted_b["steps"][0]["actions"][0]["result"], json!("yza"));
}
