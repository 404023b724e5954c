//! Unit registration wiring for the Durapipe binary.

use std::sync::Arc;

use tracing::info;

use durapipe_core::UnitRegistry;
use durapipe_pipeline::{register_units, PipelineUnits};
use durapipe_protocols::StateStore;
use durapipe_runtime::LocalEngine;

/// Build a local engine with the processing pipeline's units attached.
pub(crate) fn build_engine(
    store: Arc<dyn StateStore>,
) -> anyhow::Result<(LocalEngine, PipelineUnits)> {
    let registry = UnitRegistry::new();
    let units = register_units(&registry, store)?;

    let engine = LocalEngine::new();
    registry.attach(&engine)?;
    info!(
        "Registered {} workflow(s) and {} activity(ies)",
        registry.workflow_count(),
        registry.activity_count()
    );

    Ok((engine, units))
}
