// Fan-in of parallel branch payloads
use super::payload::WorkflowPayload;
use crate::error::Result;
use serde_json::Value;
use tracing::debug;

/// Merge raw branch payloads in list order.
///
/// Later branches win on colliding `metadata` or `outputs` keys. The order is
/// whatever the caller passes, not the order the branches finished in.
pub fn merge(branches: &[Value]) -> Result<WorkflowPayload> {
    let payloads = branches
        .iter()
        .cloned()
        .map(WorkflowPayload::from_value)
        .collect::<Result<Vec<_>>>()?;
    Ok(merge_payloads(&payloads))
}

/// Same as [`merge`] for already-decoded payloads.
pub fn merge_payloads(branches: &[WorkflowPayload]) -> WorkflowPayload {
    let mut merged = WorkflowPayload::default();

    for branch in branches {
        for (key, value) in &branch.metadata {
            if let Some(previous) = merged.metadata.insert(key.clone(), value.clone()) {
                if &previous != value {
                    debug!("metadata.{} overridden by later branch", key);
                }
            }
        }
        for (stage, result) in &branch.outputs {
            merged.outputs.insert(stage.clone(), result.clone());
        }
    }

    merged
}
