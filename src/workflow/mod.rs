//! Workflow payloads, branch aggregation and the stage transformations.

pub mod aggregate;
pub mod payload;
pub mod stages;

pub use aggregate::{merge, merge_payloads};
pub use payload::WorkflowPayload;
pub use stages::{failure_payload, start_workflow, WorkflowStages};
