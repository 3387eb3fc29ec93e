//! Workflow execution runtime
//!
//! This crate holds the editable graph store, the registry that maps node
//! kinds to handlers, and the runner that executes one workflow run.

mod registry;
mod runner;
mod runtime;
mod store;

pub use registry::{NodeFactory, NodeRegistry, PassThroughHandler};
pub use runner::{RunHandle, RunReport, WorkflowRunner};
pub use runtime::{FlowRuntime, RuntimeConfig};
pub use store::{ConnectOutcome, GraphStore};
