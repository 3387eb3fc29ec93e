//! Core abstractions for the content workflow engine
//!
//! This crate provides the node model, the kind catalog, the payload bag,
//! the collaborator contracts and the trace log that the runtime and the
//! node library build on.

mod error;
pub mod events;
mod graph;
pub mod kind;
mod node;
mod payload;
pub mod services;

pub use error::{DocumentError, FlowError, NodeError, RunError, ServiceError, WorkflowError};
pub use events::*;
pub use graph::{Node, NodeId, Position, WorkflowDocument, DOCUMENT_VERSION};
pub use kind::{KindSpec, NodeKind};
pub use node::{NodeContext, NodeHandler};
pub use payload::Payload;
pub use services::Services;

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
