use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Run error: {0}")]
    Run(#[from] RunError),
}

/// Failure of a single node. Aborts the branch the node belongs to.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Collaborator failed: {0}")]
    Collaborator(#[from] ServiceError),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Timeout after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Cancelled by stop request")]
    Cancelled,
}

impl NodeError {
    /// Missing-input error listing every payload key that was checked.
    pub fn missing_any(what: &str, checked: &[&str]) -> Self {
        NodeError::MissingInput(format!("{} (checked: {})", what, checked.join(", ")))
    }
}

/// Graph validity problems, detected before a run starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Workflow has no nodes")]
    EmptyGraph,

    #[error("Workflow has no trigger node")]
    NoTrigger,

    #[error("Runner already executed a run; create a new one")]
    AlreadyRun,
}

/// Import problems with a portable workflow document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Document has no 'nodes' field")]
    MissingNodes,

    #[error("Document field 'nodes' is not an array")]
    NodesNotArray,

    #[error("Document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Summary of a run that did not complete.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error("Node '{label}' ({node_id}) failed: {message}")]
    NodeFailed {
        node_id: String,
        label: String,
        message: String,
    },

    #[error("Run was stopped")]
    Stopped,
}

/// Failure reported by an external collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid service response: {0}")]
    Decode(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}
