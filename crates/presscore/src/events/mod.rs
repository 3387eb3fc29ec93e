mod base;
mod trace;

pub use base::{EventBus, ExecutionEvent, RunId, RunState};
pub use trace::{LogEntry, LogStatus, NodeTrace, TraceLog, DEFAULT_MAX_LOG_ENTRIES};
