//! Indigo host integration: script rendering and process execution

pub mod executor;
pub mod script;

pub use executor::{ExecutionResult, HostExecutor, ProcessHostExecutor};
pub use script::{LogicalOperation, OperationKind, PowerState, ScriptPayload, ScriptTemplateBuilder};
