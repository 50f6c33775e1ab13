//! MCP tool implementations for Indigo folders, devices and logs
//!
//! Each endpoint validates its parameters once, maps them to a
//! [`LogicalOperation`] and hands it to [`ToolContext::perform`].

pub mod adapter;
pub mod devices;
pub mod folders;
pub mod logs;

pub use adapter::{ResourceReference, ResultAdapter, ToolOutput};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::host::{HostExecutor, LogicalOperation, ScriptTemplateBuilder};
use crate::validation::ValidationOptions;
use std::sync::Arc;
use tracing::debug;

/// Shared tool context for all MCP tools
#[derive(Clone)]
pub struct ToolContext {
    /// Runs host scripts
    pub executor: Arc<dyn HostExecutor>,

    /// Renders host scripts
    pub builder: ScriptTemplateBuilder,

    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ToolContext {
    pub fn new(executor: Arc<dyn HostExecutor>, config: Arc<ServerConfig>) -> Self {
        Self {
            executor,
            builder: ScriptTemplateBuilder::new(),
            config,
        }
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            strict_power_state: self.config.tools.strict_power_state,
        }
    }

    /// Carry out one logical operation end to end
    pub async fn perform(&self, operation: LogicalOperation) -> Result<ToolOutput> {
        let kind = operation.kind();

        if let LogicalOperation::ReadLog { date } = &operation {
            let reference = ResourceReference::indigo_log(&self.config.logs.directory, date);
            return Ok(ResultAdapter::adapt_resource(reference));
        }

        let payload = self.builder.render(&operation)?;
        debug!(operation = %kind, script_bytes = payload.as_str().len(), "Running host script");

        let document = self.executor.run(&payload).await?;
        ResultAdapter::adapt(kind, document)
    }
}
