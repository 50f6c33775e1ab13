//! Process-wide server context
//!
//! Owns the configuration, the host executor and the tool registry. Built
//! once at startup by [`BridgeContext::initialize`] and shut down explicitly.

use super::registry::{ToolInvocation, ToolRegistry};
use crate::config::ServerConfig;
use crate::error::{ErrorReporter, IndigoError, Result};
use crate::host::{HostExecutor, ProcessHostExecutor};
use crate::tools::{ToolContext, ToolOutput};
use pulseengine_mcp_protocol::Tool;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use url::Url;
use uuid::Uuid;

/// Text content of a resource read back by URI
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceText {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

/// Server-wide state shared by every request
pub struct BridgeContext {
    config: Arc<ServerConfig>,
    tools: ToolContext,
    registry: ToolRegistry,
    started_at: Instant,
    running: AtomicBool,
}

impl BridgeContext {
    /// Build the context with a process-spawning host executor
    pub fn initialize(config: ServerConfig) -> Result<Self> {
        let executor = Arc::new(ProcessHostExecutor::new(&config.host));
        Self::with_executor(config, executor)
    }

    /// Build the context around a caller-supplied executor
    pub fn with_executor(config: ServerConfig, executor: Arc<dyn HostExecutor>) -> Result<Self> {
        config.validate()?;

        let config = Arc::new(config);
        let registry = ToolRegistry::with_indigo_tools()?;

        info!(
            host = %config.host.executable,
            timeout_ms = config.host.timeout.as_millis() as u64,
            tools = registry.len(),
            "Indigo bridge initialized"
        );

        Ok(Self {
            tools: ToolContext::new(executor, config.clone()),
            config,
            registry,
            started_at: Instant::now(),
            running: AtomicBool::new(true),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn tool_definitions(&self) -> Vec<Tool> {
        self.registry.definitions()
    }

    /// Run one tool invocation to completion
    pub async fn call_tool(&self, invocation: ToolInvocation) -> Result<ToolOutput> {
        if !self.is_running() {
            return Err(IndigoError::mcp("server is shutting down"));
        }

        let request_id = Uuid::new_v4();
        let tool_name = invocation.tool_name.clone();
        let span = info_span!("tool_call", tool = %tool_name, request_id = %request_id);

        async {
            let started = Instant::now();
            let result = self.registry.dispatch(&self.tools, invocation).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(_) => info!(elapsed_ms, "Tool call completed"),
                Err(e) => ErrorReporter::log_error(e, "tool_dispatcher", &tool_name),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Read an Indigo event log referenced by `get_logs`.
    ///
    /// Only files named `<date> Events.log` directly inside the configured
    /// log directory are served.
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceText> {
        let path = if uri.starts_with("file://") {
            Url::parse(uri)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| IndigoError::not_found(format!("Invalid resource URI: {uri}")))?
        } else {
            PathBuf::from(uri)
        };

        let in_log_dir = path.parent() == Some(self.config.logs.directory.as_path());
        let is_event_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(" Events.log"));
        if !in_log_dir || !is_event_log {
            return Err(IndigoError::not_found(format!("Unknown resource: {uri}")));
        }

        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IndigoError::not_found(format!("Log file does not exist: {}", path.display()))
            } else {
                IndigoError::Io(e)
            }
        })?;

        Ok(ResourceText {
            uri: uri.to_string(),
            mime_type: "text/plain".to_string(),
            text,
        })
    }

    /// List folders once and return the text a caller would see.
    ///
    /// Used by the `check` subcommand to confirm the host is reachable.
    pub async fn check_host(&self) -> Result<String> {
        let output = self
            .call_tool(ToolInvocation::new("list_folders", serde_json::Value::Null))
            .await?;
        Ok(output.to_display_text())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop accepting tool calls
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!(uptime_seconds = self.uptime_seconds(), "Indigo bridge shut down");
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
