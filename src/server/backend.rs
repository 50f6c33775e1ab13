//! Indigo backend for the MCP framework
//!
//! Implements [`McpBackend`] over [`BridgeContext`]: registry definitions are
//! listed as protocol tools, tool outputs become `CallToolResult` content,
//! and event logs and prompts are served through the resource and prompt
//! hooks.

use super::context::BridgeContext;
use super::prompts;
use super::registry::ToolInvocation;
use crate::config::ServerConfig;
use crate::error::{ErrorReporter, IndigoError};
use crate::tools::ToolOutput;
use async_trait::async_trait;
use pulseengine_mcp_protocol::*;
use pulseengine_mcp_server::backend::{BackendError, McpBackend};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Framework errors carry only a category and a message
impl From<IndigoError> for BackendError {
    fn from(err: IndigoError) -> Self {
        match err {
            IndigoError::HostUnavailable(msg) | IndigoError::Timeout(msg) => {
                BackendError::connection(msg)
            }
            IndigoError::Config(msg) => BackendError::configuration(msg),
            IndigoError::UnknownTool(name) => {
                BackendError::not_supported(format!("Unknown tool: {name}"))
            }
            IndigoError::NotFound(msg) => BackendError::not_supported(msg),
            other => BackendError::internal(other.to_string()),
        }
    }
}

/// MCP backend serving the Indigo tools
#[derive(Clone)]
pub struct IndigoBackend {
    context: Arc<BridgeContext>,
}

impl IndigoBackend {
    pub fn new(context: Arc<BridgeContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.context
    }
}

/// Map a tool output onto protocol content.
///
/// Log references are returned as JSON text carrying the `file://` URI the
/// client passes to `resources/read`.
pub fn tool_result(output: &ToolOutput) -> CallToolResult {
    CallToolResult::success(vec![Content::text(output.to_display_text())])
}

/// Failed calls carry the structured API error as their text
pub fn tool_error_result(error: &IndigoError) -> CallToolResult {
    let body = ErrorReporter::format_api_error(error);
    CallToolResult::error_text(
        serde_json::to_string_pretty(&body).unwrap_or_else(|_| error.to_string()),
    )
}

/// Protocol arguments are optional; re-encode them as a plain JSON value
fn arguments_value<T: serde::Serialize>(
    arguments: &Option<T>,
) -> std::result::Result<Value, BackendError> {
    match arguments {
        Some(arguments) => serde_json::to_value(arguments)
            .map_err(|e| BackendError::internal(format!("Unreadable arguments: {e}"))),
        None => Ok(Value::Null),
    }
}

#[async_trait]
impl McpBackend for IndigoBackend {
    type Error = BackendError;
    type Config = ServerConfig;

    async fn initialize(config: Self::Config) -> std::result::Result<Self, Self::Error> {
        let context = BridgeContext::initialize(config)?;
        Ok(Self::new(Arc::new(context)))
    }

    fn get_server_info(&self) -> ServerInfo {
        let mcp = &self.context.config().mcp;
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: mcp.name.clone(),
                version: mcp.version.clone(),
            },
            instructions: Some(mcp.instructions.clone()),
        }
    }

    async fn health_check(&self) -> std::result::Result<(), Self::Error> {
        if self.context.is_running() {
            Ok(())
        } else {
            Err(BackendError::internal("server is shutting down"))
        }
    }

    async fn list_tools(
        &self,
        _params: PaginatedRequestParam,
    ) -> std::result::Result<ListToolsResult, Self::Error> {
        Ok(ListToolsResult {
            tools: self.context.tool_definitions(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParam,
    ) -> std::result::Result<CallToolResult, Self::Error> {
        debug!("Calling Indigo tool: {}", params.name);

        let arguments = arguments_value(&params.arguments)?;
        let invocation = ToolInvocation::new(params.name.clone(), arguments);
        match self.context.call_tool(invocation).await {
            Ok(output) => Ok(tool_result(&output)),
            Err(IndigoError::UnknownTool(name)) => Err(IndigoError::UnknownTool(name).into()),
            Err(e) => Ok(tool_error_result(&e)),
        }
    }

    async fn list_resources(
        &self,
        _params: PaginatedRequestParam,
    ) -> std::result::Result<ListResourcesResult, Self::Error> {
        // Event logs are reached through the references get_logs returns
        Ok(ListResourcesResult {
            resources: Vec::new(),
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        params: ReadResourceRequestParam,
    ) -> std::result::Result<ReadResourceResult, Self::Error> {
        debug!("Reading Indigo resource: {}", params.uri);

        let resource = self.context.read_resource(&params.uri).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: resource.uri,
                mime_type: Some(resource.mime_type),
                text: Some(resource.text),
                blob: None,
            }],
        })
    }

    async fn list_resource_templates(
        &self,
        _params: PaginatedRequestParam,
    ) -> std::result::Result<ListResourceTemplatesResult, Self::Error> {
        Ok(ListResourceTemplatesResult {
            resource_templates: Vec::new(),
            next_cursor: None,
        })
    }

    async fn list_prompts(
        &self,
        _params: PaginatedRequestParam,
    ) -> std::result::Result<ListPromptsResult, Self::Error> {
        let prompts = prompts::definitions()
            .into_iter()
            .map(|prompt| Prompt {
                name: prompt.name,
                description: Some(prompt.description),
                arguments: Some(
                    prompt
                        .arguments
                        .into_iter()
                        .map(|argument| PromptArgument {
                            name: argument.name,
                            description: Some(argument.description),
                            required: Some(argument.required),
                        })
                        .collect(),
                ),
            })
            .collect();

        Ok(ListPromptsResult {
            prompts,
            next_cursor: None,
        })
    }

    async fn get_prompt(
        &self,
        params: GetPromptRequestParam,
    ) -> std::result::Result<GetPromptResult, Self::Error> {
        info!("Rendering prompt: {}", params.name);

        let arguments = arguments_value(&params.arguments)?;
        let (description, text) =
            prompts::render(&params.name, arguments).map_err(|e| match e {
                IndigoError::Validation(_) => BackendError::configuration(e.to_string()),
                other => BackendError::from(other),
            })?;

        Ok(GetPromptResult {
            description: Some(description),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, text)],
        })
    }

    async fn subscribe(
        &self,
        params: SubscribeRequestParam,
    ) -> std::result::Result<(), Self::Error> {
        Err(BackendError::not_supported(format!(
            "Subscriptions are not supported: {}",
            params.uri
        )))
    }

    async fn unsubscribe(
        &self,
        params: UnsubscribeRequestParam,
    ) -> std::result::Result<(), Self::Error> {
        Err(BackendError::not_supported(format!(
            "Subscriptions are not supported: {}",
            params.uri
        )))
    }

    async fn complete(
        &self,
        _params: CompleteRequestParam,
    ) -> std::result::Result<CompleteResult, Self::Error> {
        Ok(CompleteResult {
            completion: Vec::new(),
        })
    }

    async fn set_level(
        &self,
        _params: SetLevelRequestParam,
    ) -> std::result::Result<(), Self::Error> {
        // Filtering is fixed at startup by the logging config
        Ok(())
    }

    async fn handle_custom_method(
        &self,
        method: &str,
        _params: Value,
    ) -> std::result::Result<Value, Self::Error> {
        warn!("Unknown custom method: {}", method);
        Err(BackendError::not_supported(format!("Unknown method: {method}")))
    }
}
