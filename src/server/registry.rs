//! Explicit tool registry
//!
//! Tools are registered when the server context is built, never as a side
//! effect of loading a module. Each entry pairs the advertised protocol
//! [`Tool`] (with a JSON schema generated from the parameter model) with its
//! handler.

use super::models::{
    BrightnessParams, GetDeviceParams, ListDevicesParams, LogParams, NoParams, PowerParams,
};
use crate::error::{IndigoError, Result};
use crate::tools::{devices, folders, logs, ToolContext, ToolOutput};
use futures::future::{BoxFuture, FutureExt};
use pulseengine_mcp_protocol::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

/// One inbound tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    /// Parameter object, or a string holding an encoded one
    #[serde(default)]
    pub parameters: Value,
}

impl ToolInvocation {
    pub fn new<S: Into<String>>(tool_name: S, parameters: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters,
        }
    }
}

type ToolHandler =
    Arc<dyn Fn(ToolContext, Value) -> BoxFuture<'static, Result<ToolOutput>> + Send + Sync>;

struct RegisteredTool {
    definition: Tool,
    handler: ToolHandler,
}

/// Name-indexed set of callable tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Indigo folder, device and log tools
    pub fn with_indigo_tools() -> Result<Self> {
        let mut registry = Self::new();

        registry.register::<NoParams, _, _>(
            "list_folders",
            "Returns the folders in Indigo.",
            |ctx, params| async move { folders::list_folders(&ctx, params).await },
        )?;
        registry.register::<ListDevicesParams, _, _>(
            "list_devices",
            "Returns a list of all devices in a given folder.",
            |ctx, params| async move { devices::list_devices(&ctx, params).await },
        )?;
        registry.register::<GetDeviceParams, _, _>(
            "get_device",
            "Gets information about a device. Returns an empty list if the device does not exist.",
            |ctx, params| async move { devices::get_device(&ctx, params).await },
        )?;
        registry.register::<PowerParams, _, _>(
            "turn_device_on_or_off",
            "Turns a device on or off.",
            |ctx, params| async move { devices::turn_device_on_or_off(&ctx, params).await },
        )?;
        registry.register::<BrightnessParams, _, _>(
            "set_device_brightness",
            "Sets a device's brightness (assuming it has a brightness characteristic).",
            |ctx, params| async move { devices::set_device_brightness(&ctx, params).await },
        )?;
        registry.register::<LogParams, _, _>(
            "get_logs",
            "Returns the log file for a given date in the format YYYY-MM-DD.",
            |ctx, params| async move { logs::get_logs(&ctx, params).await },
        )?;

        Ok(registry)
    }

    /// Register a tool whose input schema is generated from `P`.
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register<P, F, Fut>(&mut self, name: &str, description: &str, handler: F) -> Result<()>
    where
        P: JsonSchema,
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput>> + Send + 'static,
    {
        let definition: Tool = serde_json::from_value(json!({
            "name": name,
            "description": description,
            "inputSchema": input_schema::<P>(),
        }))
        .map_err(|e| IndigoError::internal(format!("Invalid tool definition for {name}: {e}")))?;
        let handler: ToolHandler = Arc::new(move |ctx, params| handler(ctx, params).boxed());

        self.tools
            .insert(name.to_string(), RegisteredTool { definition, handler });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Protocol tool definitions in name order
    pub fn definitions(&self) -> Vec<Tool> {
        self.tools
            .values()
            .map(|tool| tool.definition.clone())
            .collect()
    }

    /// Route an invocation to its handler
    pub async fn dispatch(
        &self,
        context: &ToolContext,
        invocation: ToolInvocation,
    ) -> Result<ToolOutput> {
        let tool = self
            .tools
            .get(&invocation.tool_name)
            .ok_or_else(|| IndigoError::UnknownTool(invocation.tool_name.clone()))?;

        (tool.handler)(context.clone(), invocation.parameters).await
    }
}

fn input_schema<P: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(P);
    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| json!({"type": "object"}));

    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
        object.entry("properties").or_insert_with(|| json!({}));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indigo_tools_registered() {
        let registry = ToolRegistry::with_indigo_tools().unwrap();
        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "get_device",
                "get_logs",
                "list_devices",
                "list_folders",
                "set_device_brightness",
                "turn_device_on_or_off",
            ]
        );
    }

    #[test]
    fn test_schemas_are_objects() {
        let registry = ToolRegistry::with_indigo_tools().unwrap();
        for tool in registry.definitions() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema.get("$schema").is_none());
            assert!(tool.input_schema["properties"].is_object());
        }
    }
}
