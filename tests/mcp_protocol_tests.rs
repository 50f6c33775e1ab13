//! MCP backend tests through the framework's request types

use indigo_mcp_rust::mock::MockHostExecutor;
use indigo_mcp_rust::IndigoBackend;
use pretty_assertions::assert_eq;
use pulseengine_mcp_protocol::{
    CallToolRequestParam, CallToolResult, Content, GetPromptRequestParam, PaginatedRequestParam,
    ReadResourceRequestParam,
};
use pulseengine_mcp_server::backend::{BackendError, McpBackend};
use serde_json::{json, Value};

mod common;
use common::{context_with, sample_context, test_config};

fn sample_backend() -> IndigoBackend {
    let (context, _) = sample_context();
    IndigoBackend::new(context)
}

fn call(name: &str, arguments: Value) -> CallToolRequestParam {
    serde_json::from_value(json!({"name": name, "arguments": arguments})).unwrap()
}

fn first_page() -> PaginatedRequestParam {
    serde_json::from_value(json!({})).unwrap()
}

fn text_of(result: &CallToolResult) -> String {
    match &result.content[0] {
        Content::Text { text, .. } => text.clone(),
        other => panic!("expected text content, got {other:?}"),
    }
}

#[test]
fn test_server_info_uses_configured_identity() {
    let backend = sample_backend();

    let info = backend.get_server_info();

    assert_eq!(info.server_info.name, "IndigoAssistant");
    assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
    assert!(info
        .instructions
        .unwrap()
        .contains("Indigo Home Automation Server"));
}

#[tokio::test]
async fn test_list_tools_advertises_every_tool() {
    let backend = sample_backend();

    let tools = backend.list_tools(first_page()).await.unwrap().tools;

    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
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

    let brightness = tools
        .iter()
        .find(|t| t.name == "set_device_brightness")
        .unwrap();
    let required = brightness.input_schema["required"].as_array().unwrap();
    assert!(required.contains(&json!("delay")));
    assert_eq!(brightness.input_schema["type"], "object");
}

#[tokio::test]
async fn test_call_tool_returns_json_text() {
    let backend = sample_backend();

    let result = backend
        .call_tool(call("get_device", json!({"device_id": 1002})))
        .await
        .unwrap();

    assert_ne!(result.is_error, Some(true));
    let devices: Value = serde_json::from_str(&text_of(&result)).unwrap();
    assert_eq!(devices[0]["name"], "Floor Lamp");
}

#[tokio::test]
async fn test_call_tool_without_arguments() {
    let backend = sample_backend();
    let params: CallToolRequestParam =
        serde_json::from_value(json!({"name": "list_folders"})).unwrap();

    let result = backend.call_tool(params).await.unwrap();

    let folders: Value = serde_json::from_str(&text_of(&result)).unwrap();
    assert_eq!(folders[0]["name"], "Living Room");
}

#[tokio::test]
async fn test_tool_failure_is_error_result() {
    let (context, executor) = sample_context();
    let backend = IndigoBackend::new(context);

    let result = backend
        .call_tool(call(
            "set_device_brightness",
            json!({"device_id": 1001, "brightness": 101, "delay": 0}),
        ))
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(true));
    let body: Value = serde_json::from_str(&text_of(&result)).unwrap();
    assert_eq!(body["error"]["category"], "data");
    assert_eq!(body["error"]["fields"][0]["field"], "brightness");
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_tool_is_backend_error() {
    let backend = sample_backend();

    let err = backend
        .call_tool(call("reboot", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::NotSupported(msg) if msg.contains("reboot")));
}

#[tokio::test]
async fn test_get_logs_reference_reads_back_as_resource() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("2024-03-01 Events.log"),
        "Mar  1 07:00:00 Trigger\n",
    )
    .unwrap();
    let (context, _) = context_with(test_config(dir.path()), MockHostExecutor::new());
    let backend = IndigoBackend::new(context);

    let result = backend
        .call_tool(call("get_logs", json!({"date": "2024-03-01"})))
        .await
        .unwrap();
    let link: Value = serde_json::from_str(&text_of(&result)).unwrap();
    assert_eq!(link["name"], "indigo_log_file");
    let uri = link["uri"].as_str().unwrap().to_string();
    assert!(uri.starts_with("file://"));

    let read: ReadResourceRequestParam = serde_json::from_value(json!({ "uri": uri })).unwrap();
    let contents = backend.read_resource(read).await.unwrap().contents;
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].text.as_deref(), Some("Mar  1 07:00:00 Trigger\n"));
    assert_eq!(contents[0].mime_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn test_read_resource_outside_log_dir_fails() {
    let backend = sample_backend();
    let read: ReadResourceRequestParam =
        serde_json::from_value(json!({"uri": "file:///etc/passwd"})).unwrap();

    let err = backend.read_resource(read).await.unwrap_err();

    assert!(matches!(err, BackendError::NotSupported(_)));
}

#[tokio::test]
async fn test_prompts() {
    let backend = sample_backend();

    let prompts = backend.list_prompts(first_page()).await.unwrap().prompts;
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].name, "analyze_data");

    let request: GetPromptRequestParam = serde_json::from_value(json!({
        "name": "analyze_data",
        "arguments": {"data_points": "3, 1.5"},
    }))
    .unwrap();
    let rendered = backend.get_prompt(request).await.unwrap();

    assert_eq!(
        rendered.description.as_deref(),
        Some("Analysis request for numerical data")
    );
    let message = serde_json::to_value(&rendered.messages[0]).unwrap();
    assert_eq!(
        message["content"]["text"],
        "Please analyze these data points: 3.0, 1.5"
    );
}

#[tokio::test]
async fn test_unknown_prompt_is_rejected() {
    let backend = sample_backend();
    let request: GetPromptRequestParam =
        serde_json::from_value(json!({"name": "summarize"})).unwrap();

    assert!(backend.get_prompt(request).await.is_err());
}

#[tokio::test]
async fn test_health_check_follows_shutdown() {
    let backend = sample_backend();
    assert!(backend.health_check().await.is_ok());

    backend.context().shutdown();

    assert!(backend.health_check().await.is_err());
    let result = backend
        .call_tool(call("list_folders", json!({})))
        .await
        .unwrap();
    assert_eq!(result.is_error, Some(true));
}
