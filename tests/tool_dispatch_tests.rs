//! Tool dispatch tests against the mock Indigo host
//!
//! Exercises every tool end to end: parameter validation, script rendering,
//! host execution and result shaping.

use indigo_mcp_rust::host::ExecutionResult;
use indigo_mcp_rust::mock::{MockDevice, MockHostExecutor};
use indigo_mcp_rust::server::ToolInvocation;
use indigo_mcp_rust::tools::ToolOutput;
use indigo_mcp_rust::{IndigoError, ServerConfig};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};

mod common;
use common::{context_with, sample_context, test_config};

fn structured(output: ToolOutput) -> Value {
    match output {
        ToolOutput::Structured(value) => value,
        other => panic!("expected structured output, got {other:?}"),
    }
}

#[rstest]
#[case(1001)]
#[case(1002)]
#[case(2001)]
#[tokio::test]
async fn test_get_device_returns_single_match(#[case] device_id: i64) {
    let (context, _) = sample_context();

    let output = context
        .call_tool(ToolInvocation::new("get_device", json!({"device_id": device_id})))
        .await
        .unwrap();

    let devices = structured(output);
    let devices = devices.as_array().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["id"], device_id);
}

#[rstest]
#[case(json!({"device_id": 9999}))]
#[case(json!({"device_id": "4242"}))]
#[tokio::test]
async fn test_get_device_absent_is_empty_list(#[case] params: Value) {
    let (context, executor) = sample_context();

    let output = context
        .call_tool(ToolInvocation::new("get_device", params))
        .await
        .unwrap();

    assert_eq!(structured(output), json!([]));
    assert_eq!(executor.call_count(), 1);
}

#[tokio::test]
async fn test_list_devices_filters_by_folder() {
    let (context, _) = sample_context();

    let output = context
        .call_tool(ToolInvocation::new("list_devices", json!({"folder_id": 100})))
        .await
        .unwrap();

    assert_eq!(
        structured(output),
        json!([
            {"device_id": 1001, "device_name": "Ceiling Light"},
            {"device_id": 1002, "device_name": "Floor Lamp"},
        ])
    );
}

#[tokio::test]
async fn test_list_devices_accepts_encoded_parameters() {
    let (context, _) = sample_context();

    let output = context
        .call_tool(ToolInvocation::new(
            "list_devices",
            Value::String("{\"folder_id\": 200}".to_string()),
        ))
        .await
        .unwrap();

    let devices = structured(output);
    for device in devices.as_array().unwrap() {
        let keys: Vec<_> = device.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["device_id", "device_name"]);
    }
    assert_eq!(devices[0]["device_id"], 2001);
}

#[tokio::test]
async fn test_list_folders_returns_text() {
    let (context, _) = sample_context();

    let output = context
        .call_tool(ToolInvocation::new("list_folders", Value::Null))
        .await
        .unwrap();

    let ToolOutput::Text(text) = output else {
        panic!("expected text output");
    };
    let folders: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(folders[0]["name"], "Living Room");
    assert_eq!(folders[1]["id"], 200);
}

#[tokio::test]
async fn test_power_toggles_and_is_idempotent() {
    let (context, executor) = sample_context();

    for (state, expected) in [("on", true), ("on", true), ("off", false), ("on", true)] {
        let output = context
            .call_tool(ToolInvocation::new(
                "turn_device_on_or_off",
                json!({"device_id": 1002, "state": state}),
            ))
            .await
            .unwrap();

        assert_eq!(structured(output)["onState"], expected, "after {state}");
    }

    assert!(executor.device(1002).unwrap().on_state);
    assert_eq!(executor.call_count(), 4);
}

#[tokio::test]
async fn test_unrecognized_power_state_is_rejected_by_default() {
    let (context, executor) = sample_context();

    let err = context
        .call_tool(ToolInvocation::new(
            "turn_device_on_or_off",
            json!({"device_id": 1002, "state": "toggle"}),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, IndigoError::Validation(_)));
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn test_unrecognized_power_state_falls_back_to_off_when_lenient() {
    let mut config = ServerConfig::default();
    config.tools.strict_power_state = false;
    let executor = MockHostExecutor::new().with_device(MockDevice {
        on_state: true,
        ..MockDevice::relay(7, "Fan", 1)
    });
    let (context, _) = context_with(config, executor);

    let output = context
        .call_tool(ToolInvocation::new(
            "turn_device_on_or_off",
            json!({"device_id": 7, "state": "toggle"}),
        ))
        .await
        .unwrap();

    assert_eq!(structured(output)["onState"], false);
}

#[tokio::test]
async fn test_set_brightness() {
    let (context, _) = sample_context();

    let output = context
        .call_tool(ToolInvocation::new(
            "set_device_brightness",
            json!({"device_id": 1001, "brightness": 50, "delay": 0}),
        ))
        .await
        .unwrap();

    let record = structured(output);
    assert_eq!(record["brightness"], 50);
    assert_eq!(record["onState"], true);
}

#[tokio::test]
async fn test_set_brightness_requires_delay() {
    let (context, executor) = sample_context();

    let err = context
        .call_tool(ToolInvocation::new(
            "set_device_brightness",
            json!({"device_id": 1001, "brightness": 50}),
        ))
        .await
        .unwrap_err();

    let fields: Vec<_> = err.field_errors().iter().map(|f| f.field.clone()).collect();
    assert_eq!(fields, vec!["delay"]);
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn test_validation_reports_all_fields_at_once() {
    let (context, _) = sample_context();

    let err = context
        .call_tool(ToolInvocation::new(
            "set_device_brightness",
            json!({"device_id": "kitchen", "brightness": 300}),
        ))
        .await
        .unwrap_err();

    let fields: Vec<_> = err.field_errors().iter().map(|f| f.field.clone()).collect();
    assert_eq!(fields, vec!["device_id", "brightness", "delay"]);
}

#[tokio::test]
async fn test_host_failure_carries_stderr_without_retry() {
    let (context, executor) = sample_context();
    let stderr = "Traceback (most recent call last):\nindigo.ServerError: server not running\n";
    executor.push_result(ExecutionResult::failure(1, stderr));

    let err = context
        .call_tool(ToolInvocation::new("get_device", json!({"device_id": 1001})))
        .await
        .unwrap_err();

    match err {
        IndigoError::HostExecution {
            stderr: captured, ..
        } => assert_eq!(captured, stderr),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(executor.call_count(), 1);
}

#[tokio::test]
async fn test_missing_device_control_fails_with_host_error() {
    let (context, executor) = sample_context();

    let err = context
        .call_tool(ToolInvocation::new(
            "turn_device_on_or_off",
            json!({"device_id": 31337, "state": "on"}),
        ))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("31337 not found"));
    assert_eq!(executor.call_count(), 1);
}

#[tokio::test]
async fn test_brightness_on_relay_fails() {
    let (context, _) = sample_context();

    let err = context
        .call_tool(ToolInvocation::new(
            "set_device_brightness",
            json!({"device_id": 1002, "brightness": 10, "delay": 2}),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, IndigoError::HostExecution { .. }));
}

#[tokio::test]
async fn test_undecodable_output_is_decode_error() {
    let (context, executor) = sample_context();
    executor.push_result(ExecutionResult::success("Connected to Indigo Server v2024.2\n"));

    let err = context
        .call_tool(ToolInvocation::new("list_folders", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, IndigoError::Decode(_)));
    assert_eq!(executor.call_count(), 1);
}

#[tokio::test]
async fn test_get_logs_returns_reference_without_host() {
    let (context, executor) = sample_context();

    let output = context
        .call_tool(ToolInvocation::new("get_logs", json!({"date": "2024-01-15"})))
        .await
        .unwrap();

    let reference = output.as_resource().expect("resource reference");
    assert_eq!(reference.name, "indigo_log_file");
    assert!(reference.locator.contains("2024-01-15 Events.log"));
    assert_eq!(reference.description, "Indigo log file for 2024-01-15");
    assert_eq!(executor.call_count(), 0);
}

#[rstest]
#[case(json!({}))]
#[case(json!({"date": "../../../etc/passwd"}))]
#[case(json!({"date": 20240115}))]
#[tokio::test]
async fn test_get_logs_rejects_bad_dates(#[case] params: Value) {
    let (context, _) = sample_context();

    let err = context
        .call_tool(ToolInvocation::new("get_logs", params))
        .await
        .unwrap_err();

    assert!(matches!(err, IndigoError::Validation(_)));
}

#[tokio::test]
async fn test_unknown_tool() {
    let (context, executor) = sample_context();

    let err = context
        .call_tool(ToolInvocation::new("delete_device", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, IndigoError::UnknownTool(name) if name == "delete_device"));
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn test_scripts_never_contain_raw_arguments() {
    let (context, executor) = sample_context();
    let hostile = "on\" == \"on\":\n    indigo.server.stop()\n#";

    let _ = context
        .call_tool(ToolInvocation::new(
            "turn_device_on_or_off",
            json!({"device_id": 1001, "state": hostile}),
        ))
        .await;
    context
        .call_tool(ToolInvocation::new("list_devices", json!({"folder_id": "100"})))
        .await
        .unwrap();

    for payload in executor.payloads() {
        assert!(!payload.as_str().contains("indigo.server.stop"));
    }
    let request = executor.payloads()[0].embedded_request().unwrap();
    assert_eq!(
        request,
        json!({"operation": "list_devices", "arguments": {"folder_id": 100}})
    );
}

#[tokio::test]
async fn test_shutdown_rejects_new_calls() {
    let (context, executor) = sample_context();
    context.shutdown();

    let err = context
        .call_tool(ToolInvocation::new("list_folders", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, IndigoError::Mcp(_)));
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn test_read_log_resource() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("2024-01-15 Events.log"), "Jan 15 08:00:01 Started\n").unwrap();
    let (context, _) = context_with(test_config(dir.path()), MockHostExecutor::new());

    let output = context
        .call_tool(ToolInvocation::new("get_logs", json!({"date": "2024-01-15"})))
        .await
        .unwrap();
    let reference = output.as_resource().unwrap();

    let contents = context.read_resource(&reference.uri()).await.unwrap();
    assert_eq!(contents.text, "Jan 15 08:00:01 Started\n");
    assert_eq!(contents.mime_type, "text/plain");

    let missing = context
        .read_resource(&dir.path().join("2024-01-16 Events.log").to_string_lossy())
        .await
        .unwrap_err();
    assert!(matches!(missing, IndigoError::NotFound(_)));

    let outside = context.read_resource("/etc/passwd").await.unwrap_err();
    assert!(matches!(outside, IndigoError::NotFound(_)));
}

#[tokio::test]
async fn test_check_host_prints_folder_listing() {
    let (context, executor) = sample_context();

    let text = context.check_host().await.unwrap();

    let folders: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(folders[0]["name"], "Living Room");
    assert_eq!(executor.call_count(), 1);
}

#[tokio::test]
async fn test_check_host_reports_unreachable_host() {
    let (context, executor) = sample_context();
    executor.push_result(ExecutionResult::failure(
        1,
        "indigo.ServerError: server not running\n",
    ));

    let err = context.check_host().await.unwrap_err();

    assert!(matches!(err, IndigoError::HostExecution { .. }));
}
