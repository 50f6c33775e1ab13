//! Host script rendering
//!
//! Every host-backed operation is rendered from a constant script body. Caller
//! values never become script source: the operation is serialised to a JSON
//! request document, base64-encoded and embedded in a fixed prelude that
//! decodes it inside the host. The base64 alphabet cannot terminate the string
//! literal it sits in, so no argument can alter the script.

use crate::error::{IndigoError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested power state for a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::On => "on",
            PowerState::Off => "off",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of actions the bridge can perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "arguments", rename_all = "snake_case")]
pub enum LogicalOperation {
    ListFolders,
    ListDevices {
        folder_id: i64,
    },
    GetDevice {
        device_id: i64,
    },
    SetPower {
        device_id: i64,
        state: PowerState,
    },
    SetBrightness {
        device_id: i64,
        level: u8,
        #[serde(default)]
        delay: Option<u32>,
    },
    ReadLog {
        date: String,
    },
}

/// Discriminant of [`LogicalOperation`] without its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    ListFolders,
    ListDevices,
    GetDevice,
    SetPower,
    SetBrightness,
    ReadLog,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::ListFolders => "list_folders",
            OperationKind::ListDevices => "list_devices",
            OperationKind::GetDevice => "get_device",
            OperationKind::SetPower => "set_power",
            OperationKind::SetBrightness => "set_brightness",
            OperationKind::ReadLog => "read_log",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LogicalOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            LogicalOperation::ListFolders => OperationKind::ListFolders,
            LogicalOperation::ListDevices { .. } => OperationKind::ListDevices,
            LogicalOperation::GetDevice { .. } => OperationKind::GetDevice,
            LogicalOperation::SetPower { .. } => OperationKind::SetPower,
            LogicalOperation::SetBrightness { .. } => OperationKind::SetBrightness,
            LogicalOperation::ReadLog { .. } => OperationKind::ReadLog,
        }
    }

    /// Whether this operation needs a round trip through the host
    pub fn requires_host(&self) -> bool {
        !matches!(self, LogicalOperation::ReadLog { .. })
    }

    /// The request document the host script decodes
    ///
    /// Unspecified brightness delay is written as 0.
    pub fn request_document(&self) -> Result<serde_json::Value> {
        let normalized = match self {
            LogicalOperation::SetBrightness {
                device_id,
                level,
                delay: None,
            } => LogicalOperation::SetBrightness {
                device_id: *device_id,
                level: *level,
                delay: Some(0),
            },
            other => other.clone(),
        };
        Ok(serde_json::to_value(normalized)?)
    }
}

/// Script text consumed by the host process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPayload(String);

impl ScriptPayload {
    /// Wrap already-rendered script text
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Recover the request document embedded by [`ScriptTemplateBuilder`]
    pub fn embedded_request(&self) -> Option<serde_json::Value> {
        let start = self.0.find(REQUEST_MARKER)? + REQUEST_MARKER.len();
        let end = start + self.0[start..].find('"')?;
        let bytes = STANDARD.decode(&self.0[start..end]).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

const REQUEST_MARKER: &str = "base64.b64decode(\"";

const PRELUDE: &str = r#"import base64
import json

request = json.loads(base64.b64decode("{request}").decode("utf-8"))
args = request.get("arguments") or {}
"#;

const EPILOGUE: &str =
    "return (json.dumps(result, indent=4, cls=indigo.utils.IndigoJSONEncoder))\n";

const LIST_FOLDERS_BODY: &str = r#"result = []
for folder in indigo.devices.folders:
    result.append(dict(folder))
"#;

const LIST_DEVICES_BODY: &str = r#"folder_id = int(args["folder_id"])
result = []
for device in indigo.devices:
    if device.folderId == folder_id:
        result.append({
            "device_id": device.id,
            "device_name": device.name
        })
"#;

const GET_DEVICE_BODY: &str = r#"device_id = int(args["device_id"])
result = []
for device in indigo.devices:
    if device.id == device_id:
        result.append(dict(device))
"#;

const SET_POWER_BODY: &str = r#"device_id = int(args["device_id"])
if args["state"] == "on":
    indigo.device.turnOn(device_id)
else:
    indigo.device.turnOff(device_id)
result = dict(indigo.devices[device_id])
"#;

const SET_BRIGHTNESS_BODY: &str = r#"device_id = int(args["device_id"])
indigo.dimmer.setBrightness(device_id, value=int(args["level"]), delay=int(args.get("delay") or 0))
result = dict(indigo.devices[device_id])
"#;

/// Renders host scripts for logical operations
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptTemplateBuilder;

impl ScriptTemplateBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Render the script for `operation`.
    ///
    /// `ReadLog` is served without the host and is rejected here.
    pub fn render(&self, operation: &LogicalOperation) -> Result<ScriptPayload> {
        let body = match operation {
            LogicalOperation::ListFolders => LIST_FOLDERS_BODY,
            LogicalOperation::ListDevices { .. } => LIST_DEVICES_BODY,
            LogicalOperation::GetDevice { .. } => GET_DEVICE_BODY,
            LogicalOperation::SetPower { .. } => SET_POWER_BODY,
            LogicalOperation::SetBrightness { .. } => SET_BRIGHTNESS_BODY,
            LogicalOperation::ReadLog { .. } => {
                return Err(IndigoError::internal(
                    "read_log is resolved locally and has no host script",
                ))
            }
        };

        let document = serde_json::to_vec(&operation.request_document()?)?;
        let encoded = STANDARD.encode(document);

        let mut script =
            String::with_capacity(PRELUDE.len() + body.len() + EPILOGUE.len() + encoded.len());
        script.push_str(&PRELUDE.replace("{request}", &encoded));
        script.push_str(body);
        script.push_str(EPILOGUE);

        Ok(ScriptPayload(script))
    }
}
