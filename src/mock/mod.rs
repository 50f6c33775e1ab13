//! Mock implementations for testing
//!
//! [`MockHostExecutor`] stands in for `indigo-host`: it decodes the request
//! document embedded in each script and answers from an in-memory home.

use crate::error::Result;
use crate::host::{ExecutionResult, HostExecutor, LogicalOperation, PowerState, ScriptPayload};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A device in the mock home
#[derive(Debug, Clone, PartialEq)]
pub struct MockDevice {
    pub id: i64,
    pub name: String,
    pub folder_id: i64,
    pub on_state: bool,
    /// `None` for relays without a dimmer
    pub brightness: Option<u8>,
}

impl MockDevice {
    pub fn relay(id: i64, name: &str, folder_id: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            folder_id,
            on_state: false,
            brightness: None,
        }
    }

    pub fn dimmer(id: i64, name: &str, folder_id: i64) -> Self {
        Self {
            brightness: Some(0),
            ..Self::relay(id, name, folder_id)
        }
    }

    /// Record shaped like Indigo's `dict(device)`
    pub fn record(&self) -> Value {
        let mut record = json!({
            "id": self.id,
            "name": self.name,
            "folderId": self.folder_id,
            "onState": self.on_state,
            "enabled": true,
            "deviceTypeId": if self.brightness.is_some() { "dimmer" } else { "relay" },
        });
        if let Some(level) = self.brightness {
            record["brightness"] = json!(level);
        }
        record
    }
}

#[derive(Debug, Default)]
struct MockHome {
    folders: Vec<(i64, String)>,
    devices: Vec<MockDevice>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock Indigo host for testing
#[derive(Debug, Default)]
pub struct MockHostExecutor {
    home: Mutex<MockHome>,
    scripted: Mutex<VecDeque<ExecutionResult>>,
    payloads: Mutex<Vec<ScriptPayload>>,
    calls: AtomicUsize,
}

impl MockHostExecutor {
    /// Create an empty mock host
    pub fn new() -> Self {
        Self::default()
    }

    /// Two folders with a few lights each
    pub fn with_sample_home() -> Self {
        Self::new()
            .with_folder(100, "Living Room")
            .with_folder(200, "Garden")
            .with_device(MockDevice::dimmer(1001, "Ceiling Light", 100))
            .with_device(MockDevice::relay(1002, "Floor Lamp", 100))
            .with_device(MockDevice::relay(2001, "Path Lights", 200))
    }

    pub fn with_folder(self, id: i64, name: &str) -> Self {
        lock(&self.home).folders.push((id, name.to_string()));
        self
    }

    pub fn with_device(self, device: MockDevice) -> Self {
        lock(&self.home).devices.push(device);
        self
    }

    /// Return `result` for the next call instead of simulating it
    pub fn push_result(&self, result: ExecutionResult) {
        lock(&self.scripted).push_back(result);
    }

    /// Number of times the host was invoked
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Scripts received so far
    pub fn payloads(&self) -> Vec<ScriptPayload> {
        lock(&self.payloads).clone()
    }

    pub fn device(&self, id: i64) -> Option<MockDevice> {
        lock(&self.home).devices.iter().find(|d| d.id == id).cloned()
    }

    fn simulate(&self, operation: LogicalOperation) -> ExecutionResult {
        let mut home = lock(&self.home);

        let document = match operation {
            LogicalOperation::ListFolders => {
                let folders = home.folders.iter().map(|(id, name)| {
                    json!({"id": id, "name": name, "remoteDisplay": true})
                });
                Value::Array(folders.collect())
            }
            LogicalOperation::ListDevices { folder_id } => Value::Array(
                home.devices
                    .iter()
                    .filter(|d| d.folder_id == folder_id)
                    .map(|d| json!({"device_id": d.id, "device_name": d.name}))
                    .collect(),
            ),
            LogicalOperation::GetDevice { device_id } => Value::Array(
                home.devices
                    .iter()
                    .filter(|d| d.id == device_id)
                    .map(MockDevice::record)
                    .collect(),
            ),
            LogicalOperation::SetPower { device_id, state } => {
                let Some(device) = home.devices.iter_mut().find(|d| d.id == device_id) else {
                    return missing_device(device_id);
                };
                device.on_state = state == PowerState::On;
                if let Some(level) = device.brightness.as_mut() {
                    *level = if device.on_state { 100 } else { 0 };
                }
                device.record()
            }
            LogicalOperation::SetBrightness {
                device_id, level, ..
            } => {
                let Some(device) = home.devices.iter_mut().find(|d| d.id == device_id) else {
                    return missing_device(device_id);
                };
                if device.brightness.is_none() {
                    return ExecutionResult::failure(
                        1,
                        format!("TypeError: device \"{}\" is not a dimmer\n", device.name),
                    );
                }
                device.brightness = Some(level);
                device.on_state = level > 0;
                device.record()
            }
            LogicalOperation::ReadLog { .. } => {
                return ExecutionResult::failure(1, "read_log is not a host operation\n")
            }
        };

        match serde_json::to_string_pretty(&document) {
            Ok(stdout) => ExecutionResult::success(stdout),
            Err(e) => ExecutionResult::failure(1, e.to_string()),
        }
    }
}

fn missing_device(device_id: i64) -> ExecutionResult {
    ExecutionResult::failure(
        1,
        format!(
            "Traceback (most recent call last):\n  File \"<script>\", line 6\n\
             KeyError: 'id {device_id} not found in database'\n"
        ),
    )
}

#[async_trait]
impl HostExecutor for MockHostExecutor {
    async fn execute(&self, payload: &ScriptPayload) -> Result<ExecutionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.payloads).push(payload.clone());

        if let Some(result) = lock(&self.scripted).pop_front() {
            return Ok(result);
        }

        let operation = payload
            .embedded_request()
            .and_then(|request| serde_json::from_value::<LogicalOperation>(request).ok());

        Ok(match operation {
            Some(operation) => self.simulate(operation),
            None => ExecutionResult::failure(1, "SyntaxError: invalid syntax\n"),
        })
    }
}
