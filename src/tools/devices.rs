//! Device discovery and control
//!
//! Control tools return the device's full record as read back from the host
//! after the action, so the caller sees the resulting state.

use super::{ToolContext, ToolOutput};
use crate::error::Result;
use crate::host::LogicalOperation;
use crate::server::models::{BrightnessParams, GetDeviceParams, ListDevicesParams, PowerParams};
use crate::validation::ToolParams;
use serde_json::Value;
use tracing::info;

/// Returns `{device_id, device_name}` for every device in a folder
pub async fn list_devices(context: &ToolContext, params: Value) -> Result<ToolOutput> {
    let ListDevicesParams { folder_id } =
        ListDevicesParams::from_value(params, context.validation_options())?;
    context
        .perform(LogicalOperation::ListDevices { folder_id })
        .await
}

/// Returns a list holding the device's record, or an empty list if no
/// device has that id
pub async fn get_device(context: &ToolContext, params: Value) -> Result<ToolOutput> {
    let GetDeviceParams { device_id } =
        GetDeviceParams::from_value(params, context.validation_options())?;
    context
        .perform(LogicalOperation::GetDevice { device_id })
        .await
}

/// Turns a device on or off
pub async fn turn_device_on_or_off(context: &ToolContext, params: Value) -> Result<ToolOutput> {
    let PowerParams { device_id, state } =
        PowerParams::from_value(params, context.validation_options())?;
    info!(device_id, state = %state, "Switching device");
    context
        .perform(LogicalOperation::SetPower { device_id, state })
        .await
}

/// Sets a dimmer's brightness, optionally after a delay in seconds
pub async fn set_device_brightness(context: &ToolContext, params: Value) -> Result<ToolOutput> {
    let BrightnessParams {
        device_id,
        brightness,
        delay,
    } = BrightnessParams::from_value(params, context.validation_options())?;
    info!(device_id, brightness, delay, "Setting device brightness");
    context
        .perform(LogicalOperation::SetBrightness {
            device_id,
            level: brightness,
            delay: Some(delay),
        })
        .await
}
