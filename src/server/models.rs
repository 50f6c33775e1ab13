//! Request models for MCP tools and prompts
//!
//! The schemas advertised in `tools/list` are generated from these structs.

use crate::host::PowerState;
use crate::validation::{ParamReader, ToolParams};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tools that take no parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoParams {}

impl ToolParams for NoParams {
    fn read(_reader: &mut ParamReader<'_>) -> Option<Self> {
        Some(Self {})
    }
}

/// Parameters for `list_devices`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListDevicesParams {
    #[schemars(description = "Indigo folder id")]
    pub folder_id: i64,
}

impl ToolParams for ListDevicesParams {
    fn read(reader: &mut ParamReader<'_>) -> Option<Self> {
        Some(Self {
            folder_id: reader.id("folder_id")?,
        })
    }
}

/// Parameters for `get_device`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetDeviceParams {
    #[schemars(description = "Indigo device id")]
    pub device_id: i64,
}

impl ToolParams for GetDeviceParams {
    fn read(reader: &mut ParamReader<'_>) -> Option<Self> {
        Some(Self {
            device_id: reader.id("device_id")?,
        })
    }
}

/// Parameters for `turn_device_on_or_off`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PowerParams {
    #[schemars(description = "Indigo device id")]
    pub device_id: i64,
    #[schemars(description = "Requested state: \"on\" or \"off\"")]
    #[schemars(with = "String")]
    pub state: PowerState,
}

impl ToolParams for PowerParams {
    fn read(reader: &mut ParamReader<'_>) -> Option<Self> {
        let device_id = reader.id("device_id");
        let state = reader.power_state("state");
        Some(Self {
            device_id: device_id?,
            state: state?,
        })
    }
}

/// Parameters for `set_device_brightness`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BrightnessParams {
    #[schemars(description = "Indigo device id")]
    pub device_id: i64,
    #[schemars(description = "Brightness level, 0-100")]
    pub brightness: u8,
    #[schemars(description = "Delay in seconds before the change is applied")]
    pub delay: u32,
}

impl ToolParams for BrightnessParams {
    fn read(reader: &mut ParamReader<'_>) -> Option<Self> {
        let device_id = reader.id("device_id");
        let brightness = reader.percentage("brightness");
        let delay = reader.bounded_u32("delay", u32::MAX);
        Some(Self {
            device_id: device_id?,
            brightness: brightness?,
            delay: delay?,
        })
    }
}

/// Parameters for `get_logs`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LogParams {
    #[schemars(description = "Log date in the format YYYY-MM-DD")]
    pub date: String,
}

impl ToolParams for LogParams {
    fn read(reader: &mut ParamReader<'_>) -> Option<Self> {
        Some(Self {
            date: reader.date("date")?,
        })
    }
}

/// Arguments for the `analyze_data` prompt
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeDataParams {
    #[schemars(description = "Numeric data points to analyze")]
    pub data_points: Vec<f64>,
}

impl ToolParams for AnalyzeDataParams {
    fn read(reader: &mut ParamReader<'_>) -> Option<Self> {
        Some(Self {
            data_points: reader.number_list("data_points")?,
        })
    }
}
