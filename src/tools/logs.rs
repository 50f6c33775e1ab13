//! Indigo event log access

use super::{ToolContext, ToolOutput};
use crate::error::Result;
use crate::host::LogicalOperation;
use crate::server::models::LogParams;
use crate::validation::ToolParams;
use serde_json::Value;

/// Returns a reference to the log file for a date in the format YYYY-MM-DD.
///
/// The host is not contacted; the caller fetches the file separately.
pub async fn get_logs(context: &ToolContext, params: Value) -> Result<ToolOutput> {
    let LogParams { date } = LogParams::from_value(params, context.validation_options())?;
    context.perform(LogicalOperation::ReadLog { date }).await
}
