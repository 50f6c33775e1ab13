//! Folder listing

use super::{ToolContext, ToolOutput};
use crate::error::Result;
use crate::host::LogicalOperation;
use crate::server::models::NoParams;
use crate::validation::ToolParams;
use serde_json::Value;

/// Returns the device folders in Indigo as indented JSON text
pub async fn list_folders(context: &ToolContext, params: Value) -> Result<ToolOutput> {
    NoParams::from_value(params, context.validation_options())?;
    context.perform(LogicalOperation::ListFolders).await
}
