//! Shapes decoded host documents into tool results

use crate::error::{IndigoError, Result};
use crate::host::OperationKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use url::Url;

/// Pointer to an artifact the caller fetches separately
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReference {
    pub name: String,
    pub description: String,
    /// Filesystem path of the artifact
    pub locator: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl ResourceReference {
    /// Reference to the Indigo event log for `date`
    pub fn indigo_log(directory: &Path, date: &str) -> Self {
        let path: PathBuf = directory.join(format!("{date} Events.log"));
        Self {
            name: "indigo_log_file".to_string(),
            description: format!("Indigo log file for {date}"),
            locator: path.to_string_lossy().into_owned(),
            mime_type: "text/plain".to_string(),
        }
    }

    /// `file://` URI for the locator, or the raw locator if it is not absolute
    pub fn uri(&self) -> String {
        Url::from_file_path(&self.locator)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| self.locator.clone())
    }
}

/// Value returned to a tool caller
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Decoded host document (list or mapping)
    Structured(Value),
    /// Pre-formatted text
    Text(String),
    /// Indirection to an external artifact
    Resource(ResourceReference),
}

impl ToolOutput {
    /// Text form shown to the agent
    pub fn to_display_text(&self) -> String {
        match self {
            ToolOutput::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ToolOutput::Text(text) => text.clone(),
            ToolOutput::Resource(reference) => {
                let link = json!({
                    "name": reference.name,
                    "description": reference.description,
                    "uri": reference.uri(),
                    "mimeType": reference.mime_type,
                });
                serde_json::to_string_pretty(&link).unwrap_or_else(|_| reference.locator.clone())
            }
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            ToolOutput::Structured(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceReference> {
        match self {
            ToolOutput::Resource(reference) => Some(reference),
            _ => None,
        }
    }
}

/// Normalizes host documents per operation
pub struct ResultAdapter;

impl ResultAdapter {
    /// Shape the decoded document produced by a host-backed operation.
    ///
    /// Folder listings are re-encoded as indented text; everything else is
    /// passed through. An empty `get_device` list means the device does not
    /// exist and is returned as-is.
    pub fn adapt(kind: OperationKind, document: Value) -> Result<ToolOutput> {
        match kind {
            OperationKind::ListFolders => {
                expect_array(kind, &document)?;
                Ok(ToolOutput::Text(serde_json::to_string_pretty(&document)?))
            }
            OperationKind::ListDevices | OperationKind::GetDevice => {
                expect_array(kind, &document)?;
                Ok(ToolOutput::Structured(document))
            }
            OperationKind::SetPower | OperationKind::SetBrightness => {
                if !document.is_object() {
                    return Err(IndigoError::decode(format!(
                        "{kind} expected a device record, got {}",
                        shape(&document)
                    )));
                }
                Ok(ToolOutput::Structured(document))
            }
            OperationKind::ReadLog => Err(IndigoError::internal(
                "read_log produces a resource reference, not a host document",
            )),
        }
    }

    /// Pass a resource reference through unchanged
    pub fn adapt_resource(reference: ResourceReference) -> ToolOutput {
        ToolOutput::Resource(reference)
    }
}

fn expect_array(kind: OperationKind, document: &Value) -> Result<()> {
    if document.is_array() {
        Ok(())
    } else {
        Err(IndigoError::decode(format!(
            "{kind} expected a list, got {}",
            shape(document)
        )))
    }
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
        _ => "a scalar",
    }
}
