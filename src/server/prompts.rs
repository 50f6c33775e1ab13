//! Prompt templates

use super::models::AnalyzeDataParams;
use crate::error::{IndigoError, Result};
use crate::validation::{ToolParams, ValidationOptions};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct PromptDefinition {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
}

/// Creates a prompt asking for analysis of numerical data
pub fn analyze_data(data_points: &[f64]) -> String {
    let formatted = data_points
        .iter()
        .map(|point| format!("{point:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Please analyze these data points: {formatted}")
}

pub fn definitions() -> Vec<PromptDefinition> {
    vec![PromptDefinition {
        name: "analyze_data".to_string(),
        description: "Creates a prompt asking for analysis of numerical data.".to_string(),
        arguments: vec![PromptArgument {
            name: "data_points".to_string(),
            description: "Numbers to analyze, as a JSON array or comma-separated list".to_string(),
            required: true,
        }],
    }]
}

/// Render prompt `name` with client-supplied arguments
pub fn render(name: &str, arguments: Value) -> Result<(String, String)> {
    match name {
        "analyze_data" => {
            let params = AnalyzeDataParams::from_value(
                coerce_data_points(arguments),
                ValidationOptions::default(),
            )?;
            Ok((
                "Analysis request for numerical data".to_string(),
                analyze_data(&params.data_points),
            ))
        }
        other => Err(IndigoError::not_found(format!("Unknown prompt: {other}"))),
    }
}

/// Prompt arguments arrive as strings; accept "[1, 2]" and "1, 2"
fn coerce_data_points(mut arguments: Value) -> Value {
    let Some(Value::String(text)) = arguments.get("data_points").cloned() else {
        return arguments;
    };

    let parsed = serde_json::from_str::<Value>(&text)
        .ok()
        .filter(Value::is_array)
        .unwrap_or_else(|| {
            Value::Array(
                text.split(',')
                    .map(|part| {
                        part.trim()
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map(Value::Number)
                            .unwrap_or_else(|| Value::String(part.trim().to_string()))
                    })
                    .collect(),
            )
        });

    arguments["data_points"] = parsed;
    arguments
}
