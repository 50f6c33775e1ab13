//! Tool parameter validation
//!
//! Parameters arrive untyped: either as a JSON object or as a string holding
//! an encoded JSON object. [`normalize_params`] turns both into a map, and
//! [`ParamReader`] extracts typed fields from it while collecting every
//! problem, so a caller sees all missing or malformed fields at once.

use crate::error::{FieldError, IndigoError, Result};
use crate::host::PowerState;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::warn;

/// Parameter map after normalization
pub type Params = Map<String, Value>;

/// Normalize raw tool parameters into a map
pub fn normalize_params(raw: Value) -> Result<Params> {
    match raw {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(IndigoError::validation(
                "parameters",
                format!("encoded parameters must be a JSON object, got {}", type_name(&other)),
            )),
            Err(e) => Err(IndigoError::validation(
                "parameters",
                format!("encoded parameters are not valid JSON: {e}"),
            )),
        },
        other => Err(IndigoError::validation(
            "parameters",
            format!("expected a JSON object, got {}", type_name(&other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Options that change how strictly fields are interpreted
#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    /// Reject power states other than on/off instead of treating them as off
    pub strict_power_state: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strict_power_state: true,
        }
    }
}

/// Collecting field extractor over a normalized parameter map
pub struct ParamReader<'a> {
    params: &'a Params,
    options: ValidationOptions,
    errors: Vec<FieldError>,
}

impl<'a> ParamReader<'a> {
    pub fn new(params: &'a Params, options: ValidationOptions) -> Self {
        Self {
            params,
            options,
            errors: Vec::new(),
        }
    }

    fn reject(&mut self, field: &str, problem: String) {
        self.errors.push(FieldError::new(field, problem));
    }

    fn required(&mut self, field: &str) -> Option<&'a Value> {
        let params = self.params;
        match params.get(field) {
            None | Some(Value::Null) => {
                self.reject(field, "is required".to_string());
                None
            }
            Some(value) => Some(value),
        }
    }

    /// An Indigo object id: an integer, or a string holding one
    pub fn id(&mut self, field: &str) -> Option<i64> {
        let value = self.required(field)?;
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.reject(field, format!("expected an integer id, got {}", describe(value)));
        }
        parsed
    }

    /// A non-negative integer no larger than `max`
    pub fn bounded_u32(&mut self, field: &str, max: u32) -> Option<u32> {
        let value = self.required(field)?;
        let parsed = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n <= u64::from(max) => Some(n as u32),
            _ => {
                self.reject(
                    field,
                    format!("expected an integer between 0 and {max}, got {}", describe(value)),
                );
                None
            }
        }
    }

    /// Brightness percentage, 0 through 100
    pub fn percentage(&mut self, field: &str) -> Option<u8> {
        self.bounded_u32(field, 100).map(|n| n as u8)
    }

    pub fn string(&mut self, field: &str) -> Option<String> {
        match self.required(field)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.reject(field, format!("expected a string, got {}", describe(other)));
                None
            }
        }
    }

    /// A calendar date in `YYYY-MM-DD` form, returned as given
    pub fn date(&mut self, field: &str) -> Option<String> {
        let text = self.string(field)?;
        match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            Ok(_) if text.len() == 10 => Some(text),
            _ => {
                self.reject(field, format!("expected a date in YYYY-MM-DD format, got {text:?}"));
                None
            }
        }
    }

    /// "on" or "off", case-insensitive
    pub fn power_state(&mut self, field: &str) -> Option<PowerState> {
        let text = self.string(field)?;
        match text.trim().to_lowercase().as_str() {
            "on" => Some(PowerState::On),
            "off" => Some(PowerState::Off),
            _ if !self.options.strict_power_state => {
                warn!(field, value = %text, "Unrecognized power state, treating as off");
                Some(PowerState::Off)
            }
            _ => {
                self.reject(field, format!("expected \"on\" or \"off\", got {text:?}"));
                None
            }
        }
    }

    /// A list of numbers
    pub fn number_list(&mut self, field: &str) -> Option<Vec<f64>> {
        let value = self.required(field)?;
        let Value::Array(items) = value else {
            self.reject(field, format!("expected an array of numbers, got {}", describe(value)));
            return None;
        };

        let mut numbers = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item.as_f64() {
                Some(n) => numbers.push(n),
                None => {
                    self.reject(
                        &format!("{field}[{index}]"),
                        format!("expected a number, got {}", describe(item)),
                    );
                    return None;
                }
            }
        }
        Some(numbers)
    }

    /// Fail with every collected problem, if any
    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(IndigoError::Validation(self.errors))
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        Value::Number(n) => n.to_string(),
        other => type_name(other).to_string(),
    }
}

/// Typed parameters for one tool, extracted in a single validation pass
pub trait ToolParams: Sized {
    /// Read every field; return `None` if any is unusable
    fn read(reader: &mut ParamReader<'_>) -> Option<Self>;

    /// Normalize `raw` and extract the parameters
    fn from_value(raw: Value, options: ValidationOptions) -> Result<Self> {
        let params = normalize_params(raw)?;
        let mut reader = ParamReader::new(&params, options);
        let parsed = Self::read(&mut reader);
        reader.finish()?;
        parsed.ok_or_else(|| IndigoError::internal("parameter extraction failed without errors"))
    }
}
