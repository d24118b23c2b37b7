use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of value types an argument can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentDataType {
    Bool,
    Int,
    Double,
    String,
    Date,
    File,
}

impl fmt::Display for ArgumentDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgumentDataType::Bool => "bool",
            ArgumentDataType::Int => "int",
            ArgumentDataType::Double => "double",
            ArgumentDataType::String => "string",
            ArgumentDataType::Date => "date",
            ArgumentDataType::File => "file",
        };
        f.write_str(name)
    }
}

/// A typed argument value as carried in an invocation document.
///
/// Values tag themselves with their data type on the wire (the `type`
/// field); a `file` additionally carries the original file name next to the
/// byte blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArgumentValue {
    Bool {
        value: bool,
    },
    Int {
        value: i64,
    },
    Double {
        value: f64,
    },
    String {
        value: String,
    },
    Date {
        value: DateTime<Utc>,
    },
    File {
        name: String,
        #[serde(with = "crate::encoding::base64_blob")]
        data: Vec<u8>,
    },
}

/// Raw text could not be converted to the wanted data type. The caller maps
/// this onto its own diagnostic, keeping the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotConvertible;

impl ArgumentValue {
    pub fn data_type(&self) -> ArgumentDataType {
        match self {
            ArgumentValue::Bool { .. } => ArgumentDataType::Bool,
            ArgumentValue::Int { .. } => ArgumentDataType::Int,
            ArgumentValue::Double { .. } => ArgumentDataType::Double,
            ArgumentValue::String { .. } => ArgumentDataType::String,
            ArgumentValue::Date { .. } => ArgumentDataType::Date,
            ArgumentValue::File { .. } => ArgumentDataType::File,
        }
    }

    /// Convert raw command-line text into a value of the wanted type.
    ///
    /// `bool` accepts the textual `true`/`false`, `int`/`double` use the
    /// native numeric parse, `date` takes an ISO-8601 timestamp, and `file`
    /// reads the path into bytes and keeps the base name. The read happens
    /// synchronously at conversion time.
    pub fn convert(raw: &str, data_type: ArgumentDataType) -> Result<ArgumentValue, NotConvertible> {
        match data_type {
            ArgumentDataType::Bool => raw
                .parse::<bool>()
                .map(|value| ArgumentValue::Bool { value })
                .map_err(|_| NotConvertible),
            ArgumentDataType::Int => raw
                .parse::<i64>()
                .map(|value| ArgumentValue::Int { value })
                .map_err(|_| NotConvertible),
            ArgumentDataType::Double => raw
                .parse::<f64>()
                .map(|value| ArgumentValue::Double { value })
                .map_err(|_| NotConvertible),
            ArgumentDataType::String => Ok(ArgumentValue::String {
                value: raw.to_string(),
            }),
            ArgumentDataType::Date => DateTime::parse_from_rfc3339(raw)
                .map(|value| ArgumentValue::Date {
                    value: value.with_timezone(&Utc),
                })
                .map_err(|_| NotConvertible),
            ArgumentDataType::File => {
                let path = Path::new(raw);
                let data = std::fs::read(path).map_err(|_| NotConvertible)?;
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .ok_or(NotConvertible)?;
                Ok(ArgumentValue::File { name, data })
            }
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgumentValue::Bool { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgumentValue::Int { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            ArgumentValue::Double { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgumentValue::String { value } => Some(value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            ArgumentValue::Date { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<(&str, &[u8])> {
        match self {
            ArgumentValue::File { name, data } => Some((name, data)),
            _ => None,
        }
    }
}
