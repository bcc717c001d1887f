//! Request field schemas and typed coercion over raw JSON maps.
//!
//! Each operation declares a schema of named, typed fields. Absent fields
//! coerce to the type's zero value (`""` / `0`), which downstream code reads
//! as "unset". Scalars are decoded weakly (a stringified integer is accepted
//! for an int field), but anything else fails fast with an error naming the
//! field.

use serde_json::{Map, Value};

use std::fmt;

use crate::error::FieldError;

/// Type of a request field at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// JSON string; absent fields default to `""`.
    String,
    /// JSON integer; absent fields default to `0`.
    Int,
}

impl fmt::Display for FieldType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::String => "string",
            Self::Int => "int",
        })
    }
}

/// Declaration of one field in an operation's schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    /// Field name as it appears in the request data.
    pub name: &'static str,
    /// Declared type.
    pub field_type: FieldType,
    /// Default used when a string field is absent, instead of `""`.
    pub default: Option<&'static str>,
}

impl FieldSchema {
    /// Declares a string field.
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::String,
            default: None,
        }
    }

    /// Declares an integer field.
    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::Int,
            default: None,
        }
    }

    /// Sets the absent-field default for a string field.
    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }
}

/// Typed view over raw request data, checked against an operation's schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldData<'a> {
    raw: &'a Map<String, Value>,
    schema: &'static [FieldSchema],
}

impl<'a> FieldData<'a> {
    /// Wraps raw request data together with the schema to read it through.
    pub fn new(raw: &'a Map<String, Value>, schema: &'static [FieldSchema]) -> Self {
        Self { raw, schema }
    }

    fn schema_entry(&self, name: &str) -> Result<&'static FieldSchema, FieldError> {
        self.schema
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| FieldError::Undeclared(name.to_owned()))
    }

    /// Reads a string field, falling back to the schema default, then `""`.
    pub fn get_string(&self, name: &str) -> Result<String, FieldError> {
        let entry = self.schema_entry(name)?;
        debug_assert_eq!(entry.field_type, FieldType::String);
        match self.raw.get(name) {
            None | Some(Value::Null) => Ok(entry.default.unwrap_or("").to_owned()),
            Some(Value::String(value)) => Ok(value.clone()),
            Some(Value::Number(value)) => Ok(value.to_string()),
            Some(Value::Bool(value)) => Ok(value.to_string()),
            Some(_) => Err(FieldError::InvalidType {
                field: name.to_owned(),
                expected: FieldType::String,
            }),
        }
    }

    /// Reads an integer field; absent fields and empty strings read as `0`.
    pub fn get_int(&self, name: &str) -> Result<i64, FieldError> {
        let entry = self.schema_entry(name)?;
        debug_assert_eq!(entry.field_type, FieldType::Int);
        let invalid = || FieldError::InvalidType {
            field: name.to_owned(),
            expected: FieldType::Int,
        };
        match self.raw.get(name) {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(value)) => value.as_i64().ok_or_else(invalid),
            Some(Value::String(value)) if value.is_empty() => Ok(0),
            Some(Value::String(value)) => value.trim().parse().map_err(|_| invalid()),
            Some(_) => Err(invalid()),
        }
    }
}
