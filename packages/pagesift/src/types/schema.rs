//! Caller-declared extraction schemas.
//!
//! A schema maps output field names to a closed set of type tags. Unknown
//! tags are rejected when the schema is built, not when it is used.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};

/// Declared type of one schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    /// Parse a type tag as it appears in schema JSON.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(FieldType::String),
            "number" => Some(FieldType::Number),
            "boolean" => Some(FieldType::Boolean),
            "array" => Some(FieldType::Array),
            "object" => Some(FieldType::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated extraction schema.
///
/// Field order is preserved so prompts and exports follow the caller's
/// declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    fields: IndexMap<String, FieldType>,
}

impl Schema {
    /// Build a schema from an already-typed field map.
    pub fn new(fields: IndexMap<String, FieldType>) -> ValidationResult<Self> {
        if fields.is_empty() {
            return Err(ValidationError::EmptySchema);
        }
        Ok(Self { fields })
    }

    /// Build a schema from JSON text of the form `{"field": "type", ...}`.
    pub fn from_json(json: &str) -> ValidationResult<Self> {
        let raw: IndexMap<String, String> =
            serde_json::from_str(json).map_err(ValidationError::MalformedSchema)?;

        let mut fields = IndexMap::with_capacity(raw.len());
        for (field, tag) in raw {
            let field_type =
                FieldType::parse(&tag).ok_or_else(|| ValidationError::UnknownFieldType {
                    field: field.clone(),
                    type_tag: tag.clone(),
                })?;
            fields.insert(field, field_type);
        }

        Self::new(fields)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether a field name is declared.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Declared type of a field, if present.
    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        self.fields.get(field).copied()
    }

    /// Iterate fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Example JSON scaffold for extraction prompts: `{"field": "<type>"}`.
    pub fn example_json(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, ty)| (name.clone(), Value::String(format!("<{}>", ty.as_str()))))
            .collect();
        Value::Object(map)
    }
}
