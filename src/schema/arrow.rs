//! JSON Schema to Arrow schema conversion
//!
//! Maps the schema document's property types onto Arrow data types. String
//! properties map to `Utf8` regardless of format hints: logical temporal
//! values persist as their ISO-8601 text form.

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Field, Fields, Schema};

/// Convert a parsed schema document into an Arrow schema
pub fn to_arrow_schema(document: &JsonSchema) -> Result<Schema> {
    if document.json_type != JsonType::Object {
        return Err(Error::config(format!(
            "top-level schema type must be 'object', got '{}'",
            document.json_type
        )));
    }

    let fields: Result<Vec<Field>> = document
        .properties
        .iter()
        .map(|(name, property)| to_arrow_field(name, property, !document.is_required(name)))
        .collect();

    Ok(Schema::new(fields?))
}

fn to_arrow_field(name: &str, property: &SchemaProperty, optional: bool) -> Result<Field> {
    let nullable = optional || property.is_nullable();
    Ok(Field::new(name, to_arrow_type(property)?, nullable))
}

fn to_arrow_type(property: &SchemaProperty) -> Result<DataType> {
    let json_type = property
        .json_type
        .primary_type()
        .unwrap_or(JsonType::Null);

    match json_type {
        JsonType::Null => Ok(DataType::Null),
        JsonType::Boolean => Ok(DataType::Boolean),
        JsonType::Integer => Ok(DataType::Int64),
        JsonType::Number => Ok(DataType::Float64),
        JsonType::String => Ok(DataType::Utf8),
        JsonType::Array => {
            let item_type = match &property.items {
                Some(items) => to_arrow_type(items)?,
                None => DataType::Null,
            };
            Ok(DataType::List(std::sync::Arc::new(Field::new(
                "item", item_type, true,
            ))))
        }
        JsonType::Object => {
            let properties = property.properties.as_ref().ok_or_else(|| {
                Error::config("object property is missing nested 'properties'")
            })?;

            let fields: Result<Vec<Field>> = properties
                .iter()
                .map(|(name, nested)| to_arrow_field(name, nested, true))
                .collect();

            Ok(DataType::Struct(Fields::from(fields?)))
        }
    }
}
