//! Struct to map conversion
//!
//! Converts a [`StructValue`] into an ordered JSON mapping of field name to
//! value, used by formats that need a schema-free representation of a
//! structured record.
//!
//! Dispatch is a closed match over [`FieldValue`] variants. Date, time and
//! timestamp fields keep their native textual representation (ISO-8601)
//! instead of the integer backing value. Arrays convert element-wise; an
//! empty array becomes an empty JSON array.

use crate::error::{Error, Result};
use crate::record::{FieldValue, StructValue};
use crate::types::{JsonObject, JsonValue};
use base64::Engine;

/// Convert a struct into an ordered JSON object, field by field
pub fn struct_to_map(value: &StructValue) -> Result<JsonObject> {
    let mut map = JsonObject::new();
    for (name, field) in value.fields() {
        map.insert(name.to_string(), field_to_json(field)?);
    }
    Ok(map)
}

/// Convert a single field value into its JSON representation
pub fn field_to_json(value: &FieldValue) -> Result<JsonValue> {
    match value {
        FieldValue::Null => Ok(JsonValue::Null),
        FieldValue::Bool(b) => Ok(JsonValue::Bool(*b)),
        FieldValue::Int16(n) => Ok(JsonValue::from(*n)),
        FieldValue::Int32(n) => Ok(JsonValue::from(*n)),
        FieldValue::Int64(n) => Ok(JsonValue::from(*n)),
        FieldValue::Float32(f) => float_to_json(f64::from(*f)),
        FieldValue::Float64(f) => float_to_json(*f),
        FieldValue::String(s) => Ok(JsonValue::String(s.clone())),
        FieldValue::Bytes(bytes) => Ok(JsonValue::String(
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )),
        FieldValue::Date(date) => Ok(JsonValue::String(date.format("%Y-%m-%d").to_string())),
        FieldValue::Time(time) => Ok(JsonValue::String(time.format("%H:%M:%S%.3f").to_string())),
        FieldValue::Timestamp(ts) => Ok(JsonValue::String(ts.to_rfc3339())),
        FieldValue::Array(items) => {
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                array.push(field_to_json(item)?);
            }
            Ok(JsonValue::Array(array))
        }
        FieldValue::Struct(nested) => Ok(JsonValue::Object(struct_to_map(nested)?)),
    }
}

fn float_to_json(f: f64) -> Result<JsonValue> {
    serde_json::Number::from_f64(f)
        .map(JsonValue::Number)
        .ok_or_else(|| {
            Error::serialization(format!("float value {f} is not representable in JSON"))
        })
}
