//! Serialization of the output map into the viewer's JSON contract.
//!
//! JSON has no encoding for a bare floating NaN, so missing numeric data is
//! exported as the string `"NaN"`, which the viewer recognises as "no data".
//! Three field classes get distinct treatment:
//!
//! - identity fields pass through untouched
//! - box-point fields apply a per-row all-or-nothing rule: a list cell with
//!   any missing element collapses to the one-element sentinel list
//! - everything else gets missing values (at any nesting depth) replaced by
//!   the sentinel string
//!
//! Fields are emitted in sorted key order so repeated exports of the same
//! plot are byte-identical.

use crate::{naming, GgmetError, Result};
use polars::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// The sanitized, JSON-ready form of a plot's output map.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct OutputDocument {
    fields: Map<String, Value>,
}

impl OutputDocument {
    /// The serialized rows of one output field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// All fields, sorted by name.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The document as one JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Write the document to `<base>.metabolism.json` and return the path.
    ///
    /// The double extension is part of the viewer contract; `base` may carry
    /// directory components but should not carry an extension of its own.
    pub fn write(&self, base: &str) -> Result<PathBuf> {
        let path = PathBuf::from(naming::data_file_path(base));
        let text = serde_json::to_string(&self.fields)
            .map_err(|e| GgmetError::IoError(format!("failed to serialize document: {}", e)))?;
        std::fs::write(&path, text).map_err(|e| {
            GgmetError::IoError(format!("failed to write {}: {}", path.display(), e))
        })?;
        Ok(path)
    }
}

/// Compact JSON rendering of the whole document.
impl std::fmt::Display for OutputDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.fields.clone()))
    }
}

/// Convert an output map into a sanitized document.
pub(crate) fn document_from(output: &HashMap<String, Series>) -> Result<OutputDocument> {
    // serde_json's Map is ordered by key, which fixes the field order
    let mut fields = Map::new();
    for (field, series) in output {
        let mut rows = Vec::with_capacity(series.len());
        for value in series.iter() {
            rows.push(any_value_to_json(value, field)?);
        }
        if naming::is_box_field(field) {
            rows = rows.into_iter().map(enforce_box_row).collect();
        }
        if !naming::is_identity_field(field) && !naming::is_variant_field(field) {
            rows = rows.into_iter().map(sanitize).collect();
        }
        fields.insert(field.clone(), Value::Array(rows));
    }
    Ok(OutputDocument { fields })
}

// ============================================================================
// Cell conversion
// ============================================================================

/// One dataframe cell as JSON. Missing values (nulls and floating NaNs)
/// become `Value::Null` at this stage; the sentinel sweep runs afterwards.
fn any_value_to_json(value: AnyValue, field: &str) -> Result<Value> {
    match value {
        AnyValue::Null => Ok(Value::Null),
        AnyValue::Boolean(b) => Ok(Value::Bool(b)),
        AnyValue::String(s) => Ok(Value::String(s.to_string())),
        AnyValue::StringOwned(s) => Ok(Value::String(s.to_string())),
        AnyValue::Float64(x) => Ok(float_to_json(x)),
        AnyValue::Float32(x) => Ok(float_to_json(f64::from(x))),
        AnyValue::Int8(i) => Ok(Value::from(i)),
        AnyValue::Int16(i) => Ok(Value::from(i)),
        AnyValue::Int32(i) => Ok(Value::from(i)),
        AnyValue::Int64(i) => Ok(Value::from(i)),
        AnyValue::UInt8(i) => Ok(Value::from(i)),
        AnyValue::UInt16(i) => Ok(Value::from(i)),
        AnyValue::UInt32(i) => Ok(Value::from(i)),
        AnyValue::UInt64(i) => Ok(Value::from(i)),
        AnyValue::List(inner) => inner
            .iter()
            .map(|element| any_value_to_json(element, field))
            .collect::<Result<Vec<Value>>>()
            .map(Value::Array),
        other => Err(GgmetError::DataError(format!(
            "field '{}' holds unsupported data type {}",
            field,
            other.dtype()
        ))),
    }
}

fn float_to_json(x: f64) -> Value {
    serde_json::Number::from_f64(x).map_or(Value::Null, Value::Number)
}

// ============================================================================
// Sanitization
// ============================================================================

fn sentinel() -> Value {
    Value::String(naming::NAN_SENTINEL.to_string())
}

/// Per-row validity for box-point fields: the viewer cannot place a partial
/// box, so any missing element invalidates the whole row.
fn enforce_box_row(row: Value) -> Value {
    match row {
        Value::Array(items) => {
            if items.iter().any(Value::is_null) {
                Value::Array(vec![sentinel()])
            } else {
                Value::Array(items)
            }
        }
        Value::Null => Value::Array(vec![sentinel()]),
        other => other,
    }
}

/// Replace missing values with the sentinel string at any nesting depth.
fn sanitize(value: Value) -> Value {
    match value {
        Value::Null => sentinel(),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_series(name: &str, rows: Vec<Series>) -> Series {
        Series::new(name.into(), rows)
    }

    #[test]
    fn test_missing_scalars_become_sentinel_strings() {
        let mut output = HashMap::new();
        output.insert(
            "colors".to_string(),
            Series::new("colors".into(), [Some(1.5), None, Some(f64::NAN)]),
        );
        let doc = document_from(&output).unwrap();
        let rows = doc.get("colors").unwrap().as_array().unwrap();
        assert_eq!(rows[0], Value::from(1.5));
        assert_eq!(rows[1], Value::String("NaN".to_string()));
        assert_eq!(rows[2], Value::String("NaN".to_string()));
    }

    #[test]
    fn test_nested_lists_are_sanitized_elementwise() {
        let mut output = HashMap::new();
        output.insert(
            "y".to_string(),
            list_series(
                "y",
                vec![
                    Series::new("".into(), [Some(1.0), None]),
                    Series::new("".into(), [Some(2.0), Some(3.0)]),
                ],
            ),
        );
        let doc = document_from(&output).unwrap();
        let rows = doc.get("y").unwrap().as_array().unwrap();
        let first = rows[0].as_array().unwrap();
        assert_eq!(first[0], Value::from(1.0));
        assert_eq!(first[1], Value::String("NaN".to_string()));
        let second = rows[1].as_array().unwrap();
        assert_eq!(second, &[Value::from(2.0), Value::from(3.0)]);
    }

    #[test]
    fn test_box_row_with_any_missing_element_collapses() {
        let mut output = HashMap::new();
        output.insert(
            "box_y".to_string(),
            list_series(
                "box_y",
                vec![
                    Series::new("".into(), [Some(1.0), Some(2.0)]),
                    Series::new("".into(), [Some(1.0), None]),
                ],
            ),
        );
        let doc = document_from(&output).unwrap();
        let rows = doc.get("box_y").unwrap().as_array().unwrap();
        assert_eq!(
            rows[0].as_array().unwrap(),
            &[Value::from(1.0), Value::from(2.0)]
        );
        assert_eq!(
            rows[1].as_array().unwrap(),
            &[Value::String("NaN".to_string())]
        );
    }

    #[test]
    fn test_variant_rows_follow_the_box_rule_but_skip_the_sweep() {
        let mut output = HashMap::new();
        output.insert(
            "box_variant".to_string(),
            list_series(
                "box_variant",
                vec![
                    Series::new("".into(), [Some("wt"), Some("ko")]),
                    Series::new("".into(), [Some("wt"), None]),
                ],
            ),
        );
        let doc = document_from(&output).unwrap();
        let rows = doc.get("box_variant").unwrap().as_array().unwrap();
        assert_eq!(
            rows[0].as_array().unwrap(),
            &[
                Value::String("wt".to_string()),
                Value::String("ko".to_string())
            ]
        );
        assert_eq!(
            rows[1].as_array().unwrap(),
            &[Value::String("NaN".to_string())]
        );
    }

    #[test]
    fn test_identity_fields_pass_through_untouched() {
        let mut output = HashMap::new();
        output.insert(
            "reactions".to_string(),
            Series::new("reactions".into(), ["ACKr", "PTAr"]),
        );
        let doc = document_from(&output).unwrap();
        assert_eq!(
            doc.get("reactions").unwrap(),
            &Value::Array(vec![
                Value::String("ACKr".to_string()),
                Value::String("PTAr".to_string())
            ])
        );
    }

    #[test]
    fn test_fields_are_emitted_in_sorted_order() {
        let mut output = HashMap::new();
        for field in ["sizes", "colors", "reactions"] {
            output.insert(field.to_string(), Series::new(field.into(), [1.0]));
        }
        let doc = document_from(&output).unwrap();
        let keys: Vec<&String> = doc.fields().keys().collect();
        assert_eq!(keys, ["colors", "reactions", "sizes"]);
    }

    #[test]
    fn test_write_appends_the_double_extension() {
        let mut output = HashMap::new();
        output.insert("colors".to_string(), Series::new("colors".into(), [1.0]));
        let doc = document_from(&output).unwrap();
        let base = std::env::temp_dir().join("ggmet_writer_test");
        let path = doc.write(base.to_str().unwrap()).unwrap();
        assert!(path.to_str().unwrap().ends_with(".metabolism.json"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("colors"));
        std::fs::remove_file(path).unwrap();
    }
}
