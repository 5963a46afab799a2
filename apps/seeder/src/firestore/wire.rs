//! Firestore REST v1 value encoding.

use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::store::FieldValue;

/// Body of `documents:commit`.
#[derive(Debug, Serialize)]
pub struct CommitRequest {
    pub writes: Vec<Write>,
}

/// A single `update` write. No `updateMask`, so the stored document is
/// replaced wholesale.
#[derive(Debug, Serialize)]
pub struct Write {
    pub update: WireDocument,
}

#[derive(Debug, Serialize)]
pub struct WireDocument {
    pub name: String,
    pub fields: Map<String, Value>,
}

pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Boolean(b) => json!({ "booleanValue": b }),
        // int64 travels as a decimal string
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": encode_double(*d) }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(ts) => json!({
            "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Micros, true)
        }),
        FieldValue::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        FieldValue::Map(fields) => json!({
            "mapValue": { "fields": encode_fields(fields.iter()) }
        }),
    }
}

pub fn encode_fields<'a, I>(fields: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a String, &'a FieldValue)>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

fn encode_double(d: f64) -> Value {
    if d.is_finite() {
        json!(d)
    } else if d.is_nan() {
        json!("NaN")
    } else if d > 0.0 {
        json!("Infinity")
    } else {
        json!("-Infinity")
    }
}
