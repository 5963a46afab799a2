//! Document model and the write seam between the seed writer and a backend.
//!
//! `main` wires in `FirestoreClient`; tests use `memory::MemoryStore`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::errors::SeedError;

/// A typed document field. Mirrors the value kinds the document database
/// distinguishes, including timestamps, which plain JSON cannot express.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                // u64 above i64::MAX and non-integral numbers
                None => FieldValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                FieldValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// One full-document write: `fields` replaces whatever is stored under `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

/// A backend that can replace a set of documents as one atomic unit.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replaces every document in `documents` inside `collection`, all or
    /// nothing. Returns the number of documents written.
    async fn commit_batch(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, SeedError>;
}
