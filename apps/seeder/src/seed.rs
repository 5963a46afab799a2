use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::catalog::VibeTemplate;
use crate::errors::SeedError;
use crate::store::{Document, DocumentStore, FieldValue};

pub const VIBES_COLLECTION: &str = "vibes";

/// Builds the stored form of a vibe: every catalog field plus
/// `createdAt`/`updatedAt`, both set to `now`.
///
/// `createdAt` is not preserved across runs. Each seed resets it.
pub fn to_document(vibe: &VibeTemplate, now: DateTime<Utc>) -> Result<Document, SeedError> {
    let value = serde_json::to_value(vibe)
        .map_err(|e| SeedError::InvalidCatalog(format!("cannot encode '{}': {e}", vibe.id)))?;

    let mut fields: BTreeMap<String, FieldValue> = match FieldValue::from(value) {
        FieldValue::Map(map) => map,
        _ => {
            return Err(SeedError::InvalidCatalog(format!(
                "'{}' did not encode to an object",
                vibe.id
            )))
        }
    };
    fields.insert("createdAt".to_string(), FieldValue::Timestamp(now));
    fields.insert("updatedAt".to_string(), FieldValue::Timestamp(now));

    Ok(Document {
        id: vibe.id.clone(),
        fields,
    })
}

/// Writes every vibe into `collection` as one atomic batch.
/// No retries and no per-record isolation: one failure fails the lot.
pub async fn seed_vibes(
    store: &dyn DocumentStore,
    collection: &str,
    vibes: &[VibeTemplate],
    now: DateTime<Utc>,
) -> Result<usize, SeedError> {
    let documents = vibes
        .iter()
        .map(|vibe| to_document(vibe, now))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Staged {} writes for {collection}", documents.len());

    let written = store.commit_batch(collection, documents).await?;

    info!("Committed {written} documents to {collection}");
    Ok(written)
}
