/// Firestore client — the only code in the seeder that talks to the database.
///
/// Constructed once by `main` and handed to the seed writer as a
/// `&dyn DocumentStore`. There is no process-wide connection state.
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::auth;
use crate::config::Config;
use crate::credentials::ServiceAccountKey;
use crate::errors::SeedError;
use crate::store::{Document, DocumentStore};

pub mod wire;

const FIRESTORE_URL: &str = "https://firestore.googleapis.com";
/// Bearer token the local emulator accepts in place of a real one.
const EMULATOR_TOKEN: &str = "owner";
/// Firestore refuses commits carrying more writes than this.
pub const MAX_BATCH_WRITES: usize = 500;
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default, rename = "writeResults")]
    write_results: Vec<serde_json::Value>,
    #[serde(default, rename = "commitTime")]
    commit_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreError {
    error: FirestoreErrorBody,
}

#[derive(Debug, Deserialize)]
struct FirestoreErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

pub struct FirestoreClient {
    http: Client,
    base_url: String,
    project_id: String,
    token: String,
}

impl FirestoreClient {
    /// Opens an authorised client for the key's project.
    /// Against the emulator no token exchange takes place.
    pub async fn connect(config: &Config, key: &ServiceAccountKey) -> Result<Self, SeedError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SeedError::Connection(format!("Failed to build HTTP client: {e}")))?;

        let client = match &config.emulator_host {
            Some(host) => {
                info!("Using Firestore emulator at {host}");
                Self::new(http, format!("http://{host}"), &key.project_id, EMULATOR_TOKEN)
            }
            None => {
                let token = auth::fetch_access_token(&http, key, Utc::now()).await?;
                Self::new(http, FIRESTORE_URL.to_string(), &key.project_id, token)
            }
        };

        info!("Firestore client ready for project {}", client.project_id);
        Ok(client)
    }

    pub fn new(
        http: Client,
        base_url: String,
        project_id: &str,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            token: token.into(),
        }
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }

    /// Fully qualified resource name of `collection/id`.
    pub fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.database_path())
    }

    fn commit_url(&self) -> String {
        format!("{}/v1/{}/documents:commit", self.base_url, self.database_path())
    }

    fn build_commit(&self, collection: &str, documents: &[Document]) -> wire::CommitRequest {
        wire::CommitRequest {
            writes: documents
                .iter()
                .map(|doc| wire::Write {
                    update: wire::WireDocument {
                        name: self.document_name(collection, &doc.id),
                        fields: wire::encode_fields(doc.fields.iter()),
                    },
                })
                .collect(),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn commit_batch(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, SeedError> {
        if documents.is_empty() {
            debug!("Nothing to commit to {collection}");
            return Ok(0);
        }
        if documents.len() > MAX_BATCH_WRITES {
            return Err(SeedError::Commit(format!(
                "batch of {} writes exceeds the limit of {MAX_BATCH_WRITES}",
                documents.len()
            )));
        }

        let body = self.build_commit(collection, &documents);

        let response = self
            .http
            .post(self.commit_url())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<FirestoreError>(&body)
                .map(|e| match e.error.status {
                    Some(code) => format!("{code}: {}", e.error.message),
                    None => e.error.message,
                })
                .unwrap_or(body);
            return Err(SeedError::CommitRejected {
                status: status.as_u16(),
                message,
            });
        }

        // A 2xx means the batch was applied, whatever the body looks like.
        match response.json::<CommitResponse>().await {
            Ok(committed) => debug!(
                "Commit to {collection} succeeded: write_results={}, commit_time={:?}",
                committed.write_results.len(),
                committed.commit_time
            ),
            Err(e) => warn!(
                "Commit to {collection} succeeded but the response was unreadable: {e}"
            ),
        }

        Ok(documents.len())
    }
}

/// Failures to connect mean nothing left the process. Anything later
/// (timeouts, resets) may have reached the service.
fn send_error(e: reqwest::Error) -> SeedError {
    if e.is_connect() || e.is_builder() {
        SeedError::Commit(e.to_string())
    } else {
        SeedError::CommitIndeterminate(e.to_string())
    }
}
