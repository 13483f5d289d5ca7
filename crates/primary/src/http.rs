//! HTTP primary store client
//!
//! Talks to a Chroma-style REST API:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | get_all / probe | `GET  {base}/api/v1/vector_db/collections/{name}/embeddings` |
//! | delete_collection | `DELETE {base}/api/v1/vector_db/collections/{name}` |
//! | create_collection | `POST {base}/api/v1/vector_db/collections` with `{"name": ...}` |
//! | bulk_add | `POST {base}/api/v1/vector_db/collections/{name}/add_embeddings` |

use std::time::Duration;

use tracing::{debug, warn};
use ureq::http::Response;
use ureq::Body;
use vaultsync_core::{CollectionSnapshot, Error, Record, Result};

use crate::endpoint::Endpoint;
use crate::PrimaryStore;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Upper bound on a response body. A full collection dump can be large.
const MAX_RESPONSE_BYTES: u64 = 1 << 30;

/// How much of an error body to keep in error messages.
const ERROR_BODY_PREVIEW: usize = 200;

const API_PREFIX: &str = "/api/v1/vector_db/collections";

/// Primary store reached over HTTP.
pub struct HttpPrimaryStore {
    /// `{scheme}://{host}[:{port}]`
    base_url: String,
    agent: ureq::Agent,
}

impl HttpPrimaryStore {
    /// Create a client for `endpoint` with a global per-request timeout.
    pub fn new(endpoint: &Endpoint, timeout_ms: u64) -> Self {
        Self::with_base_url(&endpoint.base_url(), timeout_ms)
    }

    /// Create a client from an explicit base URL (e.g. "http://10.0.0.5:8000").
    pub fn with_base_url(base_url: &str, timeout_ms: u64) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(timeout_ms)))
            .http_status_as_error(false)
            .build();
        HttpPrimaryStore {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collections_url(&self) -> String {
        format!("{}{}", self.base_url, API_PREFIX)
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}{}/{}", self.base_url, API_PREFIX, collection)
    }

    fn embeddings_url(&self, collection: &str) -> String {
        format!("{}/embeddings", self.collection_url(collection))
    }

    fn add_url(&self, collection: &str) -> String {
        format!("{}/add_embeddings", self.collection_url(collection))
    }

    fn fetch_embeddings(&self, collection: &str) -> Result<Response<Body>> {
        self.agent
            .get(&self.embeddings_url(collection))
            .header("accept", "application/json")
            .call()
            .map_err(|e| transport_error("GET", &self.embeddings_url(collection), e))
    }

    fn post_json(&self, url: &str, body: &[u8]) -> Result<Response<Body>> {
        self.agent
            .post(url)
            .header("accept", "application/json")
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(|e| transport_error("POST", url, e))
    }
}

fn transport_error(method: &str, url: &str, e: ureq::Error) -> Error {
    Error::transient(format!("{} {} failed: {}", method, url, e))
}

fn read_body(response: &mut Response<Body>) -> Result<String> {
    response
        .body_mut()
        .with_config()
        .limit(MAX_RESPONSE_BYTES)
        .read_to_string()
        .map_err(|e| Error::transient(format!("failed to read response: {}", e)))
}

fn preview(text: &str) -> String {
    text.chars().take(ERROR_BODY_PREVIEW).collect()
}

/// Map a non-success status on a collection-scoped call.
fn status_error(status: u16, collection: &str, op: &str) -> Error {
    if status == 404 {
        Error::not_found(format!("collection '{}'", collection))
    } else {
        Error::transient(format!(
            "{} on collection '{}' returned status {}",
            op, collection, status
        ))
    }
}

impl PrimaryStore for HttpPrimaryStore {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn get_all(&self, collection: &str) -> Result<CollectionSnapshot> {
        let mut response = self.fetch_embeddings(collection)?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(status_error(status, collection, "get_all"));
        }

        let text = read_body(&mut response)?;
        let snapshot: CollectionSnapshot = serde_json::from_str(&text).map_err(|e| {
            Error::malformed(
                format!("<collection {}>", collection),
                format!("invalid embeddings payload: {}", e),
            )
        })?;

        debug!(
            target: "vaultsync::primary",
            collection,
            ids = snapshot.ids.len(),
            embeddings = snapshot.embeddings.len(),
            metadatas = snapshot.metadatas.len(),
            documents = snapshot.documents.len(),
            "Retrieved collection payload"
        );
        Ok(snapshot)
    }

    fn probe(&self, collection: &str) -> Result<()> {
        let response = self.fetch_embeddings(collection)?;
        match response.status().as_u16() {
            200 => Ok(()),
            status => Err(status_error(status, collection, "probe")),
        }
    }

    fn delete_collection(&self, collection: &str) -> Result<bool> {
        let url = self.collection_url(collection);
        let response = self
            .agent
            .delete(&url)
            .header("accept", "application/json")
            .call()
            .map_err(|e| transport_error("DELETE", &url, e))?;
        match response.status().as_u16() {
            200 | 204 => Ok(true),
            404 => Ok(false),
            status => Err(status_error(status, collection, "delete")),
        }
    }

    fn create_collection(&self, collection: &str) -> Result<()> {
        let body = serde_json::to_vec(&serde_json::json!({ "name": collection }))?;
        let url = self.collections_url();
        let response = self.post_json(&url, &body)?;
        match response.status().as_u16() {
            200 | 201 => Ok(()),
            409 => {
                warn!(
                    target: "vaultsync::primary",
                    collection,
                    "Collection already exists, proceeding"
                );
                Ok(())
            }
            status => Err(status_error(status, collection, "create")),
        }
    }

    fn bulk_add(&self, collection: &str, records: &[Record]) -> Result<usize> {
        let body = serde_json::to_vec(records)?;
        let url = self.add_url(collection);
        let mut response = self.post_json(&url, &body)?;
        let status = response.status().as_u16();
        if status == 200 || status == 201 {
            return Ok(records.len());
        }

        let text = read_body(&mut response).unwrap_or_default();
        Err(Error::write_rejected(
            format!("collection '{}'", collection),
            format!("status {}: {}", status, preview(&text)),
        ))
    }
}
