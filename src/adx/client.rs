//! ADX REST API client
//!
//! HTTP client for the two Azure Data Explorer REST endpoints the editor
//! needs: `/v1/rest/query` for query execution and `/v1/rest/mgmt` for
//! management commands (schema discovery, connectivity checks).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::response::QueryResponse;
use crate::schema::{Schema, SchemaError, SchemaResult, SchemaSource};
use crate::transport::{QueryTransport, TableResult, TransportError};

/// Configuration for the ADX client
#[derive(Debug, Clone, Deserialize)]
pub struct AdxConfig {
    /// Base URL of the cluster, e.g. "https://mycluster.westeurope.kusto.windows.net"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Database used when a query names none
    #[serde(default)]
    pub default_database: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Maximum retry attempts for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    1
}

impl Default for AdxConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_database: String::new(),
            request_timeout_ms: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// ADX REST API client
///
/// Implements both collaborator seams: [`SchemaSource`] for metadata and
/// [`QueryTransport`] for query execution.
pub struct AdxClient {
    client: Client,
    config: AdxConfig,
}

/// Request body for both REST endpoints
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    db: &'a str,
    csl: &'a str,
}

impl AdxClient {
    /// Create a new client with the given configuration
    pub fn new(config: AdxConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &AdxConfig {
        &self.config
    }

    /// Check that the cluster answers management commands
    pub async fn connectivity_check(&self) -> Result<(), TransportError> {
        self.request("/v1/rest/mgmt", ".show databases", &self.config.default_database)
            .await
            .map(|_| ())
    }

    /// Run a management command
    pub async fn management(
        &self,
        csl: &str,
        database: &str,
    ) -> Result<QueryResponse, TransportError> {
        self.request("/v1/rest/mgmt", csl, database).await
    }

    /// Send a request with bounded retry on transport-level failures
    ///
    /// HTTP error statuses are returned immediately; only connection-level
    /// failures are retried.
    async fn request(
        &self,
        path: &str,
        csl: &str,
        database: &str,
    ) -> Result<QueryResponse, TransportError> {
        let url = format!("{}{}", self.config.base_url, path);
        let request_id = uuid::Uuid::new_v4().to_string();
        let body = QueryRequest { db: database, csl };

        let mut last_error = TransportError::Unavailable("no attempts made".to_string());

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(250 * u64::from(attempt));
                tokio::time::sleep(delay).await;
                tracing::debug!(
                    request_id = %request_id,
                    attempt = attempt,
                    "retrying ADX request"
                );
            }

            match self.client.post(&url).json(&body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<QueryResponse>()
                            .await
                            .map_err(|error| TransportError::Decode(error.to_string()));
                    }

                    let message = response.text().await.unwrap_or_default();
                    tracing::warn!(
                        request_id = %request_id,
                        status = status.as_u16(),
                        "ADX request rejected"
                    );
                    return Err(TransportError::Query {
                        status: status.as_u16(),
                        message,
                    });
                }
                Err(error) => {
                    last_error = if error.is_timeout() {
                        TransportError::Timeout
                    } else {
                        TransportError::Unavailable(error.to_string())
                    };
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl QueryTransport for AdxClient {
    async fn execute(&self, query: &str, database: &str) -> Result<TableResult, TransportError> {
        let database = if database.is_empty() {
            self.config.default_database.as_str()
        } else {
            database
        };

        let response = self.request("/v1/rest/query", query, database).await?;
        response.into_table_result()
    }
}

#[async_trait]
impl SchemaSource for AdxClient {
    async fn fetch_schema(&self) -> SchemaResult<Schema> {
        let response = self
            .management(".show databases schema as json", &self.config.default_database)
            .await
            .map_err(schema_error)?;

        response.into_schema().map_err(schema_error)
    }
}

fn schema_error(error: TransportError) -> SchemaError {
    match error {
        TransportError::Unavailable(message) => SchemaError::Unavailable(message),
        TransportError::Timeout => SchemaError::Unavailable("request timed out".to_string()),
        TransportError::Query { status, message } => {
            SchemaError::Fetch(format!("status {}: {}", status, message))
        }
        TransportError::Decode(message) => SchemaError::Malformed(message),
    }
}
