//! HTTP record store client
//!
//! Talks JSON to a managed backend. Each table is addressed as
//! `{base_url}/tables/{table}`; requests carry the project id and public key
//! as headers.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, warn};

use super::query::Query;
use super::store::{FetchResponse, GetResponse, MutationResponse, RecordStore};
use super::{Record, RecordId};
use crate::error::Error;
use crate::Result;

pub const PROJECT_ID_HEADER: &str = "X-Project-Id";
pub const PUBLIC_KEY_HEADER: &str = "X-Public-Key";

/// Connection settings for the managed backend
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL, e.g. "https://api.example.com/v1"
    pub base_url: String,
    /// Project the records belong to
    pub project_id: String,
    /// Public API key sent with every request
    pub public_key: String,
}

/// Record store backed by a remote HTTP API
pub struct HttpRecordStore {
    config: HttpStoreConfig,
    client: reqwest::Client,
}

impl HttpStoreConfig {
    /// Reject credentials that cannot be sent as header values
    pub fn validate(&self) -> Result<()> {
        for (name, raw) in [
            (PROJECT_ID_HEADER, &self.project_id),
            (PUBLIC_KEY_HEADER, &self.public_key),
        ] {
            if HeaderValue::from_str(raw).is_err() {
                return Err(Error::Config(format!(
                    "{} value contains characters not allowed in a header",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl HttpRecordStore {
    pub fn new(config: HttpStoreConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured client (proxies, TLS roots, transport timeouts)
    pub fn with_client(config: HttpStoreConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, raw) in [
            (PROJECT_ID_HEADER, &self.config.project_id),
            (PUBLIC_KEY_HEADER, &self.config.public_key),
        ] {
            match HeaderValue::from_str(raw) {
                Ok(value) => {
                    headers.insert(name, value);
                }
                Err(_) => warn!("Dropping {} header: value is not a valid header", name),
            }
        }
        headers
    }

    fn table_url(&self, table: &str, suffix: &str) -> String {
        format!(
            "{}/tables/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(table),
            suffix
        )
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.client.request(method, url).headers(self.headers())
    }

    /// Send a request and decode the JSON body; non-2xx is a transport error
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Record store returned {}: {}", status, body);
            return Err(Error::Transport(format!(
                "record store returned {}: {}",
                status, body
            )));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_records(&self, table: &str, query: &Query) -> Result<FetchResponse> {
        let url = self.table_url(table, "query");
        self.send(self.request(Method::POST, url).json(query)).await
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[String],
    ) -> Result<GetResponse> {
        let url = self.table_url(table, &format!("records/{}", id));
        let mut request = self.request(Method::GET, url);
        if !fields.is_empty() {
            request = request.query(&[("fields", fields.join(","))]);
        }
        self.send(request).await
    }

    async fn create_records(&self, table: &str, records: Vec<Record>) -> Result<MutationResponse> {
        let url = self.table_url(table, "records");
        self.send(
            self.request(Method::POST, url)
                .json(&json!({ "records": records })),
        )
        .await
    }

    async fn update_records(&self, table: &str, records: Vec<Record>) -> Result<MutationResponse> {
        let url = self.table_url(table, "records");
        self.send(
            self.request(Method::PATCH, url)
                .json(&json!({ "records": records })),
        )
        .await
    }

    async fn delete_records(&self, table: &str, ids: &[RecordId]) -> Result<MutationResponse> {
        let url = self.table_url(table, "records");
        self.send(
            self.request(Method::DELETE, url)
                .json(&json!({ "RecordIds": ids })),
        )
        .await
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}
