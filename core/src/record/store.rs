//! Record store trait
//!
//! Defines the interface of the backing store for both record kinds.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::query::Query;
use super::{Record, RecordId};
use crate::Result;

/// Response of a list query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of a single-record lookup; `data` is `None` when nothing matched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome for one record of a create/update/delete request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordResult {
    pub fn ok(data: Option<Record>) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Response of a create/update/delete request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<RecordResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MutationResponse {
    /// Per-record results that succeeded; empty when the request as a whole failed
    pub fn successes(&self) -> impl Iterator<Item = &RecordResult> {
        let ok = self.success;
        self.results.iter().filter(move |r| ok && r.success)
    }

    /// Data of the first successful result
    pub fn first_success(self) -> Option<Record> {
        if !self.success {
            return None;
        }
        self.results
            .into_iter()
            .find(|r| r.success)
            .map(|r| r.data.unwrap_or_default())
    }
}

/// Backing store for tasks and projects
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Query records of a table
    async fn fetch_records(&self, table: &str, query: &Query) -> Result<FetchResponse>;

    /// Look up one record, restricted to `fields` when non-empty
    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[String],
    ) -> Result<GetResponse>;

    /// Create records; the store assigns ids and timestamps
    async fn create_records(&self, table: &str, records: Vec<Record>) -> Result<MutationResponse>;

    /// Apply partial updates; every record must carry its `Id`
    async fn update_records(&self, table: &str, records: Vec<Record>) -> Result<MutationResponse>;

    /// Delete records by id
    async fn delete_records(&self, table: &str, ids: &[RecordId]) -> Result<MutationResponse>;

    /// Short backend name for health output and logs
    fn backend_name(&self) -> &'static str;
}
