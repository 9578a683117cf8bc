//! File-based record store implementation
//!
//! Keeps every table in memory and, when backed by a path, writes the whole
//! snapshot as JSON after each mutation. Query options are evaluated locally.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

use super::query::Query;
use super::store::{FetchResponse, GetResponse, MutationResponse, RecordResult, RecordStore};
use super::{record_id, Record, RecordId, CREATED_ON_FIELD, ID_FIELD, MODIFIED_ON_FIELD};
use crate::Result;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Table {
    next_id: RecordId,
    records: BTreeMap<RecordId, Record>,
}

/// Record store persisted to a single JSON file, or kept purely in memory
pub struct FileRecordStore {
    /// Path to the JSON file; `None` for an in-memory store
    path: Option<PathBuf>,
    /// Tables by name
    tables: RwLock<HashMap<String, Table>>,
}

impl FileRecordStore {
    /// Open a store backed by `path`
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tables = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: Some(path),
            tables: RwLock::new(tables),
        })
    }

    /// A store that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Persist the tables to disk
    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = {
            let tables = self.tables.read().await;
            serde_json::to_string_pretty(&*tables)?
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(path, content).await?;
        debug!("Persisted record store to {:?}", path);
        Ok(())
    }

    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn fetch_records(&self, table: &str, query: &Query) -> Result<FetchResponse> {
        let tables = self.tables.read().await;
        let data = match tables.get(table) {
            Some(t) => query.apply(t.records.values()),
            None => Vec::new(),
        };
        Ok(FetchResponse {
            success: true,
            data,
            message: None,
        })
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[String],
    ) -> Result<GetResponse> {
        let tables = self.tables.read().await;
        let data = tables
            .get(table)
            .and_then(|t| t.records.get(&id))
            .map(|record| Query::new().with_fields(fields).apply([record]))
            .and_then(|mut found| found.pop());
        Ok(GetResponse {
            success: true,
            data,
            message: None,
        })
    }

    async fn create_records(&self, table: &str, records: Vec<Record>) -> Result<MutationResponse> {
        let results = {
            let mut tables = self.tables.write().await;
            let table = tables.entry(table.to_string()).or_default();
            let now = Self::now();

            records
                .into_iter()
                .map(|mut record| {
                    table.next_id += 1;
                    let id = table.next_id;
                    record.insert(ID_FIELD.to_string(), id.into());
                    record.insert(CREATED_ON_FIELD.to_string(), now.clone().into());
                    record.insert(MODIFIED_ON_FIELD.to_string(), now.clone().into());
                    table.records.insert(id, record.clone());
                    RecordResult::ok(Some(record))
                })
                .collect::<Vec<_>>()
        };

        if !results.is_empty() {
            self.persist().await?;
        }
        Ok(MutationResponse {
            success: true,
            results,
            message: None,
        })
    }

    async fn update_records(&self, table: &str, records: Vec<Record>) -> Result<MutationResponse> {
        let results = {
            let mut tables = self.tables.write().await;
            let table = tables.entry(table.to_string()).or_default();
            let now = Self::now();

            records
                .into_iter()
                .map(|patch| {
                    let Some(id) = patch.get(ID_FIELD).and_then(record_id) else {
                        return RecordResult::failed("Record is missing its Id");
                    };
                    let Some(existing) = table.records.get_mut(&id) else {
                        return RecordResult::failed(format!("Record {} not found", id));
                    };
                    for (field, value) in patch {
                        if field != ID_FIELD && field != CREATED_ON_FIELD {
                            existing.insert(field, value);
                        }
                    }
                    existing.insert(MODIFIED_ON_FIELD.to_string(), now.clone().into());
                    RecordResult::ok(Some(existing.clone()))
                })
                .collect::<Vec<_>>()
        };

        if results.iter().any(|r| r.success) {
            self.persist().await?;
        }
        Ok(MutationResponse {
            success: true,
            results,
            message: None,
        })
    }

    async fn delete_records(&self, table: &str, ids: &[RecordId]) -> Result<MutationResponse> {
        let results = {
            let mut tables = self.tables.write().await;
            let table = tables.entry(table.to_string()).or_default();
            ids.iter()
                .map(|id| match table.records.remove(id) {
                    Some(_) => RecordResult::ok(None),
                    None => RecordResult::failed(format!("Record {} not found", id)),
                })
                .collect::<Vec<_>>()
        };

        if results.iter().any(|r| r.success) {
            self.persist().await?;
        }
        Ok(MutationResponse {
            success: true,
            results,
            message: None,
        })
    }

    fn backend_name(&self) -> &'static str {
        if self.path.is_some() {
            "file"
        } else {
            "memory"
        }
    }
}
