//! Project data access over a record store

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, warn};

use super::model::Project;
use super::repository::ProjectRepository;
use crate::error::Error;
use crate::record::{pick_fields, Query, Record, RecordId, RecordStore, ID_FIELD};
use crate::Result;

/// Fields requested from the store when the caller names none
pub const PROJECT_FIELDS: &[&str] = &[
    "Name",
    "Tags",
    "Owner",
    "CreatedOn",
    "CreatedBy",
    "ModifiedOn",
    "ModifiedBy",
    "color",
];

/// The only fields ever sent on create/update
pub const PROJECT_UPDATEABLE_FIELDS: &[&str] = &["Name", "Tags", "Owner", "color"];

/// Project repository backed by a record store table
#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl ProjectService {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl ProjectRepository for ProjectService {
    async fn list(&self, options: Query) -> Result<Vec<Project>> {
        let query = Query::new().with_fields(PROJECT_FIELDS).merged(options);
        let response = self
            .store
            .fetch_records(&self.table, &query)
            .await
            .inspect_err(|e| error!("Error fetching projects: {}", e))?;

        if !response.success {
            warn!(
                "Project fetch reported failure: {}",
                response.message.as_deref().unwrap_or("no message")
            );
            return Ok(Vec::new());
        }

        Ok(response
            .data
            .iter()
            .filter_map(|record| {
                Project::from_record(record)
                    .inspect_err(|e| warn!("Skipping malformed project record: {}", e))
                    .ok()
            })
            .collect())
    }

    async fn get(&self, id: RecordId) -> Result<Option<Project>> {
        let fields: Vec<String> = PROJECT_FIELDS.iter().map(|f| f.to_string()).collect();
        let response = self
            .store
            .get_record_by_id(&self.table, id, &fields)
            .await
            .inspect_err(|e| error!("Error fetching project with ID {}: {}", id, e))?;

        match response.data {
            Some(record) if response.success => Project::from_record(&record).map(Some),
            _ => Ok(None),
        }
    }

    async fn create(&self, fields: Record) -> Result<Project> {
        let record = pick_fields(fields, PROJECT_UPDATEABLE_FIELDS);
        let response = self
            .store
            .create_records(&self.table, vec![record])
            .await
            .inspect_err(|e| error!("Error creating project: {}", e))?;

        match response.first_success() {
            Some(created) => Project::from_record(&created),
            None => {
                error!("Error creating project: store reported no successful result");
                Err(Error::Remote("Failed to create project".to_string()))
            }
        }
    }

    async fn update(&self, id: RecordId, fields: Record) -> Result<Project> {
        let mut record = pick_fields(fields, PROJECT_UPDATEABLE_FIELDS);
        record.insert(ID_FIELD.to_string(), id.into());
        let response = self
            .store
            .update_records(&self.table, vec![record])
            .await
            .inspect_err(|e| error!("Error updating project {}: {}", id, e))?;

        match response.first_success() {
            Some(updated) => Project::from_record(&updated),
            None => {
                error!("Error updating project {}: store reported no successful result", id);
                Err(Error::Remote("Failed to update project".to_string()))
            }
        }
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        Ok(self.delete_many(&[id]).await? > 0)
    }

    async fn delete_many(&self, ids: &[RecordId]) -> Result<usize> {
        let response = self
            .store
            .delete_records(&self.table, ids)
            .await
            .inspect_err(|e| error!("Error deleting projects {:?}: {}", ids, e))?;
        Ok(response.successes().count())
    }
}
