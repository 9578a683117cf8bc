//! Task data access over a record store
//!
//! Maps task CRUD intents onto the store's table and normalizes the records
//! it returns.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::model::Task;
use super::repository::TaskRepository;
use crate::error::Error;
use crate::record::{pick_fields, Query, Record, RecordId, RecordStore, ID_FIELD};
use crate::Result;

/// Fields requested from the store when the caller names none
pub const TASK_FIELDS: &[&str] = &[
    "Name",
    "Tags",
    "Owner",
    "CreatedOn",
    "CreatedBy",
    "ModifiedOn",
    "ModifiedBy",
    "title",
    "description",
    "due_date",
    "priority",
    "status",
    "project",
];

/// The only fields ever sent on create/update
pub const TASK_UPDATEABLE_FIELDS: &[&str] = &[
    "Name",
    "Tags",
    "Owner",
    "title",
    "description",
    "due_date",
    "priority",
    "status",
    "project",
];

/// Task repository backed by a record store table
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl TaskService {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn normalize(records: Vec<Record>) -> Vec<Task> {
        records
            .iter()
            .filter_map(|record| match Task::from_record(record) {
                Ok(task) => Some(task),
                Err(e) => {
                    warn!("Skipping malformed task record: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl TaskRepository for TaskService {
    async fn list(&self, options: Query) -> Result<Vec<Task>> {
        let query = Query::new().with_fields(TASK_FIELDS).merged(options);
        let response = self
            .store
            .fetch_records(&self.table, &query)
            .await
            .inspect_err(|e| error!("Error fetching tasks: {}", e))?;

        if !response.success {
            warn!(
                "Task fetch reported failure: {}",
                response.message.as_deref().unwrap_or("no message")
            );
            return Ok(Vec::new());
        }
        Ok(Self::normalize(response.data))
    }

    async fn get(&self, id: RecordId) -> Result<Option<Task>> {
        let fields: Vec<String> = TASK_FIELDS.iter().map(|f| f.to_string()).collect();
        let response = self
            .store
            .get_record_by_id(&self.table, id, &fields)
            .await
            .inspect_err(|e| error!("Error fetching task with ID {}: {}", id, e))?;

        match response.data {
            Some(record) if response.success => Task::from_record(&record).map(Some),
            _ => Ok(None),
        }
    }

    async fn create(&self, fields: Record) -> Result<Task> {
        let record = pick_fields(fields, TASK_UPDATEABLE_FIELDS);
        let response = self
            .store
            .create_records(&self.table, vec![record])
            .await
            .inspect_err(|e| error!("Error creating task: {}", e))?;

        let Some(created) = response.first_success() else {
            error!("Error creating task: store reported no successful result");
            return Err(Error::Remote("Failed to create task".to_string()));
        };
        let task = Task::from_record(&created)?;
        debug!("Created task {}", task.id);
        Ok(task)
    }

    async fn update(&self, id: RecordId, fields: Record) -> Result<Task> {
        let mut record = pick_fields(fields, TASK_UPDATEABLE_FIELDS);
        record.insert(ID_FIELD.to_string(), id.into());
        let response = self
            .store
            .update_records(&self.table, vec![record])
            .await
            .inspect_err(|e| error!("Error updating task {}: {}", id, e))?;

        let Some(updated) = response.first_success() else {
            error!("Error updating task {}: store reported no successful result", id);
            return Err(Error::Remote("Failed to update task".to_string()));
        };
        Task::from_record(&updated)
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        Ok(self.delete_many(&[id]).await? > 0)
    }

    async fn delete_many(&self, ids: &[RecordId]) -> Result<usize> {
        let response = self
            .store
            .delete_records(&self.table, ids)
            .await
            .inspect_err(|e| error!("Error deleting tasks {:?}: {}", ids, e))?;
        Ok(response.successes().count())
    }
}
