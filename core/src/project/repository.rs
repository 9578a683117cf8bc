//! Project repository trait

use async_trait::async_trait;

use super::model::Project;
use crate::record::{Condition, Query, Record, RecordId};
use crate::Result;

/// Repository interface for project CRUD operations
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// List projects matching the query options; no match is an empty list
    async fn list(&self, options: Query) -> Result<Vec<Project>>;

    /// Get a project by ID
    async fn get(&self, id: RecordId) -> Result<Option<Project>>;

    /// Create a project from storage fields
    async fn create(&self, fields: Record) -> Result<Project>;

    /// Apply a partial update
    async fn update(&self, id: RecordId, fields: Record) -> Result<Project>;

    /// Delete a project by ID
    async fn delete(&self, id: RecordId) -> Result<bool>;

    /// Delete several projects, returning how many were removed
    async fn delete_many(&self, ids: &[RecordId]) -> Result<usize>;

    /// Projects whose name contains the term
    async fn search(&self, term: &str) -> Result<Vec<Project>> {
        self.list(Query::new().filter(Condition::contains("Name", term)))
            .await
    }
}
