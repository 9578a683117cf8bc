//! Task repository trait
//!
//! Defines the interface for task storage operations.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::{Task, TaskPriority, TaskStatus};
use crate::record::{Condition, Query, Record, RecordId, WhereGroup};
use crate::Result;

/// Repository interface for task CRUD operations
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// List tasks matching the query options; no match is an empty list
    async fn list(&self, options: Query) -> Result<Vec<Task>>;

    /// Get a task by ID
    async fn get(&self, id: RecordId) -> Result<Option<Task>>;

    /// Create a task from storage fields
    async fn create(&self, fields: Record) -> Result<Task>;

    /// Apply a partial update
    async fn update(&self, id: RecordId, fields: Record) -> Result<Task>;

    /// Delete a task by ID
    async fn delete(&self, id: RecordId) -> Result<bool>;

    /// Delete several tasks, returning how many were removed
    async fn delete_many(&self, ids: &[RecordId]) -> Result<usize>;

    /// Find tasks belonging to a project
    async fn find_by_project(&self, project_id: RecordId) -> Result<Vec<Task>> {
        self.list(Query::new().filter(Condition::equal_to("project", project_id)))
            .await
    }

    /// Find tasks by status
    async fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        self.list(Query::new().filter(Condition::exact_match("status", status.as_str())))
            .await
    }

    /// Find tasks by priority
    async fn find_by_priority(&self, priority: TaskPriority) -> Result<Vec<Task>> {
        self.list(Query::new().filter(Condition::exact_match("priority", priority.as_str())))
            .await
    }

    /// Tasks whose title or description contains the term
    async fn search(&self, term: &str) -> Result<Vec<Task>> {
        self.list(Query::new().group(WhereGroup::any_of([
            Condition::contains("title", term),
            Condition::contains("description", term),
        ])))
        .await
    }

    /// Tasks due before `today` that are not completed
    async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<Task>> {
        self.list(Query::new().group(WhereGroup::all_of([
            Condition::less_than("due_date", iso_date(today)),
            Condition::not_equal_to("status", TaskStatus::Completed.as_str()),
        ])))
        .await
    }

    /// Tasks due on `today`
    async fn find_due_today(&self, today: NaiveDate) -> Result<Vec<Task>> {
        self.list(Query::new().filter(Condition::exact_match("due_date", iso_date(today))))
            .await
    }
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
