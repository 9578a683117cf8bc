//! Task model definitions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::Error;
use crate::record::{
    parse_tags, parse_timestamp, record_id, text_field, Record, RecordId, CREATED_ON_FIELD,
    ID_FIELD, MODIFIED_ON_FIELD,
};
use crate::Result;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    /// Icon name used by the front end
    pub fn icon(self) -> &'static str {
        match self {
            Self::Pending => "Clock",
            Self::InProgress => "Loader",
            Self::Completed => "CheckCircle",
        }
    }

    /// Status after a toggle-complete action
    pub fn toggled(self) -> Self {
        match self {
            Self::Completed => Self::Pending,
            _ => Self::Completed,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in-progress" | "in_progress" | "inprogress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(Error::InvalidInput(format!("unknown task status: {}", other))),
        }
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// Sort weight, higher sorts first
    pub fn weight(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Low => "ChevronDown",
            Self::Medium => "Minus",
            Self::High => "ChevronUp",
            Self::Urgent => "AlertTriangle",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(Error::InvalidInput(format!("unknown task priority: {}", other))),
        }
    }
}

/// A task as held by the application, normalized from the store's record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub project_id: Option<RecordId>,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a task value with the given id and title
    ///
    /// Tasks normally come from the store; this is for building expected
    /// values and fixtures.
    pub fn new(id: RecordId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            due_date: None,
            priority: TaskPriority::default(),
            status: TaskStatus::default(),
            project_id: None,
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the project id
    pub fn with_project_id(mut self, project_id: RecordId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Normalize a store record into a task
    ///
    /// The title is taken from `title`, falling back to `Name`. Unknown
    /// priority/status values map to medium/pending.
    pub fn from_record(record: &Record) -> Result<Self> {
        let id = record
            .get(ID_FIELD)
            .and_then(record_id)
            .ok_or_else(|| Error::Remote("task record without Id".to_string()))?;

        let title = text_field(record, "title")
            .filter(|t| !t.trim().is_empty())
            .or_else(|| text_field(record, "Name"))
            .unwrap_or_default();

        let priority = match text_field(record, "priority") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Task {} has unknown priority {:?}, using medium", id, raw);
                TaskPriority::Medium
            }),
            None => TaskPriority::default(),
        };

        let status = match text_field(record, "status") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Task {} has unknown status {:?}, using pending", id, raw);
                TaskStatus::Pending
            }),
            None => TaskStatus::default(),
        };

        Ok(Self {
            id,
            title,
            description: text_field(record, "description").unwrap_or_default(),
            due_date: record.get("due_date").and_then(parse_date),
            priority,
            status,
            project_id: record.get("project").and_then(record_id),
            tags: record.get("Tags").map(parse_tags).unwrap_or_default(),
            created_at: record.get(CREATED_ON_FIELD).and_then(parse_timestamp),
            updated_at: record.get(MODIFIED_ON_FIELD).and_then(parse_timestamp),
        })
    }
}

/// User-editable task fields, as held by the task form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub project_id: Option<RecordId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            due_date: None,
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
            project_id: None,
            tags: Vec::new(),
        }
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            priority: task.priority,
            status: task.status,
            project_id: task.project_id,
            tags: task.tags.clone(),
        }
    }
}

impl TaskDraft {
    /// Required-field check run before submission
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("Task title is required".to_string()));
        }
        Ok(())
    }

    /// Storage fields for a create or full update
    ///
    /// `Name` mirrors the title so the store's primary display field is set.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("Name".into(), self.title.clone().into());
        record.insert("title".into(), self.title.clone().into());
        record.insert("description".into(), self.description.clone().into());
        record.insert("due_date".into(), date_value(self.due_date));
        record.insert("priority".into(), self.priority.as_str().into());
        record.insert("status".into(), self.status.as_str().into());
        record.insert(
            "project".into(),
            self.project_id.map(Value::from).unwrap_or(Value::Null),
        );
        record.insert("Tags".into(), self.tags.join(",").into());
        record
    }

    /// Overlay the fields set in a patch
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
    }
}

/// Partial task update; `None` leaves a field untouched
///
/// For the nullable fields, `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<Option<RecordId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Storage fields for the set members only
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        if let Some(title) = &self.title {
            record.insert("Name".into(), title.clone().into());
            record.insert("title".into(), title.clone().into());
        }
        if let Some(description) = &self.description {
            record.insert("description".into(), description.clone().into());
        }
        if let Some(due_date) = self.due_date {
            record.insert("due_date".into(), date_value(due_date));
        }
        if let Some(priority) = self.priority {
            record.insert("priority".into(), priority.as_str().into());
        }
        if let Some(status) = self.status {
            record.insert("status".into(), status.as_str().into());
        }
        if let Some(project_id) = self.project_id {
            record.insert(
                "project".into(),
                project_id.map(Value::from).unwrap_or(Value::Null),
            );
        }
        if let Some(tags) = &self.tags {
            record.insert("Tags".into(), tags.join(",").into());
        }
        record
    }
}

/// Distinguish an absent field (`None`) from an explicit null (`Some(None)`)
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn date_value(date: Option<NaiveDate>) -> Value {
    date.map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
        .unwrap_or(Value::Null)
}

/// Accepts "YYYY-MM-DD" or a full RFC 3339 timestamp
fn parse_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            warn!("Ignoring unparseable due date {:?}", raw);
            None
        })
}
