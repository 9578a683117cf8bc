//! Project model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::record::{
    parse_tags, parse_timestamp, record_id, text_field, Record, RecordId, CREATED_ON_FIELD,
    ID_FIELD, MODIFIED_ON_FIELD,
};
use crate::Result;

/// Color given to projects created without one
pub const DEFAULT_PROJECT_COLOR: &str = "#6366f1";

/// A Project groups tasks for display and aggregate counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Store-assigned identifier
    pub id: RecordId,

    /// Display name (e.g., "Work")
    pub name: String,

    /// Tag color used by the UI, as a CSS color
    pub color: String,

    /// Free-text tags, stored upstream comma-joined
    pub tags: Vec<String>,

    /// Timestamp when the project was created
    pub created_at: Option<DateTime<Utc>>,

    /// Timestamp when the project was last updated
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Create a project value with required fields
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: DEFAULT_PROJECT_COLOR.to_string(),
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Tags as the store keeps them
    pub fn tags_text(&self) -> String {
        self.tags.join(",")
    }

    /// Normalize a store record into a project
    pub fn from_record(record: &Record) -> Result<Self> {
        let id = record
            .get(ID_FIELD)
            .and_then(record_id)
            .ok_or_else(|| Error::Remote("project record without Id".to_string()))?;

        Ok(Self {
            id,
            name: text_field(record, "Name").unwrap_or_default(),
            color: text_field(record, "color")
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()),
            tags: record.get("Tags").map(parse_tags).unwrap_or_default(),
            created_at: record.get(CREATED_ON_FIELD).and_then(parse_timestamp),
            updated_at: record.get(MODIFIED_ON_FIELD).and_then(parse_timestamp),
        })
    }
}

/// User-editable project fields, as held by the project form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_PROJECT_COLOR.to_string()
}

impl Default for ProjectDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            tags: Vec::new(),
            color: default_color(),
        }
    }
}

impl From<&Project> for ProjectDraft {
    fn from(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            tags: project.tags.clone(),
            color: project.color.clone(),
        }
    }
}

impl ProjectDraft {
    /// Required-field check run before submission
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("Project name is required".to_string()));
        }
        Ok(())
    }

    /// Storage fields for a create or full update
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("Name".into(), self.name.clone().into());
        record.insert("Tags".into(), self.tags.join(",").into());
        record.insert("color".into(), self.color.clone().into());
        record
    }

    /// Overlay the fields set in a patch
    pub fn apply(&mut self, patch: &ProjectPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
    }
}

/// Partial project update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_project() {
        let project = Project::new(1, "Work");

        assert_eq!(project.name, "Work");
        assert_eq!(project.color, DEFAULT_PROJECT_COLOR);
        assert!(project.tags.is_empty());
    }

    #[test]
    fn test_project_with_builders() {
        let project = Project::new(1, "Work")
            .with_color("#06b6d4")
            .with_tags(["office", "q3"]);

        assert_eq!(project.color, "#06b6d4");
        assert_eq!(project.tags_text(), "office,q3");
    }

    #[test]
    fn test_from_record() {
        let record = json!({
            "Id": 4,
            "Name": "Personal",
            "Tags": "home, health",
            "color": "",
            "ModifiedOn": "2024-02-01T08:00:00Z"
        });
        let project = Project::from_record(record.as_object().unwrap()).unwrap();

        assert_eq!(project.id, 4);
        assert_eq!(project.name, "Personal");
        assert_eq!(project.tags, vec!["home", "health"]);
        assert_eq!(project.color, DEFAULT_PROJECT_COLOR);
        assert!(project.updated_at.is_some());
    }

    #[test]
    fn test_draft_validation_and_record() {
        let mut draft = ProjectDraft::default();
        assert!(draft.validate().unwrap_err().is_validation());

        draft.apply(&ProjectPatch {
            name: Some("Garden".to_string()),
            tags: Some(vec!["outdoor".to_string()]),
            color: None,
        });
        assert!(draft.validate().is_ok());

        let record = draft.to_record();
        assert_eq!(record["Name"], json!("Garden"));
        assert_eq!(record["Tags"], json!("outdoor"));
        assert_eq!(record["color"], json!(DEFAULT_PROJECT_COLOR));
    }
}
