//! Aggregates over the task and project lists

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use super::filter::is_overdue;
use crate::project::Project;
use crate::record::RecordId;
use crate::task::{Task, TaskStatus};

/// Task counts for one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub project_id: RecordId,
    pub task_count: usize,
    pub completed_count: usize,
}

/// Per-project task and completed-task counts, in project order
pub fn project_stats(tasks: &[Task], projects: &[Project]) -> Vec<ProjectStats> {
    let mut counts: HashMap<RecordId, (usize, usize)> = HashMap::new();
    for task in tasks {
        if let Some(project_id) = task.project_id {
            let entry = counts.entry(project_id).or_default();
            entry.0 += 1;
            if task.is_completed() {
                entry.1 += 1;
            }
        }
    }

    projects
        .iter()
        .map(|p| {
            let (task_count, completed_count) = counts.get(&p.id).copied().unwrap_or_default();
            ProjectStats {
                project_id: p.id,
                task_count,
                completed_count,
            }
        })
        .collect()
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub in_progress_tasks: usize,
    pub overdue_tasks: usize,
}

impl DashboardStats {
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        tasks.iter().fold(Self::default(), |mut stats, task| {
            stats.total_tasks += 1;
            match task.status {
                TaskStatus::Completed => stats.completed_tasks += 1,
                TaskStatus::Pending => stats.pending_tasks += 1,
                TaskStatus::InProgress => stats.in_progress_tasks += 1,
            }
            if is_overdue(task, today) {
                stats.overdue_tasks += 1;
            }
            stats
        })
    }

    /// Completed share in whole percent, 0 when there are no tasks
    pub fn completion_rate(&self) -> u8 {
        if self.total_tasks == 0 {
            return 0;
        }
        ((self.completed_tasks * 100) / self.total_tasks) as u8
    }
}

/// Most recently modified first; tasks without a timestamp go last
pub fn recent_tasks(tasks: &[Task], limit: usize) -> Vec<Task> {
    let mut recent = tasks.to_vec();
    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    recent.truncate(limit);
    recent
}

/// Projects whose name or tags contain the term, case-insensitively
pub fn search_projects<'a>(projects: &'a [Project], term: &str) -> Vec<&'a Project> {
    let needle = term.to_lowercase();
    projects
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.tags_text().to_lowercase().contains(&needle)
        })
        .collect()
}
