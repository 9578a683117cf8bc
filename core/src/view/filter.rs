//! Task filtering, search and display ordering

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::record::RecordId;
use crate::task::{Task, TaskStatus};
use crate::Result;

/// Which subset of tasks is shown; exactly one is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Project,
    Today,
    Overdue,
    Completed,
}

impl TaskFilter {
    pub const ALL: [TaskFilter; 5] = [
        Self::All,
        Self::Project,
        Self::Today,
        Self::Overdue,
        Self::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Project => "project",
            Self::Today => "today",
            Self::Overdue => "overdue",
            Self::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Tasks",
            Self::Project => "Current Project",
            Self::Today => "Due Today",
            Self::Overdue => "Overdue",
            Self::Completed => "Completed",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::All => "List",
            Self::Project => "Folder",
            Self::Today => "Calendar",
            Self::Overdue => "AlertCircle",
            Self::Completed => "CheckCircle",
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("unknown task filter: {}", s)))
    }
}

/// Due date equals `today`
pub fn is_due_today(task: &Task, today: NaiveDate) -> bool {
    task.due_date == Some(today)
}

/// Due date strictly before `today` and not completed
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    matches!(task.due_date, Some(due) if due < today) && task.status != TaskStatus::Completed
}

/// The current filter/search/project selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(default)]
    pub filter: TaskFilter,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub selected_project: Option<RecordId>,
}

impl TaskView {
    pub fn new(filter: TaskFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_project(mut self, project_id: RecordId) -> Self {
        self.selected_project = Some(project_id);
        self
    }

    /// Whether the task passes the active filter
    ///
    /// The project filter compares against the selected project; with no
    /// selection it keeps tasks that have no project.
    pub fn matches_filter(&self, task: &Task, today: NaiveDate) -> bool {
        match self.filter {
            TaskFilter::All => true,
            TaskFilter::Project => task.project_id == self.selected_project,
            TaskFilter::Today => is_due_today(task, today),
            TaskFilter::Overdue => is_overdue(task, today),
            TaskFilter::Completed => task.status == TaskStatus::Completed,
        }
    }

    /// Case-insensitive substring match on title or description
    ///
    /// Only an empty search matches everything; whitespace is matched as typed.
    pub fn matches_search(&self, task: &Task) -> bool {
        let needle = self.search.to_lowercase();
        needle.is_empty()
            || task.title.to_lowercase().contains(&needle)
            || task.description.to_lowercase().contains(&needle)
    }

    /// Filter, search and order tasks for display
    pub fn apply(&self, tasks: &[Task], today: NaiveDate) -> Vec<Task> {
        let mut visible: Vec<Task> = tasks
            .iter()
            .filter(|t| self.matches_filter(t, today) && self.matches_search(t))
            .cloned()
            .collect();
        sort_for_display(&mut visible);
        visible
    }
}

/// Completed tasks last, then priority descending; stable within ties
pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| (t.is_completed(), Reverse(t.priority.weight())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskPriority;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn sample() -> Vec<Task> {
        vec![
            Task::new(1, "Buy Milk").with_project_id(1).with_due_date(day(9)),
            Task::new(2, "Report")
                .with_project_id(2)
                .with_due_date(day(10))
                .with_priority(TaskPriority::High),
            Task::new(3, "Taxes")
                .with_project_id(1)
                .with_due_date(day(1))
                .with_status(TaskStatus::Completed),
            Task::new(4, "Gym").with_description("leg day").with_due_date(day(11)),
            Task::new(5, "Call plumber")
                .with_priority(TaskPriority::Urgent)
                .with_status(TaskStatus::InProgress)
                .with_due_date(day(3)),
        ]
    }

    fn ids(tasks: &[Task]) -> Vec<RecordId> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("Overdue".parse::<TaskFilter>().unwrap(), TaskFilter::Overdue);
        assert!("later".parse::<TaskFilter>().is_err());
    }

    #[test]
    fn test_filters_are_idempotent() {
        let tasks = sample();
        for filter in TaskFilter::ALL {
            let view = TaskView::new(filter).with_project(1).with_search("a");
            let once = view.apply(&tasks, today());
            let twice = view.apply(&once, today());
            assert_eq!(once, twice, "filter {} not idempotent", filter);
        }
    }

    #[test]
    fn test_overdue_iff_past_due_and_open() {
        let tasks = sample();
        let overdue = TaskView::new(TaskFilter::Overdue).apply(&tasks, today());
        assert_eq!(ids(&overdue), vec![5, 1]);

        for task in &tasks {
            let expected = task.due_date.is_some_and(|d| d < today())
                && task.status != TaskStatus::Completed;
            assert_eq!(overdue.iter().any(|t| t.id == task.id), expected);
        }
    }

    #[test]
    fn test_today_project_and_completed_filters() {
        let tasks = sample();
        assert_eq!(ids(&TaskView::new(TaskFilter::Today).apply(&tasks, today())), vec![2]);
        assert_eq!(
            ids(&TaskView::new(TaskFilter::Project).with_project(1).apply(&tasks, today())),
            vec![1, 3]
        );
        assert_eq!(
            ids(&TaskView::new(TaskFilter::Project).apply(&tasks, today())),
            vec![5, 4]
        );
        assert_eq!(ids(&TaskView::new(TaskFilter::Completed).apply(&tasks, today())), vec![3]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let tasks = sample();
        let view = TaskView::new(TaskFilter::All).with_search("milk");
        assert_eq!(ids(&view.apply(&tasks, today())), vec![1]);

        let by_description = TaskView::new(TaskFilter::All).with_search("LEG");
        assert_eq!(ids(&by_description.apply(&tasks, today())), vec![4]);

        let everything = TaskView::new(TaskFilter::All).apply(&tasks, today());
        assert_eq!(everything.len(), tasks.len());
    }

    #[test]
    fn test_search_whitespace_is_not_trimmed() {
        let tasks = vec![Task::new(1, "Buy Milk"), Task::new(2, "Gym")];

        let blank = TaskView::new(TaskFilter::All).with_search(" ");
        assert_eq!(ids(&blank.apply(&tasks, today())), vec![1]);

        let trailing = TaskView::new(TaskFilter::All).with_search("milk ");
        assert!(trailing.apply(&tasks, today()).is_empty());
    }

    #[test]
    fn test_sort_by_priority_descending() {
        let mut tasks = vec![
            Task::new(1, "a").with_priority(TaskPriority::Low),
            Task::new(2, "b").with_priority(TaskPriority::Urgent),
            Task::new(3, "c").with_priority(TaskPriority::Medium),
            Task::new(4, "d").with_priority(TaskPriority::High),
        ];
        sort_for_display(&mut tasks);

        let priorities: Vec<TaskPriority> = tasks.iter().map(|t| t.priority).collect();
        assert_eq!(
            priorities,
            vec![
                TaskPriority::Urgent,
                TaskPriority::High,
                TaskPriority::Medium,
                TaskPriority::Low
            ]
        );
    }

    #[test]
    fn test_completed_sort_last_and_stable() {
        let mut tasks = vec![
            Task::new(1, "done urgent")
                .with_priority(TaskPriority::Urgent)
                .with_status(TaskStatus::Completed),
            Task::new(2, "open low").with_priority(TaskPriority::Low),
            Task::new(3, "open medium a"),
            Task::new(4, "open medium b"),
        ];
        sort_for_display(&mut tasks);

        assert_eq!(ids(&tasks), vec![3, 4, 2, 1]);
        let first_completed = tasks.iter().position(|t| t.is_completed()).unwrap();
        assert!(tasks[first_completed..].iter().all(|t| t.is_completed()));
    }
}
