//! Application state container
//!
//! `Board` owns the in-memory task and project lists, the current view
//! selection, the task/project forms and the notification queue. It is the
//! only place local state changes, always in response to a completed store
//! call, so it stays a cache of the store rather than an owner of identity.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::form::{Form, FormMode};
use crate::project::{Project, ProjectDraft, ProjectPatch, ProjectRepository};
use crate::record::{Query, RecordId, SortType, MODIFIED_ON_FIELD};
use crate::task::{Task, TaskDraft, TaskPatch, TaskRepository};
use crate::view::{self, DashboardStats, ProjectStats, TaskFilter, TaskView};
use crate::Result;

/// Asks the user to confirm a destructive action
pub trait Confirm: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub struct Board {
    task_repo: Arc<dyn TaskRepository>,
    project_repo: Arc<dyn ProjectRepository>,
    tasks: Vec<Task>,
    projects: Vec<Project>,
    view: TaskView,
    task_form: Form<TaskDraft>,
    project_form: Form<ProjectDraft>,
    notices: Vec<Notice>,
}

impl Board {
    pub fn new(task_repo: Arc<dyn TaskRepository>, project_repo: Arc<dyn ProjectRepository>) -> Self {
        Self {
            task_repo,
            project_repo,
            tasks: Vec::new(),
            projects: Vec::new(),
            view: TaskView::default(),
            task_form: Form::new(),
            project_form: Form::new(),
            notices: Vec::new(),
        }
    }

    fn newest_first() -> Query {
        Query::new().order_by(MODIFIED_ON_FIELD, SortType::Desc)
    }

    /// Replace local state with the store's tasks and projects
    pub async fn load(&mut self) -> Result<()> {
        let loaded = futures::try_join!(
            self.task_repo.list(Self::newest_first()),
            self.project_repo.list(Self::newest_first()),
        );

        match loaded {
            Ok((tasks, projects)) => {
                info!("Loaded {} tasks and {} projects", tasks.len(), projects.len());
                self.tasks = tasks;
                self.projects = projects;
                Ok(())
            }
            Err(e) => {
                self.notify(NoticeLevel::Error, "Failed to load tasks");
                Err(e)
            }
        }
    }

    /// Re-fetch the project list only
    pub async fn reload_projects(&mut self) -> Result<()> {
        self.projects = self.project_repo.list(Self::newest_first()).await?;
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn task(&self, id: RecordId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn project(&self, id: RecordId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn task_repository(&self) -> &Arc<dyn TaskRepository> {
        &self.task_repo
    }

    pub fn project_repository(&self) -> &Arc<dyn ProjectRepository> {
        &self.project_repo
    }

    // ------------------------------------------------------------------
    // View selection
    // ------------------------------------------------------------------

    pub fn view(&self) -> &TaskView {
        &self.view
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.view.filter = filter;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.view.search = search.into();
    }

    pub fn select_project(&mut self, project_id: Option<RecordId>) {
        self.view.selected_project = project_id;
    }

    /// Tasks to render for the current selection
    pub fn visible_tasks(&self, today: NaiveDate) -> Vec<Task> {
        self.view.apply(&self.tasks, today)
    }

    pub fn project_stats(&self) -> Vec<ProjectStats> {
        view::project_stats(&self.tasks, &self.projects)
    }

    pub fn dashboard(&self, today: NaiveDate) -> DashboardStats {
        DashboardStats::compute(&self.tasks, today)
    }

    pub fn recent_tasks(&self, limit: usize) -> Vec<Task> {
        view::recent_tasks(&self.tasks, limit)
    }

    // ------------------------------------------------------------------
    // Task intents
    // ------------------------------------------------------------------

    pub fn task_form(&self) -> &Form<TaskDraft> {
        &self.task_form
    }

    pub fn task_form_mut(&mut self) -> &mut Form<TaskDraft> {
        &mut self.task_form
    }

    /// Open the task form for a new task in the selected project
    pub fn new_task(&mut self) {
        self.task_form.open_create();
        if let Ok(draft) = self.task_form.draft_mut() {
            draft.project_id = self.view.selected_project;
        }
    }

    /// Open the task form on an existing task
    pub fn edit_task(&mut self, id: RecordId) -> Result<()> {
        let task = self
            .task(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        let draft = TaskDraft::from(task);
        let project_id = task.project_id;
        self.task_form.open_edit(id, draft);
        self.select_project(project_id);
        Ok(())
    }

    /// Submit the task form; success merges the stored task into local state
    pub async fn submit_task_form(&mut self) -> Result<Task> {
        let repo = Arc::clone(&self.task_repo);
        let mode = self.task_form.mode();

        let result = self
            .task_form
            .submit(|mode, draft| async move {
                let fields = draft.to_record();
                match mode {
                    FormMode::Create => repo.create(fields).await,
                    FormMode::Edit(id) => repo.update(id, fields).await,
                }
            })
            .await;

        match result {
            Ok(task) => {
                self.upsert_task(task.clone());
                let message = match mode {
                    FormMode::Create => "Task created successfully!",
                    FormMode::Edit(_) => "Task updated successfully!",
                };
                self.notify(NoticeLevel::Success, message);
                Ok(task)
            }
            Err(e) => {
                let message = if e.is_validation() {
                    e.user_message()
                } else if mode == FormMode::Create {
                    "Failed to create task".to_string()
                } else {
                    "Failed to update task".to_string()
                };
                self.notify(NoticeLevel::Error, message);
                Err(e)
            }
        }
    }

    /// Create a task through the form in one step
    pub async fn create_task(&mut self, draft: TaskDraft) -> Result<Task> {
        self.task_form.open_create();
        *self.task_form.draft_mut()? = draft;
        self.submit_task_form().await
    }

    /// Edit a task through the form, overlaying `patch` on its current fields
    ///
    /// The project selection is left as it was, whatever the outcome.
    pub async fn update_task(&mut self, id: RecordId, patch: &TaskPatch) -> Result<Task> {
        let selected = self.view.selected_project;
        let result = self.edit_and_submit(id, patch).await;
        self.view.selected_project = selected;
        result
    }

    async fn edit_and_submit(&mut self, id: RecordId, patch: &TaskPatch) -> Result<Task> {
        self.edit_task(id)?;
        self.task_form.draft_mut()?.apply(patch);
        self.submit_task_form().await
    }

    /// Flip a task between completed and pending
    pub async fn toggle_task(&mut self, id: RecordId) -> Result<Task> {
        let status = self
            .task(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?
            .status
            .toggled();

        match self
            .task_repo
            .update(id, TaskPatch::status(status).to_record())
            .await
        {
            Ok(task) => {
                self.upsert_task(task.clone());
                Ok(task)
            }
            Err(e) => {
                self.notify(NoticeLevel::Error, "Failed to update task");
                Err(e)
            }
        }
    }

    /// Delete a task after confirmation
    ///
    /// Returns `false` without any request when the user declines, and
    /// `false` with an error notice when the store deleted nothing.
    pub async fn delete_task(&mut self, id: RecordId, confirm: &dyn Confirm) -> Result<bool> {
        if !confirm.confirm("Are you sure you want to delete this task?") {
            debug!("Deletion of task {} not confirmed", id);
            return Ok(false);
        }

        match self.task_repo.delete(id).await {
            Ok(true) => {
                self.tasks.retain(|t| t.id != id);
                self.notify(NoticeLevel::Success, "Task deleted successfully!");
                Ok(true)
            }
            Ok(false) => {
                self.notify(NoticeLevel::Error, "Failed to delete task");
                Ok(false)
            }
            Err(e) => {
                self.notify(NoticeLevel::Error, "Failed to delete task");
                Err(e)
            }
        }
    }

    fn upsert_task(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
    }

    // ------------------------------------------------------------------
    // Project intents
    // ------------------------------------------------------------------

    pub fn project_form(&self) -> &Form<ProjectDraft> {
        &self.project_form
    }

    pub fn project_form_mut(&mut self) -> &mut Form<ProjectDraft> {
        &mut self.project_form
    }

    pub fn new_project(&mut self) {
        self.project_form.open_create();
    }

    pub fn edit_project(&mut self, id: RecordId) -> Result<()> {
        let project = self
            .project(id)
            .ok_or_else(|| Error::ProjectNotFound(id.to_string()))?;
        let draft = ProjectDraft::from(project);
        self.project_form.open_edit(id, draft);
        Ok(())
    }

    /// Submit the project form, then re-fetch the project list
    pub async fn submit_project_form(&mut self) -> Result<Project> {
        let repo = Arc::clone(&self.project_repo);
        let mode = self.project_form.mode();

        let result = self
            .project_form
            .submit(|mode, draft| async move {
                let fields = draft.to_record();
                match mode {
                    FormMode::Create => repo.create(fields).await,
                    FormMode::Edit(id) => repo.update(id, fields).await,
                }
            })
            .await;

        match result {
            Ok(project) => {
                self.upsert_project(project.clone());
                if let Err(e) = self.reload_projects().await {
                    warn!("Keeping merged project list, reload failed: {}", e);
                }
                let message = match mode {
                    FormMode::Create => "Project created successfully!",
                    FormMode::Edit(_) => "Project updated successfully!",
                };
                self.notify(NoticeLevel::Success, message);
                Ok(project)
            }
            Err(e) => {
                let message = if e.is_validation() {
                    e.user_message()
                } else if mode == FormMode::Create {
                    "Failed to create project".to_string()
                } else {
                    "Failed to update project".to_string()
                };
                self.notify(NoticeLevel::Error, message);
                Err(e)
            }
        }
    }

    pub async fn create_project(&mut self, draft: ProjectDraft) -> Result<Project> {
        self.project_form.open_create();
        *self.project_form.draft_mut()? = draft;
        self.submit_project_form().await
    }

    pub async fn update_project(&mut self, id: RecordId, patch: &ProjectPatch) -> Result<Project> {
        self.edit_project(id)?;
        self.project_form.draft_mut()?.apply(patch);
        self.submit_project_form().await
    }

    /// Delete a project after confirmation, then re-fetch the project list
    pub async fn delete_project(&mut self, id: RecordId, confirm: &dyn Confirm) -> Result<bool> {
        if !confirm.confirm(
            "Are you sure you want to delete this project? This action cannot be undone.",
        ) {
            debug!("Deletion of project {} not confirmed", id);
            return Ok(false);
        }

        match self.project_repo.delete(id).await {
            Ok(true) => {
                self.projects.retain(|p| p.id != id);
                if self.view.selected_project == Some(id) {
                    self.view.selected_project = None;
                }
                if let Err(e) = self.reload_projects().await {
                    warn!("Keeping local project list, reload failed: {}", e);
                }
                self.notify(NoticeLevel::Success, "Project deleted successfully!");
                Ok(true)
            }
            Ok(false) => {
                self.notify(NoticeLevel::Error, "Failed to delete project");
                Ok(false)
            }
            Err(e) => {
                self.notify(NoticeLevel::Error, "Failed to delete project");
                Err(e)
            }
        }
    }

    fn upsert_project(&mut self, project: Project) {
        match self.projects.iter_mut().find(|p| p.id == project.id) {
            Some(slot) => *slot = project,
            None => self.projects.insert(0, project),
        }
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain pending notifications
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Error => warn!("{}", message),
            _ => debug!("{}", message),
        }
        self.notices.push(Notice { level, message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectService;
    use crate::record::{
        FetchResponse, FileRecordStore, GetResponse, MutationResponse, Record, RecordStore,
    };
    use crate::task::{TaskPriority, TaskService, TaskStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store that can be told to refuse creates
    struct CountingStore {
        inner: FileRecordStore,
        creates: AtomicUsize,
        refuse_creates: bool,
    }

    impl CountingStore {
        fn new(refuse_creates: bool) -> Self {
            Self {
                inner: FileRecordStore::in_memory(),
                creates: AtomicUsize::new(0),
                refuse_creates,
            }
        }
    }

    #[async_trait]
    impl RecordStore for CountingStore {
        async fn fetch_records(&self, table: &str, query: &Query) -> Result<FetchResponse> {
            self.inner.fetch_records(table, query).await
        }

        async fn get_record_by_id(
            &self,
            table: &str,
            id: RecordId,
            fields: &[String],
        ) -> Result<GetResponse> {
            self.inner.get_record_by_id(table, id, fields).await
        }

        async fn create_records(&self, table: &str, records: Vec<Record>) -> Result<MutationResponse> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if self.refuse_creates {
                return Ok(MutationResponse {
                    success: false,
                    results: Vec::new(),
                    message: Some("quota exceeded".to_string()),
                });
            }
            self.inner.create_records(table, records).await
        }

        async fn update_records(&self, table: &str, records: Vec<Record>) -> Result<MutationResponse> {
            self.inner.update_records(table, records).await
        }

        async fn delete_records(&self, table: &str, ids: &[RecordId]) -> Result<MutationResponse> {
            self.inner.delete_records(table, ids).await
        }

        fn backend_name(&self) -> &'static str {
            "counting"
        }
    }

    fn board_with(store: Arc<CountingStore>) -> Board {
        Board::new(
            Arc::new(TaskService::new(store.clone(), "tasks")),
            Arc::new(ProjectService::new(store, "projects")),
        )
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            ..TaskDraft::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn yes(_: &str) -> bool {
        true
    }

    fn no(_: &str) -> bool {
        false
    }

    #[tokio::test]
    async fn test_empty_title_never_calls_create() {
        let store = Arc::new(CountingStore::new(false));
        let mut board = board_with(store.clone());

        board.new_task();
        let result = board.submit_task_form().await;

        assert!(result.unwrap_err().is_validation());
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
        assert!(board.task_form().is_open());
        assert_eq!(board.task_form().error(), Some("Task title is required"));
        assert_eq!(
            board.take_notices(),
            vec![Notice {
                level: NoticeLevel::Error,
                message: "Task title is required".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_rejected_create_leaves_state_unchanged() {
        let store = Arc::new(CountingStore::new(true));
        let mut board = board_with(store.clone());

        let result = board.create_task(draft("Buy milk")).await;

        assert!(matches!(result, Err(Error::Remote(_))));
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
        assert!(board.tasks().is_empty());
        assert_eq!(board.task_form().draft().title, "Buy milk");

        let notices = board.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "Failed to create task");
    }

    #[tokio::test]
    async fn test_create_appends_and_closes_form() {
        let store = Arc::new(CountingStore::new(false));
        let mut board = board_with(store);

        board.select_project(Some(3));
        board.new_task();
        board.task_form_mut().draft_mut().unwrap().title = "Buy milk".to_string();
        let task = board.submit_task_form().await.unwrap();

        assert_eq!(task.project_id, Some(3));
        assert_eq!(board.tasks().len(), 1);
        assert!(!board.task_form().is_open());
        assert_eq!(board.take_notices()[0].message, "Task created successfully!");
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_exactly_one() {
        let store = Arc::new(CountingStore::new(false));
        let mut board = board_with(store);
        let a = board.create_task(draft("a")).await.unwrap();
        let b = board.create_task(draft("b")).await.unwrap();
        let c = board.create_task(draft("c")).await.unwrap();
        board.take_notices();

        assert!(!board.delete_task(b.id, &no).await.unwrap());
        assert_eq!(board.tasks().len(), 3);

        assert!(board.delete_task(b.id, &yes).await.unwrap());
        let remaining: Vec<RecordId> = board.tasks().iter().map(|t| t.id).collect();
        assert_eq!(remaining, vec![a.id, c.id]);

        // Already gone upstream: nothing removed locally, error surfaced
        assert!(!board.delete_task(b.id, &yes).await.unwrap());
        assert_eq!(board.tasks().len(), 2);
        let notices = board.take_notices();
        assert_eq!(notices.last().unwrap().message, "Failed to delete task");
    }

    #[tokio::test]
    async fn test_toggle_and_edit_merge_server_record() {
        let store = Arc::new(CountingStore::new(false));
        let mut board = board_with(store);
        let task = board.create_task(draft("Write report")).await.unwrap();

        let toggled = board.toggle_task(task.id).await.unwrap();
        assert_eq!(toggled.status, TaskStatus::Completed);
        assert_eq!(board.task(task.id).unwrap().status, TaskStatus::Completed);

        let edited = board
            .update_task(
                task.id,
                &TaskPatch {
                    priority: Some(TaskPriority::Urgent),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.priority, TaskPriority::Urgent);
        assert_eq!(edited.status, TaskStatus::Completed);
        assert_eq!(board.tasks().len(), 1);
        assert_eq!(board.task(task.id).unwrap().priority, TaskPriority::Urgent);
    }

    #[tokio::test]
    async fn test_update_keeps_project_selection() {
        let store = Arc::new(CountingStore::new(false));
        let mut board = board_with(store);
        let task = board
            .create_task(TaskDraft {
                project_id: Some(5),
                ..draft("Plant tulips")
            })
            .await
            .unwrap();

        board.select_project(Some(9));
        let patch = TaskPatch {
            priority: Some(TaskPriority::High),
            ..TaskPatch::default()
        };
        board.update_task(task.id, &patch).await.unwrap();
        assert_eq!(board.view().selected_project, Some(9));

        let rejected = TaskPatch {
            title: Some(String::new()),
            ..TaskPatch::default()
        };
        assert!(board.update_task(task.id, &rejected).await.is_err());
        assert_eq!(board.view().selected_project, Some(9));

        // The explicit edit intent still follows the task's project
        board.edit_task(task.id).unwrap();
        assert_eq!(board.view().selected_project, Some(5));
    }

    #[tokio::test]
    async fn test_load_and_project_counts() {
        let store = Arc::new(CountingStore::new(false));
        let mut board = board_with(store.clone());
        let p1 = board
            .create_project(ProjectDraft {
                name: "p1".to_string(),
                ..ProjectDraft::default()
            })
            .await
            .unwrap();
        let p2 = board
            .create_project(ProjectDraft {
                name: "p2".to_string(),
                ..ProjectDraft::default()
            })
            .await
            .unwrap();
        for project_id in [p1.id, p1.id, p2.id] {
            board
                .create_task(TaskDraft {
                    project_id: Some(project_id),
                    ..draft("t")
                })
                .await
                .unwrap();
        }

        // A fresh board sees the same state after loading
        let mut fresh = board_with(store);
        fresh.load().await.unwrap();
        assert_eq!(fresh.tasks().len(), 3);
        assert_eq!(fresh.projects().len(), 2);

        let stats = fresh.project_stats();
        let count = |id| stats.iter().find(|s| s.project_id == id).unwrap().task_count;
        assert_eq!(count(p1.id), 2);
        assert_eq!(count(p2.id), 1);
    }

    #[tokio::test]
    async fn test_visible_tasks_follow_selection() {
        let store = Arc::new(CountingStore::new(false));
        let mut board = board_with(store);
        board
            .create_task(TaskDraft {
                due_date: NaiveDate::from_ymd_opt(2024, 6, 1),
                ..draft("Pay rent")
            })
            .await
            .unwrap();
        board.create_task(draft("Buy Milk")).await.unwrap();

        board.set_filter(TaskFilter::Overdue);
        assert_eq!(board.visible_tasks(today()).len(), 1);

        board.set_filter(TaskFilter::All);
        board.set_search("milk");
        let visible = board.visible_tasks(today());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Buy Milk");

        let stats = board.dashboard(today());
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.overdue_tasks, 1);
    }

    #[tokio::test]
    async fn test_project_lifecycle() {
        let store = Arc::new(CountingStore::new(false));
        let mut board = board_with(store);

        board.new_project();
        let invalid = board.submit_project_form().await;
        assert!(invalid.unwrap_err().is_validation());

        board.project_form_mut().draft_mut().unwrap().name = "Garden".to_string();
        let project = board.submit_project_form().await.unwrap();
        assert_eq!(board.projects().len(), 1);

        let renamed = board
            .update_project(
                project.id,
                &ProjectPatch {
                    name: Some("Backyard".to_string()),
                    ..ProjectPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Backyard");
        assert_eq!(board.projects()[0].name, "Backyard");

        board.select_project(Some(project.id));
        assert!(board.delete_project(project.id, &yes).await.unwrap());
        assert!(board.projects().is_empty());
        assert_eq!(board.view().selected_project, None);
    }
}
