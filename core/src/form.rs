//! Form submission state machine
//!
//! `Idle -> Editing -> Submitting -> Idle` on success, or back to `Editing`
//! with the draft preserved on failure. The required-field check runs before
//! `Submitting`, so a draft that fails it never reaches the store.

use serde::Serialize;
use std::future::Future;
use tracing::debug;

use crate::error::Error;
use crate::project::ProjectDraft;
use crate::record::RecordId;
use crate::task::TaskDraft;
use crate::Result;

/// Editable field set backing a form
pub trait Draft: Clone + Default {
    /// Required-field check; must not touch the network
    fn validate(&self) -> Result<()>;
}

impl Draft for TaskDraft {
    fn validate(&self) -> Result<()> {
        TaskDraft::validate(self)
    }
}

impl Draft for ProjectDraft {
    fn validate(&self) -> Result<()> {
        ProjectDraft::validate(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormPhase {
    Idle,
    Editing,
    Submitting,
}

/// Whether the form creates a new record or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    Create,
    Edit(RecordId),
}

#[derive(Debug, Clone)]
pub struct Form<D> {
    phase: FormPhase,
    mode: FormMode,
    draft: D,
    error: Option<String>,
}

impl<D: Draft> Default for Form<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Draft> Form<D> {
    pub fn new() -> Self {
        Self {
            phase: FormPhase::Idle,
            mode: FormMode::Create,
            draft: D::default(),
            error: None,
        }
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    /// Message of the last failed submission, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.phase != FormPhase::Idle
    }

    /// Open an empty form for a new record
    pub fn open_create(&mut self) {
        self.phase = FormPhase::Editing;
        self.mode = FormMode::Create;
        self.draft = D::default();
        self.error = None;
    }

    /// Open the form seeded from an existing record
    pub fn open_edit(&mut self, id: RecordId, draft: D) {
        self.phase = FormPhase::Editing;
        self.mode = FormMode::Edit(id);
        self.draft = draft;
        self.error = None;
    }

    /// Mutable access to the draft while editing
    pub fn draft_mut(&mut self) -> Result<&mut D> {
        if self.phase != FormPhase::Editing {
            return Err(Error::InvalidInput("form is not open for editing".to_string()));
        }
        Ok(&mut self.draft)
    }

    /// Close the form and discard the draft
    pub fn cancel(&mut self) {
        *self = Self::new();
    }

    /// Validate and move to `Submitting`, handing out what to send
    ///
    /// A failed validation keeps the form in `Editing` with the message set.
    pub fn begin_submit(&mut self) -> Result<(FormMode, D)> {
        if self.phase != FormPhase::Editing {
            return Err(Error::InvalidInput("form is not open for editing".to_string()));
        }
        if let Err(e) = self.draft.validate() {
            debug!("Form validation failed: {}", e);
            self.error = Some(e.user_message());
            return Err(e);
        }
        self.phase = FormPhase::Submitting;
        self.error = None;
        Ok((self.mode, self.draft.clone()))
    }

    /// Submission succeeded: clear the draft and close
    pub fn finish_success(&mut self) {
        *self = Self::new();
    }

    /// Submission failed: reopen for editing with the draft intact
    pub fn finish_failure(&mut self, message: impl Into<String>) {
        self.phase = FormPhase::Editing;
        self.error = Some(message.into());
    }

    /// Run one full submission through `op`
    pub async fn submit<T, F, Fut>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(FormMode, D) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (mode, draft) = self.begin_submit()?;
        match op(mode, draft).await {
            Ok(value) => {
                self.finish_success();
                Ok(value)
            }
            Err(e) => {
                self.finish_failure(e.user_message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_open_and_cancel() {
        let mut form: Form<TaskDraft> = Form::new();
        assert_eq!(form.phase(), FormPhase::Idle);
        assert!(form.draft_mut().is_err());

        form.open_create();
        assert_eq!(form.phase(), FormPhase::Editing);
        form.draft_mut().unwrap().title = "Write tests".to_string();

        form.cancel();
        assert!(!form.is_open());
        assert!(form.draft().title.is_empty());
    }

    #[tokio::test]
    async fn test_empty_title_never_submits() {
        let mut form: Form<TaskDraft> = Form::new();
        form.open_create();
        let called = Cell::new(false);

        let result = form
            .submit(|_, _| async {
                called.set(true);
                Ok(())
            })
            .await;

        assert!(result.unwrap_err().is_validation());
        assert!(!called.get());
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.error(), Some("Task title is required"));
    }

    #[tokio::test]
    async fn test_success_clears_and_closes() {
        let mut form: Form<ProjectDraft> = Form::new();
        form.open_edit(4, ProjectDraft {
            name: "Work".to_string(),
            ..ProjectDraft::default()
        });

        let sent = form
            .submit(|mode, draft| async move { Ok((mode, draft.name)) })
            .await
            .unwrap();

        assert_eq!(sent, (FormMode::Edit(4), "Work".to_string()));
        assert_eq!(form.phase(), FormPhase::Idle);
        assert_eq!(form.mode(), FormMode::Create);
        assert!(form.draft().name.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_draft() {
        let mut form: Form<TaskDraft> = Form::new();
        form.open_create();
        form.draft_mut().unwrap().title = "Keep me".to_string();

        let result: Result<()> = form
            .submit(|_, _| async { Err(Error::Remote("Failed to create task".to_string())) })
            .await;

        assert!(result.is_err());
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.draft().title, "Keep me");
        assert_eq!(form.error(), Some("Failed to create task"));
    }

    #[test]
    fn test_begin_submit_requires_editing() {
        let mut form: Form<TaskDraft> = Form::new();
        assert!(form.begin_submit().is_err());

        form.open_create();
        form.draft_mut().unwrap().title = "x".to_string();
        let (mode, _) = form.begin_submit().unwrap();
        assert_eq!(mode, FormMode::Create);
        assert_eq!(form.phase(), FormPhase::Submitting);
        // A second submit while one is in flight is refused
        assert!(form.begin_submit().is_err());
    }
}
