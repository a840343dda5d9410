//! Add/edit form session.
//!
//! # Responsibility
//! - Back a single create-or-edit form interaction with a small state
//!   machine: editing, submitting, closed.
//! - Gate submission behind trim-and-non-empty validation and a
//!   re-entrancy check before any store call happens.
//!
//! # Invariants
//! - Exactly one store call per accepted submission; a submit issued while
//!   one is in flight does nothing.
//! - A failed submission returns to editing with the typed input intact.
//! - A validation failure never reaches the store.
//!
//! # See also
//! - `controller` for the list the session feeds on success.

use crate::controller::NoteController;
use crate::model::note::{Note, NoteDraft, NoteId, OwnerId};
use crate::store::NoteStore;

/// What a session submits to when accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    /// New note for `owner`; fields start empty.
    Create { owner: OwnerId },
    /// Full rewrite of an existing note; fields start prefilled.
    Edit { id: NoteId },
}

/// Lifecycle phase of one form interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Editing,
    Submitting,
    Closed,
}

/// Result of the submission gate, before any store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginSubmit {
    /// Validation passed and the session is now submitting; the caller
    /// must drive the store call and report back.
    Started,
    /// A prior submission is still in flight.
    AlreadyInFlight,
    /// Input was rejected; no store call may be issued.
    Rejected(String),
}

/// Settled result of driving one submission end to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The store confirmed the note; the session is closed.
    Saved(NoteId),
    /// A prior submission was still in flight; nothing was sent.
    AlreadyInFlight,
    /// Validation rejected the input; nothing was sent.
    Rejected(String),
    /// The store refused; the session is editing again with input intact.
    Failed(String),
}

/// Transient state machine behind one add/edit form.
///
/// The session holds raw typed input and never talks to the store itself;
/// [`FormSession::submit`] drives the controller with the session's fields
/// and folds the result back into the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSession {
    mode: FormMode,
    title: String,
    content: String,
    phase: FormPhase,
    last_error: Option<String>,
}

impl FormSession {
    /// Opens a blank session that will create a note for `owner`.
    pub fn create(owner: OwnerId) -> Self {
        Self {
            mode: FormMode::Create { owner },
            title: String::new(),
            content: String::new(),
            phase: FormPhase::Editing,
            last_error: None,
        }
    }

    /// Opens a session prefilled from an existing note for editing.
    pub fn edit(note: &Note) -> Self {
        Self {
            mode: FormMode::Edit {
                id: note.id.clone(),
            },
            title: note.title.clone(),
            content: note.content.clone(),
            phase: FormPhase::Editing,
            last_error: None,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Message from the most recent rejected or failed submission.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    /// Replaces the title field. Ignored unless the session is editing.
    pub fn set_title(&mut self, value: &str) {
        if self.phase != FormPhase::Editing {
            return;
        }
        self.title = value.to_string();
    }

    /// Replaces the content field. Ignored unless the session is editing.
    pub fn set_content(&mut self, value: &str) {
        if self.phase != FormPhase::Editing {
            return;
        }
        self.content = value.to_string();
    }

    /// Runs the submission gate: re-entrancy check, then validation.
    ///
    /// On [`BeginSubmit::Started`] the session is submitting and input is
    /// frozen until [`FormSession::submit_succeeded`] or
    /// [`FormSession::submit_failed`] is called.
    pub fn begin_submit(&mut self) -> BeginSubmit {
        match self.phase {
            FormPhase::Submitting => BeginSubmit::AlreadyInFlight,
            FormPhase::Closed => BeginSubmit::Rejected("form is closed".to_string()),
            FormPhase::Editing => match NoteDraft::new(&self.title, &self.content) {
                Ok(_) => {
                    self.phase = FormPhase::Submitting;
                    self.last_error = None;
                    BeginSubmit::Started
                }
                Err(err) => {
                    let message = err.to_string();
                    self.last_error = Some(message.clone());
                    BeginSubmit::Rejected(message)
                }
            },
        }
    }

    /// Closes the session after the store confirmed the submission.
    pub fn submit_succeeded(&mut self) {
        self.phase = FormPhase::Closed;
        self.title.clear();
        self.content.clear();
        self.last_error = None;
    }

    /// Returns to editing after a refused submission, keeping the input.
    pub fn submit_failed(&mut self, message: impl Into<String>) {
        self.phase = FormPhase::Editing;
        self.last_error = Some(message.into());
    }

    /// Discards the session. Allowed in any phase.
    pub fn cancel(&mut self) {
        self.phase = FormPhase::Closed;
        self.title.clear();
        self.content.clear();
        self.last_error = None;
    }

    /// Drives one full submission against the controller.
    ///
    /// Create sessions call `add`; edit sessions rewrite both fields of
    /// the target note. The state machine settles before this returns.
    pub async fn submit<S: NoteStore>(
        &mut self,
        controller: &mut NoteController<S>,
    ) -> SubmitOutcome {
        match self.begin_submit() {
            BeginSubmit::AlreadyInFlight => SubmitOutcome::AlreadyInFlight,
            BeginSubmit::Rejected(message) => SubmitOutcome::Rejected(message),
            BeginSubmit::Started => {
                let result = match self.mode.clone() {
                    FormMode::Create { owner } => controller
                        .add(&owner, &self.title, &self.content)
                        .await
                        .map(|note| note.id.clone()),
                    FormMode::Edit { id } => controller
                        .update(&id, Some(&self.title), Some(&self.content))
                        .await
                        .map(|note| note.id.clone()),
                };
                match result {
                    Ok(id) => {
                        self.submit_succeeded();
                        SubmitOutcome::Saved(id)
                    }
                    Err(err) => {
                        let message = err.to_string();
                        self.submit_failed(message.clone());
                        SubmitOutcome::Failed(message)
                    }
                }
            }
        }
    }
}
