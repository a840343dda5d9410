//! Note collection controller.
//!
//! # Responsibility
//! - Own the authoritative in-memory note list for one signed-in owner.
//! - Expose load/add/update/remove operations that settle against the
//!   remote store before the local list changes.
//!
//! # Invariants
//! - Confirm-then-apply: every mutation reaches the local list only after
//!   the store confirms it; a failed operation leaves the list untouched.
//! - List order is store order after `load`; `add` inserts at the head;
//!   the controller never re-sorts.
//! - Note ids are unique within the list and every entry belongs to the
//!   bound owner; rows violating either are rejected on ingress.
//! - Log lines carry ids, counts and durations, never note text.
//!
//! # See also
//! - `store` for the persistence contract this controller settles against.
//! - `form` for the submission state machine feeding `add` and `update`.

use log::{error, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

use crate::model::note::{Note, NoteDraft, NoteId, NotePatch, NoteValidationError, OwnerId};
use crate::store::{NoteStore, StoreError};

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Controller-level error for note list operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// Input rejected before any store call was issued.
    Validation(NoteValidationError),
    /// Target id is not present in the local list.
    UnknownNote(NoteId),
    /// Operation addressed a different owner than the list is bound to.
    OwnerMismatch { bound: OwnerId, requested: OwnerId },
    /// Refreshing the list failed; the previous list was kept.
    Load(StoreError),
    /// Creating a note failed; nothing was inserted.
    Save(StoreError),
    /// Updating a note failed; the local entry kept its previous values.
    Update(StoreError),
    /// Deleting a note failed; the local entry was kept.
    Delete(StoreError),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UnknownNote(id) => write!(f, "note not in local list: {id}"),
            Self::OwnerMismatch { bound, requested } => {
                write!(f, "note list is bound to owner {bound}, got {requested}")
            }
            Self::Load(err) => write!(f, "failed to fetch notes: {err}"),
            Self::Save(err) => write!(f, "failed to save note: {err}"),
            Self::Update(err) => write!(f, "failed to update note: {err}"),
            Self::Delete(err) => write!(f, "failed to delete note: {err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Load(err) | Self::Save(err) | Self::Update(err) | Self::Delete(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for ControllerError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl ControllerError {
    /// Stable machine-readable code for logs and host envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::UnknownNote(_) => "unknown_note",
            Self::OwnerMismatch { .. } => "owner_mismatch",
            Self::Load(_) => "load_failed",
            Self::Save(_) => "save_failed",
            Self::Update(err) | Self::Delete(err) if err.is_not_found() => "not_found",
            Self::Update(_) => "update_failed",
            Self::Delete(_) => "delete_failed",
        }
    }

    /// Returns whether the store reported the target document as missing.
    ///
    /// Callers may reconcile by dropping the stale entry via
    /// [`NoteController::forget`].
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Load(err) | Self::Update(err) | Self::Delete(err) if err.is_not_found()
        )
    }
}

/// Authoritative local note list, reconciled against a remote store.
///
/// All display surfaces read from this one list; all mutations go through
/// it. Operations take `&mut self`, so the list can never change from two
/// overlapping calls.
pub struct NoteController<S: NoteStore> {
    store: S,
    notes: Vec<Note>,
    owner: Option<OwnerId>,
}

impl<S: NoteStore> NoteController<S> {
    /// Creates a controller with an empty list and no bound owner.
    pub fn new(store: S) -> Self {
        Self {
            store,
            notes: Vec::new(),
            owner: None,
        }
    }

    /// Current list, newest first.
    pub fn notes(&self) -> &[Note] {
        self.notes.as_slice()
    }

    /// Looks up one note by id.
    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == *id)
    }

    /// Returns whether `id` is present in the local list.
    pub fn contains(&self, id: &NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Owner the list is bound to, once a load or add has succeeded.
    pub fn owner(&self) -> Option<&OwnerId> {
        self.owner.as_ref()
    }

    /// Replaces the whole list with the store's view for `owner`.
    ///
    /// On failure the previous list is kept as-is; there is no retry.
    pub async fn load(&mut self, owner: &OwnerId) -> ControllerResult<&[Note]> {
        let started_at = Instant::now();
        info!("event=notes_load module=controller status=start owner={owner}");

        if let Err(err) = self.ensure_owner_scope(owner) {
            error!(
                "event=notes_load module=controller status=error owner={owner} duration_ms={} error_code={} error={err}",
                started_at.elapsed().as_millis(),
                err.code(),
            );
            return Err(err);
        }

        match self.store.list_notes(owner).await {
            Ok(notes) => {
                if let Err(err) = check_loaded_rows(&notes, owner) {
                    let err = ControllerError::Load(err);
                    error!(
                        "event=notes_load module=controller status=error owner={owner} duration_ms={} error_code={} error={err}",
                        started_at.elapsed().as_millis(),
                        err.code(),
                    );
                    return Err(err);
                }
                self.owner = Some(owner.clone());
                self.notes = notes;
                info!(
                    "event=notes_load module=controller status=ok owner={owner} count={} duration_ms={}",
                    self.notes.len(),
                    started_at.elapsed().as_millis(),
                );
                Ok(self.notes.as_slice())
            }
            Err(err) => {
                let err = ControllerError::Load(err);
                error!(
                    "event=notes_load module=controller status=error owner={owner} duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                );
                Err(err)
            }
        }
    }

    /// Creates a note for `owner` and inserts the confirmed record at the
    /// head of the list.
    ///
    /// Title and content are trimmed and must be non-empty; validation
    /// failures return before any store call.
    pub async fn add(
        &mut self,
        owner: &OwnerId,
        title: &str,
        content: &str,
    ) -> ControllerResult<&Note> {
        let started_at = Instant::now();
        info!("event=note_add module=controller status=start owner={owner}");

        let draft = match self
            .ensure_owner_scope(owner)
            .and_then(|()| NoteDraft::new(title, content).map_err(ControllerError::from))
        {
            Ok(draft) => draft,
            Err(err) => {
                error!(
                    "event=note_add module=controller status=error owner={owner} duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                );
                return Err(err);
            }
        };

        match self.store.create_note(owner, &draft).await {
            Ok(note) => {
                if let Err(err) = check_owned(&note, owner) {
                    let err = ControllerError::Save(err);
                    error!(
                        "event=note_add module=controller status=error owner={owner} duration_ms={} error_code={} error={err}",
                        started_at.elapsed().as_millis(),
                        err.code(),
                    );
                    return Err(err);
                }
                if self.owner.is_none() {
                    self.owner = Some(owner.clone());
                }
                info!(
                    "event=note_add module=controller status=ok owner={owner} note_id={} duration_ms={}",
                    note.id,
                    started_at.elapsed().as_millis(),
                );
                self.notes.insert(0, note);
                Ok(&self.notes[0])
            }
            Err(err) => {
                let err = ControllerError::Save(err);
                error!(
                    "event=note_add module=controller status=error owner={owner} duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                );
                Err(err)
            }
        }
    }

    /// Applies a partial update to a note already in the list and replaces
    /// the entry in place with the store's refreshed record.
    ///
    /// A store-side `NotFound` surfaces as an error with
    /// [`ControllerError::is_not_found`] set, so callers can decide whether
    /// to [`NoteController::forget`] the stale entry.
    pub async fn update(
        &mut self,
        id: &NoteId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> ControllerResult<&Note> {
        let started_at = Instant::now();
        info!("event=note_update module=controller status=start note_id={id}");

        let prepared = NotePatch::new(title, content)
            .map_err(ControllerError::from)
            .and_then(|patch| {
                let index = self
                    .notes
                    .iter()
                    .position(|note| note.id == *id)
                    .ok_or_else(|| ControllerError::UnknownNote(id.clone()))?;
                Ok((patch, index))
            });
        let (patch, index) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                error!(
                    "event=note_update module=controller status=error note_id={id} duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                );
                return Err(err);
            }
        };

        match self.store.update_note(id, &patch).await {
            Ok(refreshed) => {
                if let Err(err) = check_refreshed_row(&refreshed, &self.notes[index]) {
                    let err = ControllerError::Update(err);
                    error!(
                        "event=note_update module=controller status=error note_id={id} duration_ms={} error_code={} error={err}",
                        started_at.elapsed().as_millis(),
                        err.code(),
                    );
                    return Err(err);
                }
                self.notes[index] = refreshed;
                info!(
                    "event=note_update module=controller status=ok note_id={id} duration_ms={}",
                    started_at.elapsed().as_millis(),
                );
                Ok(&self.notes[index])
            }
            Err(err) => {
                let err = ControllerError::Update(err);
                error!(
                    "event=note_update module=controller status=error note_id={id} duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                );
                Err(err)
            }
        }
    }

    /// Deletes a note from the store, then drops the local entry.
    ///
    /// Removing an id the store no longer has yields an error with
    /// [`ControllerError::is_not_found`] set and leaves the list unchanged,
    /// so a repeated remove is harmless.
    pub async fn remove(&mut self, id: &NoteId) -> ControllerResult<()> {
        let started_at = Instant::now();
        info!("event=note_remove module=controller status=start note_id={id}");

        if id.is_blank() {
            let err = ControllerError::Validation(NoteValidationError::BlankNoteId);
            error!(
                "event=note_remove module=controller status=error note_id={id} duration_ms={} error_code={} error={err}",
                started_at.elapsed().as_millis(),
                err.code(),
            );
            return Err(err);
        }

        match self.store.delete_note(id).await {
            Ok(()) => {
                self.notes.retain(|note| note.id != *id);
                info!(
                    "event=note_remove module=controller status=ok note_id={id} count={} duration_ms={}",
                    self.notes.len(),
                    started_at.elapsed().as_millis(),
                );
                Ok(())
            }
            Err(err) => {
                let err = ControllerError::Delete(err);
                error!(
                    "event=note_remove module=controller status=error note_id={id} duration_ms={} error_code={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                );
                Err(err)
            }
        }
    }

    /// Drops a local entry without touching the store.
    ///
    /// Reconciliation hook for stale entries, e.g. after an update or
    /// remove came back not-found. Returns whether an entry was dropped.
    pub fn forget(&mut self, id: &NoteId) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != *id);
        let dropped = self.notes.len() < before;
        info!("event=note_forget module=controller status=ok note_id={id} dropped={dropped}");
        dropped
    }

    /// Empties the list and unbinds the owner when the session ends.
    pub fn clear(&mut self) {
        let count = self.notes.len();
        self.notes.clear();
        self.owner = None;
        info!("event=notes_clear module=controller status=ok count={count}");
    }

    fn ensure_owner_scope(&self, requested: &OwnerId) -> ControllerResult<()> {
        if requested.is_blank() {
            return Err(ControllerError::Validation(
                NoteValidationError::BlankOwnerId,
            ));
        }
        match &self.owner {
            Some(bound) if bound != requested => Err(ControllerError::OwnerMismatch {
                bound: bound.clone(),
                requested: requested.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Rejects loaded rows that would break the list invariants.
fn check_loaded_rows(notes: &[Note], owner: &OwnerId) -> Result<(), StoreError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(notes.len());
    for note in notes {
        if note.owner_id != *owner {
            return Err(StoreError::InvalidData(format!(
                "note {} belongs to owner {}, expected {}",
                note.id, note.owner_id, owner
            )));
        }
        if !seen.insert(note.id.as_str()) {
            return Err(StoreError::InvalidData(format!(
                "duplicate note id in store response: {}",
                note.id
            )));
        }
    }
    Ok(())
}

fn check_owned(note: &Note, owner: &OwnerId) -> Result<(), StoreError> {
    if note.owner_id != *owner {
        return Err(StoreError::InvalidData(format!(
            "note {} belongs to owner {}, expected {}",
            note.id, note.owner_id, owner
        )));
    }
    Ok(())
}

/// A refreshed row must keep the identity of the entry it replaces.
fn check_refreshed_row(refreshed: &Note, current: &Note) -> Result<(), StoreError> {
    if refreshed.id != current.id {
        return Err(StoreError::InvalidData(format!(
            "store answered update for {} with document {}",
            current.id, refreshed.id
        )));
    }
    if refreshed.owner_id != current.owner_id {
        return Err(StoreError::InvalidData(format!(
            "note {} changed owner in store response",
            refreshed.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn error_codes_are_stable() {
        let id = NoteId::from("n1");
        assert_eq!(
            ControllerError::Validation(NoteValidationError::EmptyTitle).code(),
            "validation_failed"
        );
        assert_eq!(ControllerError::UnknownNote(id.clone()).code(), "unknown_note");
        assert_eq!(
            ControllerError::Load(StoreError::Transport("offline".into())).code(),
            "load_failed"
        );
        assert_eq!(
            ControllerError::Delete(StoreError::NotFound(id.clone())).code(),
            "not_found"
        );
        assert_eq!(
            ControllerError::Update(StoreError::NotFound(id)).code(),
            "not_found"
        );
    }

    #[test]
    fn not_found_detection_tracks_inner_store_error() {
        let gone = ControllerError::Delete(StoreError::NotFound(NoteId::from("n1")));
        assert!(gone.is_not_found());

        let refused = ControllerError::Delete(StoreError::Unauthorized("no session".into()));
        assert!(!refused.is_not_found());

        let invalid = ControllerError::Validation(NoteValidationError::EmptyTitle);
        assert!(!invalid.is_not_found());
    }

    #[test]
    fn messages_name_the_failed_operation() {
        let err = ControllerError::Load(StoreError::Transport("offline".into()));
        assert!(err.to_string().starts_with("failed to fetch notes"));

        let err = ControllerError::Save(StoreError::Api {
            status: 500,
            message: "boom".into(),
        });
        assert!(err.to_string().starts_with("failed to save note"));
    }

    #[test]
    fn loaded_rows_are_checked_for_scope_and_uniqueness() {
        let owner = OwnerId::from("u1");
        let draft = NoteDraft::new("Groceries", "milk").unwrap();
        let now = Utc::now();
        let a = Note::assigned(NoteId::from("n1"), owner.clone(), &draft, now);
        let b = Note::assigned(NoteId::from("n2"), OwnerId::from("u2"), &draft, now);

        assert!(check_loaded_rows(&[a.clone()], &owner).is_ok());
        assert!(check_loaded_rows(&[a.clone(), b], &owner).is_err());
        assert!(check_loaded_rows(&[a.clone(), a], &owner).is_err());
    }
}
