//! In-memory note store for tests and offline smoke runs.
//!
//! # Responsibility
//! - Emulate the remote document collection behind the `NoteStore` trait.
//! - Assign ids and timestamps the way the hosted store would.
//!
//! # Invariants
//! - Listing is scoped to the requested owner and ordered newest-first;
//!   equal timestamps keep insertion order.
//! - Unknown ids yield `StoreError::NotFound`, matching the remote contract.

use crate::model::note::{Note, NoteDraft, NoteId, NotePatch, OwnerId};
use crate::store::{NoteStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Mutex-guarded document collection living in process memory.
#[derive(Debug, Default)]
pub struct InMemoryNoteStore {
    notes: Mutex<Vec<Note>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the store pre-populated, for fixtures with pinned ids and
    /// timestamps.
    pub fn seeded(notes: Vec<Note>) -> Self {
        Self {
            notes: Mutex::new(notes),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Note>> {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn list_notes(&self, owner: &OwnerId) -> StoreResult<Vec<Note>> {
        let notes = self.guard();
        let mut owned: Vec<Note> = notes
            .iter()
            .filter(|note| &note.owner_id == owner)
            .cloned()
            .collect();
        // Stable sort: equal created_at keeps insertion order.
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn create_note(&self, owner: &OwnerId, draft: &NoteDraft) -> StoreResult<Note> {
        let note = Note::assigned(
            NoteId::new(Uuid::new_v4().simple().to_string()),
            owner.clone(),
            draft,
            Utc::now(),
        );
        self.guard().push(note.clone());
        Ok(note)
    }

    async fn update_note(&self, id: &NoteId, patch: &NotePatch) -> StoreResult<Note> {
        let mut notes = self.guard();
        let note = notes
            .iter_mut()
            .find(|note| &note.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if let Some(title) = patch.title() {
            note.title = title.to_string();
        }
        if let Some(content) = patch.content() {
            note.content = content.to_string();
        }
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn delete_note(&self, id: &NoteId) -> StoreResult<()> {
        let mut notes = self.guard();
        let before = notes.len();
        notes.retain(|note| &note.id != id);
        if notes.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}
