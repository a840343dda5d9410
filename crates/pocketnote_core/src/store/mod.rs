//! Remote note store contract and implementations.
//!
//! # Responsibility
//! - Define the use-case oriented persistence contract (`NoteStore`).
//! - Isolate transport and wire-format details from the controller.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`, `Unauthorized`) in
//!   addition to transport failures; callers never see raw HTTP errors.
//! - `list_notes` returns documents newest-first (`created_at` descending)
//!   as ordered by the store; implementations own that ordering.

use crate::model::note::{Note, NoteDraft, NoteId, NotePatch, OwnerId};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod http;
pub mod memory;

pub use http::HttpNoteStore;
pub use memory::InMemoryNoteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer error for document persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced document does not exist in the collection.
    NotFound(NoteId),
    /// The store rejected the caller's credentials or permissions.
    Unauthorized(String),
    /// Network-level failure before any store response arrived.
    Transport(String),
    /// The store answered with a non-success status other than the above.
    Api { status: u16, message: String },
    /// The store answered, but the payload could not be decoded.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Unauthorized(message) => write!(f, "store rejected credentials: {message}"),
            Self::Transport(message) => write!(f, "store unreachable: {message}"),
            Self::Api { status, message } => {
                write!(f, "store request failed (HTTP {status}): {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid store response: {message}"),
        }
    }
}

impl Error for StoreError {}

impl StoreError {
    /// Returns whether this error means the target document is gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Persistence contract the controller reconciles against.
///
/// Implementations sit behind a network boundary (or emulate one); every
/// call settles fully before the caller observes a result.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Lists all notes owned by `owner`, newest first.
    async fn list_notes(&self, owner: &OwnerId) -> StoreResult<Vec<Note>>;

    /// Creates one note for `owner`; the store assigns id and timestamps.
    async fn create_note(&self, owner: &OwnerId, draft: &NoteDraft) -> StoreResult<Note>;

    /// Applies a partial update and returns the refreshed document.
    async fn update_note(&self, id: &NoteId, patch: &NotePatch) -> StoreResult<Note>;

    /// Deletes one note. Deleting an unknown id yields `NotFound`.
    async fn delete_note(&self, id: &NoteId) -> StoreResult<()>;
}
