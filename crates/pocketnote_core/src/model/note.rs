//! Note domain model and validated write-path inputs.
//!
//! # Responsibility
//! - Define the canonical note record returned by the remote store.
//! - Validate user input (trim + non-empty) before it reaches the network.
//! - Derive the short list preview shown next to the title.
//!
//! # Invariants
//! - `id` is assigned by the store on creation and never changes.
//! - `owner_id` is set at creation and never changes.
//! - `created_at` is set once by the store; `updated_at` moves forward on
//!   every successful update.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PREVIEW_MAX_CHARS: usize = 120;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable store-assigned note identifier.
///
/// Kept as an opaque string newtype: the store owns the id format, the
/// client only threads it through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Wraps a store-provided identifier. No format is assumed.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether the id is usable as a store lookup key.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of the authenticated user a note belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Canonical note record as confirmed by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable store-assigned id.
    pub id: NoteId,
    /// Authenticated user this note belongs to.
    pub owner_id: OwnerId,
    /// Note title. Trimmed non-empty on the write path.
    pub title: String,
    /// Note body. Trimmed non-empty on the write path.
    pub content: String,
    /// Store-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Refreshed by the store on every successful update.
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Builds a note whose identity and timestamps already exist externally.
    ///
    /// Used by store implementations when materializing a freshly created
    /// document; `created_at == updated_at` at that point.
    pub fn assigned(
        id: NoteId,
        owner_id: OwnerId,
        draft: &NoteDraft,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            title: draft.title().to_string(),
            content: draft.content().to_string(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Short single-line summary of the body for list rendering.
    pub fn preview(&self) -> Option<String> {
        derive_preview(self.content.as_str())
    }
}

/// Validation failure for write-path note input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
    /// Content is empty after trimming.
    EmptyContent,
    /// Patch carries neither a title nor a content change.
    EmptyPatch,
    /// Provided note id is blank.
    BlankNoteId,
    /// Provided owner id is blank.
    BlankOwnerId,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::EmptyContent => write!(f, "content must not be empty"),
            Self::EmptyPatch => write!(f, "patch must change title or content"),
            Self::BlankNoteId => write!(f, "note id must not be blank"),
            Self::BlankOwnerId => write!(f, "owner id must not be blank"),
        }
    }
}

impl Error for NoteValidationError {}

/// Validated input for creating one note.
///
/// Construction trims both fields and rejects empty values, so a draft in
/// hand is always safe to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    title: String,
    content: String,
}

impl NoteDraft {
    /// Validates raw form input into a submittable draft.
    pub fn new(title: &str, content: &str) -> Result<Self, NoteValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(NoteValidationError::EmptyContent);
        }
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
        })
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn content(&self) -> &str {
        self.content.as_str()
    }
}

/// Validated partial update for one note.
///
/// At least one field must be present; present fields are trimmed and
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePatch {
    title: Option<String>,
    content: Option<String>,
}

impl NotePatch {
    /// Validates raw form input into a submittable patch.
    pub fn new(title: Option<&str>, content: Option<&str>) -> Result<Self, NoteValidationError> {
        if title.is_none() && content.is_none() {
            return Err(NoteValidationError::EmptyPatch);
        }
        let title = match title {
            Some(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(NoteValidationError::EmptyTitle);
                }
                Some(trimmed.to_string())
            }
            None => None,
        };
        let content = match content {
            Some(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(NoteValidationError::EmptyContent);
                }
                Some(trimmed.to_string())
            }
            None => None,
        };
        Ok(Self { title, content })
    }

    /// Full-replace patch used by the edit form (both fields submitted).
    pub fn replace(draft: &NoteDraft) -> Self {
        Self {
            title: Some(draft.title().to_string()),
            content: Some(draft.content().to_string()),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// Derives the short list preview from note content.
///
/// Rules:
/// - Whitespace runs (including newlines) collapse to single spaces.
/// - The first 120 chars are retained.
/// - Returns `None` for all-whitespace content.
pub fn derive_preview(content: &str) -> Option<String> {
    let normalized = WHITESPACE_RE.replace_all(content, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
    }
}
