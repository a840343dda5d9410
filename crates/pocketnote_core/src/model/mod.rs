//! Domain model for user notes.
//!
//! # Responsibility
//! - Define the canonical note record shared by controller, store and FFI.
//! - Provide validated input shapes for the write path.
//!
//! # Invariants
//! - Every note carries a store-assigned, immutable `NoteId`.
//! - Write-path inputs (`NoteDraft`, `NotePatch`) are trimmed and non-empty
//!   at construction time; rows read back from the store are not re-checked.

pub mod note;
