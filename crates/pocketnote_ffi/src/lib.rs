//! Flutter-facing bridge crate for PocketNote.
//!
//! The bridge surface lives in [`api`]; domain logic stays in
//! `pocketnote_core`.

pub mod api;
