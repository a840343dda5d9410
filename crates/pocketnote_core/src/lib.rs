//! Core domain logic for PocketNote.
//! This crate is the single source of truth for note-list consistency.

pub mod auth;
pub mod config;
pub mod controller;
pub mod form;
pub mod logging;
pub mod model;
pub mod store;

pub use auth::{
    AccountUser, AuthError, AuthGateway, AuthResult, AuthService, HttpAuthGateway,
    InMemoryAuthGateway,
};
pub use config::{BackendConfig, ConfigError, ConfigResult};
pub use controller::{ControllerError, ControllerResult, NoteController};
pub use form::{BeginSubmit, FormMode, FormPhase, FormSession, SubmitOutcome};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{
    derive_preview, Note, NoteDraft, NoteId, NotePatch, NoteValidationError, OwnerId,
};
pub use store::{HttpNoteStore, InMemoryNoteStore, NoteStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
