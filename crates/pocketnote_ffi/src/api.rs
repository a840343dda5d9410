//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Hold the process-wide backend state (auth session + note list).
//! - Translate core errors into envelope codes the UI can branch on.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Note calls run behind one async lock, so the visible list only ever
//!   changes after the backend confirmed the operation.
//! - Envelope `code` values are stable machine-readable tokens; `message`
//!   wording may change between releases.
//!
//! # See also
//! - `pocketnote_core::controller` for the list consistency rules.

use log::info;
use once_cell::sync::OnceCell;
use pocketnote_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AccountUser, AuthService, BackendConfig, HttpAuthGateway, HttpNoteStore, Note, NoteController,
    NoteId, OwnerId,
};
use tokio::sync::Mutex;

const CODE_NOT_INITIALIZED: &str = "not_initialized";
const CODE_NOT_SIGNED_IN: &str = "not_signed_in";
const NOT_SIGNED_IN_MESSAGE: &str = "no account is signed in; call auth_login first";

static BACKEND: OnceCell<AppState> = OnceCell::new();

/// Process-wide backend wiring created by [`init_backend`].
struct AppState {
    config: BackendConfig,
    core: Mutex<AppCore>,
}

/// Mutable half of the backend state, guarded by one async lock.
struct AppCore {
    auth: AuthService<HttpAuthGateway>,
    controller: NoteController<HttpNoteStore>,
    session: Option<AccountUser>,
}

impl AppState {
    fn build(config: BackendConfig) -> Result<Self, String> {
        let gateway = HttpAuthGateway::new(config.clone())
            .map_err(|err| format!("backend init failed: {err}"))?;
        let store = HttpNoteStore::with_client(gateway.session_client().clone(), config.clone());
        Ok(Self {
            config,
            core: Mutex::new(AppCore {
                auth: AuthService::new(gateway),
                controller: NoteController::new(store),
                session: None,
            }),
        })
    }
}

fn backend() -> Result<&'static AppState, String> {
    BACKEND
        .get()
        .ok_or_else(|| "backend is not initialized; call init_backend first".to_string())
}

fn session_owner(core: &AppCore) -> Option<OwnerId> {
    core.session.as_ref().map(|user| user.id.clone())
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - UI-thread safe for current implementation.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - UI-thread safe for current implementation.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Wires the hosted-backend auth and note stack once per process.
///
/// Input semantics:
/// - `endpoint`: base URL of the backend API, e.g. `https://cloud.appwrite.io/v1`.
/// - `api_key`: optional server key; attached to document calls only, never
///   to account calls.
///
/// # FFI contract
/// - Sync call; builds HTTP clients but performs no network I/O.
/// - Safe to call repeatedly with the same configuration (idempotent).
/// - Reconfiguration attempts with different values return an error message.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_backend(
    endpoint: String,
    project_id: String,
    database_id: String,
    collection_id: String,
    api_key: Option<String>,
) -> String {
    let config = match BackendConfig::new(
        &endpoint,
        &project_id,
        &database_id,
        &collection_id,
        api_key.as_deref(),
    ) {
        Ok(config) => config,
        Err(err) => return format!("backend config rejected: {err}"),
    };

    let built = BACKEND.get_or_try_init(|| {
        let state = AppState::build(config.clone())?;
        info!(
            "event=backend_init module=ffi status=ok endpoint={} project_id={}",
            state.config.endpoint, state.config.project_id
        );
        Ok::<_, String>(state)
    });

    match built {
        Ok(state) if state.config == config => String::new(),
        Ok(_) => "backend already initialized with a different configuration".to_string(),
        Err(err) => err,
    }
}

/// Note row shaped for list rendering in Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteView {
    /// Stable note ID in string form.
    pub id: String,
    /// Full note title.
    pub title: String,
    /// Full note body.
    pub content: String,
    /// Short body excerpt for list rows.
    pub preview: String,
    /// Creation instant as epoch milliseconds (UTC).
    pub created_at_ms: i64,
    /// Last-update instant as epoch milliseconds (UTC).
    pub updated_at_ms: i64,
}

/// Signed-in account shaped for Dart display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    /// Stable account ID in string form.
    pub id: String,
    /// Display name; empty when the account was created without one.
    pub name: String,
    /// Sign-in email address.
    pub email: String,
}

/// Generic action response envelope for commands without a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Stable failure token for UI branching; empty on plain success.
    pub code: String,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            code: String::new(),
            message: message.into(),
        }
    }

    fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Response envelope for account flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Stable failure token for UI branching; empty on plain success.
    pub code: String,
    /// Signed-in account; `None` when no session exists.
    pub user: Option<UserView>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl AuthResponse {
    fn success(message: impl Into<String>, user: Option<UserView>) -> Self {
        Self {
            ok: true,
            code: String::new(),
            user,
            message: message.into(),
        }
    }

    fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            user: None,
            message: message.into(),
        }
    }
}

/// Response envelope for the note-list read flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Stable failure token for UI branching; empty on plain success.
    pub code: String,
    /// Notes in list order (newest first after a load).
    pub notes: Vec<NoteView>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl NotesResponse {
    fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            notes: Vec::new(),
            message: message.into(),
        }
    }
}

/// Response envelope for note commands that return the confirmed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Stable failure token for UI branching; empty on plain success.
    pub code: String,
    /// Confirmed note record on success.
    pub note: Option<NoteView>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl NoteActionResponse {
    fn success(message: impl Into<String>, note: NoteView) -> Self {
        Self {
            ok: true,
            code: String::new(),
            note: Some(note),
            message: message.into(),
        }
    }

    fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            note: None,
            message: message.into(),
        }
    }
}

/// Creates an account and signs it in.
///
/// # FFI contract
/// - Async call, network-backed execution.
/// - On success the session is cached and note calls are unlocked.
/// - Never panics.
pub async fn auth_register(email: String, password: String, name: String) -> AuthResponse {
    let state = match backend() {
        Ok(state) => state,
        Err(message) => return AuthResponse::failure(CODE_NOT_INITIALIZED, message),
    };
    let mut core = state.core.lock().await;
    match core.auth.register(&email, &password, &name).await {
        Ok(user) => {
            let view = to_user_view(&user);
            core.session = Some(user);
            AuthResponse::success("Account created and signed in.", Some(view))
        }
        Err(err) => AuthResponse::failure(err.code(), format!("auth_register failed: {err}")),
    }
}

/// Signs an existing account in.
///
/// # FFI contract
/// - Async call, network-backed execution.
/// - On success the session is cached and note calls are unlocked.
/// - Never panics.
pub async fn auth_login(email: String, password: String) -> AuthResponse {
    let state = match backend() {
        Ok(state) => state,
        Err(message) => return AuthResponse::failure(CODE_NOT_INITIALIZED, message),
    };
    let mut core = state.core.lock().await;
    match core.auth.login(&email, &password).await {
        Ok(user) => {
            let view = to_user_view(&user);
            core.session = Some(user);
            AuthResponse::success("Signed in.", Some(view))
        }
        Err(err) => AuthResponse::failure(err.code(), format!("auth_login failed: {err}")),
    }
}

/// Resolves the account behind the current session, if any.
///
/// # FFI contract
/// - Async call, network-backed execution.
/// - `ok=true` with `user=None` means no one is signed in; the cached
///   session and note list are dropped in that case.
/// - Never panics.
pub async fn auth_current_user() -> AuthResponse {
    let state = match backend() {
        Ok(state) => state,
        Err(message) => return AuthResponse::failure(CODE_NOT_INITIALIZED, message),
    };
    let mut core = state.core.lock().await;
    match core.auth.current_user().await {
        Ok(Some(user)) => {
            let view = to_user_view(&user);
            core.session = Some(user);
            AuthResponse::success("Session is active.", Some(view))
        }
        Ok(None) => {
            core.session = None;
            core.controller.clear();
            AuthResponse::success("No active session.", None)
        }
        Err(err) => AuthResponse::failure(err.code(), format!("auth_current_user failed: {err}")),
    }
}

/// Ends the current session.
///
/// # FFI contract
/// - Async call, network-backed execution.
/// - Drops the cached session and the local note list on success.
/// - Safe to call when already signed out.
/// - Never panics.
pub async fn auth_logout() -> ActionResponse {
    let state = match backend() {
        Ok(state) => state,
        Err(message) => return ActionResponse::failure(CODE_NOT_INITIALIZED, message),
    };
    let mut core = state.core.lock().await;
    match core.auth.logout().await {
        Ok(()) => {
            core.session = None;
            core.controller.clear();
            ActionResponse::success("Signed out.")
        }
        Err(err) => ActionResponse::failure(err.code(), format!("auth_logout failed: {err}")),
    }
}

/// Fetches the signed-in account's notes and replaces the local list.
///
/// # FFI contract
/// - Async call, network-backed execution.
/// - On failure the previously loaded list is kept, but the envelope
///   carries no rows; render from the last good response.
/// - Never panics.
pub async fn notes_load() -> NotesResponse {
    let state = match backend() {
        Ok(state) => state,
        Err(message) => return NotesResponse::failure(CODE_NOT_INITIALIZED, message),
    };
    let mut core = state.core.lock().await;
    let owner = match session_owner(&core) {
        Some(owner) => owner,
        None => return NotesResponse::failure(CODE_NOT_SIGNED_IN, NOT_SIGNED_IN_MESSAGE),
    };
    match core.controller.load(&owner).await {
        Ok(notes) => {
            let views = notes.iter().map(to_note_view).collect::<Vec<_>>();
            let message = if views.is_empty() {
                "No notes yet.".to_string()
            } else {
                format!("Loaded {} note(s).", views.len())
            };
            NotesResponse {
                ok: true,
                code: String::new(),
                notes: views,
                message,
            }
        }
        Err(err) => NotesResponse::failure(err.code(), format!("notes_load failed: {err}")),
    }
}

/// Creates a note for the signed-in account.
///
/// # FFI contract
/// - Async call, network-backed execution.
/// - The local list gains the confirmed record at its head.
/// - Never panics.
pub async fn note_add(title: String, content: String) -> NoteActionResponse {
    let state = match backend() {
        Ok(state) => state,
        Err(message) => return NoteActionResponse::failure(CODE_NOT_INITIALIZED, message),
    };
    let mut core = state.core.lock().await;
    let owner = match session_owner(&core) {
        Some(owner) => owner,
        None => return NoteActionResponse::failure(CODE_NOT_SIGNED_IN, NOT_SIGNED_IN_MESSAGE),
    };
    match core.controller.add(&owner, &title, &content).await {
        Ok(note) => NoteActionResponse::success("Note saved.", to_note_view(note)),
        Err(err) => NoteActionResponse::failure(err.code(), format!("note_add failed: {err}")),
    }
}

/// Rewrites the given fields of a note already in the local list.
///
/// Input semantics:
/// - `title`/`content`: `None` keeps the stored field, `Some` replaces it.
///
/// # FFI contract
/// - Async call, network-backed execution.
/// - `code=not_found` means the note is gone server-side; the stale row
///   stays listed until [`note_forget`] drops it.
/// - Never panics.
pub async fn note_update(
    id: String,
    title: Option<String>,
    content: Option<String>,
) -> NoteActionResponse {
    let state = match backend() {
        Ok(state) => state,
        Err(message) => return NoteActionResponse::failure(CODE_NOT_INITIALIZED, message),
    };
    let mut core = state.core.lock().await;
    if session_owner(&core).is_none() {
        return NoteActionResponse::failure(CODE_NOT_SIGNED_IN, NOT_SIGNED_IN_MESSAGE);
    }
    let note_id = NoteId::new(id);
    match core
        .controller
        .update(&note_id, title.as_deref(), content.as_deref())
        .await
    {
        Ok(note) => NoteActionResponse::success("Note updated.", to_note_view(note)),
        Err(err) => NoteActionResponse::failure(err.code(), format!("note_update failed: {err}")),
    }
}

/// Deletes a note and drops it from the local list.
///
/// # FFI contract
/// - Async call, network-backed execution.
/// - A note already gone server-side still reports `ok=true` with
///   `code=not_found`, and the stale row is dropped locally.
/// - Never panics.
pub async fn note_delete(id: String) -> ActionResponse {
    let state = match backend() {
        Ok(state) => state,
        Err(message) => return ActionResponse::failure(CODE_NOT_INITIALIZED, message),
    };
    let mut core = state.core.lock().await;
    if session_owner(&core).is_none() {
        return ActionResponse::failure(CODE_NOT_SIGNED_IN, NOT_SIGNED_IN_MESSAGE);
    }
    let note_id = NoteId::new(id);
    match core.controller.remove(&note_id).await {
        Ok(()) => ActionResponse::success("Note deleted."),
        Err(err) if err.is_not_found() => {
            core.controller.forget(&note_id);
            ActionResponse {
                ok: true,
                code: err.code().to_string(),
                message: "Note was already gone; dropped it from the local list.".to_string(),
            }
        }
        Err(err) => ActionResponse::failure(err.code(), format!("note_delete failed: {err}")),
    }
}

/// Drops a note from the local list without touching the backend.
///
/// # FFI contract
/// - Async call, local-only execution.
/// - Reconcile helper for stale rows; succeeds whether or not the ID
///   was listed.
/// - Never panics.
pub async fn note_forget(id: String) -> ActionResponse {
    let state = match backend() {
        Ok(state) => state,
        Err(message) => return ActionResponse::failure(CODE_NOT_INITIALIZED, message),
    };
    let mut core = state.core.lock().await;
    let note_id = NoteId::new(id);
    if core.controller.forget(&note_id) {
        ActionResponse::success("Note dropped from the local list.")
    } else {
        ActionResponse::success("Note was not in the local list.")
    }
}

/// Empties the local note list and releases its owner binding.
///
/// # FFI contract
/// - Async call, local-only execution.
/// - Never panics.
pub async fn notes_clear() -> ActionResponse {
    let state = match backend() {
        Ok(state) => state,
        Err(message) => return ActionResponse::failure(CODE_NOT_INITIALIZED, message),
    };
    let mut core = state.core.lock().await;
    core.controller.clear();
    ActionResponse::success("Note list cleared.")
}

fn to_note_view(note: &Note) -> NoteView {
    NoteView {
        id: note.id.to_string(),
        title: note.title.clone(),
        content: note.content.clone(),
        preview: note.preview().unwrap_or_default(),
        created_at_ms: note.created_at.timestamp_millis(),
        updated_at_ms: note.updated_at.timestamp_millis(),
    }
}

fn to_user_view(user: &AccountUser) -> UserView {
    UserView {
        id: user.id.to_string(),
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_backend, init_logging, note_add, note_delete, note_forget, notes_load,
        ping,
    };

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    // The backend slot is process-global, so its whole lifecycle lives in
    // one test. No network I/O happens: every call below is refused before
    // a request could go out.
    #[tokio::test]
    async fn backend_lifecycle_guards_init_and_session() {
        let refused = notes_load().await;
        assert!(!refused.ok);
        assert_eq!(refused.code, "not_initialized");

        let rejected = init_backend(
            "ftp://cloud.example.com".to_string(),
            "proj".to_string(),
            "db".to_string(),
            "notes".to_string(),
            None,
        );
        assert!(!rejected.is_empty());

        let first = init_backend(
            "https://cloud.example.com/v1".to_string(),
            "proj".to_string(),
            "db".to_string(),
            "notes".to_string(),
            None,
        );
        assert_eq!(first, "");

        let again = init_backend(
            "https://cloud.example.com/v1".to_string(),
            "proj".to_string(),
            "db".to_string(),
            "notes".to_string(),
            None,
        );
        assert_eq!(again, "");

        let conflict = init_backend(
            "https://cloud.example.com/v1".to_string(),
            "other-proj".to_string(),
            "db".to_string(),
            "notes".to_string(),
            None,
        );
        assert!(conflict.contains("different configuration"));

        let unauthorized = notes_load().await;
        assert!(!unauthorized.ok);
        assert_eq!(unauthorized.code, "not_signed_in");

        let add = note_add("a".to_string(), "b".to_string()).await;
        assert!(!add.ok);
        assert_eq!(add.code, "not_signed_in");

        let delete = note_delete("n1".to_string()).await;
        assert!(!delete.ok);
        assert_eq!(delete.code, "not_signed_in");

        let forget = note_forget("n1".to_string()).await;
        assert!(forget.ok);
    }
}
