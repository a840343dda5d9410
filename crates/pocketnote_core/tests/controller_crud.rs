use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pocketnote_core::{
    ControllerError, InMemoryNoteStore, Note, NoteController, NoteDraft, NoteId, NotePatch,
    NoteStore, OwnerId, StoreError, StoreResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn note_at(id: &str, owner: &str, secs: i64) -> Note {
    let draft = NoteDraft::new(format!("Title {id}").as_str(), "Body").unwrap();
    let at = Utc.timestamp_opt(secs, 0).unwrap();
    Note::assigned(NoteId::from(id), OwnerId::from(owner), &draft, at)
}

fn ids(controller: &NoteController<impl NoteStore>) -> Vec<String> {
    controller
        .notes()
        .iter()
        .map(|note| note.id.to_string())
        .collect()
}

/// Store double that returns a scripted list payload verbatim.
struct ScriptedStore {
    rows: Vec<Note>,
}

#[async_trait]
impl NoteStore for ScriptedStore {
    async fn list_notes(&self, _owner: &OwnerId) -> StoreResult<Vec<Note>> {
        Ok(self.rows.clone())
    }

    async fn create_note(&self, _owner: &OwnerId, _draft: &NoteDraft) -> StoreResult<Note> {
        unreachable!("scripted store only lists")
    }

    async fn update_note(&self, _id: &NoteId, _patch: &NotePatch) -> StoreResult<Note> {
        unreachable!("scripted store only lists")
    }

    async fn delete_note(&self, _id: &NoteId) -> StoreResult<()> {
        unreachable!("scripted store only lists")
    }
}

/// Shared observation point for [`StoreProbe`].
#[derive(Default)]
struct ProbeState {
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_with: Mutex<Option<StoreError>>,
}

impl ProbeState {
    fn fail_with(&self, err: StoreError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }

    fn heal(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    fn injected(&self) -> Option<StoreError> {
        self.fail_with.lock().unwrap().clone()
    }
}

/// In-memory store wrapped with call counters and failure injection.
struct StoreProbe {
    inner: InMemoryNoteStore,
    state: Arc<ProbeState>,
}

impl StoreProbe {
    fn new() -> (Self, Arc<ProbeState>) {
        Self::seeded(Vec::new())
    }

    fn seeded(notes: Vec<Note>) -> (Self, Arc<ProbeState>) {
        let state = Arc::new(ProbeState::default());
        (
            Self {
                inner: InMemoryNoteStore::seeded(notes),
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

#[async_trait]
impl NoteStore for StoreProbe {
    async fn list_notes(&self, owner: &OwnerId) -> StoreResult<Vec<Note>> {
        self.state.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.state.injected() {
            return Err(err);
        }
        self.inner.list_notes(owner).await
    }

    async fn create_note(&self, owner: &OwnerId, draft: &NoteDraft) -> StoreResult<Note> {
        self.state.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.state.injected() {
            return Err(err);
        }
        self.inner.create_note(owner, draft).await
    }

    async fn update_note(&self, id: &NoteId, patch: &NotePatch) -> StoreResult<Note> {
        self.state.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.state.injected() {
            return Err(err);
        }
        self.inner.update_note(id, patch).await
    }

    async fn delete_note(&self, id: &NoteId) -> StoreResult<()> {
        self.state.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.state.injected() {
            return Err(err);
        }
        self.inner.delete_note(id).await
    }
}

#[tokio::test]
async fn load_adopts_store_order_without_resorting() {
    // Deliberately not sorted by created_at; store order wins.
    let store = ScriptedStore {
        rows: vec![
            note_at("n3", "u1", 300),
            note_at("n1", "u1", 100),
            note_at("n2", "u1", 200),
        ],
    };
    let mut controller = NoteController::new(store);

    controller.load(&OwnerId::from("u1")).await.unwrap();
    assert_eq!(ids(&controller), vec!["n3", "n1", "n2"]);
}

#[tokio::test]
async fn load_replaces_the_previous_list_wholesale() {
    let owner = OwnerId::from("u1");
    let (store, _) = StoreProbe::seeded(vec![note_at("n1", "u1", 100)]);
    let mut controller = NoteController::new(store);

    controller.load(&owner).await.unwrap();
    assert_eq!(controller.len(), 1);

    controller.add(&owner, "Todo", "Call Bob").await.unwrap();
    assert_eq!(controller.len(), 2);

    controller.load(&owner).await.unwrap();
    assert_eq!(controller.len(), 2);
    assert!(controller.contains(&NoteId::from("n1")));
}

#[tokio::test]
async fn load_failure_keeps_the_previous_list() {
    let owner = OwnerId::from("u1");
    let (store, probe) = StoreProbe::seeded(vec![note_at("n1", "u1", 100)]);
    let mut controller = NoteController::new(store);

    controller.load(&owner).await.unwrap();
    probe.fail_with(StoreError::Transport("connection reset".into()));

    let err = controller.load(&owner).await.unwrap_err();
    assert!(matches!(err, ControllerError::Load(_)));
    assert_eq!(ids(&controller), vec!["n1"]);

    // The controller stays usable once the store recovers.
    probe.heal();
    controller.load(&owner).await.unwrap();
    assert_eq!(ids(&controller), vec!["n1"]);
}

#[tokio::test]
async fn load_rejects_rows_belonging_to_another_owner() {
    let store = ScriptedStore {
        rows: vec![note_at("n1", "u1", 100), note_at("x1", "u2", 200)],
    };
    let mut controller = NoteController::new(store);

    let err = controller.load(&OwnerId::from("u1")).await.unwrap_err();
    assert!(matches!(
        err,
        ControllerError::Load(StoreError::InvalidData(_))
    ));
    assert!(controller.is_empty());
}

#[tokio::test]
async fn load_rejects_duplicate_ids_in_store_response() {
    let store = ScriptedStore {
        rows: vec![note_at("n1", "u1", 100), note_at("n1", "u1", 200)],
    };
    let mut controller = NoteController::new(store);

    let err = controller.load(&OwnerId::from("u1")).await.unwrap_err();
    assert!(matches!(
        err,
        ControllerError::Load(StoreError::InvalidData(_))
    ));
}

#[tokio::test]
async fn bound_owner_rejects_operations_for_another_owner() {
    let (store, state) = StoreProbe::new();
    let mut controller = NoteController::new(store);

    controller.load(&OwnerId::from("u1")).await.unwrap();
    let listed_for_u1 = state.list_calls.load(Ordering::SeqCst);

    let err = controller.load(&OwnerId::from("u2")).await.unwrap_err();
    assert!(matches!(err, ControllerError::OwnerMismatch { .. }));

    let err = controller
        .add(&OwnerId::from("u2"), "Todo", "Call Bob")
        .await
        .unwrap_err();
    assert!(matches!(err, ControllerError::OwnerMismatch { .. }));

    // Rejections happen before the store is consulted.
    assert_eq!(state.list_calls.load(Ordering::SeqCst), listed_for_u1);
    assert_eq!(state.create_calls.load(Ordering::SeqCst), 0);

    // Ending the session releases the binding.
    controller.clear();
    controller.load(&OwnerId::from("u2")).await.unwrap();
}

#[tokio::test]
async fn add_prepends_the_confirmed_note() {
    let owner = OwnerId::from("u1");
    let (store, _) = StoreProbe::seeded(vec![note_at("a", "u1", 200), note_at("b", "u1", 100)]);
    let mut controller = NoteController::new(store);
    controller.load(&owner).await.unwrap();
    assert_eq!(ids(&controller), vec!["a", "b"]);

    let created_id = controller
        .add(&owner, "Groceries", "milk, eggs")
        .await
        .unwrap()
        .id
        .clone();

    assert_eq!(controller.len(), 3);
    assert_eq!(controller.notes()[0].id, created_id);
    assert_eq!(ids(&controller)[1..], ["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn add_binds_the_owner_on_first_use() {
    let (store, _) = StoreProbe::new();
    let mut controller = NoteController::new(store);
    assert_eq!(controller.owner(), None);

    let owner = OwnerId::from("u1");
    controller.add(&owner, "Groceries", "milk, eggs").await.unwrap();
    assert_eq!(controller.owner(), Some(&owner));
}

#[tokio::test]
async fn validation_failures_issue_zero_store_calls() {
    let owner = OwnerId::from("u1");
    let (store, state) = StoreProbe::new();
    let mut controller = NoteController::new(store);

    let err = controller.add(&owner, "", "content").await.unwrap_err();
    assert!(matches!(err, ControllerError::Validation(_)));

    let err = controller.add(&owner, "title", "   ").await.unwrap_err();
    assert!(matches!(err, ControllerError::Validation(_)));

    assert_eq!(state.create_calls.load(Ordering::SeqCst), 0);
    assert!(controller.is_empty());
}

#[tokio::test]
async fn add_failure_leaves_the_list_unchanged() {
    let owner = OwnerId::from("u1");
    let (store, probe) = StoreProbe::seeded(vec![note_at("n1", "u1", 100)]);
    let mut controller = NoteController::new(store);
    controller.load(&owner).await.unwrap();

    probe.fail_with(StoreError::Api {
        status: 500,
        message: "server error".into(),
    });
    let err = controller.add(&owner, "Todo", "Call Bob").await.unwrap_err();
    assert!(matches!(err, ControllerError::Save(_)));
    assert_eq!(ids(&controller), vec!["n1"]);
}

#[tokio::test]
async fn update_replaces_the_entry_in_place() {
    let owner = OwnerId::from("u1");
    let (store, _) = StoreProbe::seeded(vec![note_at("n1", "u1", 100), note_at("n2", "u1", 50)]);
    let mut controller = NoteController::new(store);
    controller.load(&owner).await.unwrap();
    let untouched = controller.get(&NoteId::from("n1")).unwrap().clone();
    let before = controller.get(&NoteId::from("n2")).unwrap().clone();

    let refreshed = controller
        .update(&NoteId::from("n2"), None, Some("Call Bob at 5pm"))
        .await
        .unwrap()
        .clone();

    assert_eq!(ids(&controller), vec!["n1", "n2"]);
    assert_eq!(refreshed.content, "Call Bob at 5pm");
    assert_eq!(refreshed.title, before.title);
    assert!(refreshed.updated_at > before.updated_at);
    assert_eq!(controller.get(&NoteId::from("n1")), Some(&untouched));
}

#[tokio::test]
async fn update_requires_a_known_id() {
    let (store, state) = StoreProbe::new();
    let mut controller = NoteController::new(store);

    let err = controller
        .update(&NoteId::from("ghost"), Some("Todo"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ControllerError::UnknownNote(_)));
    assert_eq!(state.update_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn update_failure_keeps_the_entry_pristine() {
    let owner = OwnerId::from("u1");
    let (store, probe) = StoreProbe::seeded(vec![note_at("n1", "u1", 100)]);
    let mut controller = NoteController::new(store);
    controller.load(&owner).await.unwrap();
    let before = controller.get(&NoteId::from("n1")).unwrap().clone();

    probe.fail_with(StoreError::Transport("connection reset".into()));
    let err = controller
        .update(&NoteId::from("n1"), Some("New title"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ControllerError::Update(_)));
    assert_eq!(controller.get(&NoteId::from("n1")), Some(&before));
}

#[tokio::test]
async fn stale_update_reports_not_found_and_forget_reconciles() {
    let owner = OwnerId::from("u1");
    let (store, probe) = StoreProbe::seeded(vec![note_at("n1", "u1", 100)]);
    let mut controller = NoteController::new(store);
    controller.load(&owner).await.unwrap();

    // The document vanished remotely, e.g. deleted from another device.
    probe.fail_with(StoreError::NotFound(NoteId::from("n1")));
    let err = controller
        .update(&NoteId::from("n1"), Some("New title"), None)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(ids(&controller), vec!["n1"]);

    assert!(controller.forget(&NoteId::from("n1")));
    assert!(controller.is_empty());
    assert!(!controller.forget(&NoteId::from("n1")));
}

#[tokio::test]
async fn remove_drops_the_entry_only_after_confirmation() {
    let owner = OwnerId::from("u1");
    let (store, _) = StoreProbe::seeded(vec![note_at("n1", "u1", 200), note_at("n2", "u1", 100)]);
    let mut controller = NoteController::new(store);
    controller.load(&owner).await.unwrap();

    controller.remove(&NoteId::from("n1")).await.unwrap();
    assert_eq!(ids(&controller), vec!["n2"]);

    controller.load(&owner).await.unwrap();
    assert_eq!(ids(&controller), vec!["n2"]);
}

#[tokio::test]
async fn repeated_remove_reports_not_found_and_changes_nothing() {
    let owner = OwnerId::from("u1");
    let (store, _) = StoreProbe::seeded(vec![note_at("n1", "u1", 200), note_at("n2", "u1", 100)]);
    let mut controller = NoteController::new(store);
    controller.load(&owner).await.unwrap();

    controller.remove(&NoteId::from("n1")).await.unwrap();
    let after_first = ids(&controller);

    let err = controller.remove(&NoteId::from("n1")).await.unwrap_err();
    assert!(matches!(err, ControllerError::Delete(_)));
    assert!(err.is_not_found());
    assert_eq!(ids(&controller), after_first);
}

#[tokio::test]
async fn remove_failure_keeps_the_entry() {
    let owner = OwnerId::from("u1");
    let (store, probe) = StoreProbe::seeded(vec![note_at("n1", "u1", 100)]);
    let mut controller = NoteController::new(store);
    controller.load(&owner).await.unwrap();

    probe.fail_with(StoreError::Transport("connection reset".into()));
    let err = controller.remove(&NoteId::from("n1")).await.unwrap_err();
    assert!(matches!(err, ControllerError::Delete(_)));
    assert!(!err.is_not_found());
    assert_eq!(ids(&controller), vec!["n1"]);
}

#[tokio::test]
async fn remove_rejects_a_blank_id_before_the_store() {
    let (store, state) = StoreProbe::new();
    let mut controller = NoteController::new(store);

    let err = controller.remove(&NoteId::from("   ")).await.unwrap_err();
    assert!(matches!(err, ControllerError::Validation(_)));
    assert_eq!(state.delete_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn clear_empties_the_list_and_unbinds_the_owner() {
    let owner = OwnerId::from("u1");
    let (store, _) = StoreProbe::seeded(vec![note_at("n1", "u1", 100)]);
    let mut controller = NoteController::new(store);
    controller.load(&owner).await.unwrap();
    assert_eq!(controller.owner(), Some(&owner));

    controller.clear();
    assert!(controller.is_empty());
    assert_eq!(controller.owner(), None);
}

#[tokio::test]
async fn listed_scenario_matches_the_store_payload() {
    let store = ScriptedStore {
        rows: vec![note_at("n1", "u1", 100), note_at("n2", "u1", 50)],
    };
    let mut controller = NoteController::new(store);

    let notes = controller.load(&OwnerId::from("u1")).await.unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].id.as_str(), "n1");
    assert_eq!(notes[1].id.as_str(), "n2");
}
