//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `pocketnote_core` linkage.
//! - Walk the sign-in and note flows against the in-memory backends, so
//!   a run is deterministic and needs no network.

use pocketnote_core::{AuthService, InMemoryAuthGateway, InMemoryNoteStore, NoteController};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("pocketnote_core ping={}", pocketnote_core::ping());
    println!(
        "pocketnote_core version={}",
        pocketnote_core::core_version()
    );

    if let Err(err) = run_walkthrough().await {
        eprintln!("walkthrough failed: {err}");
        std::process::exit(1);
    }
}

async fn run_walkthrough() -> Result<(), Box<dyn std::error::Error>> {
    let auth = AuthService::new(InMemoryAuthGateway::new());
    let user = auth
        .register("demo@example.com", "correct-horse-battery", "Demo")
        .await?;
    println!("signed in as {} <{}>", user.name, user.email);

    let mut notes = NoteController::new(InMemoryNoteStore::new());
    notes.load(&user.id).await?;
    let first_id = notes
        .add(&user.id, "First note", "Hello from the CLI.")
        .await?
        .id
        .clone();
    notes
        .add(&user.id, "Second note", "Newest entries stay on top.")
        .await?;

    for note in notes.notes() {
        println!(
            "- [{}] {}: {}",
            note.id,
            note.title,
            note.preview().unwrap_or_default()
        );
    }

    let updated = notes
        .update(&first_id, None, Some("Edited from the CLI."))
        .await?;
    println!(
        "updated [{}] -> {}",
        updated.id,
        updated.preview().unwrap_or_default()
    );

    notes.remove(&first_id).await?;
    println!("removed [{first_id}], {} note(s) left", notes.len());

    auth.logout().await?;
    println!("signed out");
    Ok(())
}
