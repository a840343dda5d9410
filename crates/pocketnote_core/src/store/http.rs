//! HTTP-backed note store.
//!
//! # Responsibility
//! - Implement [`NoteStore`] against the hosted Appwrite-style document API.
//! - Translate wire documents and failure responses into crate types.
//!
//! # Invariants
//! - Every request carries the project header; the server key header is
//!   attached only when a key is configured.
//! - Non-success responses never surface as decoded notes.
//!
//! # See also
//! - `store::memory` for the network-free implementation used in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::BackendConfig;
use crate::model::note::{Note, NoteDraft, NoteId, NotePatch, OwnerId};
use crate::store::{NoteStore, StoreError, StoreResult};

const HEADER_PROJECT: &str = "X-Appwrite-Project";
const HEADER_API_KEY: &str = "X-Appwrite-Key";

/// Sentinel document id asking the backend to mint one.
const NEW_DOCUMENT_ID: &str = "unique()";

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidData(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Note store speaking the backend's document REST surface.
pub struct HttpNoteStore {
    http: Client,
    config: BackendConfig,
}

impl HttpNoteStore {
    /// Builds a store with its own cookie-carrying client.
    pub fn new(config: BackendConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok(Self::with_client(http, config))
    }

    /// Builds a store on a shared client so document calls reuse the
    /// session cookie established by account calls.
    pub fn with_client(http: Client, config: BackendConfig) -> Self {
        Self { http, config }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.config.endpoint, self.config.database_id, self.config.collection_id
        )
    }

    fn document_url(&self, id: &NoteId) -> String {
        format!("{}/{}", self.documents_url(), id)
    }

    fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(HEADER_PROJECT, &self.config.project_id);
        match &self.config.api_key {
            Some(key) => request.header(HEADER_API_KEY, key),
            None => request,
        }
    }

    async fn read_failure(&self, response: Response, missing: Option<&NoteId>) -> StoreError {
        let status = response.status().as_u16();
        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => format!("request failed with status {status}"),
        };
        classify_failure(status, message, missing)
    }
}

#[async_trait]
impl NoteStore for HttpNoteStore {
    async fn list_notes(&self, owner: &OwnerId) -> StoreResult<Vec<Note>> {
        let response = self
            .decorate(self.http.get(self.documents_url()))
            .query(&[
                ("queries[]", owner_equal_query(owner)),
                ("queries[]", newest_first_query()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.read_failure(response, None).await);
        }
        let list = response.json::<DocumentList>().await?;
        Ok(list.documents.into_iter().map(NoteDocument::into_note).collect())
    }

    async fn create_note(&self, owner: &OwnerId, draft: &NoteDraft) -> StoreResult<Note> {
        let response = self
            .decorate(self.http.post(self.documents_url()))
            .json(&create_body(owner, draft))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.read_failure(response, None).await);
        }
        Ok(response.json::<NoteDocument>().await?.into_note())
    }

    async fn update_note(&self, id: &NoteId, patch: &NotePatch) -> StoreResult<Note> {
        let response = self
            .decorate(self.http.patch(self.document_url(id)))
            .json(&patch_body(patch))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.read_failure(response, Some(id)).await);
        }
        Ok(response.json::<NoteDocument>().await?.into_note())
    }

    async fn delete_note(&self, id: &NoteId) -> StoreResult<()> {
        let response = self
            .decorate(self.http.delete(self.document_url(id)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.read_failure(response, Some(id)).await);
        }
        Ok(())
    }
}

/// Maps a non-success status to the store error taxonomy.
fn classify_failure(status: u16, message: String, missing: Option<&NoteId>) -> StoreError {
    match (status, missing) {
        (404, Some(id)) => StoreError::NotFound(id.clone()),
        (401 | 403, _) => StoreError::Unauthorized(message),
        _ => StoreError::Api { status, message },
    }
}

fn owner_equal_query(owner: &OwnerId) -> String {
    json!({
        "method": "equal",
        "attribute": "ownerId",
        "values": [owner.as_str()],
    })
    .to_string()
}

fn newest_first_query() -> String {
    json!({
        "method": "orderDesc",
        "attribute": "$createdAt",
    })
    .to_string()
}

fn create_body(owner: &OwnerId, draft: &NoteDraft) -> Value {
    json!({
        "documentId": NEW_DOCUMENT_ID,
        "data": {
            "title": draft.title(),
            "content": draft.content(),
            "ownerId": owner.as_str(),
        },
    })
}

fn patch_body(patch: &NotePatch) -> Value {
    let mut data = serde_json::Map::new();
    if let Some(title) = patch.title() {
        data.insert("title".to_string(), json!(title));
    }
    if let Some(content) = patch.content() {
        data.insert("content".to_string(), json!(content));
    }
    json!({ "data": data })
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    documents: Vec<NoteDocument>,
}

/// Note document as stored by the backend. System fields use `$` names.
#[derive(Debug, Deserialize)]
struct NoteDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "$createdAt")]
    created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    updated_at: DateTime<Utc>,
    #[serde(rename = "ownerId")]
    owner_id: String,
    title: String,
    content: String,
}

impl NoteDocument {
    fn into_note(self) -> Note {
        Note {
            id: NoteId::new(self.id),
            owner_id: OwnerId::new(self.owner_id),
            title: self.title,
            content: self.content,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
