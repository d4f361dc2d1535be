//! In-memory stand-ins for every external collaborator, plus a harness that
//! drives the real router with them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use chrono::Utc;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::session::{SessionError, SessionVerifier};
use crate::creations::CreationStore;
use crate::identity::{IdentityError, Metadata, MetadataStore};
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::creation::{CreationRow, NewCreation};
use crate::providers::{BackgroundRemover, ImageGenerator, ProviderError};
use crate::routes::build_router;
use crate::staging::StagingArea;
use crate::state::AppState;
use crate::storage::{content_key, MediaStore, StorageError, StoredMedia};

// ────────────────────────────────────────────────────────────────────────────
// Identity
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryMetadataStore {
    users: Mutex<HashMap<String, Metadata>>,
    set_calls: AtomicUsize,
    fail_reads: AtomicBool,
}

impl MemoryMetadataStore {
    pub fn with(principal_id: &str, metadata: Metadata) -> Self {
        let store = Self::default();
        store.put(principal_id, metadata);
        store
    }

    pub fn put(&self, principal_id: &str, metadata: Metadata) {
        self.users
            .lock()
            .unwrap()
            .insert(principal_id.to_string(), metadata);
    }

    pub fn snapshot(&self, principal_id: &str) -> Metadata {
        self.users
            .lock()
            .unwrap()
            .get(principal_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get_metadata(&self, principal_id: &str) -> Result<Metadata, IdentityError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(IdentityError::Api {
                status: 503,
                message: "identity store offline".into(),
            });
        }
        Ok(self.snapshot(principal_id))
    }

    async fn set_metadata(
        &self,
        principal_id: &str,
        update: Metadata,
    ) -> Result<(), IdentityError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        let entry = users.entry(principal_id.to_string()).or_default();
        for (k, v) in update {
            entry.insert(k, v);
        }
        Ok(())
    }
}

/// Accepts `token-<principal>` and yields `<principal>`.
pub struct StaticSessions;

impl SessionVerifier for StaticSessions {
    fn verify(&self, token: &str) -> Result<String, SessionError> {
        token
            .strip_prefix("token-")
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(SessionError::MissingSubject)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Creations
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryCreationStore {
    rows: Mutex<Vec<CreationRow>>,
    fail_inserts: AtomicBool,
}

impl MemoryCreationStore {
    pub fn all(&self) -> Vec<CreationRow> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CreationStore for MemoryCreationStore {
    async fn insert(&self, creation: NewCreation) -> Result<CreationRow, sqlx::Error> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let row = CreationRow {
            id: Uuid::new_v4(),
            user_id: creation.user_id,
            prompt: creation.prompt,
            content: creation.content,
            creation_type: creation.creation_type.as_str().to_string(),
            publish: creation.publish,
            likes: Vec::new(),
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<CreationRow>, sqlx::Error> {
        Ok(self
            .all()
            .into_iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .collect())
    }

    async fn list_published(&self) -> Result<Vec<CreationRow>, sqlx::Error> {
        Ok(self.all().into_iter().rev().filter(|r| r.publish).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<CreationRow>, sqlx::Error> {
        Ok(self.all().into_iter().find(|r| r.id == id))
    }

    async fn set_likes(&self, id: Uuid, likes: &[String]) -> Result<(), sqlx::Error> {
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|r| r.id == id) {
            row.likes = likes.to_vec();
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Media
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryMediaStore {
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
    fail_uploads: AtomicBool,
}

impl MemoryMediaStore {
    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredMedia, StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Upload("bucket unavailable".into()));
        }
        let key = content_key(&bytes, content_type);
        self.uploads.lock().unwrap().push((key.clone(), bytes));
        Ok(StoredMedia {
            url: format!("https://media.test/{key}"),
            key,
        })
    }

    fn transformed_url(&self, media: &StoredMedia, transform: &str) -> String {
        format!("https://cdn.test/{transform}/{}", media.key)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Providers
// ────────────────────────────────────────────────────────────────────────────

pub struct MockTextGenerator {
    reply: Option<String>,
    calls: AtomicUsize,
    last_max_tokens: Mutex<Option<u32>>,
    last_prompt: Mutex<Option<String>>,
}

impl MockTextGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
            last_max_tokens: Mutex::new(None),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            ..Self::replying("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_max_tokens(&self) -> Option<u32> {
        *self.last_max_tokens.lock().unwrap()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_max_tokens.lock().unwrap() = Some(max_tokens);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.reply.clone().ok_or(LlmError::Api {
            status: 500,
            message: "model overloaded".into(),
        })
    }
}

pub struct MockImageGenerator {
    calls: AtomicUsize,
}

impl MockImageGenerator {
    pub const PNG: &'static [u8] = b"\x89PNG generated";

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, _prompt: &str) -> Result<Bytes, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from_static(Self::PNG))
    }
}

#[derive(Default)]
pub struct MockBackgroundRemover {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockBackgroundRemover {
    pub const PNG: &'static [u8] = b"\x89PNG transparent";

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BackgroundRemover for MockBackgroundRemover {
    async fn remove_background(
        &self,
        _image: Vec<u8>,
        _file_name: &str,
    ) -> Result<Bytes, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Api {
                provider: "remove.bg",
                status: 402,
                message: "insufficient credits".into(),
            });
        }
        Ok(Bytes::from_static(Self::PNG))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Harness
// ────────────────────────────────────────────────────────────────────────────

pub struct Harness {
    pub identity: Arc<MemoryMetadataStore>,
    pub creations: Arc<MemoryCreationStore>,
    pub media: Arc<MemoryMediaStore>,
    pub text: Arc<MockTextGenerator>,
    pub images: Arc<MockImageGenerator>,
    pub remover: Arc<MockBackgroundRemover>,
    remover_configured: bool,
    upload_dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_text(MockTextGenerator::replying("Generated text"))
    }

    pub fn with_text(text: MockTextGenerator) -> Self {
        Self {
            identity: Arc::new(MemoryMetadataStore::default()),
            creations: Arc::new(MemoryCreationStore::default()),
            media: Arc::new(MemoryMediaStore::default()),
            text: Arc::new(text),
            images: Arc::new(MockImageGenerator {
                calls: AtomicUsize::new(0),
            }),
            remover: Arc::new(MockBackgroundRemover::default()),
            remover_configured: true,
            upload_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn without_background_remover(mut self) -> Self {
        self.remover_configured = false;
        self
    }

    pub fn principal(&self, id: &str, metadata: Value) -> &Self {
        self.identity
            .put(id, metadata.as_object().cloned().unwrap_or_default());
        self
    }

    pub fn router(&self) -> Router {
        let background_remover: Option<Arc<dyn BackgroundRemover>> = if self.remover_configured {
            Some(self.remover.clone())
        } else {
            None
        };
        build_router(AppState {
            sessions: Arc::new(StaticSessions),
            identity: self.identity.clone(),
            creations: self.creations.clone(),
            media: self.media.clone(),
            text: self.text.clone(),
            images: self.images.clone(),
            background_remover,
            staging: StagingArea::new(self.upload_dir.path()),
        })
    }

    /// Files currently left in the staging directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}

pub fn json_request(path: &str, user: &str, body: Value) -> Request<Body> {
    Request::post(path)
        .header(header::AUTHORIZATION, format!("Bearer token-{user}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(path: &str, user: &str) -> Request<Body> {
    Request::get(path)
        .header(header::AUTHORIZATION, format!("Bearer token-{user}"))
        .body(Body::empty())
        .unwrap()
}

/// One multipart part: `(field name, file name, content type, bytes)`.
pub type Part<'a> = (&'a str, Option<&'a str>, &'a str, &'a [u8]);

const BOUNDARY: &str = "----aihub-test-boundary";

pub fn multipart_request(path: &str, user: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, file_name, content_type, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post(path)
        .header(header::AUTHORIZATION, format!("Bearer token-{user}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Single-page PDF showing `text` in Helvetica, with a correct xref table.
/// `text` must not contain parentheses or backslashes.
pub fn one_page_pdf(text: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}
