//! Shared test doubles for the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vitalens_core::gateway::transport::{
    ByteProgress, HttpRequest, HttpResponse, Transport, TransportError,
};
use vitalens_core::store::{CredentialStore, MemoryStore, StoreError};
use vitalens_core::{ApiClient, AppServices, EventBus};

pub const BASE_URL: &str = "http://api.test";

pub const TOKENS_JSON: &str =
    r#"{"access_token":"access-1","refresh_token":"refresh-1","token_type":"bearer"}"#;

pub const USER_JSON: &str = r#"{
    "id": 42,
    "email": "ada@example.com",
    "username": "ada",
    "is_active": true,
    "created_at": "2025-12-19T10:15:00"
}"#;

/// Transport answering from a queue of canned responses
///
/// Every request is recorded. An empty queue answers with a connection error.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    calls: AtomicUsize,
    /// Number of progress steps reported while "sending" a body
    progress_steps: u64,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_progress_steps(steps: u64) -> Arc<Self> {
        Arc::new(Self {
            progress_steps: steps,
            ..Self::default()
        })
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    pub fn fail(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    fn next(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("no canned response".to_string())))
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.next(request)
    }

    async fn send_with_progress(
        &self,
        request: HttpRequest,
        progress: ByteProgress,
    ) -> Result<HttpResponse, TransportError> {
        let total = request.body_len();
        let steps = self.progress_steps.max(1);
        for step in 0..=steps {
            progress(total * step / steps, total);
        }
        self.next(request)
    }
}

/// Memory store that journals every mutation and can refuse writes to a key
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    journal: Mutex<Vec<String>>,
    fail_key: Mutex<Option<String>>,
    fail_delete_all: Mutex<bool>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_writes_to(&self, key: &str) {
        *self.fail_key.lock().unwrap() = Some(key.to_string());
    }

    pub fn fail_delete_all(&self) {
        *self.fail_delete_all.lock().unwrap() = true;
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn saves(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter(|op| op.starts_with("save:"))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl CredentialStore for RecordingStore {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.journal.lock().unwrap().push(format!("save:{}", key));
        if self.fail_key.lock().unwrap().as_deref() == Some(key) {
            return Err(StoreError::Unavailable("write refused".to_string()));
        }
        self.inner.save(key, value)
    }

    fn get(&self, key: &str) -> Result<String, StoreError> {
        self.inner.get(key)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.journal.lock().unwrap().push(format!("delete:{}", key));
        self.inner.delete(key)
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        self.journal.lock().unwrap().push("delete_all".to_string());
        if *self.fail_delete_all.lock().unwrap() {
            return Err(StoreError::Unavailable("keychain locked".to_string()));
        }
        self.inner.delete_all()
    }
}

/// Services wired to a fake transport and a recording store
pub fn services(transport: &Arc<FakeTransport>, store: &Arc<RecordingStore>) -> AppServices {
    let client = ApiClient::new(BASE_URL, transport.clone(), store.clone())
        .expect("test base URL is valid");
    AppServices::from_client(client, EventBus::default())
}
