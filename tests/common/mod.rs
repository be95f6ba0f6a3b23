#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use chrono::{Duration, Utc};
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use uuid::Uuid;

use jobboard_backend::{
    database::{MemoryPostingStore, PostingStore},
    error::{Error, Result},
    middleware::auth::issue_token,
    models::posting::{JobType, NewPosting, Posting},
    routes::api_router,
    services::{
        payment_service::{CheckoutSession, ListingPrice, PaymentGateway, SessionStatus},
        storage_service::ObjectStorage,
    },
    AppState,
};

pub const JWT_SECRET: &str = "test_secret_key";
pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const BOUNDARY: &str = "----jobboard-test-boundary";

/// Gateway double that remembers every session it opened.
#[derive(Default)]
pub struct FakeGateway {
    sessions: Mutex<HashMap<String, (Uuid, bool)>>,
    counter: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeGateway {
    pub fn mark_paid(&self, session_id: &str) {
        if let Some(entry) = self.sessions.lock().unwrap().get_mut(session_id) {
            entry.1 = true;
        }
    }

    pub fn opened(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_session(&self, posting_id: Uuid, _price: &ListingPrice) -> Result<CheckoutSession> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::PaymentSession("gateway timed out".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = format!("cs_test_{}", n);
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.clone(), (posting_id, false));
        Ok(CheckoutSession {
            redirect_url: format!("https://pay.example.com/checkout/{}", session_id),
            session_id,
        })
    }

    async fn session_status(&self, session_id: &str) -> Result<SessionStatus> {
        let sessions = self.sessions.lock().unwrap();
        let (posting_id, paid) = sessions
            .get(session_id)
            .copied()
            .ok_or_else(|| Error::PaymentSession(format!("unknown checkout session {}", session_id)))?;
        Ok(SessionStatus {
            session_id: session_id.to_string(),
            posting_id: Some(posting_id),
            paid,
        })
    }
}

#[derive(Default)]
pub struct FakeStorage {
    pub keys: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn store(&self, key: &str, _data: Bytes, _content_type: &str) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Internal("object storage unavailable".into()));
        }
        self.keys.lock().unwrap().push(key.to_string());
        Ok(format!("/uploads/{}", key))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryPostingStore>,
    pub gateway: Arc<FakeGateway>,
    pub storage: Arc<FakeStorage>,
}

pub fn setup_app() -> TestApp {
    let store = Arc::new(MemoryPostingStore::new());
    let gateway = Arc::new(FakeGateway::default());
    let storage = Arc::new(FakeStorage::default());
    let state = AppState::from_parts(
        store.clone(),
        storage.clone(),
        gateway.clone(),
        ListingPrice {
            amount_cents: 1000,
            currency: "usd".into(),
        },
        JWT_SECRET,
        WEBHOOK_SECRET,
    );
    TestApp {
        router: api_router(state),
        store,
        gateway,
        storage,
    }
}

pub fn bearer(employer_id: Uuid) -> String {
    let token = issue_token(employer_id, JWT_SECRET, Duration::hours(1)).expect("sign token");
    format!("Bearer {}", token)
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let resp = router.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn authed(method: &str, uri: &str, employer_id: Uuid) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(employer_id))
        .body(Body::empty())
        .unwrap()
}

/// A `multipart/form-data` body built by hand.
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn job(title: &str, location: &str) -> Self {
        Self::new()
            .text("title", title)
            .text("company", "Nairobi Tech Labs")
            .text("company_email", "jobs@nairotechlabs.co.ke")
            .text("company_phone", "+254712345678")
            .text("location", location)
            .text("job_type", "Full-time")
            .text("category", "Technology")
            .text("description", "Build beautiful, responsive web interfaces.")
            .text("salary_min", "80000")
            .text("salary_max", "150000")
            .text("application_deadline", "2026-12-31")
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str, employer_id: Uuid) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, bearer(employer_id))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub fn new_posting(employer_id: Uuid, title: &str, location: &str, minutes_ago: i64) -> NewPosting {
    NewPosting {
        id: Uuid::new_v4(),
        employer_id,
        title: title.into(),
        company: "Acme Kenya".into(),
        company_email: "hr@acme.co.ke".into(),
        company_phone: "+254700000000".into(),
        location: location.into(),
        job_type: JobType::FullTime,
        category: "Technology".into(),
        description: "A role on a growing team.".into(),
        requirements: None,
        salary_min: None,
        salary_max: None,
        image_url: None,
        application_deadline: None,
        created_at: Utc::now() - Duration::minutes(minutes_ago),
    }
}

/// Inserts and activates directly through the store.
pub async fn seed_active(store: &MemoryPostingStore, posting: NewPosting) -> Posting {
    let id = posting.id;
    store.insert(posting).await.expect("insert");
    store.activate(id, &format!("tx_{}", id)).await.expect("activate");
    store.get(id).await.expect("get").expect("exists")
}
