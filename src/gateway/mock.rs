//! Scripted gateways for tests and offline runs.
//!
//! Replies are consumed in order; once a script runs dry the mocks fall back
//! to canned successful answers, so an interactive session never stalls.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use agency_api::{
    AccessToken, Agency, AgencyApiError, DocumentUpload, HealthStatus, Identity,
    RunAgencyRequest, StatusCode,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use super::{AuthGateway, PipelineGateway};

/// Failure a mock replays in place of a backend answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    Status(u16, String),
    Timeout,
}

impl MockFailure {
    fn into_error(self) -> AgencyApiError {
        match self {
            Self::Status(code, message) => AgencyApiError::Status(
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message,
            ),
            Self::Timeout => AgencyApiError::Timeout,
        }
    }
}

#[derive(Debug, Clone)]
struct MockAccount {
    password: String,
    token: String,
}

#[derive(Debug, Default)]
struct AuthState {
    accounts: HashMap<String, MockAccount>,
    identities: HashMap<String, Identity>,
    permissive: bool,
    login_calls: Vec<String>,
    users_me_calls: Vec<Option<String>>,
}

/// Auth service stand-in keyed by username and token.
#[derive(Debug, Default)]
pub struct MockAuthGateway {
    state: Mutex<AuthState>,
}

pub const MOCK_TOKEN_PREFIX: &str = "mock-token-";
const INCORRECT_CREDENTIALS: &str = "Incorrect email or password";
const INVALID_TOKEN: &str = "Could not validate credentials";

impl MockAuthGateway {
    /// Rejects every credential and token until accounts are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts any non-blank credentials and resolves every token it issued.
    pub fn permissive() -> Self {
        let gateway = Self::new();
        gateway.state().permissive = true;
        gateway
    }

    /// Registers an account. `identity` is what `users_me` returns for its
    /// token; `None` makes the lookup fail.
    pub fn with_account(
        self,
        username: &str,
        password: &str,
        token: &str,
        identity: Option<Identity>,
    ) -> Self {
        {
            let mut state = self.state();
            state.accounts.insert(
                username.to_owned(),
                MockAccount {
                    password: password.to_owned(),
                    token: token.to_owned(),
                },
            );
            if let Some(identity) = identity {
                state.identities.insert(token.to_owned(), identity);
            }
        }
        self
    }

    /// Makes `users_me` resolve `token` without a matching account.
    pub fn with_identity(self, token: &str, identity: Identity) -> Self {
        self.state().identities.insert(token.to_owned(), identity);
        self
    }

    pub fn login_calls(&self) -> Vec<String> {
        self.state().login_calls.clone()
    }

    pub fn users_me_calls(&self) -> Vec<Option<String>> {
        self.state().users_me_calls.clone()
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        lock_unpoisoned(&self.state)
    }
}

#[async_trait]
impl AuthGateway for MockAuthGateway {
    async fn login_access_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccessToken, AgencyApiError> {
        let mut state = self.state();
        state.login_calls.push(username.to_owned());

        if let Some(account) = state.accounts.get(username) {
            if account.password == password {
                return Ok(bearer(account.token.clone()));
            }
        } else if state.permissive && !username.trim().is_empty() && !password.is_empty() {
            let token = format!("{MOCK_TOKEN_PREFIX}{}", username.trim());
            let identity = Identity {
                id: state.identities.len() as i64 + 1,
                email: username.trim().to_owned(),
                is_active: true,
                is_superuser: false,
            };
            state.identities.insert(token.clone(), identity);
            return Ok(bearer(token));
        }

        Err(MockFailure::Status(400, INCORRECT_CREDENTIALS.to_owned()).into_error())
    }

    async fn users_me(&self, token: Option<&str>) -> Result<Identity, AgencyApiError> {
        let mut state = self.state();
        state.users_me_calls.push(token.map(str::to_owned));

        token
            .and_then(|token| state.identities.get(token).cloned())
            .ok_or_else(|| MockFailure::Status(401, INVALID_TOKEN.to_owned()).into_error())
    }
}

fn bearer(access_token: String) -> AccessToken {
    AccessToken {
        access_token,
        token_type: Some("bearer".to_owned()),
    }
}

#[derive(Debug, Default)]
struct PipelineState {
    run_replies: VecDeque<Result<Value, MockFailure>>,
    ingest_replies: VecDeque<Result<(), MockFailure>>,
    run_calls: Vec<RunAgencyRequest>,
    ingested: Vec<DocumentUpload>,
}

/// Pipeline service stand-in.
#[derive(Debug, Default)]
pub struct MockPipelineGateway {
    state: Mutex<PipelineState>,
    gate: Option<Arc<Semaphore>>,
}

impl MockPipelineGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next run-agency payload.
    pub fn with_reply(self, payload: Value) -> Self {
        self.state().run_replies.push_back(Ok(payload));
        self
    }

    /// Queue the next run-agency failure.
    pub fn with_failure(self, failure: MockFailure) -> Self {
        self.state().run_replies.push_back(Err(failure));
        self
    }

    /// Queue the next ingestion failure. Unscripted ingestions succeed.
    pub fn with_ingest_failure(self, failure: MockFailure) -> Self {
        self.state().ingest_replies.push_back(Err(failure));
        self
    }

    /// Hold every run until `gate` hands out a permit. Each permit releases
    /// exactly one run.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn run_calls(&self) -> Vec<RunAgencyRequest> {
        self.state().run_calls.clone()
    }

    pub fn ingested(&self) -> Vec<DocumentUpload> {
        self.state().ingested.clone()
    }

    fn state(&self) -> MutexGuard<'_, PipelineState> {
        lock_unpoisoned(&self.state)
    }
}

#[async_trait]
impl PipelineGateway for MockPipelineGateway {
    async fn run_agency(&self, request: &RunAgencyRequest) -> Result<Value, AgencyApiError> {
        let scripted = {
            let mut state = self.state();
            state.run_calls.push(request.clone());
            state.run_replies.pop_front()
        };

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        match scripted {
            Some(reply) => reply.map_err(MockFailure::into_error),
            None => Ok(canned_reply(request)),
        }
    }

    async fn ingest(&self, document: DocumentUpload) -> Result<(), AgencyApiError> {
        let mut state = self.state();
        match state.ingest_replies.pop_front() {
            Some(Err(failure)) => Err(failure.into_error()),
            _ => {
                state.ingested.push(document);
                Ok(())
            }
        }
    }

    async fn health(&self) -> Result<HealthStatus, AgencyApiError> {
        Ok(HealthStatus {
            status: "ok".to_owned(),
        })
    }
}

fn canned_reply(request: &RunAgencyRequest) -> Value {
    match request.agency_type {
        Agency::Legal => json!({
            "status": "success",
            "output": {
                "document": format!("# Draft\n\nMock legal draft for: {}", request.prompt),
            },
            "metrics": {"risk_score": 12},
            "messages": [request.prompt],
        }),
        Agency::Design => json!({
            "status": "success",
            "output": {
                "concept": format!("Mock design concept for: {}", request.prompt),
                "artifacts": {"image": {"url": "https://assets.invalid/mock-concept.png"}},
            },
        }),
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
