use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex as StdMutex,
    },
};

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{Profile, RelationshipStatus, Username},
    protocol::RelationResource,
};
use tokio::{
    net::TcpListener,
    sync::{Barrier, Notify},
};

use crate::{
    action::{ActionSpec, HttpMethod},
    api::RelationshipApi,
    error::ApiCallError,
};

/// Status the server reports after a successful mutation, seen from the viewer.
pub fn status_after(action: &ActionSpec) -> RelationshipStatus {
    match (action.resource, action.method) {
        (RelationResource::Invitations, HttpMethod::Post) => {
            RelationshipStatus::InvitationFromYou
        }
        (RelationResource::Friends, HttpMethod::Post) => RelationshipStatus::Friend,
        (_, HttpMethod::Delete) => RelationshipStatus::Unknown,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path_and_query: String,
    pub username: String,
    pub cookie: Option<String>,
}

#[derive(Clone)]
pub struct FakeRelationsServer {
    status: Arc<StdMutex<RelationshipStatus>>,
    status_failure: Arc<StdMutex<Option<StatusCode>>>,
    mutation_failure: Arc<StdMutex<Option<StatusCode>>>,
    requests: Arc<StdMutex<Vec<RecordedRequest>>>,
}

impl FakeRelationsServer {
    pub fn new(status: RelationshipStatus) -> Self {
        Self {
            status: Arc::new(StdMutex::new(status)),
            status_failure: Arc::new(StdMutex::new(None)),
            mutation_failure: Arc::new(StdMutex::new(None)),
            requests: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    pub fn fail_status_with(&self, code: StatusCode) {
        *self.status_failure.lock().expect("lock") = Some(code);
    }

    pub fn fail_mutations_with(&self, code: StatusCode) {
        *self.mutation_failure.lock().expect("lock") = Some(code);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path_and_query))
            .collect()
    }

    fn record(&self, method: &Method, uri: &Uri, headers: &HeaderMap, username: String) {
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        self.requests.lock().expect("lock").push(RecordedRequest {
            method: method.to_string(),
            path_and_query,
            username,
            cookie: headers
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });
    }

    pub async fn spawn(self) -> anyhow::Result<String> {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = Router::new()
            .route("/api/v1.0/relations/status/:username", get(handle_status))
            .route(
                "/api/v1.0/relations/friends/:username",
                post(handle_mutation).delete(handle_mutation),
            )
            .route(
                "/api/v1.0/relations/invitations/:username",
                post(handle_mutation).delete(handle_mutation),
            )
            .route("/api/v1.0/users/:username", get(handle_profile))
            .with_state(self);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{addr}"))
    }
}

async fn handle_status(
    State(server): State<FakeRelationsServer>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Result<Json<RelationshipStatus>, StatusCode> {
    server.record(&method, &uri, &headers, username);
    if let Some(code) = *server.status_failure.lock().expect("lock") {
        return Err(code);
    }
    Ok(Json(*server.status.lock().expect("lock")))
}

async fn handle_profile(
    State(server): State<FakeRelationsServer>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Json<Profile> {
    server.record(&method, &uri, &headers, username.clone());
    Json(Profile {
        email: format!("{username}@example.com"),
        username,
        avatar_src: None,
        number_of_friends: 2,
    })
}

async fn handle_mutation(
    State(server): State<FakeRelationsServer>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> StatusCode {
    server.record(&method, &uri, &headers, username);
    if let Some(code) = *server.mutation_failure.lock().expect("lock") {
        return code;
    }

    let resource = if uri.path().contains("/friends/") {
        RelationResource::Friends
    } else {
        RelationResource::Invitations
    };
    let http_method = if method == Method::POST {
        HttpMethod::Post
    } else {
        HttpMethod::Delete
    };
    *server.status.lock().expect("lock") = status_after(&ActionSpec::new(resource, http_method));

    if method == Method::POST {
        StatusCode::CREATED
    } else {
        StatusCode::NO_CONTENT
    }
}

/// Blocks `execute` so tests can observe actions while they are pending.
pub enum ExecuteGate {
    /// Every call waits until the barrier's party count is reached.
    Barrier(Arc<Barrier>),
    /// Each call signals `started`, then waits for `release`.
    Hold {
        started: Arc<Notify>,
        release: Arc<Notify>,
    },
}

/// In-memory [`RelationshipApi`] that applies the server's transitions.
pub struct ScriptedApi {
    status: StdMutex<RelationshipStatus>,
    status_failures: StdMutex<VecDeque<u16>>,
    mutation_failure: Option<u16>,
    profile_failure: Option<u16>,
    executed: StdMutex<Vec<ActionSpec>>,
    status_calls: AtomicUsize,
    gate: Option<ExecuteGate>,
}

impl ScriptedApi {
    pub fn new(status: RelationshipStatus) -> Self {
        Self {
            status: StdMutex::new(status),
            status_failures: StdMutex::new(VecDeque::new()),
            mutation_failure: None,
            profile_failure: None,
            executed: StdMutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn failing_mutations(mut self, code: u16) -> Self {
        self.mutation_failure = Some(code);
        self
    }

    pub fn failing_profile(mut self, code: u16) -> Self {
        self.profile_failure = Some(code);
        self
    }

    pub fn failing_status_reads(self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.status_failures.lock().expect("lock").extend(codes);
        self
    }

    pub fn gated(mut self, gate: ExecuteGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<ActionSpec> {
        self.executed.lock().expect("lock").clone()
    }
}

#[async_trait]
impl RelationshipApi for ScriptedApi {
    async fn fetch_status(&self, _target: &Username) -> Result<RelationshipStatus, ApiCallError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = self.status_failures.lock().expect("lock").pop_front() {
            return Err(ApiCallError::rejected(code));
        }
        Ok(*self.status.lock().expect("lock"))
    }

    async fn fetch_profile(&self, target: &Username) -> Result<Profile, ApiCallError> {
        if let Some(code) = self.profile_failure {
            return Err(ApiCallError::rejected(code));
        }
        Ok(Profile {
            username: target.to_string(),
            email: format!("{target}@example.com"),
            avatar_src: Some("https://cdn.example/avatar.png".to_string()),
            number_of_friends: 1,
        })
    }

    async fn execute(&self, _target: &Username, action: &ActionSpec) -> Result<(), ApiCallError> {
        self.executed.lock().expect("lock").push(*action);
        match &self.gate {
            Some(ExecuteGate::Barrier(barrier)) => {
                barrier.wait().await;
            }
            Some(ExecuteGate::Hold { started, release }) => {
                started.notify_one();
                release.notified().await;
            }
            None => {}
        }

        if let Some(code) = self.mutation_failure {
            return Err(ApiCallError::rejected(code));
        }
        *self.status.lock().expect("lock") = status_after(action);
        Ok(())
    }
}
