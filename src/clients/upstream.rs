use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::{
    config::Config,
    error::UpstreamError,
    models::student::{
        AuthorizedGuardian, GuardianPhoto, PickupAuthorization, StudentSummary,
    },
};

/// Deadline for every upstream call except photos.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Deadline for guardian photo calls.
const PHOTO_TIMEOUT: Duration = Duration::from_secs(5);
/// Header carrying the session token after authentication.
const TOKEN_HEADER: &str = "token";

/// A photo fetched on a best-effort basis. `None` means "no photo".
pub type PhotoResult = Option<String>;

/// An upstream session token. Valid for a single lookup flow.
#[derive(Clone)]
pub struct Token(Zeroizing<String>);

impl Token {
    fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    usuario: &'a str,
    senha: &'a str,
}

/// Client for the upstream school-management API.
///
/// Every call is a single attempt with a fixed deadline; no retries.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    username: String,
    password: Zeroizing<String>,
}

impl UpstreamClient {
    /// Creates a client for the tenant described by `config`.
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        Self::with_base_url(
            config.api_base_url(),
            config.api_user.clone(),
            config.api_password.to_string(),
        )
    }

    /// Creates a client against an explicit base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        username: String,
        password: String,
    ) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| UpstreamError::ApiFailure(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username,
            password: Zeroizing::new(password),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    fn authed_get(&self, token: &Token, path: &str) -> RequestBuilder {
        self.http
            .get(self.url(path))
            .header(TOKEN_HEADER, token.as_str())
            .header(header::ACCEPT, "application/json")
    }

    /// Exchanges the configured credentials for a token.
    pub async fn authenticate(&self) -> Result<Token, UpstreamError> {
        let auth_url = self.url("Autenticacao");
        tracing::debug!("🔐 Authenticating against upstream API");

        let response = self
            .http
            .post(&auth_url)
            .header(header::ACCEPT, "application/json")
            .json(&Credentials {
                usuario: &self.username,
                senha: &self.password,
            })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::warn!("❌ Upstream authentication request failed ({}): {}", auth_url, e);
                UpstreamError::AuthFailure(e.to_string())
            })?;

        let body = response.text().await.map_err(|e| {
            tracing::warn!("❌ Upstream authentication body unreadable: {}", e);
            UpstreamError::AuthFailure(e.to_string())
        })?;

        let token = body.trim();
        if token.is_empty() {
            tracing::warn!("❌ Upstream authentication returned an empty token");
            return Err(UpstreamError::AuthFailure("empty token".to_string()));
        }

        tracing::debug!("✅ Upstream token acquired");
        Ok(Token(Zeroizing::new(token.to_string())))
    }

    /// Searches students by name. An empty list is a valid result.
    pub async fn search_students(
        &self,
        token: &Token,
        name: &str,
    ) -> Result<Vec<StudentSummary>, UpstreamError> {
        let response = self
            .authed_get(token, "Alunos")
            .query(&[("Nome", name)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| UpstreamError::ApiFailure(e.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::ApiFailure(e.to_string()))?;

        sonic_rs::from_slice(&body)
            .map_err(|e| UpstreamError::ApiFailure(format!("invalid search response: {}", e)))
    }

    /// Fetches one student, degrading to a "not found" placeholder on any failure.
    pub async fn get_student(&self, token: &Token, student_id: i64) -> StudentSummary {
        match self.try_get_student(token, student_id).await {
            Ok(student) => student,
            Err(e) => {
                tracing::warn!("⚠️ Student {} unavailable upstream: {}", student_id, e);
                StudentSummary::not_found(student_id)
            }
        }
    }

    async fn try_get_student(
        &self,
        token: &Token,
        student_id: i64,
    ) -> Result<StudentSummary, UpstreamError> {
        let response = self
            .authed_get(token, &format!("Alunos/{}", student_id))
            .send()
            .await
            .map_err(|e| UpstreamError::ApiFailure(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(UpstreamError::ApiFailure(format!(
                "status {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::ApiFailure(e.to_string()))?;

        sonic_rs::from_slice(&body).map_err(|e| UpstreamError::ApiFailure(e.to_string()))
    }

    /// Lists the guardians authorized to pick up a student, without photos.
    pub async fn get_authorized_guardians(
        &self,
        token: &Token,
        student_id: i64,
    ) -> Result<Vec<AuthorizedGuardian>, UpstreamError> {
        let response = self
            .authed_get(token, &format!("alunos/{}/AutorizacaoRetirada", student_id))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| UpstreamError::ApiFailure(e.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::ApiFailure(e.to_string()))?;

        let authorization: PickupAuthorization = sonic_rs::from_slice(&body).map_err(|e| {
            UpstreamError::ApiFailure(format!("invalid authorization response: {}", e))
        })?;

        Ok(authorization
            .guardians
            .into_iter()
            .map(|guardian| AuthorizedGuardian {
                photo_uri: None,
                ..guardian
            })
            .collect())
    }

    /// Fetches a guardian photo. Every failure is logged and reported as no photo.
    pub async fn get_guardian_photo(&self, token: &Token, guardian_code: &str) -> PhotoResult {
        match self.try_get_guardian_photo(token, guardian_code).await {
            Ok(photo) => Some(photo),
            Err(e) => {
                tracing::warn!("⚠️ Guardian {}: {}", guardian_code, e);
                None
            }
        }
    }

    async fn try_get_guardian_photo(
        &self,
        token: &Token,
        guardian_code: &str,
    ) -> Result<String, UpstreamError> {
        let response = self
            .authed_get(token, &format!("responsaveis/{}/fotos", guardian_code))
            .timeout(PHOTO_TIMEOUT)
            .send()
            .await
            .map_err(|e| UpstreamError::PhotoUnavailable(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(UpstreamError::PhotoUnavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::PhotoUnavailable(e.to_string()))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(UpstreamError::PhotoUnavailable("empty body".to_string()));
        }

        let photo: GuardianPhoto = sonic_rs::from_slice(&body)
            .map_err(|e| UpstreamError::PhotoUnavailable(e.to_string()))?;

        photo
            .photo
            .filter(|p| !p.is_empty())
            .ok_or_else(|| UpstreamError::PhotoUnavailable("no photo on file".to_string()))
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! In-process stand-in for the upstream API, bound to an ephemeral port.

    use std::collections::HashMap;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, post},
        Router,
    };

    use super::UpstreamClient;

    pub const TOKEN: &str = "stub-token";

    /// How the stub answers a guardian photo request.
    #[derive(Clone)]
    pub enum PhotoReply {
        Photo(String),
        Status(u16),
        EmptyBody,
        Garbage,
    }

    #[derive(Default)]
    pub struct StubState {
        pub auth_status: Option<u16>,
        pub search_status: Option<u16>,
        pub search_body: Option<String>,
        pub students: HashMap<i64, String>,
        pub guardians_status: Option<u16>,
        pub guardians_body: Option<String>,
        pub photos: HashMap<String, PhotoReply>,
        pub auth_calls: AtomicUsize,
        pub search_calls: AtomicUsize,
        pub last_search: Mutex<Option<String>>,
    }

    impl StubState {
        pub fn search_calls(&self) -> usize {
            self.search_calls.load(Ordering::SeqCst)
        }

        pub fn auth_calls(&self) -> usize {
            self.auth_calls.load(Ordering::SeqCst)
        }
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("token").and_then(|v| v.to_str().ok()) == Some(TOKEN)
    }

    fn status(code: u16) -> StatusCode {
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    async fn authenticate(State(stub): State<Arc<StubState>>) -> Response {
        stub.auth_calls.fetch_add(1, Ordering::SeqCst);
        match stub.auth_status {
            Some(code) => status(code).into_response(),
            None => TOKEN.into_response(),
        }
    }

    async fn search(
        State(stub): State<Arc<StubState>>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        stub.search_calls.fetch_add(1, Ordering::SeqCst);
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        *stub.last_search.lock().unwrap() = params.get("Nome").cloned();
        if let Some(code) = stub.search_status {
            return status(code).into_response();
        }
        stub.search_body.clone().unwrap_or_else(|| "[]".to_string()).into_response()
    }

    async fn student(
        State(stub): State<Arc<StubState>>,
        headers: HeaderMap,
        Path(id): Path<i64>,
    ) -> Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        match stub.students.get(&id) {
            Some(name) => format!(r#"{{"codigo":{},"nome":"{}"}}"#, id, name).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn guardians(
        State(stub): State<Arc<StubState>>,
        headers: HeaderMap,
        Path(_id): Path<i64>,
    ) -> Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        if let Some(code) = stub.guardians_status {
            return status(code).into_response();
        }
        stub.guardians_body
            .clone()
            .unwrap_or_else(|| r#"{"responsaveisAutorizados":[]}"#.to_string())
            .into_response()
    }

    async fn photo(
        State(stub): State<Arc<StubState>>,
        headers: HeaderMap,
        Path(code): Path<String>,
    ) -> Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        match stub.photos.get(&code) {
            Some(PhotoReply::Photo(data)) => {
                format!(r#"{{"foto":"{}"}}"#, data).into_response()
            }
            Some(PhotoReply::Status(code)) => status(*code).into_response(),
            Some(PhotoReply::EmptyBody) => StatusCode::OK.into_response(),
            Some(PhotoReply::Garbage) => "<html>oops</html>".into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }

    /// Starts the stub and returns a client pointed at it.
    pub async fn spawn(state: StubState) -> (UpstreamClient, Arc<StubState>) {
        let state = Arc::new(state);
        let app = Router::new()
            .route("/api/v1/Autenticacao", post(authenticate))
            .route("/api/v1/Alunos", get(search))
            .route("/api/v1/Alunos/{id}", get(student))
            .route("/api/v1/alunos/{id}/AutorizacaoRetirada", get(guardians))
            .route("/api/v1/responsaveis/{code}/fotos", get(photo))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = UpstreamClient::with_base_url(
            format!("http://{}", addr),
            "desk".to_string(),
            "api-secret".to_string(),
        )
        .unwrap();

        (client, state)
    }

    /// A client pointed at a port nothing listens on.
    pub async fn unreachable() -> UpstreamClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        UpstreamClient::with_base_url(
            format!("http://{}", addr),
            "desk".to_string(),
            "api-secret".to_string(),
        )
        .unwrap()
    }
}
