use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::ConfigV1;
use crate::errors::AuthError;
use crate::http::{self, ApiRequest};
use crate::models::{Claims, ErrorBody, TokenResponse};
use crate::token::decode_claims;

use super::refresh::{RefreshCoordinator, Ticket};
use super::state::{SessionSnapshot, SessionStore};

/// Owns the authentication session: decodes and validates bearer tokens,
/// notifies observers of authentication transitions, and wraps outbound API
/// calls with credential injection and transparent single-flight
/// refresh-on-401.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    config: ConfigV1,
    client: Client,
    store: SessionStore,
    refresh: RefreshCoordinator,
}

/// Handle returned by `subscribe`; deregisters the listener when consumed.
pub struct Subscription {
    id: u64,
    inner: Arc<ManagerInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        self.inner.store.unsubscribe(self.id);
    }
}

impl SessionManager {
    /// Build a manager against the configured backend. The cookie store
    /// carries the server-issued refresh credential between calls.
    pub fn new(config: ConfigV1) -> Result<Self, AuthError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_millis(config.http.timeout_in_ms))
            .build()?;

        Ok(SessionManager {
            inner: Arc::new(ManagerInner {
                config,
                client,
                store: SessionStore::new(),
                refresh: RefreshCoordinator::new(),
            }),
        })
    }

    /// Register a listener for authentication transitions. It receives the
    /// full snapshot when `is_authenticated` flips and when the startup
    /// restore completes, in registration order, after the mutation is
    /// fully applied.
    pub fn subscribe(
        &self,
        listener: impl Fn(&SessionSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.store.subscribe(Arc::new(listener));
        Subscription {
            id,
            inner: self.inner.clone(),
        }
    }

    /// Attempt to restore a session from the ambient refresh credential.
    /// Failing to restore is the normal "no session" outcome, not an error;
    /// either way the store is marked initialized. Callers are expected to
    /// call this once at startup, though repeat calls simply re-attempt
    /// restoration.
    pub async fn init(&self) {
        let restored = self.try_restore().await;
        match &restored {
            Some((_, claims)) => info!(sub = %claims.sub, "session restored"),
            None => debug!("no session to restore"),
        }
        self.inner.store.complete_init(restored);
    }

    /// Restore goes through the same single-flight coordinator as the
    /// 401 pipeline, so an `init()` racing a rejected call still yields at
    /// most one refresh exchange in flight.
    async fn try_restore(&self) -> Option<(String, Claims)> {
        match self.inner.refresh.begin() {
            // Another refresh is already in flight; share its outcome
            // instead of issuing a second exchange.
            Ticket::Follower(rx) => match rx.await {
                Ok(Ok(token)) => {
                    let claims = decode_claims(&token, Utc::now()).ok()?;
                    Some((token, claims))
                }
                _ => None,
            },
            Ticket::Leader => {
                let exchanged = self.exchange_refresh_token().await;
                let outcome = match &exchanged {
                    Ok((token, _)) => Ok(token.clone()),
                    Err(message) => Err(message.clone()),
                };
                self.inner.refresh.settle(&outcome);
                match exchanged {
                    Ok(restored) => Some(restored),
                    Err(message) => {
                        debug!(message = %message, "session restore failed");
                        None
                    }
                }
            }
        }
    }

    /// Exchange credentials for a fresh session. On rejection the local
    /// state is left exactly as it was before the call.
    pub async fn login(&self, email: &str, senha: &str) -> Result<Claims, AuthError> {
        let request = ApiRequest::post(self.inner.config.endpoints.login.clone())
            .json(json!({ "email": email, "senha": senha }));
        self.establish_session(request).await
    }

    /// Register a new account; same state-replacement contract as `login`.
    /// The backend answers 409 for a duplicate identity.
    pub async fn create_account(
        &self,
        nome: &str,
        email: &str,
        senha: &str,
    ) -> Result<Claims, AuthError> {
        let request = ApiRequest::post(self.inner.config.endpoints.create_account.clone())
            .json(json!({ "nome": nome, "email": email, "senha": senha }));
        self.establish_session(request).await
    }

    async fn establish_session(&self, request: ApiRequest) -> Result<Claims, AuthError> {
        let response = self.dispatch(&request).await?;
        if !response.status().is_success() {
            let message = read_error_message(response).await;
            warn!(message = %message, "authentication rejected");
            return Err(AuthError::AuthenticationRejected(message));
        }

        let body: TokenResponse = response.json().await?;
        let claims = decode_claims(&body.access_token, Utc::now())?;
        self.inner.store.set_session(body.access_token, claims.clone());
        info!(sub = %claims.sub, role = %claims.role, "session established");
        Ok(claims)
    }

    /// Tell the backend the session is over, then clear local state. The
    /// clear happens even when the backend call fails: a network error must
    /// not leave stale credentials behind.
    pub async fn logout(&self) {
        let request = ApiRequest::post(self.inner.config.endpoints.logout.clone());
        if let Err(err) = self.dispatch(&request).await {
            warn!(error = %err, "logout call failed, clearing local session anyway");
        }
        self.inner.store.clear_session();
    }

    // -- Read-only getters. Pure reads, no side effects, no network calls.

    pub fn is_authenticated(&self) -> bool {
        self.inner.store.snapshot().is_authenticated
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.store.snapshot().initialized
    }

    pub fn current_user(&self) -> Option<Claims> {
        self.inner.store.snapshot().user
    }

    pub fn current_role(&self) -> Option<String> {
        self.inner.store.snapshot().user.map(|user| user.role)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.inner
            .store
            .snapshot()
            .user
            .map(|user| user.has_role(role))
            .unwrap_or(false)
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.store.snapshot().access_token
    }

    /// Dispatch an authenticated API call. A 401 on a non-auth endpoint
    /// triggers one single-flight token refresh followed by one retry; a
    /// second 401 is surfaced as `SessionExpired` rather than looping.
    pub async fn fetch(&self, request: ApiRequest) -> Result<Response, AuthError> {
        let response = self.dispatch(&request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        // A 401 from login/refresh/logout themselves fails outward;
        // refreshing here would recurse.
        if self.inner.config.endpoints.is_auth_path(&request.path) {
            return Ok(response);
        }

        debug!(path = %request.path, "credential rejected, entering refresh");
        let token = self.refresh_access_token().await?;

        let retried = http::dispatch(
            &self.inner.client,
            &self.inner.config.base_url,
            &request,
            Some(&token),
        )
        .await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            // Already retried once with a fresh token; do not loop.
            warn!(path = %request.path, "request rejected again after refresh");
            return Err(AuthError::SessionExpired);
        }
        Ok(retried)
    }

    /// Single-flight refresh: one caller performs the exchange, everyone
    /// else queues behind it and receives the same outcome in FIFO order.
    async fn refresh_access_token(&self) -> Result<String, AuthError> {
        match self.inner.refresh.begin() {
            Ticket::Follower(rx) => match rx.await {
                Ok(Ok(token)) => Ok(token),
                Ok(Err(message)) => Err(AuthError::RefreshFailed(message)),
                // The leader dropped without settling; treat it as a failed
                // refresh.
                Err(_) => Err(AuthError::RefreshFailed("refresh abandoned".to_string())),
            },
            Ticket::Leader => {
                let outcome = match self.exchange_refresh_token().await {
                    Ok((token, claims)) => {
                        // State is updated before waiters are released, so
                        // every retry sees the new session.
                        self.inner.store.set_session(token.clone(), claims);
                        info!("access token refreshed");
                        Ok(token)
                    }
                    Err(message) => {
                        // Fail closed: a rejected credential and an
                        // unreachable backend are indistinguishable here, so
                        // both force logout.
                        warn!(message = %message, "refresh failed, forcing logout");
                        self.inner.store.clear_session();
                        Err(message)
                    }
                };
                self.inner.refresh.settle(&outcome);
                outcome.map_err(AuthError::RefreshFailed)
            }
        }
    }

    /// One exchange against the refresh endpoint. The store is not touched
    /// here; callers decide what a success means for the session.
    async fn exchange_refresh_token(&self) -> Result<(String, Claims), String> {
        let request = ApiRequest::post(self.inner.config.endpoints.refresh.clone());
        let response = match self.dispatch(&request).await {
            Ok(response) => response,
            Err(err) => return Err(format!("refresh transport error: {}", err)),
        };
        if !response.status().is_success() {
            return Err(format!("refresh rejected with status {}", response.status()));
        }

        let body: TokenResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => return Err(format!("refresh response unreadable: {}", err)),
        };
        match decode_claims(&body.access_token, Utc::now()) {
            Ok(claims) => Ok((body.access_token, claims)),
            Err(err) => Err(format!("refreshed token rejected: {}", err)),
        }
    }

    /// Low-level dispatch with the *current* token attached at send time.
    async fn dispatch(&self, request: &ApiRequest) -> Result<Response, reqwest::Error> {
        let token = self.access_token();
        http::dispatch(
            &self.inner.client,
            &self.inner.config.base_url,
            request,
            token.as_deref(),
        )
        .await
    }
}

/// Pull the backend's error message out of a failed response, falling back
/// to the status line.
async fn read_error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(ErrorBody {
            error: Some(message),
        }) => message,
        _ => status.to_string(),
    }
}
