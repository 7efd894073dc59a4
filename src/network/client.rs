//! Authenticated HTTP client - bearer auth with transparent token refresh
//!
//! Every call goes through [`ApiClient::request`]. Authorized calls check the
//! access token's expiry locally before sending, and a 401 answer triggers
//! one refresh followed by one retry. Concurrent callers that hit an expired
//! session share a single refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::constants::REFRESH_PATH;
use crate::error::{error_message, ApiError, ApiResult};
use crate::models::{Credentials, HttpMethod, RefreshRequest, TokenPair};
use crate::network::descriptor::RequestDescriptor;
use crate::network::hooks::Hooks;
use crate::network::session::Session;
use crate::token;

/// Outcome of the last refresh attempt, guarded by the refresh lock
#[derive(Default)]
struct RefreshGate {
    /// Settle count at which an exchange failed, with the reason handed to
    /// the callers that queued behind it
    failed: Option<(u64, String)>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    expiry_leeway: chrono::Duration,
    session: Session,
    hooks: Hooks,
    refresh_gate: Mutex<RefreshGate>,
    /// Number of refresh exchanges that completed; read before queuing on
    /// the gate
    refresh_settled: AtomicU64,
}

/// API client holding the session for one signed-in user.
///
/// Construct one at startup and hand clones to whatever issues requests;
/// clones share credentials and listeners. Call [`ApiClient::shutdown`] on
/// full sign-out.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self::from_parts(
            config.normalized_base_url(),
            http,
            config.expiry_leeway(),
        ))
    }

    /// Build on an existing `reqwest::Client`
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Self {
        Self::from_parts(base_url, http, chrono::Duration::zero())
    }

    fn from_parts(base_url: &str, http: reqwest::Client, expiry_leeway: chrono::Duration) -> Self {
        ApiClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                expiry_leeway,
                session: Session::default(),
                hooks: Hooks::default(),
                refresh_gate: Mutex::new(RefreshGate::default()),
                refresh_settled: AtomicU64::new(0),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Replace both tokens at once
    pub fn set_tokens(&self, access_token: Option<String>, refresh_token: Option<String>) {
        self.inner.session.replace(Credentials {
            access_token,
            refresh_token,
        });
    }

    pub fn get_tokens(&self) -> Credentials {
        self.inner.session.credentials()
    }

    /// Register the listener called once after each successful refresh.
    ///
    /// It runs synchronously on the task that performed the refresh and is
    /// expected to persist the pair.
    pub fn on_token_refresh<F>(&self, listener: F)
    where
        F: Fn(&TokenPair) + Send + Sync + 'static,
    {
        self.inner.hooks.set_token_refresh(Arc::new(listener));
    }

    /// Register the listener called once per operation that fails because
    /// the session cannot be restored.
    pub fn on_auth_error<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.hooks.set_auth_error(Arc::new(listener));
    }

    /// End of the client's lifecycle: drop credentials and listeners
    pub fn shutdown(&self) {
        self.inner.session.clear();
        self.inner.hooks.clear();
        tracing::info!(base_url = %self.inner.base_url, "Client shut down");
    }

    pub(crate) fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Execute a request and decode the response as `T`.
    ///
    /// Empty responses (204 or zero-length) decode as JSON `null`, so `()`
    /// and `Option<_>` accept them.
    pub async fn request<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> ApiResult<T> {
        if !descriptor.requires_auth {
            let response = self.send(&descriptor, None).await?;
            return read_response(response).await;
        }

        let (access_token, generation) = self.authorize().await?;
        let response = self.send(&descriptor, Some(&access_token)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return read_response(response).await;
        }

        tracing::info!(endpoint = %descriptor.endpoint, "Access token rejected, refreshing session");
        let pair = match self.refresh_from(generation).await {
            Ok((pair, _)) => pair,
            Err(reason) => return Err(self.auth_failed(reason)),
        };

        // The retry is final: a second 401 is a real authorization failure
        let response = self.send(&descriptor, Some(&pair.access_token)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.bytes().await.unwrap_or_default();
            let reason = error_message(&body)
                .unwrap_or_else(|| "access token rejected after refresh".to_string());
            return Err(self.auth_failed(reason));
        }
        read_response(response).await
    }

    /// Refresh the session now, regardless of the access token's state
    pub(crate) async fn refresh_now(&self) -> ApiResult<TokenPair> {
        let generation = self.inner.session.snapshot().generation;
        match self.refresh_from(generation).await {
            Ok((pair, _)) => Ok(pair),
            Err(reason) => Err(self.auth_failed(reason)),
        }
    }

    /// Access token to send, refreshing first when it is missing or expired
    async fn authorize(&self) -> ApiResult<(String, u64)> {
        let snapshot = self.inner.session.snapshot();
        let credentials = &snapshot.credentials;

        match &credentials.access_token {
            Some(access) if !token::is_expired(access, Utc::now(), self.inner.expiry_leeway) => {
                return Ok((access.clone(), snapshot.generation));
            }
            Some(_) => tracing::info!("Access token expired, refreshing before request"),
            None if credentials.refresh_token.is_none() => {
                return Err(self.auth_failed("not signed in"));
            }
            None => tracing::info!("No access token held, refreshing before request"),
        }

        match self.refresh_from(snapshot.generation).await {
            Ok((pair, generation)) => Ok((pair.access_token, generation)),
            Err(reason) => Err(self.auth_failed(reason)),
        }
    }

    /// Single-flight refresh of the session seen at `observed` generation.
    ///
    /// Callers queue on the refresh lock. If the pair changed while waiting,
    /// the new pair is returned without another exchange. If an exchange
    /// failed while waiting, its reason is returned. A caller that arrives
    /// after a failure has settled starts a fresh exchange.
    async fn refresh_from(&self, observed: u64) -> Result<(TokenPair, u64), String> {
        let seen_settled = self.inner.refresh_settled.load(Ordering::SeqCst);
        let mut gate = self.inner.refresh_gate.lock().await;

        let current = self.inner.session.snapshot();
        if current.generation != observed {
            if let Some(pair) = current.credentials.pair() {
                tracing::debug!(generation = current.generation, "Session already refreshed");
                return Ok((pair, current.generation));
            }
        }

        let settled = self.inner.refresh_settled.load(Ordering::SeqCst);
        if settled != seen_settled {
            if let Some((failed_at, reason)) = &gate.failed {
                if *failed_at == settled {
                    return Err(reason.clone());
                }
            }
        }

        let generation = current.generation;
        let Some(refresh_token) = current.credentials.refresh_token else {
            return Err("no refresh token held".to_string());
        };

        // A dropped exchange never settles, so the next caller tries again
        let outcome = self.exchange_refresh_token(&refresh_token).await;
        let settled = self.inner.refresh_settled.fetch_add(1, Ordering::SeqCst) + 1;

        match outcome {
            Ok(pair) => {
                gate.failed = None;
                let Some(generation) = self.inner.session.rotate_if_current(generation, &pair) else {
                    // Signed out or re-authenticated while the exchange was in flight
                    let current = self.inner.session.snapshot();
                    return match current.credentials.pair() {
                        Some(pair) => Ok((pair, current.generation)),
                        None => Err("session ended during refresh".to_string()),
                    };
                };
                tracing::info!(generation, "Session refreshed");
                self.inner.hooks.token_refreshed(&pair);
                Ok((pair, generation))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                let reason = format!("session refresh failed: {}", e);
                gate.failed = Some((settled, reason.clone()));
                Err(reason)
            }
        }
    }

    /// POST the refresh token. Never carries a bearer header.
    async fn exchange_refresh_token(&self, refresh_token: &str) -> ApiResult<TokenPair> {
        let descriptor = RequestDescriptor::post(REFRESH_PATH)
            .json(&RefreshRequest { refresh_token })?
            .public();
        let response = self.send(&descriptor, None).await?;
        read_response(response).await
    }

    fn auth_failed(&self, reason: impl Into<String>) -> ApiError {
        let reason = reason.into();
        tracing::warn!(reason = %reason, "Authorization failed");
        self.inner.hooks.auth_failed();
        ApiError::Unauthorized(reason)
    }

    async fn send(
        &self,
        descriptor: &RequestDescriptor,
        bearer: Option<&str>,
    ) -> ApiResult<reqwest::Response> {
        let url = descriptor.url(&self.inner.base_url);
        let http = &self.inner.http;

        let mut req_builder = match descriptor.method {
            HttpMethod::GET => http.get(&url),
            HttpMethod::POST => http.post(&url),
            HttpMethod::PUT => http.put(&url),
            HttpMethod::PATCH => http.patch(&url),
            HttpMethod::DELETE => http.delete(&url),
        };
        req_builder = req_builder.header(ACCEPT, "application/json");

        if let Some(token) = bearer {
            req_builder = req_builder.bearer_auth(token);
        }
        if let Some(body) = &descriptor.body {
            req_builder = req_builder.json(body);
        }

        tracing::debug!(
            method = descriptor.method.as_str(),
            url = %url,
            authorized = bearer.is_some(),
            "Sending request"
        );

        match req_builder.send().await {
            Ok(response) => {
                tracing::debug!(url = %url, status = response.status().as_u16(), "Response received");
                Ok(response)
            }
            Err(e) => {
                if e.is_timeout() {
                    tracing::warn!(url = %url, "Request timed out");
                } else {
                    tracing::warn!(url = %url, error = %e, "Request failed");
                }
                Err(ApiError::Network(e))
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

/// Interpret a response: status classification, empty bodies, JSON decoding
async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return empty_value();
    }
    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        return Err(ApiError::from_status(status.as_u16(), &body));
    }
    if response.content_length() == Some(0) {
        return empty_value();
    }

    let body = response.bytes().await?;
    if body.is_empty() {
        return empty_value();
    }
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn empty_value<T: DeserializeOwned>() -> ApiResult<T> {
    serde_json::from_value(Value::Null)
        .map_err(|e| ApiError::Decode(format!("empty response body: {}", e)))
}
