//! Sign-in and session handling against the hosted auth API.
//!
//! The session manager is the identity provider for the goal store: its
//! current session decides which user every read and write is scoped to.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use goalpath_core::errors::{Error, PersistenceError, Result};
use goalpath_core::goals::IdentityProviderTrait;

use crate::config::RemoteConfig;
use crate::errors::{ApiErrorResponse, StorageError};

/// Access tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at
            .map(|expires_at| expires_at - margin <= now)
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
            email: self.user.email,
            expires_at,
        }
    }
}

/// HTTP client for the auth endpoints (`/auth/v1`).
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl AuthClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.token_grant(
            "password",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    /// Revokes the session's refresh token on the server.
    pub async fn sign_out(&self, session: &Session) -> Result<()> {
        let url = self.config.auth_url("logout");
        debug!("[Auth] POST {}", url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(StorageError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.map_err(StorageError::from)?;
        Err(StorageError::Status {
            status: status.as_u16(),
            message: ApiErrorResponse::describe(&body, status.as_u16()),
        }
        .into())
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let url = self.config.auth_url("token");
        debug!("[Auth] POST {} (grant_type={})", url, grant_type);

        let response = self
            .client
            .post(&url)
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.config.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(StorageError::from)?;

        let status = response.status();
        let text = response.text().await.map_err(StorageError::from)?;

        if !status.is_success() {
            let message = ApiErrorResponse::describe(&text, status.as_u16());
            error!("[Auth] Token request failed with status {}: {}", status, message);
            // Bad grants come back as 400; anything else is a service failure.
            return Err(match status.as_u16() {
                400 | 401 | 403 => Error::Persistence(PersistenceError::Unauthorized(message)),
                code => StorageError::Status {
                    status: code,
                    message,
                }
                .into(),
            });
        }

        let token: TokenResponse = serde_json::from_str(&text).map_err(StorageError::from)?;
        Ok(token.into_session(Utc::now()))
    }
}

/// Holds the current session and refreshes it when it is about to expire.
pub struct SessionManager {
    auth: AuthClient,
    session: RwLock<Option<Session>>,
}

impl SessionManager {
    pub fn new(auth: AuthClient) -> Self {
        Self {
            auth,
            session: RwLock::new(None),
        }
    }

    pub fn with_session(auth: AuthClient, session: Session) -> Self {
        Self {
            auth,
            session: RwLock::new(Some(session)),
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_session(&self, session: Option<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        info!("[Auth] Signed in as user {}", session.user_id);
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    /// Starts a session from a stored refresh token.
    pub async fn restore(&self, refresh_token: &str) -> Result<Session> {
        let session = self.auth.refresh_session(refresh_token).await?;
        info!("[Auth] Restored session for user {}", session.user_id);
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    /// Ends the session locally; the server-side revoke is best-effort.
    pub async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.session() else {
            return Ok(());
        };
        self.set_session(None);
        if let Err(e) = self.auth.sign_out(&session).await {
            warn!("[Auth] Server sign-out failed: {}", e);
        }
        Ok(())
    }

    /// Bearer token for REST calls, refreshing the session first when it is
    /// close to expiry. `None` when signed out.
    pub async fn access_token(&self) -> Result<Option<String>> {
        let Some(session) = self.session() else {
            return Ok(None);
        };
        if !session.expires_within(Utc::now(), Duration::seconds(REFRESH_MARGIN_SECS)) {
            return Ok(Some(session.access_token));
        }

        debug!("[Auth] Access token expiring, refreshing");
        let refreshed = self.auth.refresh_session(&session.refresh_token).await?;
        let token = refreshed.access_token.clone();
        self.set_session(Some(refreshed));
        Ok(Some(token))
    }
}

impl IdentityProviderTrait for SessionManager {
    fn current_user_id(&self) -> Option<String> {
        self.session().map(|s| s.user_id)
    }
}
