use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use services::auth::tokens::{hash_session_token, SESSION_TOKEN_LEN, SESSION_TOKEN_PREFIX};
use services::{SessionId, UserId};
use std::sync::Arc;

use crate::error::ApiError;

/// Authenticated user information inserted into request extensions by the auth middleware.
/// Extract in route handlers using `Extension<AuthenticatedUser>`
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub email: String,
}

/// State for authentication middleware
#[derive(Clone)]
pub struct AuthState {
    pub session_repository: Arc<dyn services::auth::ports::SessionRepository>,
    pub user_repository: Arc<dyn services::auth::ports::UserRepository>,
}

/// Check the bearer token shape before touching the database
fn validate_token_format(token: &str) -> Result<(), ApiError> {
    if !token.starts_with(SESSION_TOKEN_PREFIX) {
        tracing::warn!("Invalid session token format: missing prefix");
        return Err(ApiError::invalid_token());
    }

    if token.len() != SESSION_TOKEN_LEN {
        tracing::warn!(
            "Invalid session token format: expected length {}, got {}",
            SESSION_TOKEN_LEN,
            token.len()
        );
        return Err(ApiError::invalid_token());
    }

    Ok(())
}

/// Extract and validate token from Authorization header
fn extract_token_from_request(request: &Request) -> Result<String, ApiError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let auth_value = auth_header.ok_or_else(|| {
        tracing::warn!("No authorization header found");
        ApiError::missing_auth_header()
    })?;

    let token = auth_value.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!("Authorization header does not start with 'Bearer '");
        ApiError::invalid_auth_header()
    })?;

    validate_token_format(token)?;

    Ok(token.to_string())
}

/// Authenticate a token string against the session and user stores
async fn authenticate_token(
    token: &str,
    auth_state: &AuthState,
) -> Result<AuthenticatedUser, ApiError> {
    let token_hash = hash_session_token(token);

    let session = auth_state
        .session_repository
        .get_session_by_token_hash(token_hash)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up session: {}", e);
            ApiError::internal_server_error("Failed to authenticate session")
        })?
        .ok_or_else(|| {
            tracing::warn!("Session not found for provided token");
            ApiError::session_not_found()
        })?;

    if session.expires_at < Utc::now() {
        tracing::warn!("Session expired: session_id={}", session.session_id);
        return Err(ApiError::session_expired());
    }

    let user = auth_state
        .user_repository
        .get_user(session.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load user for session: {}", e);
            ApiError::internal_server_error("Failed to authenticate session")
        })?
        .ok_or_else(|| {
            tracing::warn!(
                "Session references missing user: session_id={}, user_id={}",
                session.session_id,
                session.user_id
            );
            ApiError::session_not_found()
        })?;

    tracing::debug!(
        "Authenticated session: user_id={}, session_id={}",
        session.user_id,
        session.session_id
    );

    Ok(AuthenticatedUser {
        user_id: session.user_id,
        session_id: session.session_id,
        email: user.email,
    })
}

/// Authentication middleware that validates session tokens
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    tracing::debug!("Auth middleware invoked for {} {}", method, path);

    let token = extract_token_from_request(&request).map_err(|e| e.into_response())?;
    let user = authenticate_token(&token, &state)
        .await
        .map_err(|e| e.into_response())?;

    tracing::info!(
        "Authentication successful for user_id={} on {} {}",
        user.user_id,
        method,
        path
    );

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::auth::test_helpers::{InMemorySessionRepository, InMemoryUserRepository};

    #[test]
    fn test_token_format_rejects_wrong_prefix() {
        assert!(validate_token_format("tok_7770c53028d8400a9c69600d800ab86e").is_err());
    }

    #[test]
    fn test_token_format_rejects_wrong_length() {
        assert!(validate_token_format("sess_abc").is_err());
        assert!(validate_token_format("sess_7770c53028d8400a9c69600d800ab86e00").is_err());
    }

    #[test]
    fn test_token_format_accepts_valid_token() {
        assert!(validate_token_format("sess_7770c53028d8400a9c69600d800ab86e").is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_token_roundtrip() {
        let sessions = Arc::new(InMemorySessionRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());

        let user_id = UserId::new();
        users.seed_user(user_id, "buyer@example.com");
        let token = sessions.seed_session(user_id).await;

        let state = AuthState {
            session_repository: sessions,
            user_repository: users,
        };

        let authenticated = authenticate_token(&token, &state).await.unwrap();
        assert_eq!(authenticated.user_id, user_id);
        assert_eq!(authenticated.email, "buyer@example.com");
    }

    #[tokio::test]
    async fn test_authenticate_token_rejects_unknown_token() {
        let state = AuthState {
            session_repository: Arc::new(InMemorySessionRepository::new()),
            user_repository: Arc::new(InMemoryUserRepository::new()),
        };

        let err = authenticate_token("sess_7770c53028d8400a9c69600d800ab86e", &state)
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }
}
