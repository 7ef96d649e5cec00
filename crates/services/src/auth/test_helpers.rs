//! In-memory session and user repositories for tests

use super::ports::{SessionRepository, User, UserRepository, UserSession};
use super::tokens::{generate_session_token, hash_session_token};
use crate::types::{SessionId, UserId};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory `SessionRepository` keyed by token hash
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, UserSession>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session directly and return the bearer token for it
    pub async fn seed_session(&self, user_id: UserId) -> String {
        let session = self
            .create_session(user_id)
            .await
            .expect("in-memory create_session cannot fail");
        session.token.expect("token populated on creation")
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create_session(&self, user_id: UserId) -> anyhow::Result<UserSession> {
        let created_at = Utc::now();
        let token = generate_session_token();
        let session = UserSession {
            session_id: SessionId::new(),
            user_id,
            created_at,
            expires_at: created_at + Duration::days(30),
            token: Some(token.clone()),
        };

        self.sessions
            .lock()
            .expect("session lock poisoned")
            .insert(
                hash_session_token(&token),
                UserSession {
                    token: None,
                    ..session.clone()
                },
            );

        Ok(session)
    }

    async fn get_session_by_token_hash(
        &self,
        token_hash: String,
    ) -> anyhow::Result<Option<UserSession>> {
        let sessions = self.sessions.lock().expect("session lock poisoned");
        Ok(sessions.get(&token_hash).cloned())
    }

    async fn delete_session(&self, session_id: SessionId) -> anyhow::Result<()> {
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        sessions.retain(|_, s| s.session_id != session_id);
        Ok(())
    }
}

/// In-memory `UserRepository`
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user with a known id
    pub fn seed_user(&self, user_id: UserId, email: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: user_id,
            email: email.to_string(),
            name: None,
            created_at: now,
            updated_at: now,
        };
        self.users
            .lock()
            .expect("user lock poisoned")
            .push(user.clone());
        user
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_user(&self, user_id: UserId) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().expect("user lock poisoned");
        Ok(users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn get_or_create_by_email(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> anyhow::Result<User> {
        let mut users = self.users.lock().expect("user lock poisoned");
        if let Some(user) = users.iter().find(|u| u.email == email) {
            return Ok(user.clone());
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: email.to_string(),
            name: name.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }
}
