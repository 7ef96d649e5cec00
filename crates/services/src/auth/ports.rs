use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{SessionId, UserId};

/// Represents a user in the system
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session created after successful authentication
#[derive(Debug, Clone)]
pub struct UserSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// The actual session token (only populated on creation, not on retrieval)
    pub token: Option<String>,
}

/// Repository trait for authentication session management
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a user session (returns the session with the unhashed token)
    async fn create_session(&self, user_id: UserId) -> anyhow::Result<UserSession>;

    /// Retrieve a session by token hash
    async fn get_session_by_token_hash(
        &self,
        token_hash: String,
    ) -> anyhow::Result<Option<UserSession>>;

    /// Delete a session
    async fn delete_session(&self, session_id: SessionId) -> anyhow::Result<()>;
}

/// Repository trait for user records
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Retrieve a user by ID
    async fn get_user(&self, user_id: UserId) -> anyhow::Result<Option<User>>;

    /// Find a user by email, creating one when absent
    async fn get_or_create_by_email(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> anyhow::Result<User>;
}
