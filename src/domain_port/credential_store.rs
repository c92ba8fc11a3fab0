use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub subject_id: SubjectId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCredentials {
    pub subject_id: SubjectId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a record. Fails with [`AuthError::UserExists`] if the email is
    /// taken and [`AuthError::UsernameTaken`] if the username is.
    async fn create(&self, credentials: NewCredentials) -> Result<(), AuthError>;

    /// Fetch credentials by (normalized) email, for login.
    async fn get_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, AuthError>;
}
