use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user already exists")]
    UserExists,
    #[error("username already taken")]
    UsernameTaken,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Failures of [`TokenCodec::decode_and_verify`] and [`TokenCodec::issue`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub subject_id: SubjectId,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Signs and verifies self-contained tokens. Implementations are pure apart
/// from reading the clock.
pub trait TokenCodec: Send + Sync {
    fn issue(
        &self,
        subject_id: SubjectId,
        token_type: TokenType,
        lifetime: Duration,
    ) -> Result<IssuedToken, TokenError>;

    /// Checks the signature before trusting any claim, then expiry.
    fn decode_and_verify(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: RegisterInput) -> Result<SubjectId, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    async fn authenticate(&self, access_token: &str) -> Result<SubjectId, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;
    async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<(), AuthError>;
}
