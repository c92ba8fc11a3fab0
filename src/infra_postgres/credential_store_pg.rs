use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// Credentials in the `auth_credential` table (see `sql/schema.sql`).
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        PgCredentialStore { pool }
    }

    fn row_to_record(row: PgRow) -> Result<CredentialRecord, AuthError> {
        let subject_id: SubjectId = row
            .try_get("subject_id")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let is_active: bool = row
            .try_get("is_active")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(CredentialRecord {
            subject_id,
            email,
            username,
            password_hash,
            is_active,
            created_at,
        })
    }
}

const USERNAME_CONSTRAINT: &str = "auth_credential_username_key";

/// Maps a unique violation to the identifier that clashed.
fn unique_violation(err: &sqlx::Error) -> Option<AuthError> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            if db.constraint() == Some(USERNAME_CONSTRAINT) {
                Some(AuthError::UsernameTaken)
            } else {
                Some(AuthError::UserExists)
            }
        }
        _ => None,
    }
}

#[async_trait::async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, credentials: NewCredentials) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO auth_credential (subject_id, email, username, password_hash)
VALUES ($1, $2, $3, $4)
"#,
        )
        .bind(credentials.subject_id)
        .bind(&credentials.email)
        .bind(&credentials.username)
        .bind(&credentials.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            unique_violation(&e).unwrap_or_else(|| AuthError::StoreUnavailable(e.to_string()))
        })?;

        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, AuthError> {
        let row_opt: Option<PgRow> = sqlx::query(
            r#"
SELECT subject_id, email, username, password_hash, is_active, created_at
FROM auth_credential
WHERE email = $1
"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }
}
