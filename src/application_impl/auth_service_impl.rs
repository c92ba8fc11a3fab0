use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 30;
const RESERVED_USERNAMES: &[&str] = &["admin"];
const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_SPECIALS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

// Verified against on login misses so they cost one hash like a wrong password.
const DUMMY_PASSWORD: &str = "turnstile-dummy-password";

pub struct RealAuthService {
    credential_store: Arc<dyn CredentialStore>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    blacklist: Arc<dyn TokenBlacklist>,
    clock: Arc<dyn Clock>,
    lifetimes: TokenLifetimes,
    dummy_hash: OnceCell<String>,
}

impl RealAuthService {
    pub fn new(
        credential_store: Arc<dyn CredentialStore>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        blacklist: Arc<dyn TokenBlacklist>,
        clock: Arc<dyn Clock>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        Self {
            credential_store,
            credential_hasher,
            token_codec,
            blacklist,
            clock,
            lifetimes,
            dummy_hash: OnceCell::new(),
        }
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn validate_email(email: &str) -> Result<(), AuthError> {
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
            _ => Err(AuthError::InvalidInput("invalid email".to_string())),
        }
    }

    fn validate_username(username: &str) -> Result<(), AuthError> {
        let len = username.chars().count();
        let reason = if len < USERNAME_MIN_LEN {
            format!("username must be at least {} characters long", USERNAME_MIN_LEN)
        } else if len > USERNAME_MAX_LEN {
            format!("username must be at most {} characters long", USERNAME_MAX_LEN)
        } else if !username.chars().all(char::is_alphanumeric) {
            "username must be alphanumeric".to_string()
        } else if RESERVED_USERNAMES
            .iter()
            .any(|reserved| username.eq_ignore_ascii_case(reserved))
        {
            format!("username '{}' is reserved", username)
        } else {
            return Ok(());
        };
        Err(AuthError::InvalidInput(reason))
    }

    /// Reports every unmet rule at once.
    fn validate_password(password: &str) -> Result<(), AuthError> {
        let mut reasons = Vec::new();
        if password.chars().count() < PASSWORD_MIN_LEN {
            reasons.push(format!(
                "password must be at least {} characters long",
                PASSWORD_MIN_LEN
            ));
        }
        if !password.chars().any(char::is_numeric) {
            reasons.push("password must contain at least one digit".to_string());
        }
        if !password.chars().any(char::is_uppercase) {
            reasons.push("password must contain at least one uppercase letter".to_string());
        }
        if !password.chars().any(char::is_lowercase) {
            reasons.push("password must contain at least one lowercase letter".to_string());
        }
        if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
            reasons.push("password must contain at least one special character".to_string());
        }

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(AuthError::InvalidInput(reasons.join("; ")))
        }
    }

    /// Spends one password verification on a hash no password matches.
    async fn verify_against_dummy(&self, password: &str) -> Result<(), AuthError> {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.credential_hasher.hash_password(DUMMY_PASSWORD))
            .await?;
        self.credential_hasher.verify_password(password, dummy).await?;
        Ok(())
    }

    fn issue_pair(&self, subject_id: SubjectId) -> Result<AuthTokens, AuthError> {
        let access = self
            .token_codec
            .issue(subject_id, TokenType::Access, self.lifetimes.access)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        let refresh = self
            .token_codec
            .issue(subject_id, TokenType::Refresh, self.lifetimes.refresh)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        Ok(AuthTokens {
            access_token: AccessToken(access.encoded),
            refresh_token: RefreshToken(refresh.encoded),
            access_token_expires_at: access.claims.expires_at,
            refresh_token_expires_at: refresh.claims.expires_at,
        })
    }

    /// Decodes a token and insists on its type. Every failure is reported
    /// as `Unauthorized`; the reason only goes to the log.
    fn verify(&self, token: &str, expected: TokenType) -> Result<TokenClaims, AuthError> {
        let claims = self.token_codec.decode_and_verify(token).map_err(|e| {
            debug!(reason = %e, token_type = %expected, "token rejected");
            AuthError::Unauthorized
        })?;
        if claims.token_type != expected {
            debug!(
                got = %claims.token_type,
                token_type = %expected,
                "token rejected: wrong type"
            );
            return Err(AuthError::Unauthorized);
        }
        Ok(claims)
    }

    /// Seconds the blacklist entry must live to cover the token's remaining
    /// validity.
    fn revocation_ttl(&self, claims: &TokenClaims) -> Result<u64, AuthError> {
        match claims.remaining_secs(self.clock.now()) {
            0 => Err(AuthError::Unauthorized),
            ttl => Ok(ttl),
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(&self, request: RegisterInput) -> Result<SubjectId, AuthError> {
        let RegisterInput {
            email,
            username,
            password,
        } = request;
        let email = Self::normalize_email(&email);

        Self::validate_email(&email)?;
        Self::validate_username(&username)?;
        Self::validate_password(&password)?;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let subject_id = SubjectId::new_random();
        self.credential_store
            .create(NewCredentials {
                subject_id,
                email,
                username,
                password_hash,
            })
            .await?;

        info!(%subject_id, "user registered");
        Ok(subject_id)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;
        let email = Self::normalize_email(&email);

        let rec = match self.credential_store.get_by_email(&email).await? {
            Some(rec) if rec.is_active => rec,
            _ => {
                self.verify_against_dummy(&password).await?;
                return Err(AuthError::InvalidCredentials);
            }
        };

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(rec.subject_id)?;
        info!(subject_id = %rec.subject_id, "login succeeded");

        Ok(LoginResult {
            subject_id: rec.subject_id,
            tokens,
        })
    }

    async fn authenticate(&self, access_token: &str) -> Result<SubjectId, AuthError> {
        let claims = self.verify(access_token, TokenType::Access)?;
        Ok(claims.subject_id)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let claims = self.verify(refresh_token, TokenType::Refresh)?;

        if self.blacklist.is_revoked(&claims.jti).await? {
            debug!(jti = %claims.jti, "refresh token rejected: revoked");
            return Err(AuthError::Unauthorized);
        }

        // Consume the old token before anything new exists. A store failure
        // here aborts the whole refresh.
        let ttl = self.revocation_ttl(&claims)?;
        if !self.blacklist.mark_revoked(&claims.jti, ttl).await? {
            warn!(jti = %claims.jti, "refresh token consumed concurrently");
            return Err(AuthError::Unauthorized);
        }

        let tokens = self.issue_pair(claims.subject_id)?;
        debug!(subject_id = %claims.subject_id, jti = %claims.jti, "refresh token rotated");
        Ok(tokens)
    }

    async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<(), AuthError> {
        let subject_id = self.authenticate(access_token).await?;
        let claims = self.verify(refresh_token, TokenType::Refresh)?;

        if claims.subject_id != subject_id {
            warn!(%subject_id, "logout with another subject's refresh token");
            return Err(AuthError::Unauthorized);
        }

        // Access tokens are not blacklisted and stay valid until they expire.
        let ttl = self.revocation_ttl(&claims)?;
        self.blacklist.mark_revoked(&claims.jti, ttl).await?;

        info!(%subject_id, "logged out");
        Ok(())
    }
}
