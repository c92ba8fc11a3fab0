use crate::application_port::*;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use std::sync::Arc;

pub struct Argon2PasswordHasher {
    params: Params,
    pepper: Option<Arc<[u8]>>,
}

impl Argon2PasswordHasher {
    pub fn new(params: Params) -> Self {
        Argon2PasswordHasher {
            params,
            pepper: None,
        }
    }

    /// Mixes a server-side secret into every hash. Hashes made with one
    /// pepper never verify under another. An empty pepper means none.
    pub fn with_pepper(mut self, pepper: impl Into<Vec<u8>>) -> Self {
        let pepper = pepper.into();
        self.pepper = (!pepper.is_empty()).then(|| Arc::from(pepper));
        self
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

fn build_argon2(params: Params, pepper: Option<&[u8]>) -> Result<Argon2<'_>, AuthError> {
    match pepper {
        Some(secret) => Argon2::new_with_secret(secret, Algorithm::Argon2id, Version::V0x13, params)
            .map_err(|e| AuthError::InternalError(format!("argon2 setup: {}", e))),
        None => Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params)),
    }
}

fn join_error(e: tokio::task::JoinError) -> AuthError {
    AuthError::InternalError(format!("hashing task failed: {}", e))
}

// Argon2 is deliberately slow, so it runs on the blocking pool.
#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let params = self.params.clone();
        let pepper = self.pepper.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            let hash = build_argon2(params, pepper.as_deref())?
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| AuthError::InternalError(e.to_string()))?
                .to_string();
            Ok::<String, AuthError>(hash)
        })
        .await
        .map_err(join_error)?
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let params = self.params.clone();
        let pepper = self.pepper.clone();
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&password_hash)
                .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {}", e)))?;

            // Cost parameters come from the PHC string; only the pepper is ours.
            match build_argon2(params, pepper.as_deref())?
                .verify_password(password.as_bytes(), &parsed)
            {
                Ok(_) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(AuthError::InternalError(format!("verify error: {}", e))),
            }
        })
        .await
        .map_err(join_error)?
    }
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> Argon2PasswordHasher {
    Argon2PasswordHasher::new(Params::new(1024, 1, 1, None).unwrap())
}
