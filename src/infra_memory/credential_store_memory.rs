use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;

/// Credentials keyed by email, with a username index. Nothing survives a
/// restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    by_email: DashMap<String, CredentialRecord>,
    usernames: DashMap<String, SubjectId>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, credentials: NewCredentials) -> Result<(), AuthError> {
        if self.by_email.contains_key(&credentials.email) {
            return Err(AuthError::UserExists);
        }

        // The username is claimed first; login never reads this index.
        let username = credentials.username.clone();
        let mut claimed = false;
        self.usernames.entry(username.clone()).or_insert_with(|| {
            claimed = true;
            credentials.subject_id
        });
        if !claimed {
            return Err(AuthError::UsernameTaken);
        }

        let mut created = false;
        self.by_email
            .entry(credentials.email.clone())
            .or_insert_with(|| {
                created = true;
                CredentialRecord {
                    subject_id: credentials.subject_id,
                    email: credentials.email,
                    username: credentials.username,
                    password_hash: credentials.password_hash,
                    is_active: true,
                    created_at: Utc::now(),
                }
            });

        if created {
            Ok(())
        } else {
            self.usernames.remove(&username);
            Err(AuthError::UserExists)
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, AuthError> {
        Ok(self.by_email.get(email).map(|r| r.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, username: &str) -> NewCredentials {
        NewCredentials {
            subject_id: SubjectId::new_random(),
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
        }
    }

    #[tokio::test]
    async fn email_and_username_are_both_unique() {
        let store = MemoryCredentialStore::new();
        store.create(credentials("a@example.com", "alice")).await.unwrap();

        let res = store.create(credentials("a@example.com", "someone")).await;
        assert!(matches!(res, Err(AuthError::UserExists)));

        let res = store.create(credentials("b@example.com", "alice")).await;
        assert!(matches!(res, Err(AuthError::UsernameTaken)));
        assert!(store.get_by_email("b@example.com").await.unwrap().is_none());

        // An email clash leaves the username free.
        store.create(credentials("c@example.com", "someone")).await.unwrap();
    }
}
