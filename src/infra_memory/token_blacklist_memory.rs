use crate::application_port::*;
use crate::domain_port::*;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Process-local blacklist for development and tests. Entries expire
/// against the injected clock; expired ones are dropped lazily.
pub struct MemoryTokenBlacklist {
    entries: DashMap<String, DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl MemoryTokenBlacklist {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        MemoryTokenBlacklist {
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries.iter().filter(|e| *e.value() > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, expires_at| *expires_at > now);
    }
}

#[async_trait::async_trait]
impl TokenBlacklist for MemoryTokenBlacklist {
    async fn mark_revoked(&self, jti: &str, ttl_secs: u64) -> Result<bool, AuthError> {
        let now = self.clock.now();
        self.purge_expired(now);

        let ttl = i64::try_from(ttl_secs)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        let expires_at = now + Duration::seconds(ttl);

        let mut inserted = false;
        self.entries.entry(jti.to_string()).or_insert_with(|| {
            inserted = true;
            expires_at
        });
        Ok(inserted)
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError> {
        let now = self.clock.now();
        let expired = match self.entries.get(jti) {
            Some(expires_at) if *expires_at > now => return Ok(true),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(jti, |_, expires_at| *expires_at <= now);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::ManualClock;

    fn blacklist() -> (MemoryTokenBlacklist, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (MemoryTokenBlacklist::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn marking_twice_is_the_same_as_once() {
        let (blacklist, _) = blacklist();
        assert!(!blacklist.is_revoked("jti-1").await.unwrap());

        assert!(blacklist.mark_revoked("jti-1", 60).await.unwrap());
        assert!(blacklist.is_revoked("jti-1").await.unwrap());

        assert!(!blacklist.mark_revoked("jti-1", 60).await.unwrap());
        assert!(blacklist.is_revoked("jti-1").await.unwrap());
        assert_eq!(blacklist.len(), 1);
    }

    #[tokio::test]
    async fn second_mark_does_not_extend_ttl() {
        let (blacklist, clock) = blacklist();
        blacklist.mark_revoked("jti-1", 10).await.unwrap();
        clock.advance(Duration::seconds(5));
        blacklist.mark_revoked("jti-1", 3600).await.unwrap();
        clock.advance(Duration::seconds(6));
        assert!(!blacklist.is_revoked("jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn entries_expire_with_their_ttl() {
        let (blacklist, clock) = blacklist();
        blacklist.mark_revoked("jti-1", 10).await.unwrap();
        blacklist.mark_revoked("jti-2", 100).await.unwrap();

        clock.advance(Duration::seconds(9));
        assert!(blacklist.is_revoked("jti-1").await.unwrap());

        clock.advance(Duration::seconds(1));
        assert!(!blacklist.is_revoked("jti-1").await.unwrap());
        assert!(blacklist.is_revoked("jti-2").await.unwrap());
        assert_eq!(blacklist.len(), 1);
    }

    #[tokio::test]
    async fn expired_entry_can_be_marked_again() {
        let (blacklist, clock) = blacklist();
        blacklist.mark_revoked("jti-1", 1).await.unwrap();
        clock.advance(Duration::seconds(2));
        assert!(blacklist.mark_revoked("jti-1", 1).await.unwrap());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let (blacklist, _) = blacklist();
        blacklist.mark_revoked("jti-1", 60).await.unwrap();
        assert!(!blacklist.is_revoked("jti-2").await.unwrap());
        assert!(!blacklist.is_empty());
    }
}
