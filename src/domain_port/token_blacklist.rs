use crate::application_port::*;

/// Denylist of revoked refresh-token JTIs. Every entry carries its own TTL
/// and disappears once the token it guards would have expired anyway.
///
/// Errors reaching the store are reported as [`AuthError::StoreUnavailable`];
/// an implementation must never answer "not revoked" when it could not look.
#[async_trait::async_trait]
pub trait TokenBlacklist: Send + Sync {
    /// Marks `jti` revoked for `ttl_secs` seconds. Returns `true` when this
    /// call created the entry and `false` when it was already present, in
    /// which case the existing entry is left untouched.
    async fn mark_revoked(&self, jti: &str, ttl_secs: u64) -> Result<bool, AuthError>;

    async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError>;
}
