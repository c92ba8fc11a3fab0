use crate::application_port::*;
use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

const REVOKED_MARKER: &str = "revoked";

pub struct RedisTokenBlacklist {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisTokenBlacklist {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisTokenBlacklist {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, jti: &str) -> String {
        format!("{}:{}", self.prefix, jti)
    }
}

#[async_trait::async_trait]
impl TokenBlacklist for RedisTokenBlacklist {
    async fn mark_revoked(&self, jti: &str, ttl_secs: u64) -> Result<bool, AuthError> {
        if ttl_secs == 0 {
            // EX 0 is rejected by Redis; a zero TTL token is already dead.
            return Ok(false);
        }
        let key = self.key(jti);
        let mut conn = self.conn.clone();
        // SET NX EX: a single per-key write, so concurrent markers agree on
        // exactly one winner.
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(REVOKED_MARKER)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(reply.is_some())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError> {
        let key = self.key(jti);
        let mut conn = self.conn.clone();
        let exists: bool = conn
            .exists(&key)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(exists)
    }
}
