//! Needs a live Redis. Run with
//! `REDIS_DSN=redis://127.0.0.1:6379 cargo test --test redis_blacklist -- --ignored`.

use turnstile::domain_port::TokenBlacklist;
use turnstile::infra_redis::RedisTokenBlacklist;

async fn blacklist() -> RedisTokenBlacklist {
    let dsn = std::env::var("REDIS_DSN").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let client = redis::Client::open(dsn).unwrap();
    let manager = client.get_connection_manager().await.unwrap();
    RedisTokenBlacklist::new(manager, format!("turnstile-test:{}", uuid::Uuid::new_v4()))
}

#[tokio::test]
#[ignore]
async fn mark_is_idempotent_and_visible() {
    let blacklist = blacklist().await;
    let jti = uuid::Uuid::new_v4().to_string();

    assert!(!blacklist.is_revoked(&jti).await.unwrap());
    assert!(blacklist.mark_revoked(&jti, 60).await.unwrap());
    assert!(!blacklist.mark_revoked(&jti, 60).await.unwrap());
    assert!(blacklist.is_revoked(&jti).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn entries_expire() {
    let blacklist = blacklist().await;
    let jti = uuid::Uuid::new_v4().to_string();

    blacklist.mark_revoked(&jti, 1).await.unwrap();
    assert!(blacklist.is_revoked(&jti).await.unwrap());
    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;
    assert!(!blacklist.is_revoked(&jti).await.unwrap());
}
