use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_postgres::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pool: Option<PgPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let blacklist: Arc<dyn TokenBlacklist> = match settings.auth.blacklist_backend.as_str() {
            "memory" => {
                warn!("using in-memory blacklist, revocations are lost on restart");
                Arc::new(MemoryTokenBlacklist::new(clock.clone()))
            }
            "redis" => {
                let redis_settings = settings
                    .redis
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("missing [redis] settings"))?;
                let redis_client = redis::Client::open(redis_settings.dsn.as_str())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                info!("connected to redis");
                Arc::new(RedisTokenBlacklist::new(
                    redis_manager,
                    redis_settings.key_prefix.clone(),
                ))
            }
            other => return Err(anyhow::anyhow!("Unknown blacklist backend: {}", other)),
        };

        let mut pool = None;
        let credential_store: Arc<dyn CredentialStore> =
            match settings.auth.credential_backend.as_str() {
                "memory" => {
                    warn!("using in-memory credential store, users are lost on restart");
                    Arc::new(MemoryCredentialStore::new())
                }
                "postgres" => {
                    let postgres = settings
                        .postgres
                        .as_ref()
                        .ok_or_else(|| anyhow::anyhow!("missing [postgres] settings"))?;
                    let pg = PgPoolOptions::new()
                        .max_connections(postgres.max_connections)
                        .connect(&postgres.dsn)
                        .await?;
                    info!("connected to postgres");
                    pool = Some(pg.clone());
                    Arc::new(PgCredentialStore::new(pg))
                }
                other => return Err(anyhow::anyhow!("Unknown credential backend: {}", other)),
            };

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(
            Argon2PasswordHasher::default().with_pepper(settings.auth.resolve_password_pepper()),
        );
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(
            JwtConfig {
                issuer: settings.auth.issuer.clone(),
                audience: settings.auth.audience.clone(),
                signing_key: settings.auth.resolve_signing_key()?,
            },
            clock.clone(),
        ));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            credential_store,
            credential_hasher,
            token_codec,
            blacklist,
            clock,
            TokenLifetimes {
                access: settings.auth.access_ttl(),
                refresh: settings.auth.refresh_ttl(),
            },
        ));

        info!("server started");

        Ok(Self { auth_service, pool })
    }

    /// A server around an already wired service, with no pooled resources.
    pub fn with_auth_service(auth_service: Arc<dyn AuthService>) -> Self {
        Self {
            auth_service,
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
